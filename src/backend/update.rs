//! Applying updates to images
//!
//! Runs the driver's update command in a container built from the
//! original image and commits the result under a new name, then records
//! the remediation in the cache.

use crate::backend::Classifier;
use crate::error::{PodpatchError, PodpatchResult};
use crate::orchestration::ContainerRuntime;
use tracing::info;

/// The kind of update to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Apply every pending update.
    General,
    /// Apply security updates only.
    Security,
}

/// Split an image reference into repository and tag, defaulting the tag
/// to `latest`. Digest references are rejected: a committed image needs
/// a name it can be pulled by.
pub fn parse_image_name(image: &str) -> PodpatchResult<(String, String)> {
    let invalid = |reason: &str| PodpatchError::InvalidImage {
        image: image.to_string(),
        reason: reason.to_string(),
    };

    if image.is_empty() {
        return Err(invalid("empty reference"));
    }
    if image.contains('@') {
        return Err(invalid("digest references cannot be used as a target"));
    }
    if image.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace is not allowed"));
    }

    // A colon only marks a tag when it comes after the last slash;
    // otherwise it belongs to a registry port.
    let slash = image.rfind('/');
    let tag_sep = image
        .rfind(':')
        .filter(|&idx| slash.map_or(true, |s| idx > s));

    match tag_sep {
        Some(idx) => {
            let (repo, tag) = (&image[..idx], &image[idx + 1..]);
            if repo.is_empty() || tag.is_empty() {
                return Err(invalid("empty repository or tag"));
            }
            Ok((repo.to_string(), tag.to_string()))
        }
        None => Ok((image.to_string(), "latest".to_string())),
    }
}

/// Update `original` and save the result as `dest`.
///
/// Refuses to overwrite an existing image. On success the original is
/// recorded as outdated and the new image joins the backend's bucket.
/// Returns the new image's ID.
pub async fn perform_update(
    runtime: &dyn ContainerRuntime,
    classifier: &mut Classifier<'_>,
    kind: UpdateKind,
    original: &str,
    dest: &str,
    comment: &str,
    author: &str,
) -> PodpatchResult<String> {
    let (repo, tag) = parse_image_name(dest)?;
    if runtime.image_exists(&format!("{}:{}", repo, tag)).await? {
        return Err(PodpatchError::ImageOverwrite(format!("{}:{}", repo, tag)));
    }

    let original_id = runtime.image_id(original).await?;
    let driver = classifier.driver_for(&original_id).await?;
    let command = match kind {
        UpdateKind::General => driver.general_update(),
        UpdateKind::Security => driver.security_update(),
    };

    info!("updating {} with {} into {}:{}", original, driver.name(), repo, tag);
    let new_id = runtime
        .run_and_commit(original, &command, &repo, &tag, comment, author)
        .await?;

    classifier
        .mark_remediated(original, &new_id, driver.name())
        .await?;

    Ok(new_id)
}

/// Stream the driver's list-updates output for an image. Returns the
/// command's exit code; the driver decides which codes are severe.
pub async fn list_updates(
    runtime: &dyn ContainerRuntime,
    classifier: &mut Classifier<'_>,
    kind: UpdateKind,
    image: &str,
    machine: bool,
) -> PodpatchResult<()> {
    let image_id = runtime.image_id(image).await?;
    let driver = classifier.driver_for(&image_id).await?;
    let command = match kind {
        UpdateKind::General => driver.list_general_updates(machine),
        UpdateKind::Security => driver.list_security_updates(machine),
    };

    let code = runtime.run_streaming(image, &command).await?;
    if driver.is_exit_code_severe(code) {
        return Err(PodpatchError::ContainerCommand { command, code });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_defaults_to_latest() {
        assert_eq!(
            parse_image_name("opensuse").unwrap(),
            ("opensuse".to_string(), "latest".to_string())
        );
    }

    #[test]
    fn tag_is_split_off() {
        assert_eq!(
            parse_image_name("opensuse:15.6").unwrap(),
            ("opensuse".to_string(), "15.6".to_string())
        );
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(
            parse_image_name("registry.local:5000/team/app").unwrap(),
            ("registry.local:5000/team/app".to_string(), "latest".to_string())
        );
        assert_eq!(
            parse_image_name("registry.local:5000/team/app:v2").unwrap(),
            ("registry.local:5000/team/app".to_string(), "v2".to_string())
        );
    }

    #[test]
    fn bad_references_are_rejected() {
        assert!(parse_image_name("").is_err());
        assert!(parse_image_name("app:").is_err());
        assert!(parse_image_name(":tag").is_err());
        assert!(parse_image_name("app@sha256:abcd").is_err());
        assert!(parse_image_name("app latest").is_err());
    }
}
