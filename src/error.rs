//! Error types for podpatch
//!
//! All modules use `PodpatchResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for podpatch operations
pub type PodpatchResult<T> = Result<T, PodpatchError>;

/// All errors that can occur in podpatch
#[derive(Error, Debug)]
pub enum PodpatchError {
    // Environment errors
    #[error("Podman not found. Install podman and make sure it is on your PATH")]
    PodmanNotFound,

    // Image errors
    #[error("Invalid image name {image}: {reason}")]
    InvalidImage { image: String, reason: String },

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Image already exists: {0}. Refusing to overwrite it")]
    ImageOverwrite(String),

    #[error("Cannot resolve image ID for {image}: {reason}")]
    ImageLookup { image: String, reason: String },

    #[error("No supported package manager found in image {0}")]
    UnsupportedImage(String),

    // Container errors
    #[error("Container command failed: {command}, exit code: {code}")]
    ContainerCommand { command: String, code: i32 },

    #[error("Failed to commit container {container}: {reason}")]
    Commit { container: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl PodpatchError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PodmanNotFound => Some("Install podman, e.g.: sudo dnf install -y podman"),
            Self::ImageOverwrite(_) => Some("Pick a different destination tag"),
            Self::UnsupportedImage(_) => {
                Some("Only apt, zypper and dnf based images are supported")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PodpatchError::PodmanNotFound;
        assert!(err.to_string().contains("Podman not found"));
    }

    #[test]
    fn error_hint() {
        let err = PodpatchError::ImageOverwrite("app:latest".to_string());
        assert_eq!(err.hint(), Some("Pick a different destination tag"));
        assert!(PodpatchError::User("boom".to_string()).hint().is_none());
    }
}
