//! Update and patch commands - apply updates and commit a new image

use crate::backend::update::{perform_update, UpdateKind};
use crate::backend::Classifier;
use crate::cli::args::UpdateArgs;
use crate::config::Config;
use crate::error::{PodpatchError, PodpatchResult};
use crate::orchestration::create_runtime;
use chrono::Utc;
use console::style;
use indicatif::ProgressBar;
use std::time::Duration;

/// Execute the update or patch command
pub async fn update(args: UpdateArgs, kind: UpdateKind, config: &Config) -> PodpatchResult<()> {
    let runtime = create_runtime(config)?;
    if !runtime.is_available().await {
        return Err(PodpatchError::PodmanNotFound);
    }

    let mut classifier = Classifier::new(runtime.as_ref());

    // Classify first so the spinner covers the potentially slow probe;
    // the update itself streams package manager output directly.
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Inspecting {}", args.image));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let image_id = runtime.image_id(&args.image).await?;
    let driver = classifier.driver_for(&image_id).await;
    spinner.finish_and_clear();
    let driver = driver?;

    println!(
        "{} image, running {} update",
        style(driver.name()).cyan(),
        match kind {
            UpdateKind::General => "a general",
            UpdateKind::Security => "a security",
        }
    );

    let author = args
        .author
        .unwrap_or_else(|| config.update.author.clone());
    let comment = args
        .message
        .or_else(|| {
            (!config.update.comment.is_empty()).then(|| config.update.comment.clone())
        })
        .unwrap_or_else(|| default_comment(kind));

    let new_id = perform_update(
        runtime.as_ref(),
        &mut classifier,
        kind,
        &args.image,
        &args.new_image,
        &comment,
        &author,
    )
    .await?;

    println!(
        "{} {} ({})",
        style("Created").green().bold(),
        args.new_image,
        short_id(&new_id)
    );
    Ok(())
}

fn default_comment(kind: UpdateKind) -> String {
    let what = match kind {
        UpdateKind::General => "update",
        UpdateKind::Security => "security patch",
    };
    format!("[podpatch] {} applied on {}", what, Utc::now().format("%Y-%m-%d"))
}

/// First 12 characters of an image ID, without any digest prefix.
pub(crate) fn short_id(id: &str) -> &str {
    let bare = id.strip_prefix("sha256:").unwrap_or(id);
    &bare[..bare.len().min(12)]
}
