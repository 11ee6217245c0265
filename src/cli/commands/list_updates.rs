//! List-updates command - show pending updates for an image

use crate::backend::update::{list_updates as stream_updates, UpdateKind};
use crate::backend::Classifier;
use crate::cli::args::ListUpdatesArgs;
use crate::config::Config;
use crate::error::{PodpatchError, PodpatchResult};
use crate::orchestration::create_runtime;
use console::style;
use indicatif::ProgressBar;
use std::time::Duration;

/// Execute the list-updates command
pub async fn list_updates(args: ListUpdatesArgs, config: &Config) -> PodpatchResult<()> {
    let runtime = create_runtime(config)?;
    if !runtime.is_available().await {
        return Err(PodpatchError::PodmanNotFound);
    }

    let mut classifier = Classifier::new(runtime.as_ref());

    let kind = if args.security {
        UpdateKind::Security
    } else {
        UpdateKind::General
    };

    if args.machine {
        return stream_updates(runtime.as_ref(), &mut classifier, kind, &args.image, true).await;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Inspecting {}", args.image));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let image_id = runtime.image_id(&args.image).await?;
    let classified = classifier.driver_for(&image_id).await;
    spinner.finish_and_clear();
    let driver = classified?;

    println!(
        "{} image, listing pending {}",
        style(driver.name()).cyan(),
        if args.security {
            "security updates"
        } else {
            "updates"
        }
    );

    stream_updates(runtime.as_ref(), &mut classifier, kind, &args.image, false).await
}
