//! Ps command - list images already patched or updated through podpatch

use crate::cache;
use crate::cli::commands::update::short_id;
use crate::config::Config;
use crate::error::PodpatchResult;
use console::style;

/// Execute the ps command
pub async fn ps(_config: &Config) -> PodpatchResult<()> {
    let store = cache::load();

    if !store.is_valid() {
        println!("Caching is disabled; nothing has been recorded.");
        return Ok(());
    }

    if store.outdated().is_empty() {
        println!("No images have been updated through podpatch yet.");
        return Ok(());
    }

    println!("Images with an update committed through podpatch:");
    for id in store.outdated() {
        let backend = store
            .bucket_of(id)
            .filter(|b| *b != cache::UNCLASSIFIED)
            .unwrap_or("unknown");
        println!("  {}  {}", short_id(id), style(backend).cyan());
    }
    println!();
    println!("Total: {} image(s)", store.outdated().len());
    Ok(())
}
