//! Cache command - inspect or empty the classification cache

use crate::cache;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::PodpatchResult;
use console::style;

/// Execute the cache command
pub async fn cache(args: CacheArgs, _config: &Config) -> PodpatchResult<()> {
    match args.action {
        CacheAction::Path => path(),
        CacheAction::Show => show(),
        CacheAction::Reset => reset(),
    }
}

fn path() -> PodpatchResult<()> {
    let store = cache::load();
    if store.is_valid() {
        println!("{}", store.path().display());
    } else {
        println!("Caching is disabled: no writable location found.");
    }
    Ok(())
}

fn show() -> PodpatchResult<()> {
    let store = cache::load();
    if !store.is_valid() {
        println!("Caching is disabled: no writable location found.");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}

fn reset() -> PodpatchResult<()> {
    let mut store = cache::load();
    if !store.is_valid() {
        println!("Caching is disabled: nothing to reset.");
        return Ok(());
    }
    store.clear();
    cache::replace_on_disk(&mut store);
    println!("{} classification cache emptied", style("Done:").green().bold());
    Ok(())
}
