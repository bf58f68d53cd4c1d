//! Purge command - remove everything cached for a URL

use crate::cli::args::UrlArgs;
use crate::config::Config;
use crate::error::CachetResult;
use crate::store::CacheStore;
use console::style;

/// Execute the purge command
pub async fn execute(args: UrlArgs, config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;
    let removed = store.purge_count(&args.url).await?;

    if removed == 0 {
        println!(
            "{} Nothing cached for {}",
            style("!").yellow(),
            style(&args.url).cyan()
        );
    } else {
        println!(
            "{} Purged {} key(s) for {}",
            style("✓").green(),
            removed,
            style(&args.url).cyan()
        );
    }

    Ok(())
}
