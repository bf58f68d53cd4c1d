//! Lock commands - inspect and release fetch locks

use crate::cli::args::UrlArgs;
use crate::config::Config;
use crate::error::CachetResult;
use crate::message::CacheRequest;
use crate::store::CacheStore;
use console::style;

/// Execute the lock command
pub async fn lock(args: UrlArgs, config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;
    let request = CacheRequest::get(&args.url)?;

    if store.lock(&request).await? {
        println!("{} Locked {}", style("✓").green(), style(&args.url).cyan());
    } else {
        println!(
            "{} {} is already locked",
            style("!").yellow(),
            style(&args.url).cyan()
        );
    }
    Ok(())
}

/// Execute the unlock command
pub async fn unlock(args: UrlArgs, config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;
    let request = CacheRequest::get(&args.url)?;

    if store.unlock(&request).await? {
        println!("{} Unlocked {}", style("✓").green(), style(&args.url).cyan());
    } else {
        println!(
            "{} {} was not locked",
            style("!").yellow(),
            style(&args.url).cyan()
        );
    }
    Ok(())
}

/// Execute the lock-status command
pub async fn status(args: UrlArgs, config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;
    let request = CacheRequest::get(&args.url)?;

    let state = if store.is_locked(&request).await? {
        style("locked").yellow()
    } else {
        style("unlocked").green()
    };
    println!("{} {}", style(&args.url).cyan(), state);
    Ok(())
}

/// Execute the cleanup command
pub async fn cleanup(config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;
    store.cleanup().await?;

    println!(
        "{} Dropped lock table {}",
        style("✓").green(),
        style(&config.store.lock_key).cyan()
    );
    Ok(())
}
