//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cachet - Vary-aware HTTP response cache store
///
/// Inspect and maintain the response cache a caching gateway keeps in
/// its key-value backend.
#[derive(Parser, Debug)]
#[command(name = "cachet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CACHET_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up the cached response for a URL
    Lookup(LookupArgs),

    /// Remove everything cached for a URL
    Purge(UrlArgs),

    /// Acquire the fetch lock for a URL
    Lock(UrlArgs),

    /// Release the fetch lock for a URL
    Unlock(UrlArgs),

    /// Show whether the fetch lock for a URL is held
    LockStatus(UrlArgs),

    /// Drop every fetch lock
    Cleanup,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// A single URL argument
#[derive(Parser, Debug)]
pub struct UrlArgs {
    /// Absolute URL (scheme://host/path?query)
    pub url: String,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Absolute URL (scheme://host/path?query)
    pub url: String,

    /// Request header used for vary negotiation (Name: value)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Print the response body after the headers
    #[arg(long)]
    pub body: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for lookup results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Status line and headers
    #[default]
    Table,
    /// JSON object
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Parse a `Name: value` header argument
fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid header format: no ':' found in '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header format: empty name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
