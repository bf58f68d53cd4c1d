//! Lookup command - show the cached response for a URL

use crate::cli::args::{LookupArgs, OutputFormat};
use crate::config::Config;
use crate::error::CachetResult;
use crate::message::{CacheRequest, CachedResponse, Headers};
use crate::store::CacheStore;
use console::style;

/// Execute the lookup command
pub async fn execute(args: LookupArgs, config: &Config) -> CachetResult<()> {
    let store = CacheStore::from_config(config)?;

    let mut request = CacheRequest::get(&args.url)?;
    for (name, value) in &args.headers {
        request.headers_mut().append(name, value.clone());
    }

    let Some(response) = store.lookup(&request).await? else {
        println!(
            "{} No cached response for {}",
            style("✗").red(),
            style(&args.url).cyan()
        );
        return Ok(());
    };

    match args.format {
        OutputFormat::Table => print_table(&response, args.body),
        OutputFormat::Json => print_json(&response, args.body)?,
    }

    Ok(())
}

fn print_table(response: &CachedResponse, with_body: bool) {
    println!("{} {}", style("HTTP").dim(), style(response.status).bold());
    for (name, values) in response.headers.iter() {
        for value in values {
            println!("{}: {}", style(name).cyan(), value);
        }
    }

    if with_body {
        println!();
        println!("{}", String::from_utf8_lossy(&response.body));
    } else {
        println!();
        println!("{} {} body bytes", style("•").dim(), response.body.len());
    }
}

fn print_json(response: &CachedResponse, with_body: bool) -> CachetResult<()> {
    #[derive(serde::Serialize)]
    struct ResponseJson<'a> {
        status: u16,
        headers: &'a Headers,
        body_bytes: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
    }

    let json = ResponseJson {
        status: response.status,
        headers: &response.headers,
        body_bytes: response.body.len(),
        body: with_body.then(|| String::from_utf8_lossy(&response.body).into_owned()),
    };

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
