//! atproto-lookup - AT Protocol identity and record lookup
//!
//! Resolves handles and DIDs, locates the PDS hosting an identity, and
//! fetches profile and post records from it.

mod commands;
mod error;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::{build, run, Cli};
use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("atproto_lookup=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let cli = Cli::parse();
    let config = Arc::new(cli.config()?);
    debug!(
        service = %config.service_url,
        directory = %config.directory_url,
        suffix = %config.handle_suffix,
        "Loaded configuration"
    );

    let repo = build(config.clone())?;
    match run(cli.command, config, &repo).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Lookup failed");
            Err(e)
        }
    }
}
