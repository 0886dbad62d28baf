//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initialises logging
//! - runs the extract against the Census provider
//! - prints the run summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::data::CensusClient;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `acs-extract` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.run_config();
    let client = CensusClient::from_env(config.cache_dir.clone())?;
    let run = pipeline::run_extract(&client, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run, chrono::Local::now())
    );
    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `info` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
