//! filedrop command-line entry point.

mod app;
mod cli;
mod config;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so progress lines on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let mut config = config::Config::load()?;
    config.override_api_key(std::env::var(config::API_KEY_ENV).ok());
    tracing::debug!(base_url = %config.base_url, user = %config.user, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let ok = rt.block_on(app::run(cli, config))?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
