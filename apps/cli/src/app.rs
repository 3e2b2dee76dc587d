//! Command execution.

use std::sync::Arc;

use anyhow::{Context, bail};
use filedrop_client::{
    ClientConfig, FileTokenStore, MemoryTokenStore, TokenStore, TransferClient,
    default_token_path,
};
use filedrop_protocol::types::LinkEntry;
use filedrop_upload::{
    BoardDestination, Destination, ProgressReport, TransferDestination, UploadOrchestrator,
    UploadOutcome,
};
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::config::Config;

/// Runs one command. Returns `false` when the remote operation failed.
pub async fn run(cli: Cli, mut config: Config) -> anyhow::Result<bool> {
    apply_flags(&cli, &mut config);
    let store = token_store()?;

    match cli.command {
        Command::Logout => {
            store.clear()?;
            println!("Cached token removed");
            Ok(true)
        }
        Command::Upload { files, name } => {
            let client = build_client(&config, store)?;
            let outcome = upload(client, &config, &files, &name, &TransferDestination).await?;
            Ok(print_outcome(&outcome))
        }
        Command::Board {
            files,
            name,
            board_id,
            description,
        } => {
            let client = build_client(&config, store)?;
            let board = BoardDestination {
                board_id,
                description,
            };
            let outcome = upload(client, &config, &files, &name, &board).await?;
            Ok(print_outcome(&outcome))
        }
        Command::Links { board_id, links } => {
            let client = build_client(&config, store)?;
            add_links(&client, &config, &board_id, &links).await
        }
    }
}

fn apply_flags(cli: &Cli, config: &mut Config) {
    config.override_api_key(cli.api_key.clone());
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(dir) = &cli.chunk_dir {
        config.chunk_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }
}

fn token_store() -> anyhow::Result<Arc<dyn TokenStore>> {
    match default_token_path() {
        Some(path) => {
            let store = FileTokenStore::new(path.clone())
                .with_context(|| format!("failed to load token from {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("no config directory found, token will not be persisted");
            Ok(Arc::new(MemoryTokenStore::new()))
        }
    }
}

fn build_client(config: &Config, store: Arc<dyn TokenStore>) -> anyhow::Result<Arc<TransferClient>> {
    if config.api_key.trim().is_empty() {
        bail!(
            "no API key configured: set api_key in the config file or {}",
            crate::config::API_KEY_ENV
        );
    }

    let client_config = ClientConfig {
        api_key: config.api_key.clone(),
        base_url: config.base_url.clone(),
        timeout: config.timeout(),
        token_max_age: config.token_max_age(),
    };
    Ok(Arc::new(TransferClient::with_reqwest(client_config, store)?))
}

async fn upload(
    client: Arc<TransferClient>,
    config: &Config,
    files: &[std::path::PathBuf],
    name: &str,
    destination: &dyn Destination,
) -> anyhow::Result<UploadOutcome> {
    let orchestrator = UploadOrchestrator::new(client, &config.chunk_dir).with_progress(
        Arc::new(|r: ProgressReport| println!("[{:>3}%] {}", r.percentage, r.message)),
    );

    let cancel = orchestrator.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling upload");
            cancel.cancel();
        }
    });

    let result = orchestrator
        .upload_files(files, name, &config.user, destination)
        .await;
    ctrl_c.abort();

    Ok(result?)
}

fn print_outcome(outcome: &UploadOutcome) -> bool {
    if outcome.is_success() {
        println!("{}", outcome.message);
        if !outcome.download_url.is_empty() {
            println!("Download: {}", outcome.download_url);
        }
    } else {
        eprintln!(
            "Upload failed ({:?} at {}): {}",
            outcome.result, outcome.stage, outcome.message
        );
    }
    outcome.is_success()
}

async fn add_links(
    client: &TransferClient,
    config: &Config,
    board_id: &str,
    links: &[LinkEntry],
) -> anyhow::Result<bool> {
    if client.tokens().get().is_none() {
        let resp = client.authorize(&config.user).await?;
        if !resp.success {
            eprintln!("Authorization failed: {}", resp.message);
            return Ok(false);
        }
    }

    let resp = client.add_links(board_id, links).await?;
    if !resp.success {
        eprintln!("Adding links failed: {}", resp.message);
        return Ok(false);
    }
    for link in &resp.data {
        println!("{} {}", link.id, link.url);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "filedrop",
            "--api-key",
            "flag-key",
            "--chunk-dir",
            "/tmp/parts",
            "logout",
        ])
        .unwrap();
        let mut config = Config {
            api_key: "file-key".into(),
            user: "file-user".into(),
            ..Config::default()
        };
        apply_flags(&cli, &mut config);

        assert_eq!(config.api_key, "flag-key");
        assert_eq!(config.user, "file-user");
        assert_eq!(config.chunk_dir, std::path::PathBuf::from("/tmp/parts"));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let config = Config::default();
        let err = build_client(&config, Arc::new(MemoryTokenStore::new())).unwrap_err();
        assert!(err.to_string().contains("FILEDROP_API_KEY"));
    }

    #[test]
    fn failed_outcome_reports_false() {
        let outcome = UploadOutcome::failure(
            filedrop_upload::ResultCode::NoConnection,
            filedrop_upload::Stage::Upload,
            "timed out",
        );
        assert!(!print_outcome(&outcome));
        assert!(print_outcome(&UploadOutcome::success("done", "")));
    }
}
