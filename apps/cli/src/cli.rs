use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filedrop_protocol::types::LinkEntry;

#[derive(Debug, Parser)]
#[command(author, version, about = "Chunked uploads to transfers and boards", long_about = None)]
pub struct Cli {
    /// API key (overrides the config file and FILEDROP_API_KEY).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// User identifier used when authorizing.
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Scratch directory for part files.
    #[arg(long, global = true)]
    pub chunk_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload files as a new transfer and print its download link.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        name: String,
    },
    /// Upload files to a new or existing board.
    Board {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        name: String,
        /// Add to this board instead of creating one.
        #[arg(long = "board-id")]
        board_id: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Attach links to a board. Each link is `URL=TITLE`.
    Links {
        board_id: String,
        #[arg(required = true, value_parser = parse_link)]
        links: Vec<LinkEntry>,
    },
    /// Forget the cached token.
    Logout,
}

/// Parses `URL=TITLE`. The title follows the last `=`; a bare URL has no
/// title.
pub fn parse_link(s: &str) -> Result<LinkEntry, String> {
    let (url, title) = match s.rsplit_once('=') {
        Some((url, title)) if url.contains("://") => (url, title),
        _ => (s, ""),
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(format!("not an http(s) URL: {url}"));
    }
    Ok(LinkEntry {
        url: url.to_string(),
        title: title.to_string(),
    })
}
