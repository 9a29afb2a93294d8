// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
//   repo-mirror <repo> [directory]
//
// Leaving out the directory turns the run into a dry run: every file is
// listed, nothing is created on disk and nothing is downloaded.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::DEFAULT_HOST;
use crate::download::{DEFAULT_CONNECTIONS, DEFAULT_PROGRAM, MAX_CONCURRENT_DOWNLOADS};

const MAX_CONCURRENT_LIMIT: usize = 256;

#[derive(Parser, Debug)]
#[command(
    name = "repo-mirror",
    version,
    about = "Mirror a web-hosted repository's file tree onto local disk",
    long_about = "repo-mirror walks every folder of a repository browser page, finds each \
                  downloadable file once, and downloads them with aria2c, a bounded number at a time. \
                  Leave out the directory to only list what would be downloaded."
)]
pub struct Cli {
    /// Repository identifier (e.g. user/repo) or a full repository URL
    pub repo: String,

    /// Directory to download into. Leave out for a dry run
    pub directory: Option<PathBuf>,

    /// Host that serves the repository pages
    #[arg(long, env = "REPO_MIRROR_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Branch to mirror when the repository is given without a /tree/ path
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Maximum number of downloads running at the same time
    #[arg(long, default_value_t = MAX_CONCURRENT_DOWNLOADS, value_parser = parse_max_concurrent)]
    pub max_concurrent: usize,

    /// Connections aria2c opens per file
    #[arg(long, default_value_t = DEFAULT_CONNECTIONS, value_parser = clap::value_parser!(u16).range(1..=16))]
    pub connections: u16,

    /// Downloader program to run for each file
    #[arg(long = "aria2c", env = "REPO_MIRROR_ARIA2C", default_value = DEFAULT_PROGRAM)]
    pub program: String,

    /// Print the dry-run file list as JSON
    #[arg(long)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn parse_max_concurrent(value: &str) -> Result<usize, String> {
    let n: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (1..=MAX_CONCURRENT_LIMIT).contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be between 1 and {MAX_CONCURRENT_LIMIT}"))
    }
}
