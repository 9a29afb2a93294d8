// src/config.rs
// =============================================================================
// Turns the parsed command line into a validated run configuration.
//
// The main job here is building the root folder URL:
//   "user/repo"                           -> "<host>/user/repo/tree/<branch>/"
//   "https://host/user/repo"              -> "https://host/user/repo/tree/<branch>/"
//   "https://host/user/repo/tree/dev/sub" -> used as given
// =============================================================================

use std::path::PathBuf;

use url::Url;

use crate::cli::Cli;
use crate::error::MirrorError;

pub const DEFAULT_HOST: &str = "https://huggingface.co";

/// Everything a run needs, checked once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub root_url: String,
    /// None means dry run
    pub target: Option<PathBuf>,
    pub max_concurrent: usize,
    pub connections: u16,
    pub program: String,
    pub json: bool,
}

impl MirrorConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, MirrorError> {
        Ok(Self {
            root_url: root_url(&cli.repo, &cli.host, &cli.branch)?,
            target: cli.directory.clone(),
            max_concurrent: cli.max_concurrent,
            connections: cli.connections,
            program: cli.program.clone(),
            json: cli.json,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.target.is_none()
    }
}

// Builds the URL of the folder the walk starts from
pub fn root_url(repo: &str, host: &str, branch: &str) -> Result<String, MirrorError> {
    let repo = repo.trim();
    if repo.is_empty() {
        return Err(MirrorError::Config("repository identifier is empty".to_string()));
    }
    if branch.trim().is_empty() || branch.contains('/') {
        return Err(MirrorError::Config(format!("invalid branch name '{branch}'")));
    }

    let host = check_http_url(host, "host")?;

    let url = if is_http_url(repo) {
        if repo.contains("/tree/") {
            repo.to_string()
        } else {
            format!("{}/tree/{branch}/", repo.trim_end_matches('/'))
        }
    } else {
        format!(
            "{}/{}/tree/{branch}/",
            host.as_str().trim_end_matches('/'),
            repo.trim_matches('/')
        )
    };

    check_http_url(&url, "repository URL")?;
    Ok(url)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

fn check_http_url(value: &str, what: &str) -> Result<Url, MirrorError> {
    let url = Url::parse(value)
        .map_err(|e| MirrorError::Config(format!("{what} '{value}' is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(MirrorError::Config(format!(
            "{what} '{value}' must use http or https, not {other}"
        ))),
    }
}
