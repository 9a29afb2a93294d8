// src/error.rs
// =============================================================================
// Error types shared by the crawl and download modules.
//
// Only MissingDependency and Config stop a run. Everything else is handled
// where it happens: the link, folder or file is skipped and the walk goes on.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// A link could not be parsed as an absolute URL
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A folder page could not be fetched (timeout, DNS, non-2xx status)
    #[error("failed to fetch {url}: {reason}")]
    Network { url: String, reason: String },

    /// No repository-relative path could be derived from a folder URL
    #[error("could not derive a relative path from {url}")]
    ParseFailure { url: String },

    /// The transfer program exited with a non-zero code or could not run
    #[error("transfer of {filename} failed: {reason}")]
    TransferFailure { filename: String, reason: String },

    /// The transfer program is not installed
    #[error("'{program}' is not installed. Please install it before running this tool")]
    MissingDependency {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A target directory could not be created
    #[error("could not create directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command-line configuration does not describe a usable root
    #[error("invalid configuration: {0}")]
    Config(String),
}
