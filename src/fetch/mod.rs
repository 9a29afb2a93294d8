// src/fetch/mod.rs
// =============================================================================
// This module fetches folder pages from the repository host.
//
// The traverser only needs "give me the HTML at this URL", so that is all the
// PageFetcher trait asks for. HttpFetcher is the real implementation; tests
// swap in an in-memory one.
// =============================================================================

mod http;

use async_trait::async_trait;

use crate::error::MirrorError;

pub use http::HttpFetcher;

/// Source of folder pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the raw page body, or `MirrorError::Network` on any failure
    async fn fetch(&self, url: &str) -> Result<String, MirrorError>;
}
