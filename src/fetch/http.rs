// src/fetch/http.rs
// =============================================================================
// Fetches folder pages over HTTP with reqwest.
//
// Every failure (timeout, DNS, refused connection, non-2xx status, unreadable
// body) becomes MirrorError::Network with a short reason, so the traverser can
// log it and carry on with the next folder.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::PageFetcher;
use crate::error::MirrorError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

/// reqwest-backed page fetcher
///
/// The client is built once and reused for every page (connection pooling).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, MirrorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MirrorError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, MirrorError> {
        debug!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| network_error(url, &e))
    }
}

// Turns a reqwest error into a Network error with a readable reason
fn network_error(url: &str, error: &reqwest::Error) -> MirrorError {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        let text = error.to_string();
        if text.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            format!("connection failed: {text}")
        }
    } else {
        error.to_string()
    };

    MirrorError::Network {
        url: url.to_string(),
        reason,
    }
}
