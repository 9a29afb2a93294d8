// src/crawl/normalize.rs
// =============================================================================
// Turns a URL into the key used by the visited sets.
//
// Two URLs that differ only by a trailing slash point at the same folder, so
// they must produce the same key. A bare root path ("/") is left alone.
// =============================================================================

use url::Url;

use crate::error::MirrorError;

// Canonicalizes an absolute URL for deduplication
//
// Examples:
//   "https://host.co/user/repo/tree/main/" -> "https://host.co/user/repo/tree/main"
//   "https://host.co/"                     -> "https://host.co/"
//   "/relative/path"                       -> Err(InvalidUrl)
pub fn normalize(url: &str) -> Result<String, MirrorError> {
    let mut parsed = Url::parse(url).map_err(|source| MirrorError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let path = parsed.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        parsed.set_path(&trimmed);
    }

    Ok(parsed.to_string())
}
