// src/crawl/path.rs
// =============================================================================
// Works out where a folder lives inside the repository.
//
// Repository browsers put folders under ".../tree/<branch>/<path...>". The
// part after the branch name is the folder's path relative to the repository
// root, and that is where its files land under the target directory.
//
// Only the folder URL's own path is read. The root URL is parsed to make sure
// it is usable, but its path segments are ignored.
// =============================================================================

use tracing::warn;
use url::Url;

use crate::error::MirrorError;

/// Path segment that precedes the branch name in folder URLs
pub const TREE_SEGMENT: &str = "tree";

// Returns the repository-relative path of a folder, or "" for the repo root
//
// Parse failures are logged and fall back to "", so the folder's files land
// directly under the target directory.
//
// Examples:
//   ".../user/repo/tree/main/subdir/nested" -> "subdir/nested"
//   ".../user/repo/tree/main"               -> ""
pub fn relative_path(folder_url: &str, root_url: &str) -> String {
    match try_relative_path(folder_url, root_url) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "falling back to the repository root");
            String::new()
        }
    }
}

// Same as relative_path but surfaces ParseFailure instead of hiding it
pub fn try_relative_path(folder_url: &str, root_url: &str) -> Result<String, MirrorError> {
    let folder = Url::parse(folder_url).map_err(|_| MirrorError::ParseFailure {
        url: folder_url.to_string(),
    })?;
    Url::parse(root_url).map_err(|_| MirrorError::ParseFailure {
        url: root_url.to_string(),
    })?;

    let segments: Vec<&str> = folder
        .path_segments()
        .ok_or_else(|| MirrorError::ParseFailure {
            url: folder_url.to_string(),
        })?
        .filter(|s| !s.is_empty())
        .collect();

    let tree_index = match segments.iter().position(|s| *s == TREE_SEGMENT) {
        Some(index) if index + 1 < segments.len() => index,
        _ => return Ok(String::new()),
    };

    let after_branch: Vec<String> = segments[tree_index + 2..]
        .iter()
        .map(|s| decode_segment(s))
        .collect();

    Ok(after_branch.join("/"))
}

// Percent-decodes one path segment for use as a file or directory name
//
// A segment that would decode into something that escapes its directory
// ("..", "." or anything with a slash) is kept in its encoded form.
pub fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) if is_plain_name(&decoded) => decoded.into_owned(),
        _ => segment.to_string(),
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
