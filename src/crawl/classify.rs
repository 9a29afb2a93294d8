// src/crawl/classify.rs
// =============================================================================
// Sorts the links on a folder page into files and subfolders.
//
// Files:
// - Any <a> whose href carries the download marker ("?download=true")
// - The filename is the last path segment of the resolved URL
//
// Folders (two detection strategies, results merged):
// - An <a> containing an <svg><title> that says "folder" or "directory"
// - An <a> whose href contains "/tree/"
// A link that matches both strategies is reported once. Duplicates are keyed
// by the normalized absolute URL, not by which element they came from.
//
// Folder candidates that point at single-file views (/blob/), commits,
// discussions or downloads are dropped, as are folders on another host.
//
// Anything odd about a single link (no href, unparseable href, mailto:...)
// just skips that link. Classification itself never fails.
// =============================================================================

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::normalize::normalize;
use super::path::decode_segment;

/// Query marker that turns a file link into a direct download
pub const DOWNLOAD_MARKER: &str = "?download=true";

const TREE_HREF_MARKER: &str = "/tree/";

// hrefs containing any of these are never navigable subfolders
const EXCLUDED_FOLDER_MARKERS: [&str; 4] = [DOWNLOAD_MARKER, "/blob/", "/commit/", "/discussions/"];

const FOLDER_ICON_LABELS: [&str; 2] = ["folder", "directory"];

/// A direct-download link found on a folder page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    /// Absolute download URL, marker included
    pub url: String,
    pub filename: String,
}

/// A link to a subfolder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLink {
    /// Absolute folder URL
    pub url: String,
}

/// Everything `classify` found on one page, in page order
#[derive(Debug, Default)]
pub struct Classified {
    pub files: Vec<FileLink>,
    pub folders: Vec<FolderLink>,
}

// Extracts file and folder links from a folder page
//
// Parameters:
//   html: the page body
//   page_url: the page's own URL, used to resolve relative hrefs
pub fn classify(html: &str, page_url: &str) -> Classified {
    let mut classified = Classified::default();

    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(url = page_url, error = %e, "cannot resolve links against an invalid page URL");
            return classified;
        }
    };

    let document = Html::parse_document(html);
    // Both selectors are constants, so parsing them cannot fail at runtime
    let anchors = Selector::parse("a[href]").expect("static anchor selector");
    let icon_titles = Selector::parse("svg title").expect("static icon selector");

    let mut seen_files = HashSet::new();
    let mut seen_folders = HashSet::new();

    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_href(&base, href) else {
            debug!(href, "skipping unresolvable link");
            continue;
        };
        let Ok(key) = normalize(resolved.as_str()) else {
            continue;
        };

        if href.contains(DOWNLOAD_MARKER) {
            if let Some(filename) = filename_of(&resolved) {
                if seen_files.insert(key) {
                    classified.files.push(FileLink {
                        url: resolved.to_string(),
                        filename,
                    });
                }
            }
            continue;
        }

        let is_candidate = has_folder_icon(&element, &icon_titles) || href.contains(TREE_HREF_MARKER);
        if !is_candidate || is_excluded(href) {
            continue;
        }

        // Stay on the host we are mirroring
        if resolved.host_str() != base.host_str() {
            debug!(url = %resolved, "skipping folder link on another host");
            continue;
        }

        if seen_folders.insert(key) {
            classified.folders.push(FolderLink {
                url: resolved.to_string(),
            });
        }
    }

    classified
}

// Resolves a possibly-relative href against the page URL
// Only http and https results are kept.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let url = base.join(href).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

fn has_folder_icon(element: &ElementRef, icon_titles: &Selector) -> bool {
    element.select(icon_titles).any(|title| {
        let label = title.text().collect::<String>().to_lowercase();
        FOLDER_ICON_LABELS.iter().any(|hint| label.contains(hint))
    })
}

fn is_excluded(href: &str) -> bool {
    EXCLUDED_FOLDER_MARKERS.iter().any(|marker| href.contains(marker))
}

// Last path segment of the download URL, decoded
// The download marker lives in the query, so it never reaches the segment.
fn filename_of(url: &Url) -> Option<String> {
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(decode_segment(last))
}
