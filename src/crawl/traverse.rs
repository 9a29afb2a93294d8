// src/crawl/traverse.rs
// =============================================================================
// This module walks the repository's folder tree and collects every file.
//
// How it works:
// 1. Start with the root folder on a stack
// 2. Pop a folder; skip it if its normalized URL was seen before
// 3. Mark it visited, fetch the page, classify its links
// 4. Record each new file (and queue it, unless this is a dry run)
// 5. Push the subfolders so the first one found is walked next
// 6. Repeat until the stack is empty
//
// The walk is depth-first and strictly sequential: one page fetch at a time,
// so the host is not hammered and the visited sets need no locking.
//
// A folder that fails to load counts as empty. A file whose directory cannot
// be created is skipped. Neither stops the walk.
// =============================================================================

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::classify::{classify, FileLink};
use super::normalize::normalize;
use super::path::relative_path;
use crate::download::{DownloadQueue, DownloadTask};
use crate::fetch::PageFetcher;
use crate::fs::DirCreator;

/// A file found during the walk, reported the same way in dry and real runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    /// Path relative to the target directory, "/"-separated
    pub path: String,
    pub url: String,
}

/// Something that went wrong for one folder or one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub url: String,
    pub reason: String,
}

/// What a finished walk produced
#[derive(Debug, Default)]
pub struct TraversalReport {
    pub files: Vec<DiscoveredFile>,
    /// Tasks ready for the dispatcher; always empty in a dry run
    pub queue: DownloadQueue,
    pub folders_visited: usize,
    pub failures: Vec<Failure>,
}

// A folder waiting to be walked, with its path relative to the repo root
struct PendingFolder {
    url: String,
    relative: String,
}

/// One run's worth of visited state plus the collaborators it needs
pub struct Traverser<'a> {
    fetcher: &'a dyn PageFetcher,
    dirs: &'a dyn DirCreator,
    root_url: String,
    /// None means dry run
    target: Option<PathBuf>,
    visited_folders: HashSet<String>,
    visited_files: HashSet<String>,
    /// Relative paths already claimed by a file
    claimed_paths: HashSet<String>,
    report: TraversalReport,
}

impl<'a> Traverser<'a> {
    // Parameters:
    //   fetcher: where folder pages come from
    //   dirs: directory creation (never called in a dry run)
    //   root_url: the folder to start from
    //   target: base directory for downloads, or None for a dry run
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        dirs: &'a dyn DirCreator,
        root_url: impl Into<String>,
        target: Option<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            dirs,
            root_url: root_url.into(),
            target,
            visited_folders: HashSet::new(),
            visited_files: HashSet::new(),
            claimed_paths: HashSet::new(),
            report: TraversalReport::default(),
        }
    }

    // Walks everything reachable from the root and returns the report
    pub async fn run(mut self) -> TraversalReport {
        let mut stack = vec![PendingFolder {
            url: self.root_url.clone(),
            relative: String::new(),
        }];

        while let Some(folder) = stack.pop() {
            let subfolders = self.visit(&folder).await;
            // Reversed so the first subfolder on the page is popped next
            stack.extend(subfolders.into_iter().rev());
        }

        info!(
            folders = self.report.folders_visited,
            files = self.report.files.len(),
            failures = self.report.failures.len(),
            "traversal finished"
        );
        self.report
    }

    // Processes one folder and returns its subfolders in page order
    async fn visit(&mut self, folder: &PendingFolder) -> Vec<PendingFolder> {
        let key = match normalize(&folder.url) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "skipping folder");
                return Vec::new();
            }
        };

        if !self.visited_folders.insert(key) {
            debug!(url = %folder.url, "already visited");
            return Vec::new();
        }
        self.report.folders_visited += 1;

        info!(url = %folder.url, "exploring");

        let html = match self.fetcher.fetch(&folder.url).await {
            Ok(html) => html,
            Err(e) => {
                error!(url = %folder.url, error = %e, "error processing folder");
                self.report.failures.push(Failure {
                    url: folder.url.clone(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let classified = classify(&html, &folder.url);
        debug!(
            url = %folder.url,
            files = classified.files.len(),
            folders = classified.folders.len(),
            "classified page"
        );

        for file in classified.files {
            self.record_file(file, &folder.relative);
        }

        classified
            .folders
            .into_iter()
            .map(|link| {
                let relative = relative_path(&link.url, &self.root_url);
                PendingFolder {
                    url: link.url,
                    relative,
                }
            })
            .collect()
    }

    fn record_file(&mut self, file: FileLink, relative: &str) {
        let key = match normalize(&file.url) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "skipping file");
                return;
            }
        };
        if !self.visited_files.insert(key) {
            return;
        }

        let path = if relative.is_empty() {
            file.filename.clone()
        } else {
            format!("{relative}/{}", file.filename)
        };

        // Two URLs landing on the same local file would race each other
        if !self.claimed_paths.insert(path.clone()) {
            warn!(%path, url = %file.url, "another file already maps to this path, skipping");
            self.report.failures.push(Failure {
                url: file.url,
                reason: format!("local path {path} is already taken by another file"),
            });
            return;
        }

        self.report.files.push(DiscoveredFile {
            path: path.clone(),
            url: file.url.clone(),
        });

        let Some(base) = &self.target else {
            debug!(%path, url = %file.url, "would download");
            return;
        };

        let target_dir = if relative.is_empty() {
            base.clone()
        } else {
            relative.split('/').fold(base.clone(), |dir, part| dir.join(part))
        };

        if let Err(e) = self.dirs.ensure_dir(&target_dir) {
            error!(%path, error = %e, "cannot prepare target directory, skipping file");
            self.report.failures.push(Failure {
                url: file.url,
                reason: e.to_string(),
            });
            return;
        }

        self.report.queue.push(DownloadTask {
            source_url: file.url,
            target_dir,
            filename: file.filename,
        });
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a stack instead of recursion?
//    - An async fn cannot call itself without boxing the future
//    - A Vec used as a stack gives the same depth-first order (children are
//      pushed in reverse) and never grows the call stack on deep trees
//
// 2. Why mark a folder visited before fetching it?
//    - If the fetch fails we still never try it again in this run
//    - Pages that link back to an ancestor (breadcrumbs, "..") hit the
//      visited check and stop there, so cycles terminate
//
// 3. Why are the visited sets plain HashSets?
//    - Only this struct touches them and it does one thing at a time
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    const ROOT: &str = "https://huggingface.co/user/repo/tree/main/";

    // In-memory site: normalized URL -> page body
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(normalize(url).unwrap(), html.to_string());
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> Result<String, MirrorError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(&normalize(url)?)
                .cloned()
                .ok_or_else(|| MirrorError::Network {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingDirs {
        created: Mutex<Vec<PathBuf>>,
        fail_on: Option<PathBuf>,
    }

    impl DirCreator for RecordingDirs {
        fn ensure_dir(&self, path: &Path) -> Result<(), MirrorError> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(MirrorError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            self.created.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn download(path: &str) -> String {
        format!(r#"<a href="/user/repo/resolve/main/{path}?download=true">{path}</a>"#)
    }

    fn folder(path: &str) -> String {
        format!(r#"<a href="/user/repo/tree/main/{path}">{path}</a>"#)
    }

    // Root with a.bin, b.bin and data/ holding c.bin
    fn sample_site() -> FakeSite {
        let root = format!("{}{}{}", download("a.bin"), download("b.bin"), folder("data"));
        FakeSite::default()
            .page(ROOT, &root)
            .page("https://huggingface.co/user/repo/tree/main/data", &download("data/c.bin"))
    }

    fn paths(report: &TraversalReport) -> Vec<&str> {
        report.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_dry_run_reports_all_files() {
        let site = sample_site();
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, None).run().await;

        assert_eq!(paths(&report), vec!["a.bin", "b.bin", "data/c.bin"]);
        assert!(report.queue.is_empty());
        assert!(dirs.created.lock().unwrap().is_empty());
        assert_eq!(report.folders_visited, 2);
    }

    #[tokio::test]
    async fn test_real_run_creates_directories_and_queues_tasks() {
        let site = sample_site();
        let dirs = RecordingDirs::default();
        let target = PathBuf::from("/mirror/target");

        let report = Traverser::new(&site, &dirs, ROOT, Some(target.clone())).run().await;

        let created: HashSet<PathBuf> = dirs.created.lock().unwrap().iter().cloned().collect();
        let expected: HashSet<PathBuf> = [target.clone(), target.join("data")].into_iter().collect();
        assert_eq!(created, expected);

        let tasks: Vec<(PathBuf, String)> = report
            .queue
            .iter()
            .map(|t| (t.target_dir.clone(), t.filename.clone()))
            .collect();
        assert_eq!(
            tasks,
            vec![
                (target.clone(), "a.bin".to_string()),
                (target.clone(), "b.bin".to_string()),
                (target.join("data"), "c.bin".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_dry_run_discovers_the_same_files() {
        let dirs = RecordingDirs::default();
        let dry_site = sample_site();
        let real_site = sample_site();

        let dry = Traverser::new(&dry_site, &dirs, ROOT, None).run().await;
        let real = Traverser::new(&real_site, &dirs, ROOT, Some(PathBuf::from("out")))
            .run()
            .await;

        assert_eq!(dry.files, real.files);
    }

    #[tokio::test]
    async fn test_cycle_terminates_and_fetches_each_folder_once() {
        let site = FakeSite::default()
            .page(ROOT, &folder("a"))
            .page("https://huggingface.co/user/repo/tree/main/a", &format!("{}{}", folder("b"), folder("")))
            .page("https://huggingface.co/user/repo/tree/main/b", &folder("a/"));
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, None).run().await;

        assert_eq!(report.folders_visited, 3);
        assert_eq!(site.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_same_file_on_two_pages_is_queued_once() {
        let site = FakeSite::default()
            .page(ROOT, &format!("{}{}", download("a.bin"), folder("x")))
            .page("https://huggingface.co/user/repo/tree/main/x", &download("a.bin"));
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, Some(PathBuf::from("out")))
            .run()
            .await;

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_link_matching_both_strategies_is_walked_once() {
        let root = r#"
            <a href="/user/repo/tree/main/data"><svg><title>Folder</title></svg>data</a>
            <a href="/user/repo/tree/main/data/">data</a>
        "#;
        let site = FakeSite::default()
            .page(ROOT, root)
            .page("https://huggingface.co/user/repo/tree/main/data", "");
        let dirs = RecordingDirs::default();

        Traverser::new(&site, &dirs, ROOT, None).run().await;

        let data_fetches = site.fetched().iter().filter(|u| u.contains("/data")).count();
        assert_eq!(data_fetches, 1);
    }

    #[tokio::test]
    async fn test_failed_folder_does_not_stop_siblings() {
        let site = FakeSite::default()
            .page(ROOT, &format!("{}{}", folder("missing"), folder("ok")))
            .page("https://huggingface.co/user/repo/tree/main/ok", &download("ok/c.bin"));
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, None).run().await;

        assert_eq!(paths(&report), vec!["ok/c.bin"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].url.ends_with("/tree/main/missing"));
    }

    #[tokio::test]
    async fn test_unreachable_root_yields_empty_report() {
        let site = FakeSite::default();
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, Some(PathBuf::from("out"))).run().await;

        assert!(report.files.is_empty());
        assert!(report.queue.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_walk_is_depth_first_in_page_order() {
        let site = FakeSite::default()
            .page(ROOT, &format!("{}{}", folder("x"), folder("y")))
            .page("https://huggingface.co/user/repo/tree/main/x", &folder("x/z"))
            .page("https://huggingface.co/user/repo/tree/main/x/z", "")
            .page("https://huggingface.co/user/repo/tree/main/y", "");
        let dirs = RecordingDirs::default();

        Traverser::new(&site, &dirs, ROOT, None).run().await;

        let order: Vec<String> = site
            .fetched()
            .iter()
            .map(|u| u.trim_start_matches("https://huggingface.co/user/repo/tree/main").to_string())
            .collect();
        assert_eq!(order, vec!["/", "/x", "/x/z", "/y"]);
    }

    #[tokio::test]
    async fn test_directory_failure_skips_only_that_file() {
        let site = sample_site();
        let target = PathBuf::from("out");
        let dirs = RecordingDirs {
            fail_on: Some(target.join("data")),
            ..RecordingDirs::default()
        };

        let report = Traverser::new(&site, &dirs, ROOT, Some(target)).run().await;

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.queue.len(), 2);
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_different_urls_for_the_same_path_are_queued_once() {
        // An icon-only folder has no tree marker, so its files fall back to
        // the root and collide with the root's own a.bin
        let root = format!(
            r#"{}<a href="/user/repo/browse/other"><svg><title>folder</title></svg>other</a>"#,
            download("a.bin")
        );
        let other = r#"<a href="/user/repo/resolve/dev/a.bin?download=true">a.bin</a>"#;
        let site = FakeSite::default()
            .page(ROOT, &root)
            .page("https://huggingface.co/user/repo/browse/other", other);
        let dirs = RecordingDirs::default();

        let report = Traverser::new(&site, &dirs, ROOT, Some(PathBuf::from("out")))
            .run()
            .await;

        assert_eq!(paths(&report), vec!["a.bin"]);
        assert_eq!(report.queue.len(), 1);
        assert_eq!(
            report.queue.iter().next().map(|t| t.source_url.as_str()),
            Some("https://huggingface.co/user/repo/resolve/main/a.bin?download=true")
        );
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].url.contains("/resolve/dev/"));
    }
}
