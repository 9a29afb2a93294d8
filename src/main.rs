// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Make sure the downloader program is installed
// 4. Walk the repository and build the download queue
// 5. Either list the files (dry run) or download them
// 6. Exit with 0, or 1 on a missing argument or missing downloader
//
// Individual folder or file failures are logged and never change the exit code.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;        // src/cli.rs - command-line parsing
mod config;     // src/config.rs - validated run settings
mod crawl;      // src/crawl/ - folder walk and link classification
mod download;   // src/download/ - queue, aria2c executor, dispatcher
mod error;      // src/error.rs - MirrorError
mod fetch;      // src/fetch/ - folder page fetching
mod fs;         // src/fs.rs - directory creation

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::MirrorConfig;
use crawl::{DiscoveredFile, TraversalReport, Traverser};
use download::{Aria2c, DispatchSummary, Dispatcher};
use fetch::HttpFetcher;
use fs::LocalDirs;

#[tokio::main]
async fn main() {
    let cli = parse_cli();
    init_tracing(&cli);
    debug!(?cli, "CLI arguments parsed");

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// clap exits with 2 on usage errors; this tool promises 1
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            // Nothing useful left to do if stderr itself is gone
            let _ = e.print();
            std::process::exit(code);
        }
    }
}

// Priority: RUST_LOG > --quiet > --verbose > info
fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = MirrorConfig::from_cli(&cli)?;

    let executor = Aria2c::new(config.program.clone(), config.connections);
    executor.ensure_installed().await?;

    let fetcher = HttpFetcher::new()?;
    let dirs = LocalDirs;

    info!(root = %config.root_url, "building download queue");
    let report = Traverser::new(&fetcher, &dirs, config.root_url.clone(), config.target.clone())
        .run()
        .await;

    if config.is_dry_run() {
        let output = if config.json {
            dry_run_json(&report.files)?
        } else {
            dry_run_lines(&report).join("\n")
        };
        println!("{}", output);
        return Ok(());
    }

    if config.json {
        warn!("--json only applies to dry runs, ignoring it");
    }

    if report.queue.is_empty() {
        println!("\nNo files found to download.");
        return Ok(());
    }

    for task in report.queue.iter() {
        debug!(file = %task.id(), url = %task.source_url, "queued");
    }

    let dispatcher = Dispatcher::new(Arc::new(executor), config.max_concurrent)?;

    println!("\nFound {} unique files to download.", report.queue.len());
    println!(
        "Starting downloads with max {} concurrent downloads.",
        dispatcher.max_concurrent()
    );

    let summary = dispatcher.run(report.queue).await;

    println!("{}", summary_lines(&summary, &report.failures).join("\n"));

    Ok(())
}

// The dry-run listing: one File/URL pair per file, then the totals
fn dry_run_lines(report: &TraversalReport) -> Vec<String> {
    let mut lines = Vec::new();

    for file in &report.files {
        lines.push(format!("File: {}", file.path));
        lines.push(format!("URL: {}", file.url));
    }

    lines.push(String::new());
    lines.push("To download the files, a directory must be specified.".to_string());
    lines.push(format!(
        "Found {} unique files that would be downloaded.",
        report.files.len()
    ));
    lines.extend(failure_line(&report.failures));
    lines
}

// The discovered files as a pretty JSON array of {path, url}
fn dry_run_json(files: &[DiscoveredFile]) -> Result<String> {
    Ok(serde_json::to_string_pretty(files)?)
}

fn summary_lines(summary: &DispatchSummary, failures: &[crawl::Failure]) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "All downloads completed!".to_string(),
        "📊 Summary:".to_string(),
        format!("   ✅ Downloaded: {}", summary.succeeded),
        format!("   ❌ Failed: {}", summary.failed),
        format!("   🔀 Peak concurrent downloads: {}", summary.peak_in_flight),
    ];
    lines.extend(failure_line(failures));
    lines
}

fn failure_line(failures: &[crawl::Failure]) -> Option<String> {
    if failures.is_empty() {
        None
    } else {
        Some(format!("   ⚠️  Not processed: {} (see errors above)", failures.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawl::Failure;

    fn sample_report() -> TraversalReport {
        TraversalReport {
            files: vec![
                DiscoveredFile {
                    path: "a.bin".to_string(),
                    url: "https://huggingface.co/u/r/resolve/main/a.bin?download=true".to_string(),
                },
                DiscoveredFile {
                    path: "data/c.bin".to_string(),
                    url: "https://huggingface.co/u/r/resolve/main/data/c.bin?download=true".to_string(),
                },
            ],
            ..TraversalReport::default()
        }
    }

    #[test]
    fn test_dry_run_lines_list_files_then_totals() {
        let lines = dry_run_lines(&sample_report());

        assert_eq!(
            lines,
            vec![
                "File: a.bin",
                "URL: https://huggingface.co/u/r/resolve/main/a.bin?download=true",
                "File: data/c.bin",
                "URL: https://huggingface.co/u/r/resolve/main/data/c.bin?download=true",
                "",
                "To download the files, a directory must be specified.",
                "Found 2 unique files that would be downloaded.",
            ]
        );
    }

    #[test]
    fn test_dry_run_lines_mention_failures() {
        let mut report = sample_report();
        report.failures.push(Failure {
            url: "https://huggingface.co/u/r/tree/main/missing".to_string(),
            reason: "HTTP 404".to_string(),
        });

        let lines = dry_run_lines(&report);
        assert_eq!(lines.last().map(String::as_str), Some("   ⚠️  Not processed: 1 (see errors above)"));
    }

    #[test]
    fn test_dry_run_json_shape() {
        let json = dry_run_json(&sample_report().files).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value,
            serde_json::json!([
                {
                    "path": "a.bin",
                    "url": "https://huggingface.co/u/r/resolve/main/a.bin?download=true"
                },
                {
                    "path": "data/c.bin",
                    "url": "https://huggingface.co/u/r/resolve/main/data/c.bin?download=true"
                }
            ])
        );
    }

    #[test]
    fn test_summary_lines_report_counts_and_peak() {
        let summary = DispatchSummary {
            succeeded: 3,
            failed: 1,
            peak_in_flight: 2,
        };

        let lines = summary_lines(&summary, &[]);

        assert_eq!(lines[1], "All downloads completed!");
        assert!(lines.contains(&"   ✅ Downloaded: 3".to_string()));
        assert!(lines.contains(&"   ❌ Failed: 1".to_string()));
        assert!(lines.contains(&"   🔀 Peak concurrent downloads: 2".to_string()));
    }
}
