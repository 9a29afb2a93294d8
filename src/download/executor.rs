// src/download/executor.rs
// =============================================================================
// Runs one transfer by handing it to an external downloader.
//
// The default executor is aria2c, started as a subprocess with 16 connections
// per file. Its progress output is echoed to stdout, prefixed with the file
// name so interleaved transfers stay readable. Exit code 0 means success;
// anything else is a TransferFailure, which the dispatcher only logs.
// =============================================================================

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::task::DownloadTask;
use crate::error::MirrorError;

pub const DEFAULT_PROGRAM: &str = "aria2c";
pub const DEFAULT_CONNECTIONS: u16 = 16;

/// Something that can move one file from its URL to disk
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Resolves when the transfer has finished, successfully or not
    async fn transfer(&self, task: &DownloadTask) -> Result<(), MirrorError>;
}

/// aria2c subprocess executor
#[derive(Debug, Clone)]
pub struct Aria2c {
    program: String,
    connections: u16,
}

impl Aria2c {
    pub fn new(program: impl Into<String>, connections: u16) -> Self {
        Self {
            program: program.into(),
            connections,
        }
    }

    // Runs `<program> --version`. Fails with MissingDependency if the
    // program cannot be started at all.
    pub async fn ensure_installed(&self) -> Result<(), MirrorError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| MirrorError::MissingDependency {
                program: self.program.clone(),
                source,
            })?;

        debug!(program = %self.program, %status, "transfer program found");
        Ok(())
    }

    /// Command-line arguments for one task
    pub fn arguments(&self, task: &DownloadTask) -> Vec<String> {
        vec![
            format!("-x{}", self.connections),
            "--allow-overwrite=true".to_string(),
            "--summary-interval=1".to_string(),
            "--console-log-level=notice".to_string(),
            "--show-console-readout=true".to_string(),
            "--human-readable=true".to_string(),
            "--download-result=full".to_string(),
            "-d".to_string(),
            task.target_dir.display().to_string(),
            "-o".to_string(),
            task.filename.clone(),
            task.source_url.clone(),
        ]
    }
}

#[async_trait]
impl TransferExecutor for Aria2c {
    async fn transfer(&self, task: &DownloadTask) -> Result<(), MirrorError> {
        let filename = task.filename.as_str();
        let failure = |reason: String| MirrorError::TransferFailure {
            filename: filename.to_string(),
            reason,
        };

        let mut child = Command::new(&self.program)
            .args(self.arguments(task))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| failure(format!("could not start {}: {e}", self.program)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let echo_progress = async {
            if let Some(out) = stdout {
                echo_lines(out, |line| println!("[{filename}] {line}")).await;
            }
        };

        let echo_errors = async {
            if let Some(err) = stderr {
                echo_lines(err, |line| warn!(file = filename, "{line}")).await;
            }
        };

        let (_, _, status) = tokio::join!(echo_progress, echo_errors, child.wait());
        let status = status.map_err(|e| failure(format!("could not wait for {}: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(failure(match status.code() {
                Some(code) => format!("download process exited with code {code}"),
                None => "download process was terminated by a signal".to_string(),
            }))
        }
    }
}

// Hands each output line to `emit` until the child closes the pipe
//
// Lines are read as raw bytes, so stray non-UTF-8 output is shown lossily
// instead of ending the loop. If reading fails anyway, the rest is drained
// into a sink: the pipe must stay open or the child dies of SIGPIPE.
async fn echo_lines<R>(reader: R, mut emit: impl FnMut(&str))
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                emit(line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                debug!(error = %e, "output unreadable, discarding the rest");
                // Best effort; the exit status is what decides success
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                return;
            }
        }
    }
}
