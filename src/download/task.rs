// src/download/task.rs
// =============================================================================
// The unit of work handed from the traverser to the dispatcher.
// =============================================================================

use std::collections::VecDeque;
use std::path::PathBuf;

/// One file to transfer. Created once, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: String,
    pub target_dir: PathBuf,
    pub filename: String,
}

impl DownloadTask {
    // Identifier used in the in-flight set and in log lines
    pub fn id(&self) -> String {
        self.target_dir.join(&self.filename).display().to_string()
    }
}

/// FIFO of pending transfers
///
/// Filled at the tail by the traverser, drained from the head by the
/// dispatcher. Length is not bounded; only concurrent execution is.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    tasks: VecDeque<DownloadTask>,
}

impl DownloadQueue {
    pub fn push(&mut self, task: DownloadTask) {
        self.tasks.push_back(task);
    }

    pub fn pop(&mut self) -> Option<DownloadTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DownloadTask> {
        self.tasks.iter()
    }
}

// Draining in FIFO order lets the dispatcher treat the queue as a stream
impl Iterator for DownloadQueue {
    type Item = DownloadTask;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop()
    }
}
