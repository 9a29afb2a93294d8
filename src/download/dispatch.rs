// src/download/dispatch.rs
// =============================================================================
// Drains the download queue with a cap on how many transfers run at once.
//
// How it works:
// 1. The queue is turned into a lazy stream of transfer futures
// 2. buffer_unordered(max) keeps at most `max` of them running; the next task
//    is only popped from the queue once a running transfer finishes
// 3. Each running transfer holds a slot in the in-flight set until the
//    executor reports back, success or failure
// 4. run() returns once the queue is empty and the in-flight set is empty
//
// A failed transfer is logged and counted. It is never retried or re-queued
// and never stops the other transfers.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use super::executor::TransferExecutor;
use super::task::{DownloadQueue, DownloadTask};
use crate::error::MirrorError;

/// Transfers allowed in flight at once unless configured otherwise
pub const MAX_CONCURRENT_DOWNLOADS: usize = 24;

/// Totals for one dispatcher run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Highest number of transfers observed in flight at the same time
    pub peak_in_flight: usize,
}

/// Identifiers of transfers currently in flight
#[derive(Debug, Default, Clone)]
pub struct ActiveTransfers {
    inner: Arc<Mutex<ActiveState>>,
}

#[derive(Debug, Default)]
struct ActiveState {
    ids: HashSet<String>,
    peak: usize,
}

impl ActiveTransfers {
    pub fn len(&self) -> usize {
        self.lock().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    // Adds the task and returns a slot that removes it again when dropped
    fn register(&self, task: &DownloadTask) -> ActiveSlot {
        let id = task.id();
        let mut state = self.lock();
        state.ids.insert(id.clone());
        state.peak = state.peak.max(state.ids.len());

        ActiveSlot {
            transfers: self.clone(),
            id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActiveState> {
        // A poisoned lock only means another transfer panicked mid-update;
        // the set itself is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct ActiveSlot {
    transfers: ActiveTransfers,
    id: String,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.transfers.lock().ids.remove(&self.id);
    }
}

/// Bounded-concurrency consumer of a DownloadQueue
pub struct Dispatcher {
    executor: Arc<dyn TransferExecutor>,
    max_concurrent: usize,
    active: ActiveTransfers,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn TransferExecutor>, max_concurrent: usize) -> Result<Self, MirrorError> {
        if max_concurrent == 0 {
            return Err(MirrorError::Config(
                "at least one concurrent download is required".to_string(),
            ));
        }

        Ok(Self {
            executor,
            max_concurrent,
            active: ActiveTransfers::default(),
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    // Runs every task in the queue and waits for all of them to finish
    pub async fn run(&self, queue: DownloadQueue) -> DispatchSummary {
        info!(
            files = queue.len(),
            max_concurrent = self.max_concurrent,
            "processing download queue"
        );

        let outcomes: Vec<bool> = stream::iter(queue.map(|task| self.transfer_one(task)))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        debug_assert!(self.active.is_empty());

        let succeeded = outcomes.iter().filter(|ok| **ok).count();
        DispatchSummary {
            succeeded,
            failed: outcomes.len() - succeeded,
            peak_in_flight: self.active.peak(),
        }
    }

    async fn transfer_one(&self, task: DownloadTask) -> bool {
        let _slot = self.active.register(&task);
        info!(file = %task.id(), "starting download");

        match self.executor.transfer(&task).await {
            Ok(()) => {
                info!(file = %task.filename, "download completed successfully");
                true
            }
            Err(e) => {
                error!(file = %task.filename, url = %task.source_url, error = %e, "download failed");
                false
            }
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffer_unordered instead of polling a counter?
//    - The stream only pulls the next task when one of the `max` running
//      futures completes, so the cap holds without sleeping or busy-waiting
//    - Results come back in completion order, which is fine: we only count them
//
// 2. Why do all transfers run on one task?
//    - Each transfer spends its time awaiting a child process, not using CPU
//    - buffer_unordered polls them concurrently, so no tokio::spawn is needed
//      and the dispatcher can borrow `self` inside each future
//
// 3. Why a Drop guard for the in-flight set?
//    - The slot is released exactly when the transfer future finishes,
//      whichever way it finishes
// -----------------------------------------------------------------------------
