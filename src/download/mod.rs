// src/download/mod.rs
// =============================================================================
// This module turns the queued files into local copies.
//
// Submodules:
// - task: DownloadTask and the FIFO DownloadQueue
// - executor: the TransferExecutor trait and the aria2c implementation
// - dispatch: the bounded-concurrency Dispatcher
// =============================================================================

mod dispatch;
mod executor;
mod task;

pub use dispatch::{DispatchSummary, Dispatcher, MAX_CONCURRENT_DOWNLOADS};
pub use executor::{Aria2c, DEFAULT_CONNECTIONS, DEFAULT_PROGRAM};
pub use task::{DownloadQueue, DownloadTask};
