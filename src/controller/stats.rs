//! Session counters.
//!
//! `processed` is bumped before an add is attempted and `success`/`failed`
//! after it resolves, so a snapshot that reads the outcome counters first
//! always sees `success + failed <= processed` for batch work.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::JobState;

#[derive(Debug, Default)]
pub struct SessionStats {
    total: AtomicU64,
    processed: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
}

impl SessionStats {
    /// Zero everything and fix `total` for a new job.
    pub(crate) fn reset(&self, total: u64) {
        self.processed.store(0, Ordering::SeqCst);
        self.success.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Returns the new 1-based position.
    pub(crate) fn begin_item(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn record(&self, added: bool) {
        if added {
            self.success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn snapshot(&self, state: JobState) -> StatsSnapshot {
        let success = self.success.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        let processed = self.processed.load(Ordering::SeqCst);
        let total = self.total.load(Ordering::SeqCst);
        StatsSnapshot {
            total,
            success,
            failed,
            processed,
            state,
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub processed: u64,
    pub state: JobState,
}

impl StatsSnapshot {
    /// `total - success - failed`. Goes negative when single adds are made
    /// outside a batch, since they share the outcome counters.
    pub fn remaining(&self) -> i64 {
        self.total as i64 - self.success as i64 - self.failed as i64
    }
}
