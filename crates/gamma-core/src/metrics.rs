//! Global atomic counters for engine observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event, or [`Metrics::snapshot`] to serve them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Relaxed atomic counters; increments never allocate or lock.
pub struct Metrics {
    assessments: AtomicU64,
    stages_invoked: AtomicU64,
    stages_succeeded: AtomicU64,
    stages_failed: AtomicU64,
    stages_skipped: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub assessments: u64,
    pub stages_invoked: u64,
    pub stages_succeeded: u64,
    pub stages_failed: u64,
    pub stages_skipped: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            assessments: AtomicU64::new(0),
            stages_invoked: AtomicU64::new(0),
            stages_succeeded: AtomicU64::new(0),
            stages_failed: AtomicU64::new(0),
            stages_skipped: AtomicU64::new(0),
        }
    }

    pub fn inc_assessments(&self) {
        self.assessments.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "assessments", "counter incremented");
    }

    pub fn inc_stages_invoked(&self) {
        self.stages_invoked.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stages_invoked", "counter incremented");
    }

    pub fn inc_stages_succeeded(&self) {
        self.stages_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stages_failed(&self) {
        self.stages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stages_skipped(&self) {
        self.stages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            assessments: self.assessments.load(Ordering::Relaxed),
            stages_invoked: self.stages_invoked.load(Ordering::Relaxed),
            stages_succeeded: self.stages_succeeded.load(Ordering::Relaxed),
            stages_failed: self.stages_failed.load(Ordering::Relaxed),
            stages_skipped: self.stages_skipped.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a CLI run, daemon shutdown)
    /// rather than on every increment.
    pub fn flush(&self) {
        let s = self.snapshot();
        tracing::info!(
            metric = "flush",
            assessments = s.assessments,
            stages_invoked = s.stages_invoked,
            stages_succeeded = s.stages_succeeded,
            stages_failed = s.stages_failed,
            stages_skipped = s.stages_skipped,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.assessments.store(0, Ordering::Relaxed);
        self.stages_invoked.store(0, Ordering::Relaxed);
        self.stages_succeeded.store(0, Ordering::Relaxed);
        self.stages_failed.store(0, Ordering::Relaxed);
        self.stages_skipped.store(0, Ordering::Relaxed);
    }
}
