//! Relay counters shared between the main loop and dispatched tasks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free relay counters.
#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    duplicates: AtomicU64,
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    resubscribes: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Messages pulled from the feed.
    pub received: u64,
    /// Deliveries rejected by the dedupe store.
    pub duplicates: u64,
    /// Tasks spawned for admitted messages.
    pub dispatched: u64,
    /// Messages delivered to a destination.
    pub succeeded: u64,
    /// Submissions that failed, timed out, were cancelled, or panicked.
    pub failed: u64,
    /// Undecodable or unrouted messages.
    pub dropped: u64,
    /// Receive errors that triggered a resubscription.
    pub resubscribes: u64,
}

impl RelayStatsSnapshot {
    /// Tasks that have finished, whatever the outcome.
    #[must_use]
    pub const fn finished(&self) -> u64 {
        self.succeeded + self.failed + self.dropped
    }
}

impl RelayStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resubscribe(&self) {
        self.resubscribes.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            resubscribes: self.resubscribes.load(Ordering::Relaxed),
        }
    }
}
