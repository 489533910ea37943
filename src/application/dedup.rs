//! Deduplication of redelivered VAAs.
//!
//! The feed delivers at-least-once and replays freely. The store tracks each
//! message key as either inflight (a task owns it) or recently processed
//! (completed successfully within the TTL), and gates admission on both.
//!
//! Both sets live under one lock so a key can never be observed in both at
//! once, and check-then-insert is atomic with respect to other callers.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::domain::MessageKey;

/// Default retention for successfully processed keys.
pub const DEFAULT_DEDUPE_TTL: Duration = Duration::from_secs(15 * 60);

/// Result of asking the store to admit a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The caller now owns the key and must call [`DedupStore::complete`].
    Admitted,
    /// Another task is processing the same bytes.
    Inflight,
    /// The same bytes completed successfully within the TTL.
    RecentlyProcessed,
}

impl Admission {
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }

    /// Stable label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Inflight => "inflight",
            Self::RecentlyProcessed => "recently_processed",
        }
    }
}

#[derive(Debug, Default)]
struct DedupState {
    inflight: HashSet<MessageKey>,
    processed: HashMap<MessageKey, Instant>,
}

/// Thread-safe tracker of inflight and recently processed message keys.
#[derive(Debug)]
pub struct DedupStore {
    state: Mutex<DedupState>,
    ttl: Duration,
}

impl DedupStore {
    /// Create a store that remembers successful keys for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(DedupState::default()),
            ttl,
        }
    }

    /// Try to take ownership of `key`.
    ///
    /// A processed entry older than the TTL is dropped here so the key can be
    /// admitted again.
    pub fn admit(&self, key: &MessageKey) -> Admission {
        let mut state = self.state.lock();

        if let Some(processed_at) = state.processed.get(key) {
            if processed_at.elapsed() < self.ttl {
                return Admission::RecentlyProcessed;
            }
            state.processed.remove(key);
        }

        if state.inflight.contains(key) {
            return Admission::Inflight;
        }

        state.inflight.insert(key.clone());
        Admission::Admitted
    }

    /// Release `key` after processing.
    ///
    /// On success the key is remembered for the TTL; on failure it becomes
    /// admissible immediately. Every call also sweeps expired processed
    /// entries.
    pub fn complete(&self, key: &MessageKey, success: bool) {
        let mut state = self.state.lock();
        let now = Instant::now();

        state.inflight.remove(key);
        if success {
            state.processed.insert(key.clone(), now);
        }

        let ttl = self.ttl;
        state
            .processed
            .retain(|_, processed_at| now.duration_since(*processed_at) < ttl);
    }

    /// Whether a task currently owns `key`.
    #[must_use]
    pub fn is_inflight(&self, key: &MessageKey) -> bool {
        self.state.lock().inflight.contains(key)
    }

    /// Number of keys currently being processed.
    #[must_use]
    pub fn inflight_len(&self) -> usize {
        self.state.lock().inflight.len()
    }

    /// Number of remembered processed keys, including any not yet swept.
    #[must_use]
    pub fn processed_len(&self) -> usize {
        self.state.lock().processed.len()
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUPE_TTL)
    }
}
