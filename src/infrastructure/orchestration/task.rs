//! Per-message work spawned by the relay loop.

use std::sync::Arc;

use tracing::Span;

use super::stats::RelayStats;
use crate::application::DedupStore;
use crate::domain::{DecodedEvent, MessageKey, RawMessage, RelayMessage};
use crate::port::{HandleOutcome, MessageHandler, ProcessingScope};

/// Releases a dedupe key when dropped.
///
/// The key completes as a failure unless [`succeed`](Self::succeed) was
/// called, so a task that errors, panics, or is aborted never leaves its key
/// inflight.
pub struct CompletionGuard {
    dedup: Arc<DedupStore>,
    key: MessageKey,
    success: bool,
}

impl CompletionGuard {
    /// Guard `key`, which must already be admitted in `dedup`.
    #[must_use]
    pub fn new(dedup: Arc<DedupStore>, key: MessageKey) -> Self {
        Self {
            dedup,
            key,
            success: false,
        }
    }

    pub fn succeed(&mut self) {
        self.success = true;
    }

    #[must_use]
    pub fn key(&self) -> &MessageKey {
        &self.key
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.dedup.complete(&self.key, self.success);
    }
}

/// Shared collaborators for every dispatched task.
#[derive(Clone)]
pub(crate) struct TaskContext {
    pub handler: Arc<dyn MessageHandler>,
    pub stats: Arc<RelayStats>,
    pub span: Span,
}

/// Decode, handle, and record one admitted message.
pub(crate) async fn process_message(
    ctx: TaskContext,
    mut guard: CompletionGuard,
    raw: RawMessage,
    scope: ProcessingScope,
) {
    let key = guard.key().clone();

    let event = match DecodedEvent::decode(raw.as_bytes()) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(
                parent: &ctx.span,
                key = key.short(),
                len = raw.len(),
                error = %error,
                "Dropping undecodable VAA"
            );
            ctx.stats.record_dropped();
            return;
        }
    };

    tracing::debug!(
        parent: &ctx.span,
        key = key.short(),
        chain = event.source_chain_id,
        sequence = event.sequence,
        emitter = %event.emitter_address,
        correlation_id = event.correlation_id.as_deref().unwrap_or("-"),
        "Processing VAA"
    );

    let message = RelayMessage { key, raw, event };
    match ctx.handler.handle(&message, &scope).await {
        Ok(HandleOutcome::Submitted { .. }) => {
            guard.succeed();
            ctx.stats.record_succeeded();
        }
        Ok(HandleOutcome::Skipped { reason }) => {
            tracing::debug!(
                parent: &ctx.span,
                key = message.key.short(),
                reason = %reason,
                "VAA not relayed"
            );
            ctx.stats.record_dropped();
        }
        Err(error) if error.is_interrupted() => {
            tracing::warn!(
                parent: &ctx.span,
                key = message.key.short(),
                chain = message.event.source_chain_id,
                sequence = message.event.sequence,
                error = %error,
                "VAA processing interrupted"
            );
            ctx.stats.record_failed();
        }
        Err(error) => {
            tracing::error!(
                parent: &ctx.span,
                key = message.key.short(),
                chain = message.event.source_chain_id,
                sequence = message.event.sequence,
                error = %error,
                "Failed to process VAA"
            );
            ctx.stats.record_failed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_key_as_failure_by_default() {
        let dedup = Arc::new(DedupStore::default());
        let key = MessageKey::compute(b"vaa");
        assert!(dedup.admit(&key).is_admitted());

        drop(CompletionGuard::new(dedup.clone(), key.clone()));

        assert!(!dedup.is_inflight(&key));
        assert!(dedup.admit(&key).is_admitted());
    }

    #[test]
    fn guard_records_success() {
        let dedup = Arc::new(DedupStore::default());
        let key = MessageKey::compute(b"vaa");
        assert!(dedup.admit(&key).is_admitted());

        let mut guard = CompletionGuard::new(dedup.clone(), key.clone());
        guard.succeed();
        drop(guard);

        assert!(!dedup.admit(&key).is_admitted());
        assert_eq!(dedup.processed_len(), 1);
    }

    #[test]
    fn guard_runs_during_unwind() {
        let dedup = Arc::new(DedupStore::default());
        let key = MessageKey::compute(b"vaa");
        assert!(dedup.admit(&key).is_admitted());

        let guard = CompletionGuard::new(dedup.clone(), key.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = guard;
            panic!("handler blew up");
        }));

        assert!(result.is_err());
        assert!(!dedup.is_inflight(&key));
    }
}
