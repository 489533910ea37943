//! Message handler port.
//!
//! A handler is the per-message unit of work the relay runtime dispatches
//! for every admitted VAA. The default implementation routes the message to
//! a destination submitter; tests and alternative deployments inject their
//! own at construction time.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{Direction, RelayMessage, TransactionId};
use crate::error::SubmissionError;

/// Cancellation view handed to dispatched work.
///
/// The relay runtime flips the scope when it starts draining. Handlers check
/// it before every blocking external call; a call already in progress is
/// allowed to finish.
#[derive(Debug, Clone)]
pub struct ProcessingScope {
    cancelled: Option<watch::Receiver<bool>>,
}

impl ProcessingScope {
    /// Create a scope and the sender that cancels it.
    #[must_use]
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (
            tx,
            Self {
                cancelled: Some(rx),
            },
        )
    }

    /// A scope that is never cancelled.
    #[must_use]
    pub const fn detached() -> Self {
        Self { cancelled: None }
    }

    /// True once the runtime has begun draining.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail fast with [`SubmissionError::Cancelled`] when draining.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Cancelled`] if the scope is cancelled.
    pub fn ensure_active(&self) -> Result<(), SubmissionError> {
        if self.is_cancelled() {
            Err(SubmissionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What a handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The message was delivered.
    Submitted {
        /// Direction the message travelled.
        direction: Direction,
        /// Name of the submitter that accepted it.
        submitter: &'static str,
        /// Destination transaction identifier.
        tx: TransactionId,
    },
    /// The message is not relayable and was dropped.
    Skipped {
        /// Why the message was dropped.
        reason: String,
    },
}

impl HandleOutcome {
    /// True when the message reached a destination.
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted { .. })
    }
}

/// Processes one admitted message.
///
/// Returning `Ok(HandleOutcome::Submitted { .. })` marks the message as
/// processed for the dedupe TTL. `Skipped` and `Err` release it so a later
/// redelivery can be admitted again.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<HandleOutcome, SubmissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_scope_is_never_cancelled() {
        let scope = ProcessingScope::detached();
        assert!(!scope.is_cancelled());
        assert!(scope.ensure_active().is_ok());
    }

    #[test]
    fn channel_scope_follows_sender() {
        let (tx, scope) = ProcessingScope::channel();
        let clone = scope.clone();
        assert!(!scope.is_cancelled());

        tx.send(true).unwrap();

        assert!(scope.is_cancelled());
        assert!(clone.is_cancelled());
        assert!(matches!(
            scope.ensure_active(),
            Err(SubmissionError::Cancelled)
        ));
    }
}
