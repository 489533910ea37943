//! Source-chain routing with primary/fallback submission.
//!
//! The router classifies a decoded event by its emitter chain and drives the
//! matching submission policy:
//!
//! - source chain: forward submitter, single attempt
//! - destination chain: verification service first, direct chain on failure
//! - anything else: not relayed
//!
//! Every attempt runs under `submit_timeout` and is preceded by a check of
//! the processing scope, so a draining relayer never starts new I/O.

use std::sync::Arc;
use std::time::Duration;

use tracing::Span;

use crate::domain::{Direction, RelayMessage, TransactionId};
use crate::error::SubmissionError;
use crate::port::{HandleOutcome, ProcessingScope, Submitter};

/// Default bound on a single submission attempt.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Classification of an event by its emitter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Forward,
    Reverse,
    Unrouted,
}

impl Route {
    /// Direction for relayable routes.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Forward => Some(Direction::Forward),
            Self::Reverse => Some(Direction::Reverse),
            Self::Unrouted => None,
        }
    }
}

/// Forward leg: one submitter, one target contract.
#[derive(Clone)]
pub struct ForwardRoute {
    pub submitter: Arc<dyn Submitter>,
    pub target: String,
}

/// Reverse leg: primary submitter with a direct-chain fallback.
#[derive(Clone)]
pub struct ReverseRoute {
    pub primary: Arc<dyn Submitter>,
    pub secondary: Arc<dyn Submitter>,
    pub target: String,
}

/// Maps source chains to destination submitters.
pub struct SubmissionRouter {
    source_chain: u16,
    dest_chain: u16,
    forward: ForwardRoute,
    reverse: ReverseRoute,
    submit_timeout: Duration,
    span: Span,
}

impl SubmissionRouter {
    #[must_use]
    pub fn new(
        source_chain: u16,
        dest_chain: u16,
        forward: ForwardRoute,
        reverse: ReverseRoute,
    ) -> Self {
        Self {
            source_chain,
            dest_chain,
            forward,
            reverse,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            span: tracing::info_span!("relay", component = "router"),
        }
    }

    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Parent span for every event the router emits.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        self.submit_timeout
    }

    /// Classify an emitter chain.
    #[must_use]
    pub const fn route(&self, chain_id: u16) -> Route {
        if chain_id == self.source_chain {
            Route::Forward
        } else if chain_id == self.dest_chain {
            Route::Reverse
        } else {
            Route::Unrouted
        }
    }

    /// Submit `message` according to its route.
    ///
    /// # Errors
    ///
    /// Returns the failing submitter's error. On the reverse leg this is the
    /// secondary's error once the fallback has been tried.
    pub async fn dispatch(
        &self,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<HandleOutcome, SubmissionError> {
        let chain = message.event.source_chain_id;
        match self.route(chain) {
            Route::Forward => self.dispatch_forward(message, scope).await,
            Route::Reverse => self.dispatch_reverse(message, scope).await,
            Route::Unrouted => {
                tracing::info!(
                    parent: &self.span,
                    key = message.key.short(),
                    chain,
                    source_chain = self.source_chain,
                    dest_chain = self.dest_chain,
                    "Ignoring VAA from unrelated chain"
                );
                Ok(HandleOutcome::Skipped {
                    reason: format!("unrouted source chain {chain}"),
                })
            }
        }
    }

    async fn dispatch_forward(
        &self,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<HandleOutcome, SubmissionError> {
        let route = &self.forward;
        let submitter = route.submitter.as_ref();
        tracing::info!(
            parent: &self.span,
            key = message.key.short(),
            direction = %Direction::Forward,
            submitter = submitter.name(),
            target = %route.target,
            "Relaying VAA"
        );

        match self.attempt(submitter, &route.target, message, scope).await {
            Ok(tx) => Ok(self.submitted(message, Direction::Forward, submitter, tx)),
            Err(error) => {
                tracing::error!(
                    parent: &self.span,
                    key = message.key.short(),
                    submitter = submitter.name(),
                    error = %error,
                    "Forward submission failed"
                );
                Err(error)
            }
        }
    }

    async fn dispatch_reverse(
        &self,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<HandleOutcome, SubmissionError> {
        let route = &self.reverse;
        let primary = route.primary.as_ref();
        tracing::info!(
            parent: &self.span,
            key = message.key.short(),
            direction = %Direction::Reverse,
            submitter = primary.name(),
            target = %route.target,
            "Relaying VAA"
        );

        let primary_error = match self.attempt(primary, &route.target, message, scope).await {
            Ok(tx) => return Ok(self.submitted(message, Direction::Reverse, primary, tx)),
            Err(SubmissionError::Cancelled) => return Err(SubmissionError::Cancelled),
            Err(error) => error,
        };

        let secondary = route.secondary.as_ref();
        tracing::warn!(
            parent: &self.span,
            key = message.key.short(),
            primary = primary.name(),
            fallback = secondary.name(),
            error = %primary_error,
            "Primary submission failed, falling back"
        );

        match self.attempt(secondary, &route.target, message, scope).await {
            Ok(tx) => Ok(self.submitted(message, Direction::Reverse, secondary, tx)),
            Err(error) => {
                tracing::error!(
                    parent: &self.span,
                    key = message.key.short(),
                    primary_error = %primary_error,
                    fallback_error = %error,
                    "Reverse submission failed on every path"
                );
                Err(error)
            }
        }
    }

    async fn attempt(
        &self,
        submitter: &dyn Submitter,
        target: &str,
        message: &RelayMessage,
        scope: &ProcessingScope,
    ) -> Result<TransactionId, SubmissionError> {
        scope.ensure_active()?;
        match tokio::time::timeout(
            self.submit_timeout,
            submitter.submit(target, message.raw.as_bytes()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::Timeout {
                after: self.submit_timeout,
            }),
        }
    }

    fn submitted(
        &self,
        message: &RelayMessage,
        direction: Direction,
        submitter: &dyn Submitter,
        tx: TransactionId,
    ) -> HandleOutcome {
        tracing::info!(
            parent: &self.span,
            key = message.key.short(),
            direction = %direction,
            submitter = submitter.name(),
            tx = %tx,
            "VAA submitted"
        );
        HandleOutcome::Submitted {
            direction,
            submitter: submitter.name(),
            tx,
        }
    }
}
