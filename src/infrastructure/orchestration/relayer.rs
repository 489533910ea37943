//! Relay runtime: pull, dedupe, dispatch, drain.
//!
//! The main loop is a single `select!` over the shutdown signal, the next
//! feed message, and completed tasks. Each admitted message runs on its own
//! task in a [`JoinSet`]; shutdown stops intake, cancels the processing scope
//! and waits for every dispatched task before returning.
//!
//! ```text
//! Running ──shutdown──▶ Draining ──all tasks joined──▶ Stopped
//!    │                      ▲
//!    └──feed lost for good──┘ (returns the fatal error after draining)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::Span;

use super::stats::{RelayStats, RelayStatsSnapshot};
use super::task::{process_message, CompletionGuard, TaskContext};
use crate::application::{DedupStore, RoutingHandler, SubmissionRouter};
use crate::domain::RawMessage;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::relay::RelayConfig;
use crate::infrastructure::feed::{ReconnectPolicy, ReconnectingFeed};
use crate::infrastructure::shutdown;
use crate::port::{MessageHandler, ProcessingScope, VaaStream};

/// Lifecycle phase of a [`Relayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Running,
    Draining,
    Stopped,
}

/// Message-ingestion orchestrator for one feed.
pub struct Relayer<S: VaaStream> {
    feed: ReconnectingFeed<S>,
    dedup: Arc<DedupStore>,
    handler: Arc<dyn MessageHandler>,
    stats: Arc<RelayStats>,
    resubscribe_delay: Duration,
    state: watch::Sender<RelayState>,
    span: Span,
}

impl<S: VaaStream> Relayer<S> {
    /// Start configuring a relayer around `stream`.
    pub fn builder(stream: S) -> RelayerBuilder<S> {
        RelayerBuilder::new(stream)
    }

    #[must_use]
    pub fn dedup(&self) -> Arc<DedupStore> {
        Arc::clone(&self.dedup)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Observe lifecycle transitions.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<RelayState> {
        self.state.subscribe()
    }

    /// Run until shutdown or an unrecoverable feed failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResubscribeExhausted`] when the feed cannot be
    /// (re)established. In-flight work is drained first.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(
            parent: &self.span,
            feed = self.feed.feed_name(),
            dedupe_ttl_secs = self.dedup.ttl().as_secs(),
            "Starting relayer"
        );

        match self.feed.resubscribe(&mut shutdown).await {
            Ok(()) => {}
            Err(Error::Cancelled) => {
                tracing::info!(parent: &self.span, "Shutdown before feed subscription");
                self.state.send_replace(RelayState::Stopped);
                return Ok(());
            }
            Err(error) => {
                self.state.send_replace(RelayState::Stopped);
                return Err(error);
            }
        }

        let (cancel, scope) = ProcessingScope::channel();
        let mut tasks = JoinSet::new();
        let ctx = TaskContext {
            handler: Arc::clone(&self.handler),
            stats: Arc::clone(&self.stats),
            span: self.span.clone(),
        };

        tracing::info!(parent: &self.span, "Listening for signed VAAs...");

        let outcome = loop {
            tokio::select! {
                biased;
                () = shutdown::requested(&mut shutdown) => {
                    tracing::info!(parent: &self.span, "Shutdown signal received");
                    break Ok(());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.reap(joined);
                }
                received = self.feed.next_message() => match received {
                    Ok(raw) => self.dispatch(raw, &ctx, &scope, &mut tasks),
                    Err(error) => {
                        self.stats.record_resubscribe();
                        tracing::warn!(
                            parent: &self.span,
                            error = %error,
                            delay_ms = self.resubscribe_delay.as_millis() as u64,
                            "Feed receive failed, resubscribing"
                        );
                        match self.recover(&mut shutdown).await {
                            Ok(()) => {}
                            Err(Error::Cancelled) => break Ok(()),
                            Err(error) => break Err(error),
                        }
                    }
                },
            }
        };

        self.drain(cancel, tasks).await;
        outcome
    }

    fn dispatch(
        &self,
        raw: RawMessage,
        ctx: &TaskContext,
        scope: &ProcessingScope,
        tasks: &mut JoinSet<()>,
    ) {
        self.stats.record_received();
        let key = raw.key();

        let admission = self.dedup.admit(&key);
        if !admission.is_admitted() {
            self.stats.record_duplicate();
            tracing::debug!(
                parent: &self.span,
                key = key.short(),
                reason = admission.as_str(),
                "Skipping duplicate VAA"
            );
            return;
        }

        self.stats.record_dispatched();
        tracing::debug!(
            parent: &self.span,
            key = key.short(),
            len = raw.len(),
            "Dispatching VAA"
        );

        let guard = CompletionGuard::new(Arc::clone(&self.dedup), key);
        tasks.spawn(process_message(ctx.clone(), guard, raw, scope.clone()));
    }

    fn reap(&self, joined: std::result::Result<(), JoinError>) {
        if let Err(error) = joined {
            self.stats.record_failed();
            if error.is_panic() {
                tracing::error!(parent: &self.span, error = %error, "Relay task panicked");
            } else {
                tracing::warn!(parent: &self.span, error = %error, "Relay task aborted");
            }
        }
    }

    async fn recover(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        tokio::select! {
            biased;
            () = shutdown::requested(shutdown) => return Err(Error::Cancelled),
            () = tokio::time::sleep(self.resubscribe_delay) => {}
        }
        self.feed.resubscribe(shutdown).await
    }

    async fn drain(&mut self, cancel: watch::Sender<bool>, mut tasks: JoinSet<()>) {
        self.state.send_replace(RelayState::Draining);
        let _ = cancel.send(true);

        tracing::info!(
            parent: &self.span,
            pending = tasks.len(),
            "Draining in-flight VAAs"
        );
        while let Some(joined) = tasks.join_next().await {
            self.reap(joined);
        }

        self.state.send_replace(RelayState::Stopped);
        let RelayStatsSnapshot {
            received,
            duplicates,
            dispatched,
            succeeded,
            failed,
            dropped,
            resubscribes,
        } = self.stats.snapshot();
        tracing::info!(
            parent: &self.span,
            received,
            duplicates,
            dispatched,
            succeeded,
            failed,
            dropped,
            resubscribes,
            "Relayer stopped"
        );
    }
}

/// Builder for [`Relayer`].
///
/// A relayer needs either a [`SubmissionRouter`] (wrapped in the default
/// [`RoutingHandler`]) or an explicit [`MessageHandler`]. An explicit handler
/// wins when both are set.
pub struct RelayerBuilder<S: VaaStream> {
    stream: S,
    policy: ReconnectPolicy,
    dedupe_ttl: Duration,
    resubscribe_delay: Duration,
    dedup: Option<Arc<DedupStore>>,
    router: Option<Arc<SubmissionRouter>>,
    handler: Option<Arc<dyn MessageHandler>>,
    span: Option<Span>,
}

impl<S: VaaStream> RelayerBuilder<S> {
    fn new(stream: S) -> Self {
        let defaults = RelayConfig::default();
        Self {
            stream,
            policy: ReconnectPolicy::from(&defaults),
            dedupe_ttl: defaults.dedupe_ttl(),
            resubscribe_delay: defaults.resubscribe_delay(),
            dedup: None,
            router: None,
            handler: None,
            span: None,
        }
    }

    /// Take retry, delay and TTL settings from `config`.
    #[must_use]
    pub fn relay_config(mut self, config: &RelayConfig) -> Self {
        self.policy = ReconnectPolicy::from(config);
        self.dedupe_ttl = config.dedupe_ttl();
        self.resubscribe_delay = config.resubscribe_delay();
        self
    }

    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn dedupe_ttl(mut self, ttl: Duration) -> Self {
        self.dedupe_ttl = ttl;
        self
    }

    #[must_use]
    pub fn resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    /// Share an existing dedupe store instead of creating one.
    #[must_use]
    pub fn dedup_store(mut self, dedup: Arc<DedupStore>) -> Self {
        self.dedup = Some(dedup);
        self
    }

    #[must_use]
    pub fn router(mut self, router: Arc<SubmissionRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Replace the default routing handler.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Parent span for the relayer and its feed.
    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Assemble the relayer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when neither a router nor a
    /// handler was provided.
    pub fn build(self) -> Result<Relayer<S>> {
        let handler: Arc<dyn MessageHandler> = match (self.handler, self.router) {
            (Some(handler), _) => handler,
            (None, Some(router)) => Arc::new(RoutingHandler::new(router)),
            (None, None) => {
                return Err(ConfigError::MissingField { field: "handler" }.into());
            }
        };

        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("relay", component = "relayer"));
        let feed = ReconnectingFeed::new(self.stream, self.policy).with_span(span.clone());
        let dedup = self
            .dedup
            .unwrap_or_else(|| Arc::new(DedupStore::new(self.dedupe_ttl)));
        let (state, _) = watch::channel(RelayState::Running);

        Ok(Relayer {
            feed,
            dedup,
            handler,
            stats: Arc::new(RelayStats::new()),
            resubscribe_delay: self.resubscribe_delay,
            state,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::feed::ScriptedStream;

    #[test]
    fn build_requires_router_or_handler() {
        let result = Relayer::builder(ScriptedStream::new()).build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "handler" }))
        ));
    }

    #[test]
    fn relay_config_sets_ttl() {
        let mut config = crate::testkit::config::relay();
        config.dedupe_ttl_secs = 42;
        let relayer = Relayer::builder(ScriptedStream::new())
            .relay_config(&config)
            .handler(Arc::new(NoopHandler))
            .build()
            .unwrap();
        assert_eq!(relayer.dedup().ttl(), Duration::from_secs(42));
        assert_eq!(*relayer.state().borrow(), RelayState::Running);
    }

    struct NoopHandler;

    #[async_trait::async_trait]
    impl MessageHandler for NoopHandler {
        async fn handle(
            &self,
            _message: &crate::domain::RelayMessage,
            _scope: &ProcessingScope,
        ) -> std::result::Result<crate::port::HandleOutcome, crate::error::SubmissionError>
        {
            Ok(crate::port::HandleOutcome::Skipped {
                reason: "noop".into(),
            })
        }
    }
}
