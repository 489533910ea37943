//! Reconnecting wrapper for [`VaaStream`].
//!
//! Re-establishes the feed subscription with a bounded number of attempts
//! separated by a fixed delay. Each attempt re-dials and then re-subscribes.
//! A shutdown request aborts the sequence immediately instead of burning the
//! remaining attempts.

use std::time::Duration;

use tokio::sync::watch;
use tracing::Span;

use crate::domain::RawMessage;
use crate::error::{Error, Result};
use crate::infrastructure::config::relay::RelayConfig;
use crate::infrastructure::shutdown;
use crate::port::VaaStream;

/// Attempt budget for (re)subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl ReconnectPolicy {
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl From<&RelayConfig> for ReconnectPolicy {
    fn from(config: &RelayConfig) -> Self {
        Self::new(config.reconnect_retries, config.reconnect_delay())
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

/// Wrapper that adds bounded resubscription to any [`VaaStream`].
pub struct ReconnectingFeed<S: VaaStream> {
    inner: S,
    policy: ReconnectPolicy,
    span: Span,
}

impl<S: VaaStream> ReconnectingFeed<S> {
    pub fn new(inner: S, policy: ReconnectPolicy) -> Self {
        Self {
            inner,
            policy,
            span: tracing::info_span!("relay", component = "feed"),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Connect and subscribe, retrying per the policy.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] when shutdown is requested before or between
    ///   attempts, or while an attempt is in progress.
    /// - [`Error::ResubscribeExhausted`] when every attempt failed.
    pub async fn resubscribe(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let attempts = self.policy.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if shutdown::is_requested(shutdown) {
                return Err(Error::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                () = shutdown::requested(shutdown) => return Err(Error::Cancelled),
                outcome = Self::attempt(&mut self.inner) => outcome,
            };

            match outcome {
                Ok(()) => {
                    tracing::info!(
                        parent: &self.span,
                        feed = self.inner.feed_name(),
                        attempt,
                        "Subscribed to signed VAA feed"
                    );
                    return Ok(());
                }
                Err(error) => {
                    tracing::warn!(
                        parent: &self.span,
                        feed = self.inner.feed_name(),
                        attempt,
                        max_attempts = attempts,
                        error = %error,
                        "Subscription attempt failed"
                    );
                    last_error = error.to_string();
                }
            }

            if attempt < attempts {
                tokio::select! {
                    biased;
                    () = shutdown::requested(shutdown) => return Err(Error::Cancelled),
                    () = tokio::time::sleep(self.policy.delay) => {}
                }
            }
        }

        tracing::error!(
            parent: &self.span,
            feed = self.inner.feed_name(),
            attempts,
            error = %last_error,
            "Giving up on signed VAA feed"
        );
        Err(Error::ResubscribeExhausted {
            attempts,
            last_error,
        })
    }

    async fn attempt(inner: &mut S) -> Result<()> {
        inner.connect().await?;
        inner.subscribe().await
    }

    /// Wait for the next message on the current session.
    ///
    /// # Errors
    ///
    /// Propagates the inner stream's receive error; the session is dead
    /// afterwards until [`resubscribe`](Self::resubscribe) succeeds.
    pub async fn next_message(&mut self) -> Result<RawMessage> {
        self.inner.next_message().await
    }

    #[must_use]
    pub fn feed_name(&self) -> &'static str {
        self.inner.feed_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::feed::ScriptedStream;

    fn fast(attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(attempts, Duration::ZERO)
    }

    fn refused() -> Error {
        Error::Connection("connection refused".to_string())
    }

    #[test]
    fn default_policy_matches_relay_defaults() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let mock = ScriptedStream::new();
        let (connects, subscribes) = mock.counts();
        let (_tx, mut rx) = watch::channel(false);

        let mut feed = ReconnectingFeed::new(mock, fast(5));
        feed.resubscribe(&mut rx).await.unwrap();

        assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(subscribes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_final_attempt() {
        let mock = ScriptedStream::new()
            .with_connect_results(vec![Err(refused()), Err(refused()), Err(refused())])
            .with_subscribe_results(vec![Err(refused())]);
        let (connects, subscribes) = mock.counts();
        let (_tx, mut rx) = watch::channel(false);

        let mut feed = ReconnectingFeed::new(mock, fast(5));
        feed.resubscribe(&mut rx).await.unwrap();

        assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 5);
        assert_eq!(subscribes.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let mock = ScriptedStream::new().with_connect_results(
            (0..5)
                .map(|i| Err(Error::Connection(format!("refused {i}"))))
                .collect(),
        );
        let (_tx, mut rx) = watch::channel(false);

        let mut feed = ReconnectingFeed::new(mock, fast(5));
        let err = feed.resubscribe(&mut rx).await.unwrap_err();

        match err {
            Error::ResubscribeExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 5);
                assert!(last_error.contains("refused 4"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_before_first_attempt_cancels() {
        let mock = ScriptedStream::new();
        let (connects, _) = mock.counts();
        let (_tx, mut rx) = watch::channel(true);

        let mut feed = ReconnectingFeed::new(mock, fast(5));
        let err = feed.resubscribe(&mut rx).await.unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_during_delay_cancels() {
        let mock = ScriptedStream::new()
            .with_connect_results((0..5).map(|_| Err(refused())).collect());
        let (connects, _) = mock.counts();
        let (tx, mut rx) = watch::channel(false);

        let mut feed = ReconnectingFeed::new(mock, ReconnectPolicy::new(5, Duration::from_secs(30)));
        let task = tokio::spawn(async move { feed.resubscribe(&mut rx).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let err = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("resubscribe should stop promptly")
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn feed_name_delegates_to_inner() {
        let feed = ReconnectingFeed::new(ScriptedStream::new(), fast(1));
        assert_eq!(feed.feed_name(), "scripted");
    }
}
