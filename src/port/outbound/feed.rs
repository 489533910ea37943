//! Feed port for signed-VAA subscriptions.
//!
//! The feed is the trusted upstream that verifies guardian signatures and
//! broadcasts every signed VAA it observes. Delivery is at-least-once: the
//! same bytes may arrive any number of times.

use async_trait::async_trait;

use crate::domain::RawMessage;
use crate::error::Result;

/// A live subscription to the signed-VAA feed.
///
/// The lifecycle is `connect` → `subscribe` → repeated `next_message`. After
/// `next_message` returns an error the session is considered dead; callers
/// obtain a fresh one by calling `connect` and `subscribe` again.
#[async_trait]
pub trait VaaStream: Send {
    /// Dial the feed endpoint, replacing any previous session.
    async fn connect(&mut self) -> Result<()>;

    /// Request the signed-VAA subscription on the current session.
    async fn subscribe(&mut self) -> Result<()>;

    /// Wait for the next raw VAA.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport fails, the server closes the
    /// session, or the stream ends.
    async fn next_message(&mut self) -> Result<RawMessage>;

    /// Return the feed name for logging.
    fn feed_name(&self) -> &'static str;
}
