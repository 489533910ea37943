//! Messages as they move through the relay pipeline.

use super::id::MessageKey;
use super::vaa::DecodedEvent;

/// Opaque bytes received from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage(Vec<u8>);

impl RawMessage {
    /// Wrap bytes delivered by the feed.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Content-derived dedupe key.
    #[must_use]
    pub fn key(&self) -> MessageKey {
        MessageKey::compute(&self.0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// An admitted, decoded message handed to a [`MessageHandler`].
///
/// [`MessageHandler`]: crate::port::inbound::handler::MessageHandler
#[derive(Debug, Clone)]
pub struct RelayMessage {
    /// Dedupe key of `raw`.
    pub key: MessageKey,
    /// Exact bytes to submit downstream.
    pub raw: RawMessage,
    /// Decoded envelope fields.
    pub event: DecodedEvent,
}
