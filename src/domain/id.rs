//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-derived identity of a raw message.
///
/// The key is the hex-encoded SHA-256 of the exact bytes delivered by the
/// feed. Two deliveries share a key only if they are byte-identical; the
/// logical `(chain, emitter, sequence)` identity is deliberately not used.
/// Keys are only built by [`MessageKey::compute`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey(String);

impl MessageKey {
    /// Compute the key for a raw message.
    #[must_use]
    pub fn compute(raw: &[u8]) -> Self {
        let digest = Sha256::digest(raw);
        Self(hex::encode(digest))
    }

    /// Get the key as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier returned by a destination submitter.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new `TransactionId` from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the transaction ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
