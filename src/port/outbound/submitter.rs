//! Submitter port for delivering a VAA to a destination chain.

use async_trait::async_trait;

use crate::domain::TransactionId;
use crate::error::{self, SubmissionError};

/// Delivers a signed VAA to a destination contract.
///
/// Implementations own every chain-specific concern: encoding, fees,
/// signing and network I/O. Submissions are NOT assumed idempotent; the
/// caller is responsible for never submitting the same bytes concurrently.
///
/// Cancellation is by dropping the returned future, so callers bound each
/// call with a timeout.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit `raw` to `target`.
    ///
    /// `target` is the destination contract identifier; submitters whose
    /// target is fixed by their endpoint may ignore it.
    async fn submit(&self, target: &str, raw: &[u8]) -> Result<TransactionId, SubmissionError>;

    /// Check the destination is reachable at startup.
    async fn check_health(&self) -> error::Result<()> {
        Ok(())
    }

    /// Return the submitter name for logging.
    fn name(&self) -> &'static str;
}
