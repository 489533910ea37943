use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors produced while decoding a VAA envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("VAA is truncated: needed {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unsupported VAA version {0}")]
    UnsupportedVersion(u8),
}

/// Per-message submission failures.
///
/// None of these are fatal: the message is released in the dedupe store and
/// becomes eligible for redelivery from the feed.
#[derive(Error, Debug, Clone)]
pub enum SubmissionError {
    #[error("submission timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("submission cancelled: relayer is draining")]
    Cancelled,

    #[error("submission rejected by {submitter}: {reason}")]
    Rejected {
        submitter: &'static str,
        reason: String,
    },

    #[error("transport error from {submitter}: {reason}")]
    Transport {
        submitter: &'static str,
        reason: String,
    },

    #[error("invalid submission input: {0}")]
    InvalidInput(String),
}

impl SubmissionError {
    /// True when the failure came from the relayer's own cancellation or
    /// deadline rather than from the destination.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to subscribe after {attempts} attempts: {last_error}")]
    ResubscribeExhausted { attempts: u32, last_error: String },

    #[error("operation cancelled by shutdown")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resubscribe_exhausted_message() {
        let err = Error::ResubscribeExhausted {
            attempts: 5,
            last_error: "refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to subscribe after 5 attempts: refused"
        );
    }

    #[test]
    fn config_errors_pass_through_unwrapped() {
        let err = Error::from(ConfigError::MissingField {
            field: "PRIVATE_KEY",
        });
        assert_eq!(err.to_string(), "missing required field: PRIVATE_KEY");
    }

    #[test]
    fn submission_interrupted_variants() {
        assert!(SubmissionError::Cancelled.is_interrupted());
        assert!(SubmissionError::Timeout {
            after: Duration::from_secs(60)
        }
        .is_interrupted());
        assert!(!SubmissionError::Rejected {
            submitter: "verifier",
            reason: "bad vaa".into()
        }
        .is_interrupted());
    }
}
