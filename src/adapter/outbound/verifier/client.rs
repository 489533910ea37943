//! Verification service client.
//!
//! Primary path for reverse relays: the service verifies the VAA and submits
//! it to the destination contract on our behalf.
//!
//! ```text
//! POST {base}/verify   {"vaaBytes":"0x.."}  ->  {"success":bool,"txHash":"..","error":".."}
//! GET  {base}/health                        ->  200
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::domain::TransactionId;
use crate::error::{Error, Result, SubmissionError};
use crate::port::Submitter;

const NAME: &str = "verifier";

/// Default HTTP timeout for verification requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct VerifyRequest {
    #[serde(rename = "vaaBytes")]
    vaa_bytes: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(rename = "txHash", default)]
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// [`Submitter`] backed by the verification service.
#[derive(Debug, Clone)]
pub struct VerificationServiceSubmitter {
    client: Client,
    base_url: String,
    span: Span,
}

impl VerificationServiceSubmitter {
    /// Create a client for `base_url`; a trailing slash is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            span: tracing::info_span!("relay", component = "verifier"),
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport(error: impl std::fmt::Display) -> SubmissionError {
        SubmissionError::Transport {
            submitter: NAME,
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl Submitter for VerificationServiceSubmitter {
    /// The service owns its destination contract, so `target` is unused.
    async fn submit(&self, _target: &str, raw: &[u8]) -> std::result::Result<TransactionId, SubmissionError> {
        let request = VerifyRequest {
            vaa_bytes: format!("0x{}", hex::encode(raw)),
        };
        tracing::debug!(
            parent: &self.span,
            len = raw.len(),
            "Posting VAA to verification service"
        );

        let response = self
            .client
            .post(format!("{}/verify", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        tracing::debug!(parent: &self.span, status = %status, "Verification service responded");
        let body: VerifyResponse = response.json().await.map_err(|e| {
            Self::transport(format!("unreadable response (status {status}): {e}"))
        })?;

        if !body.success {
            return Err(SubmissionError::Rejected {
                submitter: NAME,
                reason: body
                    .error
                    .unwrap_or_else(|| "verification failed".to_string()),
            });
        }

        Ok(TransactionId::new(
            body.tx_hash.unwrap_or_else(|| "unknown".to_string()),
        ))
    }

    async fn check_health(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        tracing::debug!(
            parent: &self.span,
            status = %response.status(),
            "Verification service health"
        );
        if response.status() != StatusCode::OK {
            return Err(Error::Connection(format!(
                "verification service unhealthy: status {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::http::HttpStub;

    fn client(url: &str) -> VerificationServiceSubmitter {
        VerificationServiceSubmitter::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn trims_trailing_slash() {
        assert_eq!(client("http://svc:8080/").base_url(), "http://svc:8080");
    }

    #[test]
    fn events_attach_to_component_span() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());

        let default = client("http://svc:8080");
        assert_eq!(default.span.metadata().map(|m| m.name()), Some("relay"));

        let custom = tracing::info_span!("relay", component = "verifier-standby");
        let submitter = default.with_span(custom.clone());
        assert!(submitter.span.id().is_some());
        assert_eq!(submitter.span.id(), custom.id());
    }

    #[tokio::test]
    async fn posts_hex_and_returns_tx_hash() {
        let stub = HttpStub::start(vec![(
            200,
            r#"{"success":true,"txHash":"0xfeed"}"#.to_string(),
        )])
        .await;

        let tx = client(stub.url()).submit("ignored", &[0x01, 0xab]).await.unwrap();

        assert_eq!(tx.as_str(), "0xfeed");
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/verify");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["vaaBytes"], "0x01ab");
    }

    #[tokio::test]
    async fn unsuccessful_response_is_rejected() {
        let stub = HttpStub::start(vec![(
            500,
            r#"{"success":false,"error":"guardian set expired"}"#.to_string(),
        )])
        .await;

        let err = client(stub.url()).submit("", &[1]).await.unwrap_err();

        match err {
            SubmissionError::Rejected { submitter, reason } => {
                assert_eq!(submitter, "verifier");
                assert_eq!(reason, "guardian set expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let url = HttpStub::unreachable_url().await;
        let err = client(&url).submit("", &[1]).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Transport { .. }));
    }

    #[tokio::test]
    async fn health_requires_ok_status() {
        let stub = HttpStub::start(vec![
            (200, "{}".to_string()),
            (503, "{}".to_string()),
        ])
        .await;
        let verifier = client(stub.url());

        assert!(verifier.check_health().await.is_ok());
        assert!(matches!(
            verifier.check_health().await,
            Err(Error::Connection(_))
        ));
        assert_eq!(stub.requests()[0].path, "/health");
    }
}
