//! Aztec PXE JSON-RPC submitter.
//!
//! Fallback path for reverse relays. The target contract takes the VAA as a
//! fixed 2000-element byte array plus its real length, so the raw bytes are
//! right-padded with zeros before submission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::Span;

use crate::domain::TransactionId;
use crate::error::{Error, Result, SubmissionError};
use crate::port::Submitter;

const NAME: &str = "aztec-pxe";

/// Width of the VAA argument of `verify_vaa`.
pub const PADDED_VAA_LEN: usize = 2000;

/// Contract function receiving the VAA.
const VERIFY_FUNCTION: &str = "verify_vaa";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Failure of a single JSON-RPC call.
#[derive(Debug)]
enum RpcFailure {
    /// The request never produced a JSON-RPC response.
    Transport(String),
    /// The node answered with an error object.
    Rpc { code: i64, message: String },
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(reason) => write!(f, "{reason}"),
            Self::Rpc { code, message } => write!(f, "rpc error {code}: {message}"),
        }
    }
}

/// Right-pad `raw` to [`PADDED_VAA_LEN`] as a JSON integer array.
///
/// # Errors
///
/// Returns [`SubmissionError::InvalidInput`] if `raw` does not fit.
pub fn pad_vaa(raw: &[u8]) -> std::result::Result<Vec<u8>, SubmissionError> {
    if raw.len() > PADDED_VAA_LEN {
        return Err(SubmissionError::InvalidInput(format!(
            "VAA is {} bytes, maximum is {PADDED_VAA_LEN}",
            raw.len()
        )));
    }
    let mut padded = raw.to_vec();
    padded.resize(PADDED_VAA_LEN, 0);
    Ok(padded)
}

/// Pull a transaction id out of a `pxe_sendTransaction` result.
fn extract_tx_id(result: &Value) -> Option<String> {
    match result {
        Value::String(hash) => Some(hash.clone()),
        Value::Object(map) => ["txHash", "hash"]
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// [`Submitter`] that calls `verify_vaa` through a PXE node.
pub struct AztecPxeSubmitter {
    client: Client,
    url: String,
    wallet_address: String,
    next_id: AtomicU64,
    span: Span,
}

impl AztecPxeSubmitter {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: &str, wallet_address: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.to_string(),
            wallet_address: wallet_address.to_string(),
            next_id: AtomicU64::new(1),
            span: tracing::info_span!("relay", component = "aztec-pxe"),
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn call(&self, method: &str, params: Value) -> std::result::Result<Value, RpcFailure> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = response.error {
            return Err(RpcFailure::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn verify_params(&self, target: &str, raw: &[u8]) -> std::result::Result<Value, SubmissionError> {
        let padded = pad_vaa(raw)?;
        Ok(json!([{
            "contractAddress": target,
            "functionName": VERIFY_FUNCTION,
            "args": [padded, raw.len()],
            "origin": self.wallet_address,
        }]))
    }
}

#[async_trait]
impl Submitter for AztecPxeSubmitter {
    async fn submit(&self, target: &str, raw: &[u8]) -> std::result::Result<TransactionId, SubmissionError> {
        let params = self.verify_params(target, raw)?;
        tracing::debug!(
            parent: &self.span,
            contract = target,
            actual_len = raw.len(),
            padded_len = PADDED_VAA_LEN,
            "Calling verify_vaa via PXE"
        );

        match self.call("pxe_simulateTransaction", params.clone()).await {
            Ok(result) => {
                tracing::debug!(parent: &self.span, result = %result, "Simulation succeeded");
            }
            Err(error) => {
                tracing::warn!(parent: &self.span, error = %error, "Simulation failed, sending anyway");
            }
        }

        let result = self
            .call("pxe_sendTransaction", params)
            .await
            .map_err(|error| match error {
                RpcFailure::Transport(reason) => SubmissionError::Transport {
                    submitter: NAME,
                    reason,
                },
                rpc @ RpcFailure::Rpc { .. } => SubmissionError::Rejected {
                    submitter: NAME,
                    reason: rpc.to_string(),
                },
            })?;

        let tx = extract_tx_id(&result).unwrap_or_else(|| {
            tracing::debug!(parent: &self.span, result = %result, "PXE result carried no hash");
            format!("tx_submitted_{}", chrono::Utc::now().timestamp())
        });
        Ok(TransactionId::new(tx))
    }

    /// Any JSON-RPC answer, including an error object, proves the node is up.
    async fn check_health(&self) -> Result<()> {
        match self.call("node_getBlock", json!([1])).await {
            Ok(_) => Ok(()),
            Err(RpcFailure::Rpc { code, message }) => {
                tracing::debug!(parent: &self.span, code, message = %message, "node_getBlock returned an error");
                Ok(())
            }
            Err(RpcFailure::Transport(reason)) => Err(Error::Connection(format!(
                "PXE unreachable at {}: {reason}",
                self.url
            ))),
        }
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::http::HttpStub;

    fn submitter(url: &str) -> AztecPxeSubmitter {
        AztecPxeSubmitter::new(url, "0xwallet", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn pads_to_fixed_width() {
        let padded = pad_vaa(&[7, 8, 9]).unwrap();
        assert_eq!(padded.len(), PADDED_VAA_LEN);
        assert_eq!(&padded[..3], &[7, 8, 9]);
        assert!(padded[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn rejects_oversized_vaa() {
        assert!(matches!(
            pad_vaa(&vec![1; PADDED_VAA_LEN + 1]),
            Err(SubmissionError::InvalidInput(_))
        ));
        assert!(pad_vaa(&vec![1; PADDED_VAA_LEN]).is_ok());
    }

    #[test]
    fn extracts_tx_id_variants() {
        assert_eq!(extract_tx_id(&json!({"txHash": "0x1"})), Some("0x1".into()));
        assert_eq!(extract_tx_id(&json!({"hash": "0x2"})), Some("0x2".into()));
        assert_eq!(extract_tx_id(&json!("0x3")), Some("0x3".into()));
        assert_eq!(extract_tx_id(&json!({"status": "ok"})), None);
        assert_eq!(extract_tx_id(&Value::Null), None);
    }

    #[tokio::test]
    async fn submit_ignores_failed_simulation() {
        let stub = HttpStub::start(vec![
            (
                200,
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#
                    .to_string(),
            ),
            (
                200,
                r#"{"jsonrpc":"2.0","id":2,"result":{"txHash":"0xaztec"}}"#.to_string(),
            ),
        ])
        .await;

        let tx = submitter(stub.url())
            .submit("0xcontract", &[1, 2, 3])
            .await
            .unwrap();

        assert_eq!(tx.as_str(), "0xaztec");
        let requests = stub.requests();
        assert_eq!(requests.len(), 2);

        let send: Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(send["method"], "pxe_sendTransaction");
        let call = &send["params"][0];
        assert_eq!(call["contractAddress"], "0xcontract");
        assert_eq!(call["functionName"], "verify_vaa");
        assert_eq!(call["origin"], "0xwallet");
        assert_eq!(call["args"][0].as_array().unwrap().len(), PADDED_VAA_LEN);
        assert_eq!(call["args"][1], 3);
    }

    #[tokio::test]
    async fn send_error_is_rejected() {
        let stub = HttpStub::start(vec![
            (200, r#"{"jsonrpc":"2.0","id":1,"result":null}"#.to_string()),
            (
                200,
                r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32000,"message":"reverted"}}"#
                    .to_string(),
            ),
        ])
        .await;

        let err = submitter(stub.url())
            .submit("0xcontract", &[1])
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Rejected { submitter: "aztec-pxe", .. }));
    }

    #[tokio::test]
    async fn missing_hash_yields_placeholder() {
        let stub = HttpStub::start(vec![
            (200, r#"{"jsonrpc":"2.0","id":1,"result":null}"#.to_string()),
            (200, r#"{"jsonrpc":"2.0","id":2,"result":{"ok":true}}"#.to_string()),
        ])
        .await;

        let tx = submitter(stub.url()).submit("0xc", &[1]).await.unwrap();
        assert!(tx.as_str().starts_with("tx_submitted_"));
    }

    #[tokio::test]
    async fn health_accepts_rpc_error() {
        let stub = HttpStub::start(vec![(
            200,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"block not found"}}"#
                .to_string(),
        )])
        .await;

        submitter(stub.url()).check_health().await.unwrap();
        let body: Value = serde_json::from_str(&stub.requests()[0].body).unwrap();
        assert_eq!(body["method"], "node_getBlock");
        assert_eq!(body["params"], json!([1]));
    }

    #[tokio::test]
    async fn health_fails_when_unreachable() {
        let url = HttpStub::unreachable_url().await;
        assert!(matches!(
            submitter(&url).check_health().await,
            Err(Error::Connection(_))
        ));
    }
}
