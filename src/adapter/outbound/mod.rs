//! Outbound adapters (driven side).
//!
//! - [`spy`] - gRPC client for the signed-VAA spy feed
//! - [`verifier`] - Verification service (reverse primary)
//! - [`aztec`] - Aztec PXE JSON-RPC (reverse fallback)
//! - [`evm`] - EVM `verify(bytes)` transactions (forward, `evm` feature)

pub mod aztec;
#[cfg(feature = "evm")]
pub mod evm;
pub mod spy;
pub mod verifier;
