//! Destination chain settings for both relay directions.

use serde::Deserialize;

/// EVM destination for forward relays.
///
/// Private key is loaded from `PRIVATE_KEY` env var at runtime (never from config file).
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    /// JSON-RPC endpoint of the destination chain.
    #[serde(default = "default_forward_rpc_url")]
    pub rpc_url: String,
    /// Contract exposing `verify(bytes)`.
    #[serde(default)]
    pub target_contract: String,
    /// Gas limit for each `verify` transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// EIP-1559 priority fee in wei.
    #[serde(default = "default_priority_fee_wei")]
    pub priority_fee_wei: u64,
    #[serde(skip)]
    pub private_key: Option<String>,
}

fn default_forward_rpc_url() -> String {
    "https://sepolia-rollup.arbitrum.io/rpc".to_string()
}

fn default_gas_limit() -> u64 {
    3_000_000
}

fn default_priority_fee_wei() -> u64 {
    100_000_000 // 0.1 gwei
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_forward_rpc_url(),
            target_contract: String::new(),
            gas_limit: default_gas_limit(),
            priority_fee_wei: default_priority_fee_wei(),
            private_key: None,
        }
    }
}

/// Aztec destination for reverse relays.
#[derive(Debug, Clone, Deserialize)]
pub struct ReverseConfig {
    /// Base URL of the verification service (primary path).
    #[serde(default = "default_verification_service_url")]
    pub verification_service_url: String,
    /// PXE JSON-RPC endpoint (fallback path).
    #[serde(default = "default_pxe_url")]
    pub pxe_url: String,
    /// Account the PXE submits from.
    #[serde(default)]
    pub wallet_address: String,
    /// Contract receiving the VAA.
    #[serde(default)]
    pub target_contract: String,
}

fn default_verification_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_pxe_url() -> String {
    "http://localhost:8090".to_string()
}

impl Default for ReverseConfig {
    fn default() -> Self {
        Self {
            verification_service_url: default_verification_service_url(),
            pxe_url: default_pxe_url(),
            wallet_address: String::new(),
            target_contract: String::new(),
        }
    }
}
