//! EVM submitter for forward relays.
//!
//! Calls `verify(bytes)` on the destination contract with an EIP-1559
//! transaction. Returns once the transaction is accepted by the node; the
//! receipt is not awaited. One provider is built per submitter and nonces
//! are cached locally across submissions.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes};
use alloy_provider::network::EthereumWallet;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use async_trait::async_trait;
use tracing::Span;

use crate::domain::TransactionId;
use crate::error::{ConfigError, Error, Result, SubmissionError};
use crate::infrastructure::config::destination::ForwardConfig;
use crate::port::Submitter;

const NAME: &str = "evm";

sol! {
    #[sol(rpc)]
    contract IWormholeReceiver {
        function verify(bytes encodedVm) external;
    }
}

/// Fee parameters for one transaction, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeQuote {
    /// Headroom of twice the latest base fee plus the tip.
    #[must_use]
    pub const fn from_base_fee(base_fee: u128, priority_fee: u128) -> Self {
        Self {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// [`Submitter`] signing `verify` transactions with a local key.
pub struct EvmSubmitter {
    address: Address,
    provider: DynProvider,
    rpc_url: url::Url,
    gas_limit: u64,
    priority_fee_wei: u128,
    span: Span,
}

impl EvmSubmitter {
    /// Build from forward-path configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the private key is absent or malformed, or
    /// if the RPC URL does not parse.
    pub fn new(config: &ForwardConfig) -> Result<Self> {
        let key = config
            .private_key
            .as_deref()
            .ok_or(ConfigError::MissingField {
                field: "PRIVATE_KEY",
            })?;
        let signer = PrivateKeySigner::from_str(key).map_err(|e| ConfigError::InvalidValue {
            field: "PRIVATE_KEY",
            reason: e.to_string(),
        })?;
        let rpc_url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ConfigError::InvalidValue {
                field: "forward.rpc_url",
                reason: e.to_string(),
            })?;

        let address = signer.address();
        // Gas and fees are set per transaction; only nonce and chain id are filled.
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .with_cached_nonce_management()
            .fetch_chain_id()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url.clone())
            .erased();

        Ok(Self {
            address,
            provider,
            rpc_url,
            gas_limit: config.gas_limit,
            priority_fee_wei: u128::from(config.priority_fee_wei),
            span: tracing::info_span!("relay", component = "evm"),
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Address transactions are sent from.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    fn transport(reason: impl std::fmt::Display) -> SubmissionError {
        SubmissionError::Transport {
            submitter: NAME,
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Submitter for EvmSubmitter {
    async fn submit(
        &self,
        target: &str,
        raw: &[u8],
    ) -> std::result::Result<TransactionId, SubmissionError> {
        let contract_address = Address::from_str(target).map_err(|e| {
            SubmissionError::InvalidInput(format!("invalid contract address {target}: {e}"))
        })?;

        let provider = &self.provider;
        let latest = provider
            .get_block_number()
            .await
            .map_err(|e| Self::transport(format!("failed to fetch block number: {e}")))?;
        let block = provider
            .get_block_by_number(latest.into())
            .await
            .map_err(|e| Self::transport(format!("failed to fetch block {latest}: {e}")))?;
        let base_fee = match block.and_then(|block| block.header.base_fee_per_gas) {
            Some(fee) => u128::from(fee),
            // Pre-London or pruned header.
            None => provider
                .get_gas_price()
                .await
                .map_err(|e| Self::transport(format!("failed to fetch gas price: {e}")))?,
        };
        let fees = FeeQuote::from_base_fee(base_fee, self.priority_fee_wei);

        tracing::debug!(
            parent: &self.span,
            contract = %contract_address,
            gas_limit = self.gas_limit,
            base_fee,
            max_fee_per_gas = fees.max_fee_per_gas,
            len = raw.len(),
            "Sending verify transaction"
        );

        let receiver = IWormholeReceiver::new(contract_address, provider);
        let pending = receiver
            .verify(Bytes::copy_from_slice(raw))
            .gas(self.gas_limit)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .send()
            .await
            .map_err(|e| Self::transport(format!("failed to send verify: {e}")))?;

        Ok(TransactionId::new(format!("{:?}", pending.tx_hash())))
    }

    async fn check_health(&self) -> Result<()> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| Error::Connection(format!("EVM RPC unreachable at {}: {e}", self.rpc_url)))?;
        tracing::debug!(parent: &self.span, chain_id, "EVM RPC reachable");
        Ok(())
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil's first default account.
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config(key: Option<&str>) -> ForwardConfig {
        ForwardConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            target_contract: "0x0000000000000000000000000000000000000001".to_string(),
            private_key: key.map(str::to_string),
            ..ForwardConfig::default()
        }
    }

    #[test]
    fn fee_quote_doubles_base_fee_plus_tip() {
        let quote = FeeQuote::from_base_fee(10, 3);
        assert_eq!(quote.max_fee_per_gas, 23);
        assert_eq!(quote.max_priority_fee_per_gas, 3);
        assert_eq!(
            FeeQuote::from_base_fee(u128::MAX, 1).max_fee_per_gas,
            u128::MAX
        );
    }

    #[test]
    fn derives_address_from_key() {
        let submitter = EvmSubmitter::new(&config(Some(TEST_KEY))).unwrap();
        assert_eq!(
            submitter.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert_eq!(submitter.name(), "evm");
    }

    #[test]
    fn provider_is_built_without_runtime_or_network() {
        let submitter = EvmSubmitter::new(&config(Some(TEST_KEY))).unwrap();
        assert_eq!(submitter.rpc_url.as_str(), "http://127.0.0.1:1/");
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = EvmSubmitter::new(&config(None)).err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "PRIVATE_KEY" })
        ));
    }

    #[test]
    fn malformed_key_is_config_error() {
        let err = EvmSubmitter::new(&config(Some("0xnothex"))).err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "PRIVATE_KEY", .. })
        ));
    }

    #[tokio::test]
    async fn invalid_target_rejected_before_network() {
        let submitter = EvmSubmitter::new(&config(Some(TEST_KEY))).unwrap();
        let err = submitter.submit("not-an-address", &[1, 2]).await.unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unreachable_rpc_is_transport_error() {
        let submitter = EvmSubmitter::new(&config(Some(TEST_KEY))).unwrap();
        let err = submitter
            .submit("0x0000000000000000000000000000000000000001", &[1])
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Transport { submitter: "evm", .. }));
        assert!(matches!(
            submitter.check_health().await,
            Err(Error::Connection(_))
        ));
    }
}
