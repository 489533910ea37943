//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all relayer settings.
//! Configuration is loaded from a TOML file; deployment environment variables
//! override individual values, and the signing key is only ever read from the
//! environment.
//!
//! # Example
//!
//! ```no_run
//! use vaa_relayer::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use super::destination::{ForwardConfig, ReverseConfig};
use super::logging::LoggingConfig;
use super::relay::RelayConfig;
use crate::error::{ConfigError, Result};

/// The two chains this relayer bridges.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainsConfig {
    /// VAAs emitted here travel forward.
    #[serde(default = "default_source_chain_id")]
    pub source_chain_id: u16,
    /// VAAs emitted here travel in reverse.
    #[serde(default = "default_dest_chain_id")]
    pub dest_chain_id: u16,
}

fn default_source_chain_id() -> u16 {
    56
}

fn default_dest_chain_id() -> u16 {
    10003
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            source_chain_id: default_source_chain_id(),
            dest_chain_id: default_dest_chain_id(),
        }
    }
}

/// Signed-VAA feed settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// gRPC endpoint of the spy feed.
    #[serde(default = "default_feed_endpoint")]
    pub endpoint: String,
}

fn default_feed_endpoint() -> String {
    "http://localhost:7073".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_feed_endpoint(),
        }
    }
}

/// Main relayer configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chains: ChainsConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Forward destination (EVM).
    #[serde(default)]
    pub forward: ForwardConfig,

    /// Reverse destination (verification service, then PXE).
    #[serde(default)]
    pub reverse: ReverseConfig,

    /// Dedupe, reconnection and timeout tuning.
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content, applying process environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - An override holds an unparseable value
    /// - Validation fails
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Parse configuration from TOML content with overrides drawn from `env`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::parse_toml`].
    pub fn parse_toml_with_env<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load configuration from a TOML file with overrides drawn from `env`.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_with_env<P, F>(path: P, env: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml_with_env(&content, env)
    }

    fn apply_env_overrides<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = var("SPY_RPC_HOST") {
            self.feed.endpoint = if host.contains("://") {
                host
            } else {
                format!("http://{host}")
            };
        }
        if let Some(value) = var("SOURCE_CHAIN_ID") {
            self.chains.source_chain_id = parse_env("SOURCE_CHAIN_ID", &value)?;
        }
        if let Some(value) = var("DEST_CHAIN_ID") {
            self.chains.dest_chain_id = parse_env("DEST_CHAIN_ID", &value)?;
        }
        if let Some(value) = var("ARBITRUM_RPC_URL") {
            self.forward.rpc_url = value;
        }
        if let Some(value) = var("ARBITRUM_TARGET_CONTRACT") {
            self.forward.target_contract = value;
        }
        if let Some(value) = var("VERIFICATION_SERVICE_URL") {
            self.reverse.verification_service_url = value;
        }
        if let Some(value) = var("AZTEC_PXE_URL") {
            self.reverse.pxe_url = value;
        }
        if let Some(value) = var("AZTEC_WALLET_ADDRESS") {
            self.reverse.wallet_address = value;
        }
        if let Some(value) = var("AZTEC_TARGET_CONTRACT") {
            self.reverse.target_contract = value;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }

        // Signing key from the environment only, never from the config file.
        self.forward.private_key = var("PRIVATE_KEY");

        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    fn validate(&self) -> Result<()> {
        if self.chains.source_chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "source_chain_id",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.chains.dest_chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dest_chain_id",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.chains.source_chain_id == self.chains.dest_chain_id {
            return Err(ConfigError::InvalidValue {
                field: "dest_chain_id",
                reason: "must differ from source_chain_id".to_string(),
            }
            .into());
        }

        require_url("endpoint", &self.feed.endpoint)?;
        require_url("rpc_url", &self.forward.rpc_url)?;
        require_url(
            "verification_service_url",
            &self.reverse.verification_service_url,
        )?;
        require_url("pxe_url", &self.reverse.pxe_url)?;

        if self.forward.target_contract.is_empty() {
            return Err(ConfigError::MissingField {
                field: "forward.target_contract",
            }
            .into());
        }
        if self.reverse.target_contract.is_empty() {
            return Err(ConfigError::MissingField {
                field: "reverse.target_contract",
            }
            .into());
        }
        if self.reverse.wallet_address.is_empty() {
            return Err(ConfigError::MissingField {
                field: "wallet_address",
            }
            .into());
        }
        if self.forward.private_key.is_none() {
            return Err(ConfigError::MissingField {
                field: "PRIVATE_KEY",
            }
            .into());
        }
        if self.forward.gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gas_limit",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.relay.reconnect_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect_retries",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.relay.dedupe_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dedupe_ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.relay.submit_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "submit_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.relay.health_check_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "health_check_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn parse_env<T>(field: &'static str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }
        .into()
    })
}

fn require_url(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[forward]
target_contract = "0x248EC2E5595480fF371031698ae3a4099b8dC229"

[reverse]
wallet_address = "0x1f3933ca4d66e948ace5f8339e5da687993b76ee57bcf65e82596e0fc10a8859"
target_contract = "0x2b13cff4daef709134419f1506ccae28956e02102a5ef5f2d0077e4991a9f493"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn with_key() -> impl Fn(&str) -> Option<String> {
        env(&[("PRIVATE_KEY", "0xabc")])
    }

    #[test]
    fn applies_defaults() {
        let config = Config::parse_toml_with_env(MINIMAL, with_key()).unwrap();

        assert_eq!(config.chains.source_chain_id, 56);
        assert_eq!(config.chains.dest_chain_id, 10003);
        assert_eq!(config.feed.endpoint, "http://localhost:7073");
        assert_eq!(config.forward.gas_limit, 3_000_000);
        assert_eq!(config.forward.priority_fee_wei, 100_000_000);
        assert_eq!(config.reverse.pxe_url, "http://localhost:8090");
        assert_eq!(config.relay.dedupe_ttl_secs, 900);
        assert_eq!(config.relay.reconnect_retries, 5);
        assert_eq!(config.relay.reconnect_delay_ms, 2000);
        assert_eq!(config.relay.resubscribe_delay_ms, 5000);
        assert_eq!(config.relay.submit_timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.forward.private_key.as_deref(), Some("0xabc"));
    }

    #[test]
    fn env_overrides_file_values() {
        let content = format!("{MINIMAL}\n[chains]\nsource_chain_id = 2\n");
        let config = Config::parse_toml_with_env(
            &content,
            env(&[
                ("PRIVATE_KEY", "0xabc"),
                ("SOURCE_CHAIN_ID", "6"),
                ("SPY_RPC_HOST", "spy:7073"),
                ("LOG_LEVEL", "debug"),
                ("AZTEC_PXE_URL", "http://pxe:8080"),
            ]),
        )
        .unwrap();

        assert_eq!(config.chains.source_chain_id, 6);
        assert_eq!(config.feed.endpoint, "http://spy:7073");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.reverse.pxe_url, "http://pxe:8080");
    }

    #[test]
    fn private_key_is_never_read_from_file() {
        let content = MINIMAL.replace(
            "[reverse]",
            "private_key = \"0xfromfile\"\n\n[reverse]",
        );
        let err = Config::parse_toml_with_env(&content, env(&[])).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "PRIVATE_KEY"
            })
        ));
    }

    #[test]
    fn rejects_unparseable_chain_override() {
        let err = Config::parse_toml_with_env(
            MINIMAL,
            env(&[("PRIVATE_KEY", "0xabc"), ("DEST_CHAIN_ID", "arbitrum")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "DEST_CHAIN_ID",
                ..
            })
        ));
    }

    #[test]
    fn rejects_identical_chains() {
        let content = format!("{MINIMAL}\n[chains]\nsource_chain_id = 7\ndest_chain_id = 7\n");
        let err = Config::parse_toml_with_env(&content, with_key()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "dest_chain_id",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_retries() {
        let content = format!("{MINIMAL}\n[relay]\nreconnect_retries = 0\n");
        let err = Config::parse_toml_with_env(&content, with_key()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "reconnect_retries",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_url() {
        let content = format!("{MINIMAL}\n[feed]\nendpoint = \"not a url\"\n");
        let err = Config::parse_toml_with_env(&content, with_key()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "endpoint",
                ..
            })
        ));
    }

    #[test]
    fn missing_target_contract() {
        let err = Config::parse_toml_with_env("", with_key()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "forward.target_contract"
            })
        ));
    }

    #[test]
    fn malformed_toml() {
        let err = Config::parse_toml_with_env("[chains", with_key()).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
