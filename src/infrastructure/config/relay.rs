//! Relay loop tuning: dedupe retention, reconnection and submission bounds.

use std::time::Duration;

use serde::Deserialize;

/// Relay runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// How long a successfully relayed VAA is remembered (seconds).
    #[serde(default = "default_dedupe_ttl_secs")]
    pub dedupe_ttl_secs: u64,
    /// Connect+subscribe attempts before the feed is declared lost.
    #[serde(default = "default_reconnect_retries")]
    pub reconnect_retries: u32,
    /// Fixed delay between reconnect attempts (milliseconds).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Pause after a receive error before resubscribing (milliseconds).
    #[serde(default = "default_resubscribe_delay_ms")]
    pub resubscribe_delay_ms: u64,
    /// Bound on each submission attempt (seconds).
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
    /// Bound on each startup health check (seconds).
    #[serde(default = "default_health_check_timeout_secs")]
    pub health_check_timeout_secs: u64,
}

fn default_dedupe_ttl_secs() -> u64 {
    900 // 15 minutes
}

fn default_reconnect_retries() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_resubscribe_delay_ms() -> u64 {
    5000
}

fn default_submit_timeout_secs() -> u64 {
    60
}

fn default_health_check_timeout_secs() -> u64 {
    10
}

impl RelayConfig {
    #[must_use]
    pub const fn dedupe_ttl(&self) -> Duration {
        Duration::from_secs(self.dedupe_ttl_secs)
    }

    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    #[must_use]
    pub const fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }

    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    #[must_use]
    pub const fn health_check_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            dedupe_ttl_secs: default_dedupe_ttl_secs(),
            reconnect_retries: default_reconnect_retries(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            resubscribe_delay_ms: default_resubscribe_delay_ms(),
            submit_timeout_secs: default_submit_timeout_secs(),
            health_check_timeout_secs: default_health_check_timeout_secs(),
        }
    }
}
