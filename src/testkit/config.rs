//! Canonical test configurations.
//!
//! Single source of truth for relay settings used across tests.

use crate::infrastructure::config::relay::RelayConfig;

/// Relay config with zero delays and a single-digit retry budget.
pub fn relay() -> RelayConfig {
    RelayConfig {
        dedupe_ttl_secs: 900,
        reconnect_retries: 5,
        reconnect_delay_ms: 0,
        resubscribe_delay_ms: 0,
        submit_timeout_secs: 5,
        health_check_timeout_secs: 1,
    }
}
