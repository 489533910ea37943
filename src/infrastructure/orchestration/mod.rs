//! Relay orchestration: main loop, per-message tasks and counters.

pub mod relayer;
pub mod stats;
pub mod task;

pub use relayer::{RelayState, Relayer, RelayerBuilder};
pub use stats::{RelayStats, RelayStatsSnapshot};
pub use task::CompletionGuard;
