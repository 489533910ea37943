//! Inbound (driving) ports consumed by the relay runtime.
//!
//! - [`handler`]: Per-message processing capability and its cancellation scope
//!
//! [`handler`]: self::handler

pub mod handler;
