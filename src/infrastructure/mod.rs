//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! relay logic: configuration, feed recovery, task supervision and wiring.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`feed`] - Reconnect policy around a [`VaaStream`](crate::port::VaaStream)
//! - [`orchestration`] - Relay loop, in-flight tasks and counters
//! - [`shutdown`] - Cooperative shutdown signal helpers

pub mod bootstrap;
pub mod config;
pub mod feed;
pub mod orchestration;
pub mod shutdown;
