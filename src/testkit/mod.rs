//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] - Mock [`VaaStream`](crate::port::VaaStream) implementations:
//!   `ScriptedStream`, `ChannelStream`.
//! - [`submitter`] - Fake submitters: `RecordingSubmitter`, `BlockingSubmitter`.
//! - [`vaa`] - `VaaBuilder` for raw envelopes.
//! - [`http`] - Scripted HTTP server for the HTTP-based submitters.
//! - [`spy`] - Loopback spy gRPC server: `SpyServer`, `SpySession`.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod feed;
pub mod http;
pub mod spy;
pub mod submitter;
pub mod vaa;
