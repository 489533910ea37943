//! Bidirectional relayer for guardian-signed cross-chain messages (VAAs).
//!
//! Subscribes to a spy feed of signed VAAs, deduplicates them, and submits
//! each one to the destination matching its emitter chain:
//!
//! - **forward** (source chain -> EVM): `verify(bytes)` on the target contract
//! - **reverse** (destination chain -> Aztec): verification service first,
//!   PXE JSON-RPC as fallback
//!
//! # Modules
//!
//! - [`domain`] - VAA envelope decoding, message keys, directions
//! - [`port`] - Trait seams: [`port::VaaStream`], [`port::Submitter`],
//!   [`port::MessageHandler`]
//! - [`application`] - Dedupe store and submission routing
//! - [`adapter`] - Spy gRPC client and destination submitters
//! - [`infrastructure`] - Config, feed recovery, relay loop, bootstrap
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `evm` (default) - Forward submission via alloy
//! - `testkit` - Test doubles for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
