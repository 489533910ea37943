//! Verification service adapter.

pub mod client;

pub use client::VerificationServiceSubmitter;
