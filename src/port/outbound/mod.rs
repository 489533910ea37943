//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the signed-VAA feed and the destination-chain
//! submitters.

pub mod feed;
pub mod submitter;
