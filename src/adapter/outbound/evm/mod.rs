//! EVM destination adapter (forward path).

pub mod submitter;

pub use submitter::{EvmSubmitter, FeeQuote};
