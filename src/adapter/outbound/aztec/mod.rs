//! Aztec destination adapter.

pub mod pxe;

pub use pxe::AztecPxeSubmitter;
