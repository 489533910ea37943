//! Infrastructure configuration modules.

pub mod destination;
pub mod logging;
pub mod relay;
pub mod settings;
