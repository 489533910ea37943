//! Guardian spy feed adapter.

pub mod dto;
pub mod stream;

pub use stream::SpyStream;
