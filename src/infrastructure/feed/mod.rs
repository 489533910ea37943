//! Feed resilience layered over a [`VaaStream`](crate::port::VaaStream).

pub mod reconnecting;

pub use reconnecting::{ReconnectPolicy, ReconnectingFeed};
