//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the relay core and the outside world.
//!
//! ```text
//!                 ┌───────────────────────────┐
//!   VaaStream ───▶│  Relayer (orchestration)  │───▶ MessageHandler
//!                 └───────────────────────────┘           │
//!                                                         ▼
//!                                                    Submitter(s)
//! ```
//!
//! # Available Ports
//!
//! - [`VaaStream`] - Signed-VAA feed subscription
//! - [`Submitter`] - Destination-chain delivery
//! - [`MessageHandler`] - Per-message processing capability

pub mod inbound;
pub mod outbound;

pub use inbound::handler::{HandleOutcome, MessageHandler, ProcessingScope};
pub use outbound::feed::VaaStream;
pub use outbound::submitter::Submitter;
