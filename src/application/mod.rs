//! Application services (use cases).
//!
//! These services hold the relay policy: which deliveries are admitted, and
//! where an admitted message is submitted.

pub mod dedup;
pub mod handler;
pub mod router;

pub use dedup::{Admission, DedupStore};
pub use handler::RoutingHandler;
pub use router::{ForwardRoute, ReverseRoute, Route, SubmissionRouter};
