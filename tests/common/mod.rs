#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use vaa_relayer::application::{ForwardRoute, ReverseRoute, SubmissionRouter};
use vaa_relayer::port::Submitter;

pub const SOURCE_CHAIN: u16 = 56;
pub const DEST_CHAIN: u16 = 10003;
pub const FORWARD_TARGET: &str = "0xforward";
pub const REVERSE_TARGET: &str = "0xreverse";

/// Router over the canonical chain pair.
pub fn router(
    forward: Arc<dyn Submitter>,
    primary: Arc<dyn Submitter>,
    secondary: Arc<dyn Submitter>,
) -> SubmissionRouter {
    SubmissionRouter::new(
        SOURCE_CHAIN,
        DEST_CHAIN,
        ForwardRoute {
            submitter: forward,
            target: FORWARD_TARGET.to_string(),
        },
        ReverseRoute {
            primary,
            secondary,
            target: REVERSE_TARGET.to_string(),
        },
    )
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn eventually<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
