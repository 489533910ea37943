//! Shutdown signal helpers.

use tokio::sync::watch;

/// Resolve once shutdown is requested.
///
/// A `true` value or a dropped sender both count as shutdown.
pub async fn requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Non-blocking check of the shutdown flag.
#[must_use]
pub fn is_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
