//! Composition root for runtime wiring.
//!
//! Builds the destination submitters from [`Config`], health-checks them, and runs a
//! [`Relayer`] over the spy feed until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::outbound::aztec::AztecPxeSubmitter;
use crate::adapter::outbound::spy::SpyStream;
use crate::adapter::outbound::verifier::VerificationServiceSubmitter;
use crate::application::{ForwardRoute, ReverseRoute, SubmissionRouter};
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::Relayer;
use crate::port::Submitter;

/// The three destination submitters a relayer needs.
pub struct Submitters {
    pub forward: Arc<dyn Submitter>,
    pub verifier: Arc<dyn Submitter>,
    pub pxe: Arc<dyn Submitter>,
}

/// Build submitters for the configured destinations.
///
/// # Errors
///
/// Returns a config error if the forward signer cannot be created, or if
/// the binary was built without the `evm` feature.
pub fn build_submitters(config: &Config) -> Result<Submitters> {
    let request_timeout = config.relay.submit_timeout();
    Ok(Submitters {
        forward: build_forward(config)?,
        verifier: Arc::new(
            VerificationServiceSubmitter::new(
                &config.reverse.verification_service_url,
                request_timeout,
            )?
            .with_span(tracing::info_span!("relay", component = "verifier")),
        ),
        pxe: Arc::new(
            AztecPxeSubmitter::new(
                &config.reverse.pxe_url,
                &config.reverse.wallet_address,
                request_timeout,
            )?
            .with_span(tracing::info_span!("relay", component = "aztec-pxe")),
        ),
    })
}

#[cfg(feature = "evm")]
fn build_forward(config: &Config) -> Result<Arc<dyn Submitter>> {
    use crate::adapter::outbound::evm::EvmSubmitter;

    let submitter = EvmSubmitter::new(&config.forward)?
        .with_span(tracing::info_span!("relay", component = "evm"));
    info!(address = %submitter.address(), "Forward signer loaded");
    Ok(Arc::new(submitter))
}

#[cfg(not(feature = "evm"))]
fn build_forward(_config: &Config) -> Result<Arc<dyn Submitter>> {
    Err(crate::error::ConfigError::InvalidValue {
        field: "forward",
        reason: "built without the `evm` feature".to_string(),
    }
    .into())
}

async fn check(submitter: &dyn Submitter, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, submitter.check_health()).await {
        Ok(result) => result,
        Err(_) => Err(Error::Connection(format!(
            "{} health check timed out after {timeout:?}",
            submitter.name()
        ))),
    }
}

/// Check destination reachability before relaying.
///
/// The forward RPC and the PXE are required. The verification service only
/// warns, since reverse relays can still fall back to the PXE.
///
/// # Errors
///
/// Returns [`Error::Connection`] if a required destination is unreachable.
pub async fn check_submitters(submitters: &Submitters, timeout: Duration) -> Result<()> {
    check(submitters.forward.as_ref(), timeout).await?;
    info!(submitter = submitters.forward.name(), "Destination reachable");

    match check(submitters.verifier.as_ref(), timeout).await {
        Ok(()) => info!(submitter = submitters.verifier.name(), "Destination reachable"),
        Err(e) => warn!(
            submitter = submitters.verifier.name(),
            error = %e,
            "Verification service unavailable, reverse relays will use the PXE"
        ),
    }

    check(submitters.pxe.as_ref(), timeout).await?;
    info!(submitter = submitters.pxe.name(), "Destination reachable");
    Ok(())
}

/// Assemble the router for the configured chain pair.
#[must_use]
pub fn build_router(config: &Config, submitters: Submitters) -> SubmissionRouter {
    SubmissionRouter::new(
        config.chains.source_chain_id,
        config.chains.dest_chain_id,
        ForwardRoute {
            submitter: submitters.forward,
            target: config.forward.target_contract.clone(),
        },
        ReverseRoute {
            primary: submitters.verifier,
            secondary: submitters.pxe,
            target: config.reverse.target_contract.clone(),
        },
    )
    .with_submit_timeout(config.relay.submit_timeout())
    .with_span(tracing::info_span!("relay", component = "router"))
}

/// Run the relayer until `shutdown` fires or a fatal error occurs.
///
/// # Errors
///
/// Returns an error if wiring fails, a required destination is unreachable,
/// or the feed cannot be re-established.
pub async fn run(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(
        source_chain = config.chains.source_chain_id,
        dest_chain = config.chains.dest_chain_id,
        feed = %config.feed.endpoint,
        "Relayer starting"
    );

    let submitters = build_submitters(&config)?;
    check_submitters(&submitters, config.relay.health_check_timeout()).await?;
    let router = Arc::new(build_router(&config, submitters));

    let stream = SpyStream::new(config.feed.endpoint.clone())
        .with_span(tracing::info_span!("relay", component = "spy"));
    let relayer = Relayer::builder(stream)
        .relay_config(&config.relay)
        .router(router)
        .build()?;

    let stats = relayer.stats();
    let result = relayer.run(shutdown).await;
    let snapshot = stats.snapshot();
    info!(
        received = snapshot.received,
        succeeded = snapshot.succeeded,
        failed = snapshot.failed,
        "Relayer stopped"
    );
    result
}
