//! End-to-end relay over a loopback spy gRPC server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use common::{eventually, router, DEST_CHAIN, SOURCE_CHAIN};
use vaa_relayer::adapter::outbound::spy::SpyStream;
use vaa_relayer::infrastructure::orchestration::Relayer;
use vaa_relayer::testkit::config;
use vaa_relayer::testkit::http::HttpStub;
use vaa_relayer::testkit::spy::{SpyServer, SpySession};
use vaa_relayer::testkit::submitter::RecordingSubmitter;
use vaa_relayer::testkit::vaa::VaaBuilder;

#[tokio::test]
async fn relays_frames_from_spy_and_recovers_from_stream_end() {
    let forward_vaa = VaaBuilder::new(SOURCE_CHAIN, 1).build();
    let reverse_vaa = VaaBuilder::new(DEST_CHAIN, 2).build();

    let spy = SpyServer::start(vec![
        // The second copy is a spy replay and must not be submitted twice.
        SpySession::closing(vec![forward_vaa.clone(), forward_vaa.clone()]),
        SpySession::open(vec![reverse_vaa.clone()]),
    ])
    .await;

    let forward = Arc::new(RecordingSubmitter::new("evm"));
    let verifier = Arc::new(RecordingSubmitter::new("verifier"));
    let pxe = Arc::new(RecordingSubmitter::new("pxe"));
    let relayer = Relayer::builder(SpyStream::new(spy.url()))
        .relay_config(&config::relay())
        .router(Arc::new(router(forward.clone(), verifier.clone(), pxe.clone())))
        .build()
        .unwrap();
    let stats = relayer.stats();

    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(relayer.run(shutdown_rx));

    eventually("both directions", || stats.snapshot().succeeded == 2).await;
    assert_eq!(forward.calls()[0].1, forward_vaa);
    assert_eq!(verifier.calls()[0].1, reverse_vaa);
    assert_eq!(forward.call_count(), 1);
    assert_eq!(pxe.call_count(), 0);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.duplicates, 1);
    assert_eq!(snapshot.resubscribes, 1);
    assert_eq!(spy.subscriptions(), 2);
    assert!(spy.requests().iter().all(|request| request.filters.is_empty()));

    let _ = shutdown.send(true);
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn unreachable_spy_exhausts_resubscribe_budget() {
    let url = HttpStub::unreachable_url().await;

    let forward = Arc::new(RecordingSubmitter::new("evm"));
    let verifier = Arc::new(RecordingSubmitter::new("verifier"));
    let pxe = Arc::new(RecordingSubmitter::new("pxe"));
    let relayer = Relayer::builder(SpyStream::new(url))
        .relay_config(&config::relay())
        .router(Arc::new(router(forward, verifier, pxe)))
        .build()
        .unwrap();

    let (_shutdown, shutdown_rx) = watch::channel(false);
    let result = tokio::time::timeout(Duration::from_secs(10), relayer.run(shutdown_rx))
        .await
        .unwrap();
    assert!(matches!(
        result,
        Err(vaa_relayer::error::Error::ResubscribeExhausted { attempts: 5, .. })
    ));
}
