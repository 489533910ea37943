//! Spy gRPC feed client.
//!
//! Implements [`VaaStream`] over the guardian spy's server-streaming
//! `SubscribeSignedVAA` call. The client does not reconnect by itself; a dead
//! session is reported as an error and the caller re-runs `connect` +
//! `subscribe`.

use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::Span;

use super::dto::{
    SubscribeSignedVaaRequest, SubscribeSignedVaaResponse, SUBSCRIBE_SIGNED_VAA_PATH,
};
use crate::domain::RawMessage;
use crate::error::{Error, Result};
use crate::port::VaaStream;

/// Signed-VAA stream backed by a spy gRPC endpoint.
pub struct SpyStream {
    url: String,
    channel: Option<Channel>,
    session: Option<Streaming<SubscribeSignedVaaResponse>>,
    span: Span,
}

impl SpyStream {
    /// Create a disconnected stream for `url`.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            channel: None,
            session: None,
            span: tracing::info_span!("relay", component = "spy"),
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl VaaStream for SpyStream {
    async fn connect(&mut self) -> Result<()> {
        self.session = None;
        self.channel = None;

        tracing::info!(parent: &self.span, url = %self.url, "Connecting to spy");
        let endpoint = Endpoint::from_shared(self.url.clone())
            .map_err(|e| Error::Connection(format!("invalid spy endpoint {}: {e}", self.url)))?;
        let channel = endpoint.connect().await.map_err(|e| {
            Error::Connection(format!("failed to connect to spy at {}: {e}", self.url))
        })?;
        tracing::info!(parent: &self.span, "Spy connected");

        self.channel = Some(channel);
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<()> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| Error::Connection("not connected".into()))?;

        let mut grpc = Grpc::new(channel);
        grpc.ready()
            .await
            .map_err(|e| Error::Connection(format!("spy channel not ready: {e}")))?;

        tracing::debug!(
            parent: &self.span,
            path = SUBSCRIBE_SIGNED_VAA_PATH,
            "Subscribing to signed VAAs"
        );
        let response = grpc
            .server_streaming(
                tonic::Request::new(SubscribeSignedVaaRequest::all()),
                PathAndQuery::from_static(SUBSCRIBE_SIGNED_VAA_PATH),
                ProstCodec::<SubscribeSignedVaaRequest, SubscribeSignedVaaResponse>::default(),
            )
            .await
            .map_err(|status| Error::Connection(format!("subscribe rejected: {status}")))?;

        self.session = Some(response.into_inner());
        Ok(())
    }

    async fn next_message(&mut self) -> Result<RawMessage> {
        let span = self.span.clone();
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Connection("not subscribed".into()))?;

        let failure = match session.message().await {
            Ok(Some(frame)) => {
                tracing::trace!(parent: &span, bytes = frame.vaa_bytes.len(), "Signed VAA frame");
                return Ok(RawMessage::new(frame.vaa_bytes));
            }
            Ok(None) => {
                tracing::info!(parent: &span, "Spy ended the subscription");
                "stream ended".to_string()
            }
            Err(status) => {
                tracing::error!(
                    parent: &span,
                    code = ?status.code(),
                    error = %status.message(),
                    "Spy stream error"
                );
                format!("spy stream failed: {status}")
            }
        };

        self.session = None;
        Err(Error::Connection(failure))
    }

    fn feed_name(&self) -> &'static str {
        "spy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::http::HttpStub;
    use crate::testkit::spy::{SpyServer, SpySession};

    #[test]
    fn starts_disconnected() {
        let stream = SpyStream::new("http://localhost:7073".into());
        assert!(!stream.is_connected());
        assert!(!stream.is_subscribed());
        assert_eq!(stream.feed_name(), "spy");
    }

    #[tokio::test]
    async fn subscribe_requires_connection() {
        let mut stream = SpyStream::new("http://localhost:7073".into());
        assert!(matches!(stream.subscribe().await, Err(Error::Connection(_))));
        assert!(matches!(stream.next_message().await, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn receives_frames_until_stream_ends() {
        let spy =
            SpyServer::start(vec![SpySession::closing(vec![vec![1, 2, 3], vec![4, 5]])]).await;

        let mut stream = SpyStream::new(spy.url());
        stream.connect().await.unwrap();
        stream.subscribe().await.unwrap();

        assert_eq!(stream.next_message().await.unwrap().as_bytes(), &[1, 2, 3]);
        assert_eq!(stream.next_message().await.unwrap().as_bytes(), &[4, 5]);
        assert!(matches!(stream.next_message().await, Err(Error::Connection(_))));
        assert!(!stream.is_subscribed());

        let requests = spy.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].filters.is_empty());
    }

    #[tokio::test]
    async fn server_error_status_is_connection_error() {
        let spy =
            SpyServer::start(vec![SpySession::failing(vec![vec![9]], "spy restarting")]).await;

        let mut stream = SpyStream::new(spy.url());
        stream.connect().await.unwrap();
        stream.subscribe().await.unwrap();

        assert_eq!(stream.next_message().await.unwrap().as_bytes(), &[9]);
        match stream.next_message().await {
            Err(Error::Connection(reason)) => {
                assert!(reason.contains("spy restarting"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn resubscribes_on_same_server() {
        let spy = SpyServer::start(vec![
            SpySession::closing(vec![vec![1]]),
            SpySession::open(vec![vec![2]]),
        ])
        .await;

        let mut stream = SpyStream::new(spy.url());
        stream.connect().await.unwrap();
        stream.subscribe().await.unwrap();
        assert_eq!(stream.next_message().await.unwrap().as_bytes(), &[1]);
        assert!(stream.next_message().await.is_err());

        stream.connect().await.unwrap();
        stream.subscribe().await.unwrap();
        assert_eq!(stream.next_message().await.unwrap().as_bytes(), &[2]);
        assert_eq!(spy.subscriptions(), 2);
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let mut stream = SpyStream::new(HttpStub::unreachable_url().await);
        assert!(matches!(stream.connect().await, Err(Error::Connection(_))));
        assert!(!stream.is_connected());
    }

    #[tokio::test]
    async fn malformed_endpoint_is_reported() {
        let mut stream = SpyStream::new("not a uri".into());
        assert!(matches!(stream.connect().await, Err(Error::Connection(_))));
    }
}
