//! In-process spy gRPC server.
//!
//! Serves `SubscribeSignedVAA` over loopback. Each subscription takes the
//! next scripted [`SpySession`]; once the script runs out, further
//! subscriptions stay open without sending anything.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{stream, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codec::ProstCodec;
use tonic::codegen::{empty_body, http, Body, BoxFuture, BoxStream, Service, StdError};
use tonic::server::{Grpc, NamedService, ServerStreamingService};
use tonic::Status;

use crate::adapter::outbound::spy::dto::{
    SubscribeSignedVaaRequest, SubscribeSignedVaaResponse, SPY_SERVICE_NAME,
    SUBSCRIBE_SIGNED_VAA_PATH,
};

#[derive(Debug, Clone)]
enum Ending {
    Hold,
    Close,
    Fail(String),
}

/// What one subscription receives.
#[derive(Debug, Clone)]
pub struct SpySession {
    frames: Vec<Vec<u8>>,
    ending: Ending,
}

impl SpySession {
    /// Send `frames`, then keep the stream open.
    pub fn open(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames,
            ending: Ending::Hold,
        }
    }

    /// Send `frames`, then end the stream cleanly.
    pub fn closing(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames,
            ending: Ending::Close,
        }
    }

    /// Send `frames`, then end the stream with an `UNAVAILABLE` status.
    pub fn failing(frames: Vec<Vec<u8>>, message: &str) -> Self {
        Self {
            frames,
            ending: Ending::Fail(message.to_string()),
        }
    }

    fn into_stream(self) -> BoxStream<SubscribeSignedVaaResponse> {
        let frames = stream::iter(
            self.frames
                .into_iter()
                .map(|vaa_bytes| Ok(SubscribeSignedVaaResponse { vaa_bytes })),
        );
        match self.ending {
            Ending::Hold => Box::pin(frames.chain(stream::pending())),
            Ending::Close => Box::pin(frames),
            Ending::Fail(message) => Box::pin(
                frames.chain(stream::once(async move { Err(Status::unavailable(message)) })),
            ),
        }
    }
}

#[derive(Clone, Default)]
struct SpyService {
    sessions: Arc<Mutex<VecDeque<SpySession>>>,
    requests: Arc<Mutex<Vec<SubscribeSignedVaaRequest>>>,
}

impl SpyService {
    fn next_session(&self, request: SubscribeSignedVaaRequest) -> SpySession {
        self.requests.lock().push(request);
        self.sessions
            .lock()
            .pop_front()
            .unwrap_or_else(|| SpySession::open(Vec::new()))
    }
}

struct Subscribe(SpyService);

impl ServerStreamingService<SubscribeSignedVaaRequest> for Subscribe {
    type Response = SubscribeSignedVaaResponse;
    type ResponseStream = BoxStream<SubscribeSignedVaaResponse>;
    type Future = BoxFuture<tonic::Response<Self::ResponseStream>, Status>;

    fn call(&mut self, request: tonic::Request<SubscribeSignedVaaRequest>) -> Self::Future {
        let session = self.0.next_session(request.into_inner());
        Box::pin(async move { Ok(tonic::Response::new(session.into_stream())) })
    }
}

impl<B> Service<http::Request<B>> for SpyService
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        if req.uri().path() != SUBSCRIBE_SIGNED_VAA_PATH {
            return Box::pin(async move {
                let mut response = http::Response::new(empty_body());
                let headers = response.headers_mut();
                headers.insert("grpc-status", http::HeaderValue::from_static("12"));
                headers.insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("application/grpc"),
                );
                Ok(response)
            });
        }

        let subscribe = Subscribe(self.clone());
        Box::pin(async move {
            let mut grpc = Grpc::new(ProstCodec::<
                SubscribeSignedVaaResponse,
                SubscribeSignedVaaRequest,
            >::default());
            Ok(grpc.server_streaming(subscribe, req).await)
        })
    }
}

impl NamedService for SpyService {
    const NAME: &'static str = SPY_SERVICE_NAME;
}

/// Handle to a running spy server. The server stops when dropped.
pub struct SpyServer {
    addr: SocketAddr,
    service: SpyService,
    task: JoinHandle<()>,
}

impl SpyServer {
    /// Start serving `sessions` on an ephemeral loopback port.
    pub async fn start(sessions: Vec<SpySession>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let service = SpyService {
            sessions: Arc::new(Mutex::new(sessions.into())),
            ..SpyService::default()
        };

        let routes = service.clone();
        let task = tokio::spawn(async move {
            let _ = tonic::transport::Server::builder()
                .add_service(routes)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        });

        Self {
            addr,
            service,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, one per subscription.
    pub fn requests(&self) -> Vec<SubscribeSignedVaaRequest> {
        self.service.requests.lock().clone()
    }

    pub fn subscriptions(&self) -> usize {
        self.service.requests.lock().len()
    }
}

impl Drop for SpyServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
