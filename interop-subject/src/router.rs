//! HTTP/2 routing for `grpc.testing.TestService`, in the shape tonic's
//! generated servers take.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use http_body::Body;
use interop_proto::service::test_service;
use interop_proto::{
    Empty, SimpleRequest, SimpleResponse, StreamingInputCallRequest, StreamingInputCallResponse,
    StreamingOutputCallRequest, StreamingOutputCallResponse,
};
use tonic::body::{BoxBody, empty_body};
use tonic::codec::{CompressionEncoding, ProstCodec};
use tonic::codegen::{BoxFuture, StdError};
use tonic::server::{Grpc, NamedService};
use tonic::{Code, Request, Status, Streaming};
use tower_service::Service;

use crate::service::Reference;

/// Routes TestService paths to a shared [`Reference`].
#[derive(Debug, Clone)]
pub struct TestServiceServer {
    inner: Arc<Reference>,
}

impl TestServiceServer {
    pub fn new(reference: Reference) -> Self {
        Self {
            inner: Arc::new(reference),
        }
    }
}

impl NamedService for TestServiceServer {
    const NAME: &'static str = test_service::SERVICE;
}

/// Adapts an async closure to the tower service tonic's call helpers drive.
#[derive(Clone)]
struct Handler<F>(F);

impl<F, Req, Fut, Resp> Service<Req> for Handler<F>
where
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = Result<Resp, Status>>,
{
    type Response = Resp;
    type Error = Status;
    type Future = Fut;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Status>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Req) -> Fut {
        (self.0)(request)
    }
}

fn grpc<Resp, Req>() -> Grpc<ProstCodec<Resp, Req>>
where
    Resp: prost::Message + Send + 'static,
    Req: prost::Message + Default + Send + 'static,
{
    Grpc::new(ProstCodec::default())
        .accept_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Gzip)
}

fn unimplemented() -> http::Response<BoxBody> {
    let mut response = http::Response::new(empty_body());
    let headers = response.headers_mut();
    headers.insert("grpc-status", http::HeaderValue::from(Code::Unimplemented as i32));
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/grpc"),
    );
    response
}

impl<B> Service<http::Request<B>> for TestServiceServer
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        let path = req.uri().path().to_owned();
        tracing::debug!(%path, "routing call");

        match path.as_str() {
            p if p == test_service::EMPTY_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<Empty>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.empty_call(request).await }
                });
                let mut grpc = grpc::<Empty, Empty>();
                Ok(grpc.unary(method, req).await)
            }),
            p if p == test_service::UNARY_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<SimpleRequest>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.unary_call(request).await }
                });
                let mut grpc = grpc::<SimpleResponse, SimpleRequest>();
                Ok(grpc.unary(method, req).await)
            }),
            p if p == test_service::FAIL_UNARY_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<SimpleRequest>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.fail_unary_call(request).await }
                });
                let mut grpc = grpc::<SimpleResponse, SimpleRequest>();
                Ok(grpc.unary(method, req).await)
            }),
            p if p == test_service::CACHEABLE_UNARY_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<SimpleRequest>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.cacheable_unary_call(request).await }
                });
                let mut grpc = grpc::<SimpleResponse, SimpleRequest>();
                Ok(grpc.unary(method, req).await)
            }),
            p if p == test_service::STREAMING_OUTPUT_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<StreamingOutputCallRequest>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.streaming_output_call(request).await }
                });
                let mut grpc = grpc::<StreamingOutputCallResponse, StreamingOutputCallRequest>();
                Ok(grpc.server_streaming(method, req).await)
            }),
            p if p == test_service::FAIL_STREAMING_OUTPUT_CALL.path => Box::pin(async move {
                let method = Handler(move |request: Request<StreamingOutputCallRequest>| {
                    let inner = Arc::clone(&inner);
                    async move { inner.fail_streaming_output_call(request).await }
                });
                let mut grpc = grpc::<StreamingOutputCallResponse, StreamingOutputCallRequest>();
                Ok(grpc.server_streaming(method, req).await)
            }),
            p if p == test_service::STREAMING_INPUT_CALL.path => Box::pin(async move {
                let method =
                    Handler(move |request: Request<Streaming<StreamingInputCallRequest>>| {
                        let inner = Arc::clone(&inner);
                        async move { inner.streaming_input_call(request).await }
                    });
                let mut grpc = grpc::<StreamingInputCallResponse, StreamingInputCallRequest>();
                Ok(grpc.client_streaming(method, req).await)
            }),
            p if p == test_service::FULL_DUPLEX_CALL.path => Box::pin(async move {
                let method =
                    Handler(move |request: Request<Streaming<StreamingOutputCallRequest>>| {
                        let inner = Arc::clone(&inner);
                        async move { inner.full_duplex_call(request).await }
                    });
                let mut grpc = grpc::<StreamingOutputCallResponse, StreamingOutputCallRequest>();
                Ok(grpc.streaming(method, req).await)
            }),
            p if p == test_service::HALF_DUPLEX_CALL.path => Box::pin(async move {
                let method =
                    Handler(move |request: Request<Streaming<StreamingOutputCallRequest>>| {
                        let inner = Arc::clone(&inner);
                        async move { inner.half_duplex_call(request).await }
                    });
                let mut grpc = grpc::<StreamingOutputCallResponse, StreamingOutputCallRequest>();
                Ok(grpc.streaming(method, req).await)
            }),
            _ => Box::pin(async move { Ok(unimplemented()) }),
        }
    }
}
