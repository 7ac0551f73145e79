//! Client stubs for TestService and UnimplementedService.
//!
//! Every method goes through [`RpcChannel::open`], the bidirectional
//! primitive, whatever its declared shape. gRPC framing is the same for all
//! shapes, and keeping the response a stream is what lets leading and
//! trailing metadata be observed separately.

use http::uri::PathAndQuery;
use interop_proto::service::{test_service, unimplemented_service};
use interop_proto::{
    Empty, MethodDescriptor, SimpleRequest, SimpleResponse, StreamingInputCallRequest,
    StreamingInputCallResponse, StreamingOutputCallRequest, StreamingOutputCallResponse,
};
use prost::Message;
use tonic::Status;
use tonic::client::Grpc;
use tonic::codec::{CompressionEncoding, ProstCodec};
use tonic::transport::Channel;

use crate::call::{CallContext, StreamCall, UnaryOutcome};
use crate::config::Compression;

/// A channel plus the per-pass compression setting.
#[derive(Debug, Clone)]
pub struct RpcChannel {
    grpc: Grpc<Channel>,
}

impl RpcChannel {
    pub fn new(channel: Channel, compression: Compression) -> Self {
        let grpc = Grpc::new(channel);
        let grpc = match compression {
            Compression::Identity => grpc,
            Compression::Gzip => grpc
                .send_compressed(CompressionEncoding::Gzip)
                .accept_compressed(CompressionEncoding::Gzip),
        };
        Self { grpc }
    }

    /// Open `method` as a bidirectional call.
    pub fn open<Req, Resp>(&self, ctx: &CallContext, method: MethodDescriptor) -> StreamCall<Req, Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.grpc.clone();
        let path = PathAndQuery::from_static(method.path);
        tracing::debug!(method = method.path, "opening call");

        StreamCall::start(ctx, move |request| async move {
            grpc.ready()
                .await
                .map_err(|e| Status::unavailable(format!("channel not ready: {}", e)))?;
            grpc.streaming(request, path, ProstCodec::<Req, Resp>::default())
                .await
        })
    }

    /// One request, at most one response.
    pub async fn unary<Req, Resp>(
        &self,
        ctx: &CallContext,
        method: MethodDescriptor,
        request: Req,
    ) -> UnaryOutcome<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut call = self.open(ctx, method);
        // A failed write has already ended the call; close_and_recv reports it.
        if let Err(status) = call.write(request).await {
            tracing::debug!(method = method.path, code = ?status.code(), "request not sent");
        }
        call.close_and_recv().await
    }

    /// Open `method` with `request` already queued. Writes stay open only
    /// for methods that stream requests.
    pub fn server_streaming<Req, Resp>(
        &self,
        ctx: &CallContext,
        method: MethodDescriptor,
        request: Req,
    ) -> StreamCall<Req, Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut call = self.open(ctx, method);
        if let Err(status) = call.enqueue(request) {
            call.abort(status);
            return call;
        }
        if !method.kind.client_streams() {
            call.close_writes();
        }
        call
    }
}

#[derive(Debug, Clone)]
pub struct TestServiceClient {
    channel: RpcChannel,
}

impl TestServiceClient {
    pub fn new(channel: RpcChannel) -> Self {
        Self { channel }
    }

    pub async fn empty_call(&self, ctx: &CallContext, request: Empty) -> UnaryOutcome<Empty> {
        self.channel.unary(ctx, test_service::EMPTY_CALL, request).await
    }

    pub async fn unary_call(
        &self,
        ctx: &CallContext,
        request: SimpleRequest,
    ) -> UnaryOutcome<SimpleResponse> {
        self.channel.unary(ctx, test_service::UNARY_CALL, request).await
    }

    pub async fn fail_unary_call(
        &self,
        ctx: &CallContext,
        request: SimpleRequest,
    ) -> UnaryOutcome<SimpleResponse> {
        self.channel.unary(ctx, test_service::FAIL_UNARY_CALL, request).await
    }

    /// Marked cacheable; whether anything caches it is up to the transport.
    pub async fn cacheable_unary_call(
        &self,
        ctx: &CallContext,
        request: SimpleRequest,
    ) -> UnaryOutcome<SimpleResponse> {
        self.channel
            .unary(ctx, test_service::CACHEABLE_UNARY_CALL, request)
            .await
    }

    pub fn streaming_output_call(
        &self,
        ctx: &CallContext,
        request: StreamingOutputCallRequest,
    ) -> StreamCall<StreamingOutputCallRequest, StreamingOutputCallResponse> {
        self.channel
            .server_streaming(ctx, test_service::STREAMING_OUTPUT_CALL, request)
    }

    pub fn fail_streaming_output_call(
        &self,
        ctx: &CallContext,
        request: StreamingOutputCallRequest,
    ) -> StreamCall<StreamingOutputCallRequest, StreamingOutputCallResponse> {
        self.channel
            .server_streaming(ctx, test_service::FAIL_STREAMING_OUTPUT_CALL, request)
    }

    pub fn streaming_input_call(
        &self,
        ctx: &CallContext,
    ) -> StreamCall<StreamingInputCallRequest, StreamingInputCallResponse> {
        self.channel.open(ctx, test_service::STREAMING_INPUT_CALL)
    }

    pub fn full_duplex_call(
        &self,
        ctx: &CallContext,
    ) -> StreamCall<StreamingOutputCallRequest, StreamingOutputCallResponse> {
        self.channel.open(ctx, test_service::FULL_DUPLEX_CALL)
    }

    pub fn half_duplex_call(
        &self,
        ctx: &CallContext,
    ) -> StreamCall<StreamingOutputCallRequest, StreamingOutputCallResponse> {
        self.channel.open(ctx, test_service::HALF_DUPLEX_CALL)
    }

    pub async fn unimplemented_call(&self, ctx: &CallContext) -> UnaryOutcome<Empty> {
        self.channel
            .unary(ctx, test_service::UNIMPLEMENTED_CALL, Empty {})
            .await
    }

    pub fn unimplemented_streaming_output_call(&self, ctx: &CallContext) -> StreamCall<Empty, Empty> {
        self.channel.server_streaming(
            ctx,
            test_service::UNIMPLEMENTED_STREAMING_OUTPUT_CALL,
            Empty {},
        )
    }
}

#[derive(Debug, Clone)]
pub struct UnimplementedServiceClient {
    channel: RpcChannel,
}

impl UnimplementedServiceClient {
    pub fn new(channel: RpcChannel) -> Self {
        Self { channel }
    }

    pub async fn unimplemented_call(&self, ctx: &CallContext) -> UnaryOutcome<Empty> {
        self.channel
            .unary(ctx, unimplemented_service::UNIMPLEMENTED_CALL, Empty {})
            .await
    }

    pub fn unimplemented_streaming_output_call(&self, ctx: &CallContext) -> StreamCall<Empty, Empty> {
        self.channel.server_streaming(
            ctx,
            unimplemented_service::UNIMPLEMENTED_STREAMING_OUTPUT_CALL,
            Empty {},
        )
    }
}
