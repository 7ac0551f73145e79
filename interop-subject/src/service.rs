//! Reference behaviour of `grpc.testing.TestService`.

use std::time::Duration;

use bytes::Bytes;
use interop_proto::contract::{ERROR_DOMAIN, NON_ASCII_ERROR_MESSAGE};
use interop_proto::{
    EchoStatus, Empty, ErrorDetail, Payload, PayloadType, ResponseParameters, RpcStatus,
    SimpleRequest, SimpleResponse, StreamingInputCallRequest, StreamingInputCallResponse,
    StreamingOutputCallRequest, StreamingOutputCallResponse,
};
use prost::Message;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Code, Request, Response, Status, Streaming};

/// Responses of the server-streaming and bidirectional methods.
pub type ResponseStream = ReceiverStream<Result<StreamingOutputCallResponse, Status>>;

const RESPONSE_BUFFER: usize = 4;

/// Stateless implementation of every method the reference server routes.
///
/// `UnimplementedCall` and `UnimplementedStreamingOutputCall` are absent on
/// purpose: the router answers them with UNIMPLEMENTED.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reference;

impl Reference {
    pub async fn empty_call(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        Ok(Response::new(Empty {}))
    }

    pub async fn unary_call(
        &self,
        request: Request<SimpleRequest>,
    ) -> Result<Response<SimpleResponse>, Status> {
        let request = request.into_inner();
        if let Some(status) = requested_status(request.response_status.as_ref()) {
            return Err(status);
        }

        let payload = payload(request.response_type, request.response_size)?;
        Ok(Response::new(SimpleResponse {
            payload: Some(payload),
        }))
    }

    pub async fn cacheable_unary_call(
        &self,
        request: Request<SimpleRequest>,
    ) -> Result<Response<SimpleResponse>, Status> {
        self.unary_call(request).await
    }

    pub async fn fail_unary_call(
        &self,
        _request: Request<SimpleRequest>,
    ) -> Result<Response<SimpleResponse>, Status> {
        Err(non_ascii_error())
    }

    pub async fn streaming_output_call(
        &self,
        request: Request<StreamingOutputCallRequest>,
    ) -> Result<Response<ResponseStream>, Status> {
        let request = request.into_inner();
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            if !send_responses(&tx, &request).await {
                return;
            }
            if let Some(status) = requested_status(request.response_status.as_ref()) {
                let _ = tx.send(Err(status)).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    pub async fn fail_streaming_output_call(
        &self,
        request: Request<StreamingOutputCallRequest>,
    ) -> Result<Response<ResponseStream>, Status> {
        let request = request.into_inner();
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            if send_responses(&tx, &request).await {
                let _ = tx.send(Err(non_ascii_error())).await;
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    pub async fn streaming_input_call(
        &self,
        request: Request<Streaming<StreamingInputCallRequest>>,
    ) -> Result<Response<StreamingInputCallResponse>, Status> {
        let mut inbound = request.into_inner();
        let mut total = 0usize;
        while let Some(message) = inbound.message().await? {
            total += message.payload.map_or(0, |payload| payload.body.len());
        }

        let aggregated_payload_size = i32::try_from(total)
            .map_err(|_| Status::out_of_range(format!("aggregated payload of {total} bytes")))?;
        Ok(Response::new(StreamingInputCallResponse {
            aggregated_payload_size,
        }))
    }

    pub async fn full_duplex_call(
        &self,
        request: Request<Streaming<StreamingOutputCallRequest>>,
    ) -> Result<Response<ResponseStream>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            loop {
                match inbound.message().await {
                    Ok(Some(request)) => {
                        if let Some(status) = requested_status(request.response_status.as_ref()) {
                            let _ = tx.send(Err(status)).await;
                            return;
                        }
                        if !send_responses(&tx, &request).await {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(status) => {
                        tracing::debug!(code = ?status.code(), "full duplex inbound ended");
                        let _ = tx.send(Err(status)).await;
                        return;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    pub async fn half_duplex_call(
        &self,
        request: Request<Streaming<StreamingOutputCallRequest>>,
    ) -> Result<Response<ResponseStream>, Status> {
        let mut inbound = request.into_inner();
        let mut buffered = Vec::new();
        while let Some(request) = inbound.message().await? {
            buffered.push(request);
        }

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        tokio::spawn(async move {
            for request in &buffered {
                if !send_responses(&tx, request).await {
                    return;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// The status a request asked to fail with, if its code is not OK.
fn requested_status(status: Option<&EchoStatus>) -> Option<Status> {
    status
        .filter(|status| status.code != Code::Ok as i32)
        .map(|status| Status::new(Code::from(status.code), status.message.clone()))
}

fn payload(response_type: i32, size: i32) -> Result<Payload, Status> {
    if response_type != PayloadType::Compressable as i32 {
        return Err(Status::invalid_argument(format!(
            "unsupported payload type: {response_type}"
        )));
    }
    let size = usize::try_from(size).map_err(|_| {
        Status::invalid_argument(format!("requested a response with invalid length {size}"))
    })?;
    Ok(Payload::compressable(size))
}

/// Send one response per parameter. Returns `false` once the stream is over,
/// either because the client went away or because a parameter was invalid.
async fn send_responses(
    tx: &mpsc::Sender<Result<StreamingOutputCallResponse, Status>>,
    request: &StreamingOutputCallRequest,
) -> bool {
    for params in &request.response_parameters {
        let ResponseParameters { size, interval_us } = *params;
        if interval_us > 0 {
            tokio::time::sleep(Duration::from_micros(interval_us.unsigned_abs().into())).await;
        }

        let item = payload(request.response_type, size).map(|payload| StreamingOutputCallResponse {
            payload: Some(payload),
        });
        let failed = item.is_err();
        if tx.send(item).await.is_err() || failed {
            return false;
        }
    }
    true
}

/// The fixed RESOURCE_EXHAUSTED failure, with an [`ErrorDetail`] packed into
/// a `google.rpc.Status` envelope.
pub fn non_ascii_error() -> Status {
    let detail = ErrorDetail {
        reason: NON_ASCII_ERROR_MESSAGE.to_string(),
        domain: ERROR_DOMAIN.to_string(),
    };
    let envelope = RpcStatus {
        code: Code::ResourceExhausted as i32,
        message: NON_ASCII_ERROR_MESSAGE.to_string(),
        details: vec![detail.to_any()],
    };
    Status::with_details(
        Code::ResourceExhausted,
        NON_ASCII_ERROR_MESSAGE,
        Bytes::from(envelope.encode_to_vec()),
    )
}
