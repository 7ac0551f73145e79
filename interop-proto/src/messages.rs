//! Messages of package `grpc.testing`, plus the `google.rpc.Status` envelope.
//!
//! Field tags match `test.proto`, `messages.proto` and `empty.proto`.

use prost::Message;
use prost_types::Any;

use crate::contract::ERROR_DETAIL_TYPE_URL;

// =============================================================================
// Payloads
// =============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct Empty {}

/// The kind of bytes a payload carries. Only compressable payloads are
/// exercised by the suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum PayloadType {
    Compressable = 0,
}

#[derive(Clone, PartialEq, Message)]
pub struct Payload {
    #[prost(enumeration = "PayloadType", tag = "1")]
    pub r#type: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub body: Vec<u8>,
}

impl Payload {
    /// A compressable payload of `size` zero bytes.
    pub fn compressable(size: usize) -> Self {
        Self {
            r#type: PayloadType::Compressable as i32,
            body: vec![0; size],
        }
    }
}

/// Status a client asks the server to fail with.
#[derive(Clone, PartialEq, Message)]
pub struct EchoStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

impl EchoStatus {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// =============================================================================
// Unary
// =============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct SimpleRequest {
    #[prost(enumeration = "PayloadType", tag = "1")]
    pub response_type: i32,
    #[prost(int32, tag = "2")]
    pub response_size: i32,
    #[prost(message, optional, tag = "3")]
    pub payload: Option<Payload>,
    #[prost(message, optional, tag = "7")]
    pub response_status: Option<EchoStatus>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SimpleResponse {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
}

// =============================================================================
// Streaming
// =============================================================================

#[derive(Clone, PartialEq, Message)]
pub struct StreamingInputCallRequest {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
}

#[derive(Clone, PartialEq, Message)]
pub struct StreamingInputCallResponse {
    #[prost(int32, tag = "1")]
    pub aggregated_payload_size: i32,
}

/// Shape of one response in a streamed reply.
#[derive(Clone, PartialEq, Message)]
pub struct ResponseParameters {
    #[prost(int32, tag = "1")]
    pub size: i32,
    /// Delay before the server sends this response.
    #[prost(int32, tag = "2")]
    pub interval_us: i32,
}

impl ResponseParameters {
    pub fn of_size(size: i32) -> Self {
        Self {
            size,
            interval_us: 0,
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct StreamingOutputCallRequest {
    #[prost(enumeration = "PayloadType", tag = "1")]
    pub response_type: i32,
    #[prost(message, repeated, tag = "2")]
    pub response_parameters: Vec<ResponseParameters>,
    #[prost(message, optional, tag = "3")]
    pub payload: Option<Payload>,
    #[prost(message, optional, tag = "7")]
    pub response_status: Option<EchoStatus>,
}

impl StreamingOutputCallRequest {
    /// Ask for one compressable response per entry of `sizes`.
    pub fn with_sizes(sizes: &[i32]) -> Self {
        Self {
            response_type: PayloadType::Compressable as i32,
            response_parameters: sizes.iter().copied().map(ResponseParameters::of_size).collect(),
            ..Default::default()
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct StreamingOutputCallResponse {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
}

// =============================================================================
// Structured errors
// =============================================================================

/// Detail attached to the fixed failure of the `Fail*` methods.
#[derive(Clone, PartialEq, Message)]
pub struct ErrorDetail {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(string, tag = "2")]
    pub domain: String,
}

impl ErrorDetail {
    /// Pack into an `Any` under the `grpc.testing.ErrorDetail` type URL.
    pub fn to_any(&self) -> Any {
        Any {
            type_url: ERROR_DETAIL_TYPE_URL.to_string(),
            value: self.encode_to_vec(),
        }
    }
}

/// `google.rpc.Status`: the envelope carried in `grpc-status-details-bin`.
#[derive(Clone, PartialEq, Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<Any>,
}
