//! Method descriptors for `grpc.testing.TestService` and
//! `grpc.testing.UnimplementedService`.

/// How many messages flow in each direction of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Unary,
    ClientStreaming,
    ServerStreaming,
    BidiStreaming,
}

impl MethodKind {
    /// Whether the client may send more than one request.
    pub fn client_streams(self) -> bool {
        matches!(self, MethodKind::ClientStreaming | MethodKind::BidiStreaming)
    }
}

/// A method of the contract: its owning service, its name and the HTTP/2
/// path it is routed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub service: &'static str,
    pub name: &'static str,
    pub path: &'static str,
    pub kind: MethodKind,
}

pub mod test_service {
    use super::{MethodDescriptor, MethodKind};

    pub const SERVICE: &str = "grpc.testing.TestService";

    pub const EMPTY_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "EmptyCall",
        path: "/grpc.testing.TestService/EmptyCall",
        kind: MethodKind::Unary,
    };

    pub const UNARY_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "UnaryCall",
        path: "/grpc.testing.TestService/UnaryCall",
        kind: MethodKind::Unary,
    };

    /// Always fails with the fixed structured error.
    pub const FAIL_UNARY_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "FailUnaryCall",
        path: "/grpc.testing.TestService/FailUnaryCall",
        kind: MethodKind::Unary,
    };

    /// Same as `UnaryCall`, but the response may be served from a cache.
    pub const CACHEABLE_UNARY_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "CacheableUnaryCall",
        path: "/grpc.testing.TestService/CacheableUnaryCall",
        kind: MethodKind::Unary,
    };

    pub const STREAMING_OUTPUT_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "StreamingOutputCall",
        path: "/grpc.testing.TestService/StreamingOutputCall",
        kind: MethodKind::ServerStreaming,
    };

    /// Streams the requested responses, then fails with the fixed
    /// structured error.
    pub const FAIL_STREAMING_OUTPUT_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "FailStreamingOutputCall",
        path: "/grpc.testing.TestService/FailStreamingOutputCall",
        kind: MethodKind::ServerStreaming,
    };

    pub const STREAMING_INPUT_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "StreamingInputCall",
        path: "/grpc.testing.TestService/StreamingInputCall",
        kind: MethodKind::ClientStreaming,
    };

    pub const FULL_DUPLEX_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "FullDuplexCall",
        path: "/grpc.testing.TestService/FullDuplexCall",
        kind: MethodKind::BidiStreaming,
    };

    /// Buffers every request until the client half-closes, then replies.
    pub const HALF_DUPLEX_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "HalfDuplexCall",
        path: "/grpc.testing.TestService/HalfDuplexCall",
        kind: MethodKind::BidiStreaming,
    };

    /// Declared but never implemented by servers.
    pub const UNIMPLEMENTED_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "UnimplementedCall",
        path: "/grpc.testing.TestService/UnimplementedCall",
        kind: MethodKind::Unary,
    };

    /// Declared but never implemented by servers.
    pub const UNIMPLEMENTED_STREAMING_OUTPUT_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "UnimplementedStreamingOutputCall",
        path: "/grpc.testing.TestService/UnimplementedStreamingOutputCall",
        kind: MethodKind::ServerStreaming,
    };

    pub const METHODS: &[MethodDescriptor] = &[
        EMPTY_CALL,
        UNARY_CALL,
        FAIL_UNARY_CALL,
        CACHEABLE_UNARY_CALL,
        STREAMING_OUTPUT_CALL,
        FAIL_STREAMING_OUTPUT_CALL,
        STREAMING_INPUT_CALL,
        FULL_DUPLEX_CALL,
        HALF_DUPLEX_CALL,
        UNIMPLEMENTED_CALL,
        UNIMPLEMENTED_STREAMING_OUTPUT_CALL,
    ];
}

/// A service no server registers.
pub mod unimplemented_service {
    use super::{MethodDescriptor, MethodKind};

    pub const SERVICE: &str = "grpc.testing.UnimplementedService";

    pub const UNIMPLEMENTED_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "UnimplementedCall",
        path: "/grpc.testing.UnimplementedService/UnimplementedCall",
        kind: MethodKind::Unary,
    };

    pub const UNIMPLEMENTED_STREAMING_OUTPUT_CALL: MethodDescriptor = MethodDescriptor {
        service: SERVICE,
        name: "UnimplementedStreamingOutputCall",
        path: "/grpc.testing.UnimplementedService/UnimplementedStreamingOutputCall",
        kind: MethodKind::ServerStreaming,
    };

    pub const METHODS: &[MethodDescriptor] = &[UNIMPLEMENTED_CALL, UNIMPLEMENTED_STREAMING_OUTPUT_CALL];
}
