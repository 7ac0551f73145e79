//! Fixed values both sides of the interop suite agree on.

// =============================================================================
// Echo metadata
// =============================================================================

/// Leading metadata key the server echoes back in its response headers.
pub const LEADING_METADATA_KEY: &str = "x-grpc-test-echo-initial";

/// Trailing metadata key the server echoes back in its trailers.
///
/// The `-bin` suffix marks the value as binary: it travels base64-encoded.
pub const TRAILING_METADATA_KEY: &str = "x-grpc-test-echo-trailing-bin";

pub const LEADING_METADATA_VALUE: &str = "test_initial_metadata_value";
pub const LEADING_METADATA_SECOND_VALUE: &str = "test_initial_metadata_value;more_stuff";

pub const TRAILING_METADATA_VALUE: &[u8] = b"\x0a\x0b\x0a\x0b\x0a\x0b";
pub const TRAILING_METADATA_SECOND_VALUE: &[u8] = b"\x0a\x0b\x0a\x0b\x0a\x0b\x0a";

// =============================================================================
// Structured errors
// =============================================================================

/// Message carried by the fixed failure of `FailUnaryCall` and
/// `FailStreamingOutputCall`. Deliberately outside ASCII.
pub const NON_ASCII_ERROR_MESSAGE: &str = "soirée 🎉";

/// Domain stamped into the [`ErrorDetail`](crate::ErrorDetail) of that failure.
pub const ERROR_DOMAIN: &str = "connect-crosstest";

/// Type URL of a packed [`ErrorDetail`](crate::ErrorDetail).
pub const ERROR_DETAIL_TYPE_URL: &str = "type.googleapis.com/grpc.testing.ErrorDetail";
