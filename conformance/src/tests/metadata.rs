//! Custom metadata scenarios.
//!
//! The client sends leading and binary trailing values under the echo keys;
//! the server must return the first set as leading metadata and the second
//! as trailing metadata, for every call shape.

use interop_conformance_macros::conformance;
use interop_proto::{Payload, PayloadType, SimpleRequest, StreamingOutputCallRequest};

use super::check_payload;
use crate::call::CallContext;
use crate::harness::Interop;
use crate::metadata::EchoMetadata;
use crate::status::expect_ok;
use crate::testcase::TestResult;
use crate::{ConformanceTest, attempt, ensure_eq};

pub const CASES: &[ConformanceTest] = &[
    CUSTOM_METADATA_UNARY,
    CUSTOM_METADATA_SERVER_STREAMING,
    CUSTOM_METADATA_FULL_DUPLEX,
    DUPLICATED_CUSTOM_METADATA_UNARY,
    DUPLICATED_CUSTOM_METADATA_SERVER_STREAMING,
    DUPLICATED_CUSTOM_METADATA_FULL_DUPLEX,
];

/// Request and response payload size for every variant.
const ECHO_PAYLOAD_SIZE: i32 = 1;

async fn echo_unary(cx: &Interop, echo: EchoMetadata) -> TestResult {
    let mut ctx = CallContext::new();
    attempt!(echo.attach(&mut ctx));

    let request = SimpleRequest {
        response_type: PayloadType::Compressable as i32,
        response_size: ECHO_PAYLOAD_SIZE,
        payload: Some(Payload::compressable(ECHO_PAYLOAD_SIZE as usize)),
        ..Default::default()
    };
    let outcome = cx.test_service().unary_call(&ctx, request).await;

    attempt!(expect_ok(&outcome.status));
    let response = attempt!(outcome.response.ok_or("UnaryCall returned no response"));
    attempt!(check_payload(
        response.payload.as_ref(),
        ECHO_PAYLOAD_SIZE as usize
    ));
    attempt!(echo.verify(&outcome.headers, &outcome.trailers));
    TestResult::pass()
}

async fn echo_server_streaming(cx: &Interop, echo: EchoMetadata) -> TestResult {
    let mut ctx = CallContext::new();
    attempt!(echo.attach(&mut ctx));

    let mut request = StreamingOutputCallRequest::with_sizes(&[ECHO_PAYLOAD_SIZE]);
    request.payload = Some(Payload::compressable(ECHO_PAYLOAD_SIZE as usize));
    let mut call = cx.test_service().streaming_output_call(&ctx, request);

    let mut received = 0usize;
    while let Some(response) = attempt!(call.read().await) {
        attempt!(check_payload(
            response.payload.as_ref(),
            ECHO_PAYLOAD_SIZE as usize
        ));
        received += 1;
    }
    ensure_eq!(received, 1usize, "response count");

    let finished = call.finish().await;
    attempt!(expect_ok(&finished.status));
    attempt!(echo.verify(&finished.headers, &finished.trailers));
    TestResult::pass()
}

async fn echo_full_duplex(cx: &Interop, echo: EchoMetadata) -> TestResult {
    let mut ctx = CallContext::new();
    attempt!(echo.attach(&mut ctx));

    let mut call = cx.test_service().full_duplex_call(&ctx);
    let mut request = StreamingOutputCallRequest::with_sizes(&[ECHO_PAYLOAD_SIZE]);
    request.payload = Some(Payload::compressable(ECHO_PAYLOAD_SIZE as usize));
    attempt!(call.write(request).await, "write");

    let response = attempt!(call.read().await, "read");
    let response = attempt!(response.ok_or("stream ended before the response"));
    attempt!(check_payload(
        response.payload.as_ref(),
        ECHO_PAYLOAD_SIZE as usize
    ));

    call.close_writes();
    let finished = call.finish().await;
    attempt!(expect_ok(&finished.status));
    attempt!(echo.verify(&finished.headers, &finished.trailers));
    TestResult::pass()
}

// =============================================================================
// metadata.custom_metadata_*
// =============================================================================

#[conformance(name = "metadata.custom_metadata_unary")]
pub async fn custom_metadata_unary(cx: &Interop) -> TestResult {
    echo_unary(cx, EchoMetadata::single()).await
}

#[conformance(name = "metadata.custom_metadata_server_streaming")]
pub async fn custom_metadata_server_streaming(cx: &Interop) -> TestResult {
    echo_server_streaming(cx, EchoMetadata::single()).await
}

#[conformance(name = "metadata.custom_metadata_full_duplex")]
pub async fn custom_metadata_full_duplex(cx: &Interop) -> TestResult {
    echo_full_duplex(cx, EchoMetadata::single()).await
}

// =============================================================================
// metadata.duplicated_custom_metadata_*
// =============================================================================
//
// Two values under each key. Order is not checked.

#[conformance(name = "metadata.duplicated_custom_metadata_unary")]
pub async fn duplicated_custom_metadata_unary(cx: &Interop) -> TestResult {
    echo_unary(cx, EchoMetadata::duplicated()).await
}

#[conformance(name = "metadata.duplicated_custom_metadata_server_streaming")]
pub async fn duplicated_custom_metadata_server_streaming(cx: &Interop) -> TestResult {
    echo_server_streaming(cx, EchoMetadata::duplicated()).await
}

#[conformance(name = "metadata.duplicated_custom_metadata_full_duplex")]
pub async fn duplicated_custom_metadata_full_duplex(cx: &Interop) -> TestResult {
    echo_full_duplex(cx, EchoMetadata::duplicated()).await
}
