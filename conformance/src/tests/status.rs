//! Status propagation scenarios: injected statuses and unimplemented
//! methods and services.

use interop_conformance_macros::conformance;
use interop_proto::{EchoStatus, SimpleRequest, StreamingOutputCallRequest};
use tonic::Code;

use super::{SPECIAL_STATUS_MESSAGE, TEST_STATUS_MESSAGE};
use crate::call::CallContext;
use crate::harness::Interop;
use crate::status::{expect_status, expect_unimplemented, expect_unimplemented_service};
use crate::testcase::TestResult;
use crate::{ConformanceTest, attempt, ensure};

pub const CASES: &[ConformanceTest] = &[
    STATUS_CODE_AND_MESSAGE_UNARY,
    STATUS_CODE_AND_MESSAGE_FULL_DUPLEX,
    SPECIAL_STATUS_MESSAGE_UNARY,
    UNIMPLEMENTED_METHOD,
    UNIMPLEMENTED_SERVER_STREAMING_METHOD,
    UNIMPLEMENTED_SERVICE,
    UNIMPLEMENTED_SERVICE_STREAMING,
];

async fn injected_unary(cx: &Interop, message: &str) -> TestResult {
    let request = SimpleRequest {
        response_status: Some(EchoStatus::new(Code::Unknown as i32, message)),
        ..Default::default()
    };
    let outcome = cx
        .test_service()
        .unary_call(&CallContext::new(), request)
        .await;

    ensure!(
        outcome.response.is_none(),
        "UnaryCall returned a response along with an error status"
    );
    attempt!(expect_status(&outcome.status, Code::Unknown, message));
    TestResult::pass()
}

// =============================================================================
// status.status_code_and_message_*
// =============================================================================

#[conformance(name = "status.status_code_and_message_unary")]
pub async fn status_code_and_message_unary(cx: &Interop) -> TestResult {
    injected_unary(cx, TEST_STATUS_MESSAGE).await
}

#[conformance(name = "status.status_code_and_message_full_duplex")]
pub async fn status_code_and_message_full_duplex(cx: &Interop) -> TestResult {
    let mut call = cx.test_service().full_duplex_call(&CallContext::new());
    let request = StreamingOutputCallRequest {
        response_status: Some(EchoStatus::new(Code::Unknown as i32, TEST_STATUS_MESSAGE)),
        ..Default::default()
    };
    attempt!(call.write(request).await, "write");
    call.close_writes();

    let status = call.finish().await.status;
    attempt!(expect_status(&status, Code::Unknown, TEST_STATUS_MESSAGE));
    TestResult::pass()
}

// =============================================================================
// status.special_status_message
// =============================================================================
//
// The message must come back byte for byte, including the surrounding
// whitespace.

#[conformance(name = "status.special_status_message")]
pub async fn special_status_message_unary(cx: &Interop) -> TestResult {
    injected_unary(cx, SPECIAL_STATUS_MESSAGE).await
}

// =============================================================================
// status.unimplemented_*
// =============================================================================

#[conformance(name = "status.unimplemented_method")]
pub async fn unimplemented_method(cx: &Interop) -> TestResult {
    let outcome = cx
        .test_service()
        .unimplemented_call(&CallContext::new())
        .await;
    attempt!(expect_unimplemented(&outcome.status));
    TestResult::pass()
}

#[conformance(name = "status.unimplemented_server_streaming_method")]
pub async fn unimplemented_server_streaming_method(cx: &Interop) -> TestResult {
    let call = cx
        .test_service()
        .unimplemented_streaming_output_call(&CallContext::new());
    let status = call.finish().await.status;
    attempt!(expect_unimplemented(&status));
    TestResult::pass()
}

#[conformance(name = "status.unimplemented_service")]
pub async fn unimplemented_service(cx: &Interop) -> TestResult {
    let outcome = cx
        .unimplemented_service()
        .unimplemented_call(&CallContext::new())
        .await;
    let reported = attempt!(expect_unimplemented_service(&outcome.status));
    match reported.warning() {
        Some(warning) => TestResult::pass().with_warning(warning),
        None => TestResult::pass(),
    }
}

#[conformance(name = "status.unimplemented_service_streaming")]
pub async fn unimplemented_service_streaming(cx: &Interop) -> TestResult {
    let call = cx
        .unimplemented_service()
        .unimplemented_streaming_output_call(&CallContext::new());
    let status = call.finish().await.status;
    let reported = attempt!(expect_unimplemented_service(&status));
    match reported.warning() {
        Some(warning) => TestResult::pass().with_warning(warning),
        None => TestResult::pass(),
    }
}
