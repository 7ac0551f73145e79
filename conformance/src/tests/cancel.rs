//! Cancellation and deadline scenarios.

use std::time::{Duration, Instant};

use interop_conformance_macros::conformance;
use interop_proto::{Payload, StreamingOutputCallRequest};
use tonic::Code;

use super::check_payload;
use crate::call::CallContext;
use crate::harness::Interop;
use crate::status::expect_code;
use crate::testcase::TestResult;
use crate::{ConformanceTest, attempt, ensure};

pub const CASES: &[ConformanceTest] = &[
    TIMEOUT_ON_SLEEPING_SERVER,
    CANCEL_AFTER_BEGIN,
    CANCEL_AFTER_FIRST_RESPONSE,
];

const SLEEPING_SERVER_DEADLINE: Duration = Duration::from_millis(500);
const CANCEL_REQUEST_SIZE: usize = 27_182;
const CANCEL_RESPONSE_SIZE: i32 = 31_415;

// =============================================================================
// cancel.timeout_on_sleeping_server
// =============================================================================
//
// A request with no response parameters gets no answer, so the call can only
// end by deadline.

#[conformance(name = "cancel.timeout_on_sleeping_server")]
pub async fn timeout_on_sleeping_server(cx: &Interop) -> TestResult {
    let ctx = CallContext::new().with_timeout(SLEEPING_SERVER_DEADLINE);
    let started = Instant::now();
    let mut call = cx.test_service().full_duplex_call(&ctx);

    let request = StreamingOutputCallRequest {
        payload: Some(Payload::compressable(CANCEL_REQUEST_SIZE)),
        ..Default::default()
    };
    let status = match call.write(request).await {
        // The deadline may already have passed by the time the write goes out.
        Err(status) => status,
        Ok(()) => call.finish().await.status,
    };

    attempt!(expect_code(&status, Code::DeadlineExceeded));
    let elapsed = started.elapsed();
    ensure!(
        elapsed >= SLEEPING_SERVER_DEADLINE,
        "call ended after {:?}, before its {:?} deadline",
        elapsed,
        SLEEPING_SERVER_DEADLINE
    );
    TestResult::pass()
}

// =============================================================================
// cancel.cancel_after_begin
// =============================================================================

#[conformance(name = "cancel.cancel_after_begin")]
pub async fn cancel_after_begin(cx: &Interop) -> TestResult {
    let ctx = CallContext::new();
    let call = cx.test_service().streaming_input_call(&ctx);
    ctx.cancel();

    let finished = call.finish().await;
    attempt!(expect_code(&finished.status, Code::Cancelled));
    TestResult::pass()
}

// =============================================================================
// cancel.cancel_after_first_response
// =============================================================================

#[conformance(name = "cancel.cancel_after_first_response")]
pub async fn cancel_after_first_response(cx: &Interop) -> TestResult {
    let mut call = cx.test_service().full_duplex_call(&CallContext::new());

    let mut request = StreamingOutputCallRequest::with_sizes(&[CANCEL_RESPONSE_SIZE]);
    request.payload = Some(Payload::compressable(CANCEL_REQUEST_SIZE));
    attempt!(call.write(request).await, "write");

    let first = attempt!(call.read().await, "first read");
    let first = attempt!(first.ok_or("stream ended before the first response"));
    attempt!(check_payload(
        first.payload.as_ref(),
        CANCEL_RESPONSE_SIZE as usize
    ));

    call.cancel();
    match call.read().await {
        Err(status) => attempt!(expect_code(&status, Code::Cancelled), "read after cancel"),
        Ok(_) => return TestResult::fail("read after cancel succeeded"),
    }

    let finished = call.finish().await;
    attempt!(expect_code(&finished.status, Code::Cancelled), "finish");
    TestResult::pass()
}
