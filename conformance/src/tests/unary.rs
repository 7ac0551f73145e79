//! Unary scenarios: one request, one response.

use interop_conformance_macros::conformance;
use interop_proto::{Empty, Payload, PayloadType, SimpleRequest};

use super::{LARGE_REQUEST_SIZE, LARGE_RESPONSE_SIZE, check_payload};
use crate::call::CallContext;
use crate::harness::Interop;
use crate::status::expect_ok;
use crate::testcase::TestResult;
use crate::{ConformanceTest, attempt, ensure};

pub const CASES: &[ConformanceTest] = &[EMPTY_UNARY, CACHEABLE_UNARY, LARGE_UNARY];

// =============================================================================
// unary.empty_unary
// =============================================================================

#[conformance(name = "unary.empty_unary")]
pub async fn empty_unary(cx: &Interop) -> TestResult {
    let outcome = cx
        .test_service()
        .empty_call(&CallContext::new(), Empty {})
        .await;

    attempt!(expect_ok(&outcome.status));
    ensure!(outcome.response.is_some(), "EmptyCall returned OK without a response");
    TestResult::pass()
}

// =============================================================================
// unary.cacheable_unary
// =============================================================================
//
// Sent as a cacheable call. Whether an intermediary serves it from cache is
// not observed.

#[conformance(name = "unary.cacheable_unary")]
pub async fn cacheable_unary(cx: &Interop) -> TestResult {
    let request = SimpleRequest {
        response_type: PayloadType::Compressable as i32,
        response_size: 1,
        payload: Some(Payload::compressable(1)),
        ..Default::default()
    };
    let outcome = cx
        .test_service()
        .cacheable_unary_call(&CallContext::new(), request)
        .await;

    attempt!(expect_ok(&outcome.status));
    let response = attempt!(outcome.response.ok_or("CacheableUnaryCall returned no response"));
    attempt!(check_payload(response.payload.as_ref(), 1));
    TestResult::pass()
}

// =============================================================================
// unary.large_unary
// =============================================================================

#[conformance(name = "unary.large_unary")]
pub async fn large_unary(cx: &Interop) -> TestResult {
    let request = SimpleRequest {
        response_type: PayloadType::Compressable as i32,
        response_size: LARGE_RESPONSE_SIZE,
        payload: Some(Payload::compressable(LARGE_REQUEST_SIZE)),
        ..Default::default()
    };
    let outcome = cx
        .test_service()
        .unary_call(&CallContext::new(), request)
        .await;

    attempt!(expect_ok(&outcome.status));
    let response = attempt!(outcome.response.ok_or("UnaryCall returned no response"));
    attempt!(check_payload(
        response.payload.as_ref(),
        LARGE_RESPONSE_SIZE as usize
    ));
    TestResult::pass()
}
