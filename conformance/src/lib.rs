//! Interop conformance suite for `grpc.testing` servers.
//!
//! The harness connects to a server once, then drives a client through a
//! fixed set of scenarios and checks what comes back: payload sizes,
//! status codes and messages, echoed metadata, structured error details,
//! cancellation and deadlines.
//!
//! # Usage
//!
//! ```bash
//! interop-conformance --port 8080 --insecure
//! interop-conformance --port 8443 --certFile client.crt --keyFile client.key
//! interop-conformance --list
//! ```
//!
//! # Exit Codes
//!
//! - 0: Every selected scenario passed
//! - 1: A scenario failed, or the flags were invalid
//! - 2: The harness could not run (transport failure, unknown case)

use std::future::Future;
use std::pin::Pin;

pub mod call;
pub mod config;
pub mod harness;
pub mod metadata;
pub mod report;
pub mod runner;
pub mod status;
pub mod stub;
pub mod testcase;
pub mod tests;

use harness::Interop;
use testcase::TestResult;

/// Future returned by a registered scenario.
pub type CaseFuture<'a> = Pin<Box<dyn Future<Output = TestResult> + 'a>>;

/// A registered conformance scenario.
///
/// Scenarios are registered with the `#[conformance(name = "...")]` attribute
/// macro and listed in their category's `CASES` table.
pub struct ConformanceTest {
    /// Fully-qualified name, `category.case`.
    pub name: &'static str,
    /// The scenario itself.
    pub func: for<'a> fn(&'a Interop) -> CaseFuture<'a>,
}

impl ConformanceTest {
    pub fn category(&self) -> &'static str {
        self.name.split_once('.').map_or(self.name, |(category, _)| category)
    }

    pub async fn run(&self, interop: &Interop) -> TestResult {
        (self.func)(interop).await
    }
}

impl std::fmt::Debug for ConformanceTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConformanceTest").field("name", &self.name).finish()
    }
}
