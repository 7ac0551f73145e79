//! Runs scenarios one after another and collects their results.

use std::time::{Duration, Instant};

use crate::ConformanceTest;
use crate::config::Compression;
use crate::harness::Interop;

/// Result of one scenario.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub name: &'static str,
    pub passed: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

/// Results of one pass over the selected scenarios.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub compression: Compression,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.cases.iter().all(|case| case.passed)
    }
}

pub async fn run_case(interop: &Interop, case: &ConformanceTest) -> CaseReport {
    tracing::info!(case = case.name, "running");
    let started = Instant::now();
    let result = case.run(interop).await;
    let elapsed = started.elapsed();

    match &result.error {
        None => tracing::info!(case = case.name, ?elapsed, "passed"),
        Some(error) => tracing::warn!(case = case.name, ?elapsed, %error, "failed"),
    }

    CaseReport {
        name: case.name,
        passed: result.passed,
        error: result.error,
        warnings: result.warnings,
        elapsed,
    }
}

/// Run `cases` in order. A failing scenario never stops the ones after it.
pub async fn run_suite(interop: &Interop, cases: &[&ConformanceTest]) -> SuiteReport {
    let mut report = SuiteReport {
        compression: interop.compression(),
        cases: Vec::with_capacity(cases.len()),
    };
    for case in cases {
        report.cases.push(run_case(interop, case).await);
    }
    report
}
