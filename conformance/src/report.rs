//! Text and JSON renderings of case listings and suite results.

use std::fmt::Write;

use facet::Facet;
use owo_colors::OwoColorize;

use crate::ConformanceTest;
use crate::runner::SuiteReport;

/// JSON output for a test case listing.
#[derive(Facet)]
pub struct TestCaseJson {
    pub name: String,
    pub category: String,
}

/// JSON output for a test result.
#[derive(Facet)]
pub struct TestResultJson {
    pub test: String,
    pub passed: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// JSON output for a whole pass.
#[derive(Facet)]
pub struct SuiteResultJson {
    pub compression: String,
    pub passed: u64,
    pub failed: u64,
    pub results: Vec<TestResultJson>,
}

pub fn listing_json(cases: &[&ConformanceTest]) -> String {
    let output: Vec<TestCaseJson> = cases
        .iter()
        .map(|case| TestCaseJson {
            name: case.name.to_string(),
            category: case.category().to_string(),
        })
        .collect();
    facet_json::to_string(&output)
}

pub fn listing_text(cases: &[&ConformanceTest]) -> String {
    let mut out = String::from("Available test cases:\n");

    let mut current_category = "";
    for case in cases {
        if case.category() != current_category {
            current_category = case.category();
            let _ = write!(out, "\n## {}\n", current_category);
        }
        let _ = writeln!(out, "  {}", case.name);
    }

    let _ = write!(out, "\nTotal: {} tests", cases.len());
    out
}

pub fn suite_json(report: &SuiteReport) -> String {
    let output = SuiteResultJson {
        compression: report.compression.to_string(),
        passed: report.passed() as u64,
        failed: report.failed() as u64,
        results: report
            .cases
            .iter()
            .map(|case| TestResultJson {
                test: case.name.to_string(),
                passed: case.passed,
                error: case.error.clone(),
                warnings: case.warnings.clone(),
                elapsed_ms: case.elapsed.as_millis() as u64,
            })
            .collect(),
    };
    facet_json::to_string(&output)
}

pub fn suite_text(report: &SuiteReport) -> String {
    let mut out = String::new();
    for case in &report.cases {
        if case.passed {
            let _ = writeln!(out, "{} {}", "PASS".green(), case.name);
        } else {
            let _ = writeln!(out, "{} {}", "FAIL".red(), case.name);
        }
        if let Some(error) = &case.error {
            let _ = writeln!(out, "     {}", error);
        }
        for warning in &case.warnings {
            let _ = writeln!(out, "     {} {}", "warning:".yellow(), warning);
        }
    }

    let _ = write!(
        out,
        "\n{} passed, {} failed ({} compression)",
        report.passed(),
        report.failed(),
        report.compression
    );
    out
}
