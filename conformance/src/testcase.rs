//! Test case results.
//!
//! This module defines the result type every scenario returns, and the
//! macros scenarios use to bail out with a diagnostic.

/// Result of running a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Tolerated deviations observed on a passing run.
    pub warnings: Vec<String>,
}

impl TestResult {
    /// Create a passing result.
    pub fn pass() -> Self {
        Self {
            passed: true,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Create a failing result with an error message.
    pub fn fail(msg: impl Into<String>) -> Self {
        Self {
            passed: false,
            error: Some(msg.into()),
            warnings: Vec::new(),
        }
    }

    /// Record a tolerated deviation.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Fail the scenario with a formatted message unless `cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return $crate::testcase::TestResult::fail(format!($($arg)+));
        }
    };
}

/// Fail the scenario unless `actual == expected`, naming both.
#[macro_export]
macro_rules! ensure_eq {
    ($actual:expr, $expected:expr, $what:expr) => {{
        let actual = &$actual;
        let expected = &$expected;
        if actual != expected {
            return $crate::testcase::TestResult::fail(format!(
                "{}: expected {:?}, got {:?}",
                $what, expected, actual
            ));
        }
    }};
}

/// Unwrap a `Result`, failing the scenario with the error's text.
#[macro_export]
macro_rules! attempt {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => return $crate::testcase::TestResult::fail(e.to_string()),
        }
    };
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => return $crate::testcase::TestResult::fail(format!("{}: {}", $context, e)),
        }
    };
}
