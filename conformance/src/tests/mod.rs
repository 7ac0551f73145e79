//! Conformance scenarios.
//!
//! Each module holds one category of scenarios and lists them, in run
//! order, in its `CASES` table.

pub mod cancel;
pub mod metadata;
pub mod status;
pub mod unary;

use interop_proto::{Payload, PayloadType};

use crate::ConformanceTest;

/// All test categories, in run order.
pub const CATEGORIES: &[&str] = &[
    "unary",
    "stream",
    "cancel",
    "metadata",
    "status",
    "error",
    "transport",
];

/// Request payload sizes for the client-side streaming scenarios.
pub(crate) const REQUEST_SIZES: [usize; 4] = [256_000, 8, 1024, 32_768];

/// Response sizes for the server-side streaming scenarios.
pub(crate) const RESPONSE_SIZES: [i32; 4] = [512_000, 16, 2028, 65_536];

pub(crate) const LARGE_REQUEST_SIZE: usize = 256_000;
pub(crate) const LARGE_RESPONSE_SIZE: i32 = 512_000;

pub(crate) const TEST_STATUS_MESSAGE: &str = "test status message";

/// Whitespace, a BMP character and a non-BMP character, all of which must
/// survive the round trip byte for byte.
pub(crate) const SPECIAL_STATUS_MESSAGE: &str =
    "\t\ntest with whitespace\r\nand Unicode BMP ☺ and non-BMP 😈\t\n";

/// The payload is present, compressable and exactly `size` bytes long.
pub(crate) fn check_payload(payload: Option<&Payload>, size: usize) -> Result<(), String> {
    let payload = payload.ok_or_else(|| "response has no payload".to_string())?;
    if payload.r#type != PayloadType::Compressable as i32 {
        return Err(format!(
            "payload type: expected COMPRESSABLE, got {}",
            payload.r#type
        ));
    }
    if payload.body.len() != size {
        return Err(format!(
            "payload size: expected {}, got {}",
            size,
            payload.body.len()
        ));
    }
    Ok(())
}

fn category_cases(category: &str) -> &'static [ConformanceTest] {
    match category {
        "unary" => unary::CASES,
        "stream" => stream::CASES,
        "cancel" => cancel::CASES,
        "metadata" => metadata::CASES,
        "status" => status::CASES,
        "error" => error::CASES,
        "transport" => transport::CASES,
        _ => &[],
    }
}

/// Every registered scenario, grouped by category.
pub fn all() -> Vec<&'static ConformanceTest> {
    CATEGORIES
        .iter()
        .flat_map(|category| category_cases(category))
        .collect()
}

/// Look up a scenario by fully-qualified name (e.g. `unary.large_unary`).
pub fn find(name: &str) -> Option<&'static ConformanceTest> {
    let (category, _) = name.split_once('.')?;
    category_cases(category).iter().find(|case| case.name == name)
}

/// Scenarios of one category; `None` for an unknown category.
pub fn list_category(category: &str) -> Option<Vec<&'static ConformanceTest>> {
    CATEGORIES
        .contains(&category)
        .then(|| category_cases(category).iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_prefixed_by_category() {
        let mut seen = HashSet::new();
        for category in CATEGORIES {
            for case in category_cases(category) {
                assert_eq!(case.category(), *category, "{}", case.name);
                assert!(seen.insert(case.name), "duplicate case {}", case.name);
            }
        }
        assert_eq!(seen.len(), all().len());
    }

    #[test]
    fn every_category_has_cases() {
        for category in CATEGORIES {
            assert!(!category_cases(category).is_empty(), "{} is empty", category);
        }
    }

    #[test]
    fn lookup_by_name_and_category() {
        assert_eq!(find("unary.large_unary").map(|case| case.name), Some("unary.large_unary"));
        assert!(find("unary.nope").is_none());
        assert!(find("no_dot").is_none());
        assert!(list_category("bogus").is_none());
        assert_eq!(list_category("transport").map(|cases| cases.len()), Some(1));
        assert_eq!(all().len(), 28);
    }

    #[test]
    fn sizes_match_the_reference_client() {
        assert_eq!(REQUEST_SIZES.iter().sum::<usize>(), 290_800);
        let payload = Payload::compressable(8);
        assert!(check_payload(Some(&payload), 8).is_ok());
        assert_eq!(
            check_payload(Some(&payload), 9).unwrap_err(),
            "payload size: expected 9, got 8"
        );
        assert!(check_payload(None, 0).is_err());
    }
}
