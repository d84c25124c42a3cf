//! Custom assertions for cache tests

use common::{Security, SecurityRef, same_security};

/// Assert that a handle points at exactly `expected`
pub fn assert_same_security(actual: &SecurityRef, expected: &Security) {
    assert!(
        same_security(actual, expected),
        "Expected the cached handle for {}, got {}",
        expected.id,
        actual.id
    );
}

/// Assert that a result holds exactly the given records, by handle identity, in order
pub fn assert_securities(actual: &[SecurityRef], expected: &[&SecurityRef]) {
    let actual_ids: Vec<&str> = actual.iter().map(|s| s.id.as_str()).collect();
    let expected_ids: Vec<&str> = expected.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Expected {expected_ids:?}, got {actual_ids:?}"
    );
    for (actual, expected) in actual.iter().zip(expected) {
        assert_same_security(actual, expected);
    }
}

/// Assert that ids match ignoring order
pub fn assert_ids_unordered(actual: &[String], expected: &[&str]) {
    let mut actual: Vec<&str> = actual.iter().map(String::as_str).collect();
    let mut expected = expected.to_vec();
    actual.sort_unstable();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Security ids differ");
}
