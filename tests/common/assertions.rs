//! Assertion utilities for testing.
//!
//! Floating-point comparisons and checks on flattened coordinate arrays.

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that two arrays of floating-point values are approximately element-wise equal.
pub fn assert_array_approx_eq(actual: &[f64], expected: &[f64], epsilon: Option<f64>) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Arrays have different lengths: actual = {}, expected = {}",
        actual.len(),
        expected.len()
    );

    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= eps,
            "Arrays differ at index {}: actual = {}, expected = {}, diff = {}, epsilon = {}",
            i,
            a,
            e,
            diff,
            eps
        );
    }
}

/// Split a JSON coordinate array (numbers and nulls) into runs between nulls
pub fn json_rings(values: &serde_json::Value) -> Vec<Vec<f64>> {
    let mut rings = Vec::new();
    let mut current = Vec::new();
    for value in values.as_array().expect("coordinates must be an array") {
        match value.as_f64() {
            Some(v) => current.push(v),
            None => {
                if !current.is_empty() {
                    rings.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        rings.push(current);
    }
    rings
}

/// Assert that a JSON coordinate array never holds two nulls in a row
pub fn assert_no_double_gaps(values: &serde_json::Value) {
    let values = values.as_array().expect("coordinates must be an array");
    for pair in values.windows(2) {
        assert!(
            !(pair[0].is_null() && pair[1].is_null()),
            "Coordinate array has consecutive gaps"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
    }

    #[test]
    fn test_json_rings() {
        let rings = json_rings(&json!([0.0, 1.0, 0.0, null, 5.0, 6.0, null]));
        assert_eq!(rings, vec![vec![0.0, 1.0, 0.0], vec![5.0, 6.0]]);
        assert_no_double_gaps(&json!([0.0, null, 1.0, null]));
    }
}
