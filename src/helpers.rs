//! Structural equality of JSON values.
//!
//! Kinds must match; arrays compare positionally, objects by key set, and
//! numbers as exact rationals, so `1`, `1.0` and `1e0` are all equal.

use crate::rational;
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => equal_numbers(left, right),
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
fn equal_numbers(left: &Number, right: &Number) -> bool {
    // Integer representations compare without allocating; everything else
    // goes through exact rationals.
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        left == right
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        left == right
    } else if let (Some(left), Some(right)) = (left.as_u64(), right.as_i64()) {
        NumCmp::num_eq(left, right)
    } else if let (Some(left), Some(right)) = (left.as_i64(), right.as_u64()) {
        NumCmp::num_eq(left, right)
    } else {
        rational::to_fraction(left) == rational::to_fraction(right)
    }
}

#[inline]
fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(left, right)| equal(left, right))
}

#[inline]
fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, left_value)| {
            right
                .get(key)
                .map_or(false, |right_value| equal(left_value, right_value))
        })
}

#[cfg(test)]
mod tests {
    use super::equal;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0))]
    #[test_case(&json!([2]), &json!([2.0]))]
    #[test_case(&json!([-3]), &json!([-3.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}))]
    #[test_case(&json!("b"), &json!("b"))]
    #[test_case(&json!(null), &json!(null))]
    fn are_equal(left: &Value, right: &Value) {
        assert!(equal(left, right));
        assert!(equal(right, left));
    }

    #[test_case(&json!(1), &json!(2.0))]
    #[test_case(&json!([]), &json!(["foo"]))]
    #[test_case(&json!([-3]), &json!([-4.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0, "b": 2}))]
    #[test_case(&json!(0), &json!(false))]
    #[test_case(&json!(""), &json!(null))]
    fn are_not_equal(left: &Value, right: &Value) {
        assert!(!equal(left, right));
        assert!(!equal(right, left));
    }

    #[test]
    fn exponent_notation_is_numeric() {
        let left: Value = serde_json::from_str("1e0").unwrap();
        assert!(equal(&left, &json!(1)));
    }

    #[test]
    fn precision_is_not_lost() {
        // Both parse to the same f64, but differ as decimals.
        let left: Value = serde_json::from_str("1.0000000000000000001").unwrap();
        assert!(!equal(&left, &json!(1)));
    }

    #[test]
    fn key_order_is_irrelevant() {
        let left: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let right: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert!(equal(&left, &right));
    }
}
