use serde_json::{Map, Number, Value};

/// Performs a deep equality check between two JSON values.
///
/// Objects compare key-by-key regardless of insertion order, arrays
/// element-by-element. Numbers compare by numeric value, so `1` and `1.0`
/// are equal even though `serde_json` stores them differently.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use field_state_util::deep_equal;
///
/// assert!(deep_equal(&json!({"a": [1, 2]}), &json!({"a": [1.0, 2]})));
/// assert!(!deep_equal(&json!({"a": [1, 2]}), &json!({"a": [2, 1]})));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => number_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(obj_a), Value::Object(obj_b)) => deep_equal_map(obj_a, obj_b),
        _ => false,
    }
}

/// Deep equality of two JSON objects.
pub fn deep_equal_map(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .all(|(key, val_a)| b.get(key).is_some_and(|val_b| deep_equal(val_a, val_b)))
}

fn number_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    // Integers outside the f64-exact range stay distinct unless bit-identical.
    match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
        (Some(x), Some(y), _, _) => x == y,
        (_, _, Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_numbers() {
        assert!(deep_equal(&json!(1), &json!(1)));
        assert!(!deep_equal(&json!(1), &json!(2)));
    }

    #[test]
    fn test_int_and_float_with_same_value_equal() {
        assert!(deep_equal(&json!(3), &json!(3.0)));
        assert!(!deep_equal(&json!(3), &json!(3.5)));
    }

    #[test]
    fn test_negative_and_unsigned() {
        assert!(deep_equal(&json!(-1), &json!(-1.0)));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!deep_equal(&json!(-1), &json!(u64::MAX)));
    }

    #[test]
    fn test_zero_and_null_not_equal() {
        assert!(!deep_equal(&json!(0), &json!(null)));
        assert!(!deep_equal(&json!(""), &json!(null)));
        assert!(!deep_equal(&json!(0), &json!(false)));
    }

    #[test]
    fn test_equal_objects_different_order() {
        assert!(deep_equal(
            &json!({"a": 1, "b": "2"}),
            &json!({"b": "2", "a": 1})
        ));
    }

    #[test]
    fn test_not_equal_objects_extra_property() {
        assert!(!deep_equal(
            &json!({"a": 1, "b": "2"}),
            &json!({"a": 1, "b": "2", "c": []})
        ));
    }

    #[test]
    fn test_not_equal_objects_different_properties() {
        assert!(!deep_equal(
            &json!({"a": 1, "c": 3}),
            &json!({"a": 1, "d": 3})
        ));
    }

    #[test]
    fn test_equal_nested() {
        assert!(deep_equal(
            &json!({"a": [{"b": "c"}]}),
            &json!({"a": [{"b": "c"}]})
        ));
        assert!(!deep_equal(
            &json!({"a": [{"b": "c"}]}),
            &json!({"a": [{"b": "d"}]})
        ));
    }

    #[test]
    fn test_empty_object_and_array_not_equal() {
        assert!(!deep_equal(&json!({}), &json!([])));
    }

    #[test]
    fn test_arrays_order_matters() {
        assert!(deep_equal(&json!([1, 2, 3]), &json!([1, 2, 3])));
        assert!(!deep_equal(&json!([1, 2, 3]), &json!([3, 2, 1])));
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
    }
}
