use serde_json::{Map, Value};

/// Copy every entry of `source` into `target`, overwriting on collision.
///
/// Keys already present keep their position; new keys are appended.
pub fn assign(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// One-level merge of `overrides` over `base`; `overrides` wins.
///
/// ```
/// use serde_json::json;
/// use field_state_util::shallow_merge;
///
/// let base = json!({"a": 1, "nested": {"x": 1}});
/// let over = json!({"nested": {"y": 2}, "b": 2});
/// let merged = shallow_merge(base.as_object().unwrap(), over.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(merged), json!({"a": 1, "nested": {"y": 2}, "b": 2}));
/// ```
pub fn shallow_merge(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    assign(&mut out, overrides);
    out
}
