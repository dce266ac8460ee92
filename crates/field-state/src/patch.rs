//! Change log produced when a draft is committed.

use field_state_util::deep_equal;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

/// One recorded change. `path[0]` is always the top-level state key.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub op: PatchOp,
    pub path: Vec<String>,
    pub value: Option<Value>,
}

impl Patch {
    /// The top-level state key this patch falls under.
    pub fn key(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    /// Whether the patch addresses a top-level key directly.
    pub fn is_top_level(&self) -> bool {
        self.path.len() == 1
    }
}

/// Append the patches that turn `src` into `dst` under `path`.
///
/// Objects and arrays are walked structurally; anything else is a `replace`.
pub(crate) fn diff_into(out: &mut Vec<Patch>, path: &mut Vec<String>, src: &Value, dst: &Value) {
    if deep_equal(src, dst) {
        return;
    }
    match (src, dst) {
        (Value::Object(s), Value::Object(d)) => diff_obj(out, path, s, d),
        (Value::Array(s), Value::Array(d)) => diff_arr(out, path, s, d),
        _ => out.push(Patch {
            op: PatchOp::Replace,
            path: path.clone(),
            value: Some(dst.clone()),
        }),
    }
}

fn diff_obj(out: &mut Vec<Patch>, path: &mut Vec<String>, src: &Map<String, Value>, dst: &Map<String, Value>) {
    for key in src.keys() {
        if !dst.contains_key(key) {
            path.push(key.clone());
            out.push(Patch {
                op: PatchOp::Remove,
                path: path.clone(),
                value: None,
            });
            path.pop();
        }
    }
    for (key, dst_val) in dst {
        path.push(key.clone());
        match src.get(key) {
            Some(src_val) => diff_into(out, path, src_val, dst_val),
            None => out.push(Patch {
                op: PatchOp::Add,
                path: path.clone(),
                value: Some(dst_val.clone()),
            }),
        }
        path.pop();
    }
}

fn diff_arr(out: &mut Vec<Patch>, path: &mut Vec<String>, src: &[Value], dst: &[Value]) {
    let common = src.len().min(dst.len());
    for i in 0..common {
        path.push(i.to_string());
        diff_into(out, path, &src[i], &dst[i]);
        path.pop();
    }
    // Trailing removals go from the back so indices stay valid when replayed.
    for i in (common..src.len()).rev() {
        path.push(i.to_string());
        out.push(Patch {
            op: PatchOp::Remove,
            path: path.clone(),
            value: None,
        });
        path.pop();
    }
    for (i, item) in dst.iter().enumerate().skip(common) {
        path.push(i.to_string());
        out.push(Patch {
            op: PatchOp::Add,
            path: path.clone(),
            value: Some(item.clone()),
        });
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diff(src: Value, dst: Value) -> Vec<Patch> {
        let mut out = Vec::new();
        diff_into(&mut out, &mut vec!["k".to_string()], &src, &dst);
        out
    }

    fn ops(patches: &[Patch]) -> Vec<(PatchOp, String)> {
        patches.iter().map(|p| (p.op, p.path.join("/"))).collect()
    }

    #[test]
    fn equal_values_produce_nothing() {
        assert!(diff(json!({"a": [1, 2]}), json!({"a": [1, 2]})).is_empty());
        assert!(diff(json!(1), json!(1.0)).is_empty());
    }

    #[test]
    fn scalar_change_is_replace_at_path() {
        let patches = diff(json!(1), json!("x"));
        assert_eq!(ops(&patches), [(PatchOp::Replace, "k".to_string())]);
        assert_eq!(patches[0].value, Some(json!("x")));
        assert!(patches[0].is_top_level());
    }

    #[test]
    fn object_changes_are_nested() {
        let patches = diff(json!({"a": 1, "b": 2}), json!({"a": 5, "c": 3}));
        assert_eq!(
            ops(&patches),
            [
                (PatchOp::Remove, "k/b".to_string()),
                (PatchOp::Replace, "k/a".to_string()),
                (PatchOp::Add, "k/c".to_string()),
            ]
        );
        assert!(patches.iter().all(|p| p.key() == Some("k") && !p.is_top_level()));
    }

    #[test]
    fn array_growth_and_shrink() {
        assert_eq!(
            ops(&diff(json!([1]), json!([1, 2, 3]))),
            [(PatchOp::Add, "k/1".to_string()), (PatchOp::Add, "k/2".to_string())]
        );
        assert_eq!(
            ops(&diff(json!([1, 2, 3]), json!([9]))),
            [
                (PatchOp::Replace, "k/0".to_string()),
                (PatchOp::Remove, "k/2".to_string()),
                (PatchOp::Remove, "k/1".to_string()),
            ]
        );
    }
}
