use indexmap::IndexSet;
use serde_json::{Number, Value};

use crate::lookup::Lookup;
use crate::path::{unique_text, FieldPath};

/// Structural equality. Numbers compare numerically, objects ignore key order
/// and values of different shapes are never equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}

pub fn lookups_equal(a: Lookup<'_>, b: Lookup<'_>) -> bool {
    match (a, b) {
        (Lookup::Missing, Lookup::Missing) => true,
        (Lookup::Found(x), Lookup::Found(y)) => values_equal(x, y),
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (exact_int(a), exact_int(b)) {
        (Some(x), Some(y)) => x == y,
        (Some(x), None) => b.as_f64().is_some_and(|y| float_is_int(y, x)),
        (None, Some(y)) => a.as_f64().is_some_and(|x| float_is_int(x, y)),
        (None, None) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn exact_int(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

// Exact: the float must be integral and within the i128 range.
fn float_is_int(float: f64, int: i128) -> bool {
    float.fract() == 0.0 && float.abs() < 2f64.powi(127) && float as i128 == int
}

fn options_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => values_equal(x, y),
        _ => false,
    }
}

/// Every path whose value differs between `prev` and `curr`, in pre-order.
/// A changed composite contributes its own path followed by each differing
/// path beneath it. Arrays are aligned by index.
pub fn diff_paths(prev: Option<&Value>, curr: Option<&Value>) -> Vec<String> {
    unique_text(&diff_field_paths(prev, curr))
}

/// The subset of [`diff_paths`] with no differing descendant.
pub fn changed_leaves(prev: Option<&Value>, curr: Option<&Value>) -> Vec<String> {
    let paths: Vec<FieldPath> = diff_field_paths(prev, curr).into_iter().collect();
    let leaves = paths.iter().enumerate().filter_map(|(idx, path)| {
        paths
            .get(idx + 1)
            .map_or(true, |next| !next.is_descendant_of(path))
            .then_some(path)
    });
    unique_text(leaves)
}

fn diff_field_paths(prev: Option<&Value>, curr: Option<&Value>) -> IndexSet<FieldPath> {
    let mut out = IndexSet::new();
    diff_children(prev, curr, &FieldPath::default(), &mut out);
    out
}

fn diff_children(
    prev: Option<&Value>,
    curr: Option<&Value>,
    prefix: &FieldPath,
    out: &mut IndexSet<FieldPath>,
) {
    let prev_map = prev.and_then(Value::as_object);
    let curr_map = curr.and_then(Value::as_object);
    let keys: IndexSet<&String> = prev_map
        .into_iter()
        .chain(curr_map)
        .flat_map(|map| map.keys())
        .collect();
    for key in keys {
        visit(
            prev_map.and_then(|map| map.get(key)),
            curr_map.and_then(|map| map.get(key)),
            prefix.key(key),
            out,
        );
    }

    // Root indices are not addressable by the path grammar.
    if prefix.is_empty() {
        return;
    }
    let prev_items = prev.and_then(Value::as_array);
    let curr_items = curr.and_then(Value::as_array);
    let len = prev_items
        .map_or(0, Vec::len)
        .max(curr_items.map_or(0, Vec::len));
    for idx in 0..len {
        visit(
            prev_items.and_then(|items| items.get(idx)),
            curr_items.and_then(|items| items.get(idx)),
            prefix.index(idx),
            out,
        );
    }
}

fn visit(prev: Option<&Value>, curr: Option<&Value>, path: FieldPath, out: &mut IndexSet<FieldPath>) {
    if options_equal(prev, curr) {
        return;
    }
    out.insert(path.clone());
    diff_children(prev, curr, &path, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_follows_structure() {
        assert!(values_equal(&json!({"a": 1, "b": [1, 2]}), &json!({"b": [1, 2], "a": 1})));
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!values_equal(&json!(null), &json!(0)));
        assert!(!values_equal(&json!(""), &json!(null)));
        assert!(!values_equal(&json!([]), &json!({})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn integer_and_float_compare_exactly() {
        assert!(values_equal(&json!(-3), &json!(-3.0)));
        assert!(!values_equal(&json!(1), &json!(1.5)));
        assert!(values_equal(&json!(9007199254740992u64), &json!(9007199254740992.0)));
        assert!(!values_equal(&json!(9007199254740993u64), &json!(9007199254740992.0)));
        assert!(!values_equal(&json!(u64::MAX), &json!(-1)));
    }

    #[test]
    fn missing_is_not_null() {
        let null = Value::Null;
        assert!(lookups_equal(Lookup::Missing, Lookup::Missing));
        assert!(!lookups_equal(Lookup::Missing, Lookup::Found(&null)));
    }

    #[test]
    fn scalar_change_reports_single_path() {
        let prev = json!({"id": 1, "v": 1});
        let curr = json!({"id": 1, "v": 2});
        assert_eq!(diff_paths(Some(&prev), Some(&curr)), vec!["v"]);
    }

    #[test]
    fn nested_change_reports_composite_and_leaf() {
        let prev = json!({"cov": [{"id": 1, "amt": 10}], "same": {"x": 1}});
        let curr = json!({"cov": [{"id": 1, "amt": 12}, {"id": 2}], "same": {"x": 1}});
        assert_eq!(
            diff_paths(Some(&prev), Some(&curr)),
            vec!["cov", "cov[0]", "cov[0].amt", "cov[1]", "cov[1].id"]
        );
        assert_eq!(
            changed_leaves(Some(&prev), Some(&curr)),
            vec!["cov[0].amt", "cov[1].id"]
        );
    }

    #[test]
    fn presence_changes_count_as_differences() {
        let prev = json!({"a": null, "gone": {"k": 1}});
        let curr = json!({"new": []});
        assert_eq!(
            diff_paths(Some(&prev), Some(&curr)),
            vec!["a", "gone", "gone.k", "new"]
        );
        assert_eq!(
            changed_leaves(Some(&prev), Some(&curr)),
            vec!["a", "gone.k", "new"]
        );
    }

    #[test]
    fn colliding_path_text_is_reported_once() {
        let prev = json!({"a.b": 1, "a": {"b": 2}});
        let curr = json!({"a.b": 3, "a": {"b": 4}});
        assert_eq!(diff_paths(Some(&prev), Some(&curr)), vec!["a.b", "a"]);
        assert_eq!(changed_leaves(Some(&prev), Some(&curr)), vec!["a.b"]);
    }

    #[test]
    fn absent_record_differs_everywhere() {
        let curr = json!({"a": {"b": 1}});
        assert_eq!(diff_paths(None, Some(&curr)), vec!["a", "a.b"]);
        assert!(diff_paths(None, None).is_empty());
    }
}
