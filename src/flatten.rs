//! Recursive flattening of a nested attribute tree into dotted metric
//! suffixes.

use std::collections::{BTreeMap, HashMap};

use crate::model::AttrValue;
use crate::sink::sanitize_metric_name;

/// Flattens a decoded attribute tree into `dotted-suffix -> value`.
///
/// Pure and total over any finite tree: each recursion strips one level of
/// nesting. Only numeric leaves survive; strings, booleans, nulls and
/// arrays are dropped. On an exact key collision after sanitization the
/// later entry wins.
pub fn flatten(tree: &BTreeMap<String, AttrValue>) -> HashMap<String, f64> {
    let mut flat = HashMap::new();
    for (key, value) in tree {
        match value {
            AttrValue::Number(n) => {
                flat.insert(sanitize_metric_name(key, false), *n);
            }
            AttrValue::Branch(inner) => {
                // suffixes coming back from the recursion are already
                // sanitized segment by segment; their joining dots are real
                // hierarchy and must survive
                let prefix = sanitize_metric_name(key, false);
                for (suffix, leaf) in flatten(inner) {
                    flat.insert(format!("{prefix}.{suffix}"), leaf);
                }
            }
            AttrValue::Other(_) => {}
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(v: serde_json::Value) -> BTreeMap<String, AttrValue> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn flattens_one_nested_level() {
        let flat = flatten(&tree(json!({"a": {"b": 1, "c": 2}, "d": 3})));
        assert_eq!(flat.len(), 3);
        assert_eq!(flat["a.b"], 1.0);
        assert_eq!(flat["a.c"], 2.0);
        assert_eq!(flat["d"], 3.0);
    }

    #[test]
    fn flattens_multiple_levels() {
        let flat = flatten(&tree(json!({"a": {"b": {"c": 5}}})));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a.b.c"], 5.0);
    }

    #[test]
    fn drops_non_numeric_leaves() {
        let flat = flatten(&tree(json!({
            "used": 7,
            "name": "heap",
            "verbose": false,
            "pools": ["eden", "old"],
            "unset": null
        })));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["used"], 7.0);
    }

    #[test]
    fn sanitizes_keys_on_the_way_out() {
        let flat = flatten(&tree(json!({"rate.per.sec": 4, "pool size": 2})));
        assert_eq!(flat["rate_per_sec"], 4.0);
        assert_eq!(flat["pool-size"], 2.0);
    }

    #[test]
    fn recursive_suffixes_keep_their_separator_dots() {
        // inner keys are sanitized exactly once; the dots joining the
        // levels stay hierarchy separators
        let flat = flatten(&tree(json!({"a": {"b.x": {"c": 5}}})));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a.b_x.c"], 5.0);
    }

    #[test]
    fn collisions_resolve_last_write_wins() {
        // '.' sorts before '_', so "b_c" is visited second and wins
        let flat = flatten(&tree(json!({"b.c": 1, "b_c": 2})));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["b_c"], 2.0);
    }
}
