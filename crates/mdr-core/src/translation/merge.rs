//! Deep merge of translation fragments
//!
//! Objects merge key by key, arrays index by index with surplus fragment
//! elements appended, and any other pairing replaces the existing value.
//! Merging the same fragment twice gives the same result as merging it once.

use serde_json::Value;

/// Merge `fragment` into `target` in place
pub fn deep_merge(target: &mut Value, fragment: &Value) {
    match (&mut *target, fragment) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            for (index, value) in incoming.iter().enumerate() {
                match existing.get_mut(index) {
                    Some(slot) => deep_merge(slot, value),
                    None => existing.push(value.clone()),
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Merged copy, leaving `base` untouched
pub fn merged(base: &Value, fragment: &Value) -> Value {
    let mut copy = base.clone();
    deep_merge(&mut copy, fragment);
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_objects_merge_recursively() {
        let base = json!({"User": {"Name": "Ada", "Skills": {"Level": 2}}});
        let result = merged(&base, &json!({"User": {"Skills": {"Genre": "A"}}}));
        assert_eq!(
            result,
            json!({"User": {"Name": "Ada", "Skills": {"Level": 2, "Genre": "A"}}})
        );
        assert_eq!(base["User"]["Skills"], json!({"Level": 2}));
    }

    #[test]
    fn test_arrays_merge_by_index() {
        let mut target = json!({"Courses": [{"id": 1}]});
        deep_merge(&mut target, &json!({"Courses": [{"grade": "A"}, {"id": 2}]}));
        assert_eq!(target, json!({"Courses": [{"id": 1, "grade": "A"}, {"id": 2}]}));
    }

    #[test]
    fn test_scalars_and_mismatched_shapes_replace() {
        let mut target = json!({"x": 1, "y": {"z": true}});
        deep_merge(&mut target, &json!({"x": "one", "y": [1]}));
        assert_eq!(target, json!({"x": "one", "y": [1]}));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let fragment = json!({"a": {"b": [1, {"c": 2}]}, "d": null});
        let once = merged(&json!({"a": {"e": 5}}), &fragment);
        assert_eq!(merged(&once, &fragment), once);
    }
}
