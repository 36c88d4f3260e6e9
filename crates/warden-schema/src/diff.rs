//! Change detection between attribute snapshots

use chrono::DateTime;
use serde_json::{Map, Value};

/// Names of attributes whose value differs between the two snapshots.
///
/// Timestamps compare by instant, so `"2024-01-01T00:00:00Z"` equals
/// `"2024-01-01T00:00:00.000Z"`. Everything else compares structurally.
/// An attribute present on only one side always counts as changed.
pub fn changed_attributes(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, old_value) in old {
        match new.get(key) {
            Some(new_value) if values_equal(old_value, new_value) => {}
            _ => changed.push(key.clone()),
        }
    }
    for key in new.keys() {
        if !old.contains_key(key) && !changed.iter().any(|c| c == key) {
            changed.push(key.clone());
        }
    }

    changed
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x == y,
                _ => x == y,
            }
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_no_changes() {
        let old = snapshot(json!({"login": "x", "age": 30}));
        let new = snapshot(json!({"login": "x", "age": 30}));
        assert!(changed_attributes(&old, &new).is_empty());
    }

    #[test]
    fn test_changed_value() {
        let old = snapshot(json!({"login": "x", "age": 30}));
        let new = snapshot(json!({"login": "y", "age": 30}));
        assert_eq!(changed_attributes(&old, &new), vec!["login"]);
    }

    #[test]
    fn test_added_and_removed_keys_count_as_changed() {
        let old = snapshot(json!({"login": "x"}));
        let new = snapshot(json!({"age": 30}));
        let changed = changed_attributes(&old, &new);
        assert!(changed.contains(&"login".to_string()));
        assert!(changed.contains(&"age".to_string()));
    }

    #[test]
    fn test_equivalent_timestamps_are_unchanged() {
        let old = snapshot(json!({"updatedAt": "2024-01-01T00:00:00Z"}));
        let new = snapshot(json!({"updatedAt": "2024-01-01T00:00:00.000Z"}));
        assert!(changed_attributes(&old, &new).is_empty());
    }

    #[test]
    fn test_different_timestamps_are_changed() {
        let old = snapshot(json!({"updatedAt": "2024-01-01T00:00:00Z"}));
        let new = snapshot(json!({"updatedAt": "2024-01-02T00:00:00Z"}));
        assert_eq!(changed_attributes(&old, &new), vec!["updatedAt"]);
    }

    #[test]
    fn test_number_representation_is_unchanged() {
        let old = snapshot(json!({"age": 30}));
        let new = snapshot(json!({"age": 30.0}));
        assert!(changed_attributes(&old, &new).is_empty());
    }
}
