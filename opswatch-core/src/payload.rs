//! Generic nested-path lookup over raw vendor payloads.
//!
//! Vendor APIs disagree about where interesting fields live; adapters keep
//! the original response as a `serde_json::Value` side-channel on each
//! [`crate::types::AlertRecord`] and read vendor-specific fields through
//! `get_path` instead of growing the normalized model.

use serde_json::Value;

/// Look up `path` ("a.b.c") in a JSON tree, rendering the leaf as a
/// string. Returns an empty string when any segment is absent or the
/// value at a segment is not an object. Array indices are accepted as
/// numeric segments ("alerts.0.type").
pub fn get_path(raw: &Value, path: &str) -> String {
    let mut current = raw;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(v) => v,
                None => return String::new(),
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(v) => v,
                None => return String::new(),
            },
            _ => return String::new(),
        };
    }
    render(current)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path_nested() {
        let raw = json!({"data": {"event": {"type": "disk_full", "code": 7}}});
        assert_eq!(get_path(&raw, "data.event.type"), "disk_full");
        assert_eq!(get_path(&raw, "data.event.code"), "7");
    }

    #[test]
    fn test_get_path_missing_segment() {
        let raw = json!({"data": {"event": {"type": "disk_full"}}});
        assert_eq!(get_path(&raw, "data.missing.type"), "");
        assert_eq!(get_path(&raw, "data.event.type.deeper"), "");
        assert_eq!(get_path(&raw, "nope"), "");
    }

    #[test]
    fn test_get_path_array_index() {
        let raw = json!({"alerts": [{"type": "cpu"}, {"type": "mem"}]});
        assert_eq!(get_path(&raw, "alerts.1.type"), "mem");
        assert_eq!(get_path(&raw, "alerts.9.type"), "");
    }

    #[test]
    fn test_get_path_on_null_payload() {
        assert_eq!(get_path(&Value::Null, "a.b"), "");
    }
}
