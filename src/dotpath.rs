//! Dot-notation addressing into JSON documents
//!
//! Keys are dot-separated field names (`"a.b.c"`). Every intermediate
//! segment must be an object; walking through anything else counts as
//! "not found".

use serde_json::{Map, Value};

use crate::error::{KageError, Result};

/// Resolve a dot path, returning `None` if any segment is absent
pub fn lookup<'a>(key: &str, document: &'a Value) -> Option<&'a Value> {
    key.split('.')
        .try_fold(document, |current, segment| current.as_object()?.get(segment))
}

/// Check if a dot path resolves
pub fn exists(key: &str, document: &Value) -> bool {
    lookup(key, document).is_some()
}

/// Resolve a dot path, failing if any segment is absent
pub fn get<'a>(key: &str, document: &'a Value) -> Result<&'a Value> {
    lookup(key, document).ok_or_else(|| KageError::PathNotFound {
        path: key.to_string(),
    })
}

/// Write a value at a dot path, creating intermediate objects
///
/// Non-object intermediates (including a non-object document) are replaced
/// by empty objects.
pub fn set(key: &str, value: Value, document: &mut Value) {
    let mut segments = key.split('.').peekable();
    let mut current = document;

    while let Some(segment) = segments.next() {
        let map = ensure_object(current);
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment)
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_and_nested_lookup() {
        let doc = json!({"n": 5, "a": {"b": {"c": "deep"}}});
        assert_eq!(get("n", &doc).unwrap(), &json!(5));
        assert_eq!(get("a.b.c", &doc).unwrap(), &json!("deep"));
        assert!(exists("a.b", &doc));
    }

    #[test]
    fn missing_segment_is_not_found() {
        let doc = json!({"a": {"b": 1}});
        assert!(!exists("a.x", &doc));
        let err = get("a.x.y", &doc).unwrap_err();
        assert!(matches!(err, KageError::PathNotFound { ref path } if path == "a.x.y"));
    }

    #[test]
    fn walking_through_scalars_is_not_found() {
        let doc = json!({"a": 1, "list": [{"b": 2}]});
        assert!(!exists("a.b", &doc));
        assert!(!exists("list.0.b", &doc));
        assert!(lookup("a.b", &doc).is_none());
    }

    #[test]
    fn null_values_exist() {
        let doc = json!({"a": null});
        assert!(exists("a", &doc));
    }

    #[test]
    fn set_creates_intermediate_levels() {
        let mut doc = json!({});
        set("result.value", json!(10), &mut doc);
        assert_eq!(doc, json!({"result": {"value": 10}}));
    }

    #[test]
    fn set_overwrites_placeholder() {
        let mut doc = json!({"x": {"y": null}, "z": null});
        set("x.y", json!("filled"), &mut doc);
        set("z", json!([1]), &mut doc);
        assert_eq!(doc, json!({"x": {"y": "filled"}, "z": [1]}));
    }

    #[test]
    fn set_replaces_non_object_intermediate() {
        let mut doc = json!({"a": 3});
        set("a.b", json!(true), &mut doc);
        assert_eq!(doc, json!({"a": {"b": true}}));

        let mut scalar = json!(null);
        set("k", json!(1), &mut scalar);
        assert_eq!(scalar, json!({"k": 1}));
    }
}
