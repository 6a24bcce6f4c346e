//! Coercion of heterogeneous structured_data payloads into Bolt-safe
//! property maps.
//!
//! Neo4j properties are limited to scalars (and homogeneous scalar lists,
//! which extraction payloads rarely satisfy), while structured_data is an
//! arbitrary JSON object. Scalars pass through; anything composite is
//! stored as its JSON string. Nulls are omitted rather than written as
//! explicit null properties. Coercion never fails.

use std::collections::HashMap;

use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltMap, BoltString, BoltType};
use serde_json::Value;

/// Coerce one JSON object into a Bolt property map.
///
/// Keys pass through unchanged.
pub fn coerce_properties(map: &serde_json::Map<String, Value>) -> BoltMap {
    let mut value = HashMap::new();
    for (key, raw) in map {
        if let Some(coerced) = coerce_value(raw) {
            value.insert(BoltString::new(key), coerced);
        }
    }
    BoltMap { value }
}

/// Coerce one JSON value. `None` means the property is omitted.
pub(crate) fn coerce_value(raw: &Value) -> Option<BoltType> {
    match raw {
        Value::Null => None,
        Value::Bool(v) => Some(BoltType::Boolean(BoltBoolean::new(*v))),
        Value::Number(v) => {
            if let Some(i) = v.as_i64() {
                Some(BoltType::Integer(BoltInteger::new(i)))
            } else if let Some(f) = v.as_f64() {
                Some(BoltType::Float(BoltFloat::new(f)))
            } else {
                // u64 beyond i64 range; degrade to its decimal string.
                Some(BoltType::String(BoltString::new(&v.to_string())))
            }
        }
        Value::String(v) => Some(BoltType::String(BoltString::new(v))),
        Value::Array(_) | Value::Object(_) => {
            let rendered = serde_json::to_string(raw).unwrap_or_else(|_| raw.to_string());
            Some(BoltType::String(BoltString::new(&rendered)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(value: Value) -> BoltMap {
        match value {
            Value::Object(map) => coerce_properties(&map),
            _ => panic!("test payload must be an object"),
        }
    }

    fn get<'a>(map: &'a BoltMap, key: &str) -> Option<&'a BoltType> {
        map.value.get(&BoltString::new(key))
    }

    #[test]
    fn test_scalars_pass_through() {
        let map = coerce(json!({
            "name": "Alice",
            "age": 34,
            "score": 0.5,
            "active": true,
        }));

        assert!(matches!(get(&map, "name"), Some(BoltType::String(s)) if s.value == "Alice"));
        assert!(matches!(get(&map, "age"), Some(BoltType::Integer(i)) if i.value == 34));
        assert!(matches!(get(&map, "score"), Some(BoltType::Float(f)) if f.value == 0.5));
        assert!(matches!(get(&map, "active"), Some(BoltType::Boolean(b)) if b.value));
    }

    #[test]
    fn test_null_is_omitted() {
        let map = coerce(json!({"present": 1, "absent": null}));
        assert!(get(&map, "present").is_some());
        assert!(get(&map, "absent").is_none());
        assert_eq!(map.value.len(), 1);
    }

    #[test]
    fn test_composites_become_json_strings() {
        let map = coerce(json!({
            "tags": ["a", "b"],
            "meta": {"k": 1},
        }));

        assert!(matches!(get(&map, "tags"), Some(BoltType::String(s)) if s.value == r#"["a","b"]"#));
        assert!(matches!(get(&map, "meta"), Some(BoltType::String(s)) if s.value == r#"{"k":1}"#));
    }

    #[test]
    fn test_huge_unsigned_degrades_to_string() {
        let map = coerce(json!({"big": u64::MAX}));
        assert!(
            matches!(get(&map, "big"), Some(BoltType::String(s)) if s.value == u64::MAX.to_string())
        );
    }
}
