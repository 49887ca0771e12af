//! Flattening of nested records into dotted keys
//!
//! Never multiplies rows: one record in, one record out. Arrays are left as
//! they are.

use serde_json::{Map, Value};

use crate::types::Record;

/// Flatten every nested object of `record` into `separator`-joined keys.
///
/// Empty strings are dropped; `null`, numbers, booleans and arrays are kept
/// unchanged under their flattened key.
pub fn flatten_record(record: &Record, separator: &str) -> Record {
    let mut out = Map::new();
    flatten_into(record, "", separator, &mut out);
    out
}

fn flatten_into(obj: &Map<String, Value>, prefix: &str, separator: &str, out: &mut Record) {
    for (key, value) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, separator, key)
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &path, separator, out),
            Value::String(s) if s.is_empty() => {}
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten(value: Value) -> Value {
        let Value::Object(record) = value else {
            panic!("expected an object");
        };
        Value::Object(flatten_record(&record, "."))
    }

    #[test]
    fn test_nested_objects() {
        let input = json!({
            "name": "test",
            "details": {
                "age": 30,
                "address": {"city": "Tokyo", "code": "123"}
            }
        });

        assert_eq!(
            flatten(input),
            json!({
                "name": "test",
                "details.age": 30,
                "details.address.city": "Tokyo",
                "details.address.code": "123"
            })
        );
    }

    #[test]
    fn test_arrays_untouched() {
        let input = json!({
            "items": ["a", "b"],
            "data": {"values": [1, 2, 3]}
        });

        assert_eq!(
            flatten(input),
            json!({"items": ["a", "b"], "data.values": [1, 2, 3]})
        );
    }

    #[test]
    fn test_null_kept_empty_string_dropped() {
        let input = json!({"a": null, "b": "", "c": {"d": null, "e": ""}});
        assert_eq!(flatten(input), json!({"a": null, "c.d": null}));
    }
}
