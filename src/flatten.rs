//! Flattening of nested JSON objects into tabular records.

use serde_json::{Map, Value as JsonValue};

use crate::value::{Row, Value};

/// Convert one JSON object into a flat record. With `flatten` set,
/// nested objects collapse into dotted-path column names (`a.b.c`);
/// otherwise nested structures are stored as JSON text. Arrays are
/// always stored as JSON text.
pub fn record_from_json(obj: &Map<String, JsonValue>, flatten: bool, empty_null: bool) -> Row {
    let mut record = Row::new();
    for (key, value) in obj {
        match value {
            JsonValue::Object(nested) if flatten => {
                flatten_into(&mut record, key, nested, empty_null)
            }
            other => {
                record.insert(key.clone(), Value::from_json(other, empty_null));
            }
        }
    }
    record
}

fn flatten_into(record: &mut Row, prefix: &str, obj: &Map<String, JsonValue>, empty_null: bool) {
    for (key, value) in obj {
        let path = format!("{prefix}.{key}");
        match value {
            JsonValue::Object(nested) => flatten_into(record, &path, nested, empty_null),
            other => {
                record.insert(path, Value::from_json(other, empty_null));
            }
        }
    }
}
