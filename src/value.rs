//! Core value types for SQLite task operations.

use indexmap::IndexMap;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Deserializer, Serialize};

/// A single SQLite-storable value.
///
/// Untagged on the serialize side so result rows map directly onto
/// JSON/YAML scalars. Deserialization goes through [`Value::from_json`]
/// so non-scalar request values (arrays, nested objects) are stored as
/// JSON text, never misread as blobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json(&json, false))
    }
}

/// One result or input row: column name to value, insertion-ordered so
/// projections keep the statement's column order.
pub type Row = IndexMap<String, Value>;

impl Value {
    /// The SQLite column type keyword used when a column is created for
    /// a value of this shape. NULL defaults to TEXT.
    pub fn sqlite_type(&self) -> &'static str {
        match self {
            Value::Integer(_) | Value::Boolean(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Blob(_) => "BLOB",
            Value::Text(_) | Value::Null => "TEXT",
        }
    }

    /// Convert a JSON value to a storable value. Nested objects and
    /// arrays are stored as JSON text; flattening happens before this.
    pub fn from_json(value: &serde_json::Value, empty_null: bool) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Real(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) if empty_null && s.is_empty() => Value::Null,
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(*b as i64)),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(value: rusqlite::types::Value) -> Self {
        match value {
            rusqlite::types::Value::Null => Value::Null,
            rusqlite::types::Value::Integer(i) => Value::Integer(i),
            rusqlite::types::Value::Real(f) => Value::Real(f),
            rusqlite::types::Value::Text(s) => Value::Text(s),
            rusqlite::types::Value::Blob(b) => Value::Blob(b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_map_to_storable_values() {
        assert_eq!(Value::from_json(&serde_json::json!(42), false), Value::Integer(42));
        assert_eq!(Value::from_json(&serde_json::json!(2.5), false), Value::Real(2.5));
        assert_eq!(Value::from_json(&serde_json::json!(true), false), Value::Boolean(true));
        assert_eq!(Value::from_json(&serde_json::json!(null), false), Value::Null);
        assert_eq!(
            Value::from_json(&serde_json::json!("hello"), false),
            Value::Text("hello".to_string())
        );
    }

    #[test]
    fn nested_json_stored_as_text() {
        let v = Value::from_json(&serde_json::json!([1, 2]), false);
        assert_eq!(v, Value::Text("[1,2]".to_string()));
    }

    #[test]
    fn empty_null_converts_empty_strings() {
        assert_eq!(Value::from_json(&serde_json::json!(""), true), Value::Null);
        assert_eq!(
            Value::from_json(&serde_json::json!(""), false),
            Value::Text(String::new())
        );
    }

    #[test]
    fn deserialization_picks_scalar_shape() {
        let v: Value = serde_json::from_str("7").unwrap();
        assert_eq!(v, Value::Integer(7));
        let v: Value = serde_json::from_str("false").unwrap();
        assert_eq!(v, Value::Boolean(false));
        let v: Value = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(v, Value::Text("x".to_string()));
        let v: Value = serde_json::from_str("null").unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn arrays_and_objects_deserialize_to_json_text() {
        let v: Value = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(v, Value::Text("[1,2]".to_string()));
        let v: Value = serde_json::from_str(r#"{"a": 1}"#).unwrap();
        assert_eq!(v, Value::Text(r#"{"a":1}"#.to_string()));
    }
}
