//! Parameter bindings for SQL statements.

use std::collections::HashMap;

use rusqlite::{params_from_iter, Statement, ToSql};
use serde::Deserialize;

use crate::error::Result;
use crate::value::{Row, Value};

/// Bound statement parameters: a sequence binds positionally to `?`
/// placeholders, a mapping binds by name to `:name` placeholders. The
/// two styles are mutually exclusive and selected by value shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SqlParams {
    Positional(Vec<Value>),
    Named(HashMap<String, Value>),
}

impl SqlParams {
    /// Normalize named keys to carry the leading `:` the driver expects.
    fn named_pairs(values: &HashMap<String, Value>) -> Vec<(String, &Value)> {
        values
            .iter()
            .map(|(k, v)| {
                let key = if k.starts_with(':') { k.clone() } else { format!(":{k}") };
                (key, v)
            })
            .collect()
    }
}

/// Run a prepared read statement with optional bound parameters and
/// collect every result row, preserving statement column order.
pub(crate) fn query_rows(stmt: &mut Statement<'_>, params: Option<&SqlParams>) -> Result<Vec<Row>> {
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = match params {
        None => stmt.query([])?,
        Some(SqlParams::Positional(values)) => stmt.query(params_from_iter(values.iter()))?,
        Some(SqlParams::Named(values)) => {
            let pairs = SqlParams::named_pairs(values);
            let refs: Vec<(&str, &dyn ToSql)> =
                pairs.iter().map(|(k, v)| (k.as_str(), *v as &dyn ToSql)).collect();
            stmt.query(refs.as_slice())?
        }
    };

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (i, name) in columns.iter().enumerate() {
            let value: rusqlite::types::Value = row.get(i)?;
            record.insert(name.clone(), Value::from(value));
        }
        out.push(record);
    }
    Ok(out)
}

/// Run a prepared write statement with optional bound parameters and
/// return the affected-row count.
pub(crate) fn execute(stmt: &mut Statement<'_>, params: Option<&SqlParams>) -> Result<usize> {
    let count = match params {
        None => stmt.execute([])?,
        Some(SqlParams::Positional(values)) => stmt.execute(params_from_iter(values.iter()))?,
        Some(SqlParams::Named(values)) => {
            let pairs = SqlParams::named_pairs(values);
            let refs: Vec<(&str, &dyn ToSql)> =
                pairs.iter().map(|(k, v)| (k.as_str(), *v as &dyn ToSql)).collect();
            stmt.execute(refs.as_slice())?
        }
    };
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_deserialize_by_shape() {
        let p: SqlParams = serde_json::from_str("[1, \"a\"]").unwrap();
        assert_eq!(
            p,
            SqlParams::Positional(vec![Value::Integer(1), Value::Text("a".to_string())])
        );

        let p: SqlParams = serde_json::from_str(r#"{"name": "John", "age": 25}"#).unwrap();
        match p {
            SqlParams::Named(map) => {
                assert_eq!(map["name"], Value::Text("John".to_string()));
                assert_eq!(map["age"], Value::Integer(25));
            }
            other => panic!("expected named params, got {other:?}"),
        }
    }

    #[test]
    fn named_keys_gain_colon_prefix() {
        let mut map = HashMap::new();
        map.insert("subject".to_string(), Value::Integer(1));
        map.insert(":kept".to_string(), Value::Integer(2));
        let pairs = SqlParams::named_pairs(&map);
        let mut keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![":kept", ":subject"]);
    }
}
