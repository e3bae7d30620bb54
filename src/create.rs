//! Schema adapter: create a table (and the database file) if absent.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{quote_ident, Database};
use crate::error::{Result, TaskError};
use crate::result::TaskResult;
use crate::value::Value;

/// Primary-key specification: a single column or a composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn columns(&self) -> &[String] {
        match self {
            PrimaryKey::Single(column) => std::slice::from_ref(column),
            PrimaryKey::Composite(columns) => columns,
        }
    }
}

/// Declared column type. Parsed from the request's type keywords; the
/// accepted spellings mirror the usual scripting-side type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    pub fn parse(keyword: &str) -> Result<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "int" | "integer" | "bool" | "boolean" => Ok(ColumnType::Integer),
            "float" | "real" | "double" => Ok(ColumnType::Real),
            "str" | "text" | "datetime" | "date" | "time" => Ok(ColumnType::Text),
            "bytes" | "blob" => Ok(ColumnType::Blob),
            other => Err(TaskError::InvalidRequest(format!(
                "unsupported column type keyword: {other}"
            ))),
        }
    }

    pub fn sql_keyword(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

/// Parameters for one table-creation task.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTableRequest {
    pub db_path: PathBuf,
    pub table: String,
    /// Ordered column-name to type-keyword mapping.
    pub columns: IndexMap<String, String>,
    #[serde(default)]
    pub pk: Option<PrimaryKey>,
    /// Skip silently when the table already exists. On by default, so
    /// repeated runs of the same task are no-ops.
    #[serde(default = "default_true")]
    pub if_not_exists: bool,
    /// Columns declared NOT NULL.
    #[serde(default)]
    pub not_null: Vec<String>,
    /// Per-column default values.
    #[serde(default)]
    pub defaults: IndexMap<String, Value>,
    /// Drop a pre-existing table and recreate it.
    #[serde(default)]
    pub replace: bool,
    /// Like `if_not_exists`, kept for compatibility with callers that
    /// phrase the skip as an ignore flag.
    #[serde(default)]
    pub ignore: bool,
}

fn default_true() -> bool {
    true
}

impl CreateTableRequest {
    pub fn run(&self) -> Result<TaskResult> {
        if self.columns.is_empty() {
            return Err(TaskError::InvalidRequest("columns must not be empty".to_string()));
        }
        for column in self.not_null.iter().chain(self.defaults.keys()) {
            if !self.columns.contains_key(column) {
                return Err(TaskError::InvalidRequest(format!(
                    "column {column} referenced by not_null/defaults is not declared"
                )));
            }
        }

        let db = Database::open(&self.db_path)?;
        let existed = db.table_exists(&self.table)?;

        if existed && !self.replace && (self.if_not_exists || self.ignore) {
            return Ok(TaskResult::default().message("table already exists"));
        }
        if existed && self.replace {
            db.conn().execute(&format!("DROP TABLE {}", quote_ident(&self.table)), [])?;
        }

        let sql = self.build_sql()?;
        debug!("creating table: {}", sql);
        // Without if_not_exists, a pre-existing table surfaces the
        // engine's own "table already exists" error here.
        db.conn().execute(&sql, [])?;

        let mut result = TaskResult::default().message("table created successfully");
        result.changed = true;
        Ok(result)
    }

    fn build_sql(&self) -> Result<String> {
        let single_pk = match &self.pk {
            Some(pk) if pk.columns().len() == 1 => Some(pk.columns()[0].as_str()),
            _ => None,
        };

        let mut pieces = Vec::with_capacity(self.columns.len() + 1);
        for (name, keyword) in &self.columns {
            let column_type = ColumnType::parse(keyword)?;
            let mut piece = format!("{} {}", quote_ident(name), column_type.sql_keyword());
            if single_pk == Some(name.as_str()) {
                piece.push_str(" PRIMARY KEY");
            }
            if self.not_null.contains(name) {
                piece.push_str(" NOT NULL");
            }
            if let Some(default) = self.defaults.get(name) {
                piece.push_str(" DEFAULT ");
                piece.push_str(&sql_literal(default));
            }
            pieces.push(piece);
        }

        if let Some(pk) = &self.pk {
            if pk.columns().len() > 1 {
                let columns: Vec<String> = pk.columns().iter().map(|c| quote_ident(c)).collect();
                pieces.push(format!("PRIMARY KEY ({})", columns.join(", ")));
            }
        }

        let if_not_exists = if self.if_not_exists || self.ignore { "IF NOT EXISTS " } else { "" };
        Ok(format!(
            "CREATE TABLE {}{} ({})",
            if_not_exists,
            quote_ident(&self.table),
            pieces.join(", ")
        ))
    }
}

/// Render a value as a SQL literal for DEFAULT clauses.
fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => (*b as i64).to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}
