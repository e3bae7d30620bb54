//! JSON-bulk-insert adapter: load records from a JSON document.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::create::PrimaryKey;
use crate::db::{quote_ident, Database};
use crate::error::{Result, TaskError};
use crate::flatten::record_from_json;
use crate::insert::{insert_rows, InsertOptions, DEFAULT_BATCH_SIZE};
use crate::result::TaskResult;
use crate::value::Row;

/// Parameters for one bulk-insert task. The file holds either a JSON
/// array of objects, a single object, or (with `lines`) one object per
/// line.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertJsonRequest {
    pub db_path: PathBuf,
    pub table: String,
    pub file_path: PathBuf,
    /// Primary key used when the table is created by this insert, and
    /// the conflict target for `upsert`.
    #[serde(default)]
    pub pk: Option<PrimaryKey>,
    /// Collapse nested objects into dotted-path column names.
    #[serde(default)]
    pub flatten: bool,
    /// Add newly discovered columns to the table instead of failing.
    #[serde(default)]
    pub alter: bool,
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub ignore: bool,
    /// Update existing rows in place, keyed by `pk`.
    #[serde(default)]
    pub upsert: bool,
    /// Delete all existing rows before inserting.
    #[serde(default)]
    pub truncate: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Stop after inserting this many rows.
    #[serde(default)]
    pub stop_after: Option<usize>,
    /// Newline-delimited JSON: one object per line.
    #[serde(default)]
    pub lines: bool,
    /// Store empty strings as NULL.
    #[serde(default)]
    pub empty_null: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl InsertJsonRequest {
    pub fn run(&self) -> Result<TaskResult> {
        if !self.file_path.is_file() {
            return Err(TaskError::FileNotFound(self.file_path.clone()));
        }
        let text = std::fs::read_to_string(&self.file_path)?;
        let mut records = self.parse_records(&text)?;
        if let Some(stop_after) = self.stop_after {
            records.truncate(stop_after);
        }
        debug!("loaded {} records from {}", records.len(), self.file_path.display());

        let mut db = Database::open(&self.db_path)?;
        let mut touched = 0usize;
        if self.truncate && db.table_exists(&self.table)? {
            touched += db
                .conn()
                .execute(&format!("DELETE FROM {}", quote_ident(&self.table)), [])?;
        }

        let options = InsertOptions {
            pk: self.pk.as_ref(),
            replace: self.replace,
            ignore: self.ignore,
            upsert: self.upsert,
            alter: self.alter,
            batch_size: self.batch_size,
        };
        let written = insert_rows(&mut db, &self.table, &records, &options)?;
        touched += written;

        let mut result = TaskResult::with_rows_affected(written)
            .message("data inserted successfully from file");
        result.changed = touched > 0;
        Ok(result)
    }

    fn parse_records(&self, text: &str) -> Result<Vec<Row>> {
        let mut documents = Vec::new();
        if self.lines {
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                documents.push(serde_json::from_str::<JsonValue>(line)?);
            }
        } else {
            match serde_json::from_str::<JsonValue>(text)? {
                JsonValue::Array(items) => documents = items,
                object @ JsonValue::Object(_) => documents.push(object),
                _ => {
                    return Err(TaskError::InvalidRequest(
                        "expected a JSON object or an array of objects".to_string(),
                    ))
                }
            }
        }

        documents
            .iter()
            .map(|document| match document {
                JsonValue::Object(obj) => {
                    Ok(record_from_json(obj, self.flatten, self.empty_null))
                }
                other => Err(TaskError::InvalidRequest(format!(
                    "expected a JSON object per record, got: {other}"
                ))),
            })
            .collect()
    }
}
