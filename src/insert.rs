//! Record-insert adapter: write one record or a batch into a table.
//!
//! The table is created on first insert when absent, with column types
//! inferred from the records themselves. `insert_json` reuses the same
//! insert core for its bulk path.

use std::path::PathBuf;

use indexmap::IndexSet;
use rusqlite::params_from_iter;
use serde::Deserialize;
use tracing::debug;

use crate::create::PrimaryKey;
use crate::db::{quote_ident, Database};
use crate::error::{Result, TaskError};
use crate::result::TaskResult;
use crate::value::{Row, Value};

pub(crate) const DEFAULT_BATCH_SIZE: usize = 100;

/// One record or a sequence of records, selected by value shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Records {
    One(Row),
    Many(Vec<Row>),
}

impl Records {
    pub fn as_slice(&self) -> &[Row] {
        match self {
            Records::One(record) => std::slice::from_ref(record),
            Records::Many(records) => records,
        }
    }
}

/// Parameters for one insert task.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertRequest {
    pub db_path: PathBuf,
    pub table: String,
    pub records: Records,
    /// Primary key used when the table is created by this insert.
    #[serde(default)]
    pub pk: Option<PrimaryKey>,
    /// On primary-key conflict, overwrite the existing row.
    #[serde(default)]
    pub replace: bool,
    /// On primary-key conflict, skip the incoming row.
    #[serde(default)]
    pub ignore: bool,
    /// Add missing columns to the table instead of failing.
    #[serde(default)]
    pub alter: bool,
}

impl InsertRequest {
    pub fn run(&self) -> Result<TaskResult> {
        let options = InsertOptions {
            pk: self.pk.as_ref(),
            replace: self.replace,
            ignore: self.ignore,
            upsert: false,
            alter: self.alter,
            // The whole request commits atomically; only the bulk
            // file path batches.
            batch_size: usize::MAX,
        };
        let mut db = Database::open(&self.db_path)?;
        let count = insert_rows(&mut db, &self.table, self.records.as_slice(), &options)?;
        Ok(TaskResult::with_rows_affected(count).message("data inserted successfully"))
    }
}

/// Knobs shared between the record-insert and JSON-bulk-insert paths.
pub(crate) struct InsertOptions<'a> {
    pub pk: Option<&'a PrimaryKey>,
    pub replace: bool,
    pub ignore: bool,
    pub upsert: bool,
    pub alter: bool,
    pub batch_size: usize,
}

impl InsertOptions<'_> {
    fn validate(&self) -> Result<()> {
        let conflict_modes =
            [self.replace, self.ignore, self.upsert].iter().filter(|set| **set).count();
        if conflict_modes > 1 {
            return Err(TaskError::InvalidRequest(
                "use at most one of replace, ignore, upsert".to_string(),
            ));
        }
        if self.upsert && self.pk.is_none() {
            return Err(TaskError::InvalidRequest("upsert requires pk".to_string()));
        }
        Ok(())
    }
}

/// Insert `records` into `table`, creating or altering the table as the
/// options allow. Returns the number of rows written. Each batch runs
/// in its own transaction.
pub(crate) fn insert_rows(
    db: &mut Database,
    table: &str,
    records: &[Row],
    options: &InsertOptions<'_>,
) -> Result<usize> {
    options.validate()?;
    if records.is_empty() {
        return Ok(0);
    }

    let columns = column_union(records);

    if !db.table_exists(table)? {
        create_from_records(db, table, &columns, records, options.pk)?;
    } else if options.alter {
        let existing = db.columns_of(table)?;
        for column in &columns {
            if !existing.contains(column) {
                let sql = format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    quote_ident(table),
                    quote_ident(column),
                    infer_type(column, records)
                );
                debug!("altering table: {}", sql);
                db.conn().execute(&sql, [])?;
            }
        }
    }
    // Without alter, an unknown column surfaces the engine's own
    // "has no column named" error from the INSERT below.

    let sql = build_insert_sql(table, &columns, options);
    debug!("insert statement: {}", sql);

    let mut written = 0usize;
    for chunk in records.chunks(options.batch_size.max(1)) {
        let tx = db.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for record in chunk {
                let values: Vec<Value> = columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect();
                written += stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;
    }
    Ok(written)
}

/// Column names across all records, in first-seen order.
fn column_union(records: &[Row]) -> Vec<String> {
    let mut columns = IndexSet::new();
    for record in records {
        for key in record.keys() {
            columns.insert(key.clone());
        }
    }
    columns.into_iter().collect()
}

/// Column type inferred from the first non-null value, TEXT otherwise.
fn infer_type(column: &str, records: &[Row]) -> &'static str {
    records
        .iter()
        .filter_map(|record| record.get(column))
        .find(|value| !matches!(value, Value::Null))
        .map(Value::sqlite_type)
        .unwrap_or("TEXT")
}

fn create_from_records(
    db: &Database,
    table: &str,
    columns: &[String],
    records: &[Row],
    pk: Option<&PrimaryKey>,
) -> Result<()> {
    if let Some(pk) = pk {
        for pk_column in pk.columns() {
            if !columns.iter().any(|c| c == pk_column) {
                return Err(TaskError::InvalidRequest(format!(
                    "pk column {pk_column} is not present in the records"
                )));
            }
        }
    }
    let single_pk = match pk {
        Some(pk) if pk.columns().len() == 1 => Some(pk.columns()[0].as_str()),
        _ => None,
    };

    let mut pieces = Vec::with_capacity(columns.len() + 1);
    for column in columns {
        let mut piece = format!("{} {}", quote_ident(column), infer_type(column, records));
        if single_pk == Some(column.as_str()) {
            piece.push_str(" PRIMARY KEY");
        }
        pieces.push(piece);
    }
    if let Some(pk) = pk {
        if pk.columns().len() > 1 {
            let quoted: Vec<String> = pk.columns().iter().map(|c| quote_ident(c)).collect();
            pieces.push(format!("PRIMARY KEY ({})", quoted.join(", ")));
        }
    }

    let sql = format!("CREATE TABLE {} ({})", quote_ident(table), pieces.join(", "));
    debug!("creating table from records: {}", sql);
    db.conn().execute(&sql, [])?;
    Ok(())
}

fn build_insert_sql(table: &str, columns: &[String], options: &InsertOptions<'_>) -> String {
    let verb = if options.replace {
        "INSERT OR REPLACE"
    } else if options.ignore {
        "INSERT OR IGNORE"
    } else {
        "INSERT"
    };
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    let mut sql = format!(
        "{} INTO {} ({}) VALUES ({})",
        verb,
        quote_ident(table),
        quoted.join(", "),
        placeholders.join(", ")
    );

    if options.upsert {
        let pk_columns = options.pk.map(PrimaryKey::columns).unwrap_or_default();
        let conflict: Vec<String> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|column| !pk_columns.contains(*column))
            .map(|column| format!("{0} = excluded.{0}", quote_ident(column)))
            .collect();
        if updates.is_empty() {
            sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", conflict.join(", ")));
        } else {
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                conflict.join(", "),
                updates.join(", ")
            ));
        }
    }
    sql
}
