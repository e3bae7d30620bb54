//! Lookup adapter: read-only table queries for templating contexts.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::db::{quote_ident, Database};
use crate::error::{Result, TaskError};
use crate::params::{self, SqlParams};
use crate::value::Row;

/// Environment variable consulted when a lookup omits `db_path`.
pub const DB_PATH_ENV: &str = "SQLITE_DB_PATH";

/// Parameters for one lookup invocation. Rows are returned directly
/// (not wrapped in a result envelope) since lookups feed template
/// expressions rather than task logic.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupRequest {
    /// Database path; falls back to the `SQLITE_DB_PATH` environment
    /// variable when omitted.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    pub table: String,
    /// Column projection, default all columns.
    #[serde(default)]
    pub select: Option<String>,
    /// Optional boolean filter expression with `?` or `:name`
    /// placeholders.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    /// Values bound to the filter's placeholders.
    #[serde(default)]
    pub where_args: Option<SqlParams>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    /// Return a single `count` row instead of the rows themselves.
    #[serde(default)]
    pub count: bool,
}

impl LookupRequest {
    pub fn run(&self) -> Result<Vec<Row>> {
        let path = self.resolve_db_path()?;
        let db = Database::open_existing(path)?;

        let sql = self.build_sql();
        debug!("lookup query: {}", sql);
        let mut stmt = db.conn().prepare(&sql)?;
        params::query_rows(&mut stmt, self.where_args.as_ref())
    }

    fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        match std::env::var(DB_PATH_ENV) {
            Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Err(TaskError::InvalidRequest(format!(
                "db_path is required (or set the {DB_PATH_ENV} environment variable)"
            ))),
        }
    }

    fn build_sql(&self) -> String {
        let projection = if self.count {
            "count(*) AS \"count\"".to_string()
        } else {
            self.select.clone().unwrap_or_else(|| "*".to_string())
        };

        let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(&self.table));
        if let Some(filter) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if self.count {
            return sql;
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite requires a LIMIT clause before OFFSET; -1 means unbounded.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
        sql
    }
}
