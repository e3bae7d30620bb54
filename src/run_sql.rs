//! Query/execute adapter: run one raw SQL statement.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::params::{self, SqlParams};
use crate::result::TaskResult;

/// Dispatch mode for a raw statement. `Query` collects rows; `Execute`
/// reports the affected-row count and marks the task changed. The
/// explicit mode always decides the path taken; statement shape is
/// never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlMethod {
    #[default]
    Query,
    Execute,
}

/// Parameters for one raw-SQL invocation. Exactly one statement is
/// supported; the database file must already exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSqlRequest {
    pub db_path: PathBuf,
    pub query: String,
    #[serde(default)]
    pub params: Option<SqlParams>,
    #[serde(default)]
    pub sql_method: SqlMethod,
}

impl RunSqlRequest {
    pub fn run(&self) -> Result<TaskResult> {
        let db = Database::open_existing(&self.db_path)?;
        debug!("running {:?} statement: {}", self.sql_method, self.query);
        let mut stmt = db.conn().prepare(&self.query)?;

        match self.sql_method {
            SqlMethod::Query => {
                let rows = params::query_rows(&mut stmt, self.params.as_ref())?;
                Ok(TaskResult::with_rows(rows))
            }
            SqlMethod::Execute => {
                let count = params::execute(&mut stmt, self.params.as_ref())?;
                Ok(TaskResult::with_rows_affected(count))
            }
        }
    }
}
