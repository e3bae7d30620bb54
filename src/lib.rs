//! Typed single-shot SQLite task adapters for automation hosts.
//!
//! # Intention
//!
//! - Expose CRUD-style SQLite access as one request struct per task:
//!   lookup, raw SQL, table creation, record insert, JSON bulk insert.
//! - Validate every recognized option at the boundary (typed fields,
//!   unknown keys rejected) before delegating to the driver.
//! - Shape driver output into the result envelope the host's templating
//!   and conditional logic consume.
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Adapters are stateless: one connection per call, released on drop.
//! - Engine errors pass through verbatim; callers branch on the
//!   diagnostic text (e.g. `UNIQUE constraint failed`).

pub mod create;
pub mod db;
pub mod error;
pub mod flatten;
pub mod insert;
pub mod insert_json;
pub mod lookup;
pub mod params;
pub mod result;
pub mod run_sql;
pub mod value;

pub use create::{ColumnType, CreateTableRequest, PrimaryKey};
pub use db::Database;
pub use error::{Result, TaskError};
pub use insert::{InsertRequest, Records};
pub use insert_json::InsertJsonRequest;
pub use lookup::{LookupRequest, DB_PATH_ENV};
pub use params::SqlParams;
pub use result::TaskResult;
pub use run_sql::{RunSqlRequest, SqlMethod};
pub use value::{Row, Value};
