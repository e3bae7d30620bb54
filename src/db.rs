//! Database handle with per-call lifetime.
//!
//! Every adapter opens the database, performs one operation, and drops
//! the handle on return. No cross-call state is kept.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};

use crate::error::{Result, TaskError};

/// A single-use handle to a SQLite database file.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open the database at `path`, creating the file if absent.
    /// Used by write adapters (create, insert, insert_json).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Ok(Database { conn, path })
    }

    /// Open the database at `path`, failing if the file does not exist.
    /// Used by read adapters (lookup, run_sql).
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(TaskError::DatabaseNotFound(path));
        }
        let conn = Connection::open(&path)?;
        Ok(Database { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        Ok(stmt.exists([table])?)
    }

    /// Column names of `table`, in schema order.
    pub fn columns_of(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

/// Quote an identifier for embedding in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
