//! The result envelope returned to the automation host.

use serde::Serialize;

use crate::value::Row;

/// Outcome of one task adapter invocation, shaped for the host's
/// templating and conditional-execution logic. Read operations carry
/// `rows`; write operations carry `rows_affected`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<usize>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl TaskResult {
    /// A read result: never marks the task as changed.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        TaskResult { changed: false, rows: Some(rows), ..Default::default() }
    }

    /// A write result: changed whenever at least one row was touched.
    pub fn with_rows_affected(count: usize) -> Self {
        TaskResult {
            changed: count > 0,
            rows_affected: Some(count),
            ..Default::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}
