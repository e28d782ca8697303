//! Outcome of a single query run.
//!
//! `ExecutionResult` is a tagged variant so callers must handle all three
//! outcomes: rows, no rows, or a failure message.

use crate::db::{ColumnInfo, Row, Value};
use crate::error::InsightsError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Which of the three terminal outcomes a run reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    EmptyResult,
    Failure,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::EmptyResult => write!(f, "EmptyResult"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// Where a failed run broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The store could not be reached, or the connection was lost.
    Connection,
    /// The store rejected or errored on the statement.
    Statement,
}

/// Result of running one query definition.
///
/// Serializes with a `status` tag. Every variant carries `elapsed_ms`, and
/// `EmptyResult` carries an empty `rows` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The statement returned at least one row.
    Success {
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
        elapsed_ms: f64,
    },

    /// The statement ran and matched nothing.
    EmptyResult {
        columns: Vec<ColumnInfo>,
        elapsed_ms: f64,
    },

    /// Acquisition or submission failed.
    Failure {
        kind: FailureKind,
        error_message: String,
    },
}

/// JSON shape of an `ExecutionResult`.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ResultRecord<'a> {
    Success {
        columns: &'a [ColumnInfo],
        rows: &'a [Row],
        elapsed_ms: f64,
    },
    EmptyResult {
        columns: &'a [ColumnInfo],
        rows: &'a [Row],
        elapsed_ms: f64,
    },
    Failure {
        kind: FailureKind,
        error_message: &'a str,
        elapsed_ms: f64,
    },
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let record = match self {
            Self::Success {
                columns,
                rows,
                elapsed_ms,
            } => ResultRecord::Success {
                columns,
                rows,
                elapsed_ms: *elapsed_ms,
            },
            Self::EmptyResult {
                columns,
                elapsed_ms,
            } => ResultRecord::EmptyResult {
                columns,
                rows: &[],
                elapsed_ms: *elapsed_ms,
            },
            Self::Failure {
                kind,
                error_message,
            } => ResultRecord::Failure {
                kind: *kind,
                error_message,
                elapsed_ms: 0.0,
            },
        };
        record.serialize(serializer)
    }
}

impl ExecutionResult {
    /// Builds a `Success` or `EmptyResult` depending on whether rows came back.
    pub fn completed(columns: Vec<ColumnInfo>, rows: Vec<Row>, elapsed: Duration) -> Self {
        let elapsed_ms = duration_to_ms(elapsed);
        if rows.is_empty() {
            Self::EmptyResult {
                columns,
                elapsed_ms,
            }
        } else {
            Self::Success {
                columns,
                rows,
                elapsed_ms,
            }
        }
    }

    /// Encodes a fault as a `Failure`.
    pub fn failure(error: &InsightsError) -> Self {
        let kind = match error {
            InsightsError::Connection(_) => FailureKind::Connection,
            _ => FailureKind::Statement,
        };
        Self::Failure {
            kind,
            error_message: error.message(),
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        match self {
            Self::Success { .. } => ExecutionStatus::Success,
            Self::EmptyResult { .. } => ExecutionStatus::EmptyResult,
            Self::Failure { .. } => ExecutionStatus::Failure,
        }
    }

    /// Column names and types; `None` on failure.
    pub fn columns(&self) -> Option<&[ColumnInfo]> {
        match self {
            Self::Success { columns, .. } | Self::EmptyResult { columns, .. } => Some(columns),
            Self::Failure { .. } => None,
        }
    }

    /// Column names only, in projection order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns()
            .unwrap_or_default()
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Rows, present only on success.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Success { rows, .. } => Some(rows),
            _ => None,
        }
    }

    /// Measured duration in milliseconds; 0 for failures.
    pub fn elapsed_ms(&self) -> f64 {
        match self {
            Self::Success { elapsed_ms, .. } | Self::EmptyResult { elapsed_ms, .. } => *elapsed_ms,
            Self::Failure { .. } => 0.0,
        }
    }

    /// Failure description, shown to the user verbatim.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failure { error_message, .. } => Some(error_message),
            _ => None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().map_or(0, <[Row]>::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns().map_or(0, <[ColumnInfo]>::len)
    }

    /// Iterates rows as name-addressable records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        let columns = self.columns().unwrap_or_default();
        self.rows()
            .unwrap_or_default()
            .iter()
            .map(move |values| Record { columns, values })
    }
}

/// A completed run never reports zero; zero is reserved for failures.
fn duration_to_ms(elapsed: Duration) -> f64 {
    elapsed.as_nanos().max(1) as f64 / 1_000_000.0
}

/// One row viewed as a mapping from column name to value.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [ColumnInfo],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of the named column, if present.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| self.values.get(i))
    }

    /// (column name, value) pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.values.iter())
    }
}
