//! The driver seam.
//!
//! A [`Driver`] runs one statement at a time on a single handle. The
//! [`Connection`](crate::Connection) owns it and layers logging, retries and
//! transactions on top.

use std::fmt;

use strata_sql::{SqlValue, Values};

/// One result row: column name to value, in select-list order.
pub type Row = Values;

/// Error reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Human-readable message from the database or transport.
    pub message: String,
    /// Vendor error code, when the database supplied one.
    pub code: Option<String>,
}

impl DriverError {
    /// Creates an error without a vendor code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attaches a vendor code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows changed by the statement.
    pub rows_affected: u64,
    /// Key generated by the last insert, when the database reports one.
    pub last_insert_id: Option<i64>,
}

/// A single blocking database handle.
pub trait Driver: Send {
    /// Runs a statement and returns its rows.
    fn query(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>, DriverError>;

    /// Runs a statement that returns no rows.
    fn execute(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ExecResult, DriverError>;
}

/// Opens a fresh handle after the previous one was lost.
pub type Reconnector = dyn FnMut() -> Result<Box<dyn Driver>, DriverError> + Send;
