//! Error types for the connection layer.

use std::path::PathBuf;

use strata_sql::schema::SchemaError;
use strata_sql::{interpolate, SqlValue};

use crate::driver::DriverError;

/// Errors that can occur while talking to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A statement failed. The message shows the SQL with its bindings inlined.
    #[error("{source} (Connection: {connection}, SQL: {})", interpolate(.sql, .bindings))]
    Query {
        /// Connection name.
        connection: String,
        /// Statement text.
        sql: String,
        /// Bindings sent with the statement.
        bindings: Vec<SqlValue>,
        /// Driver error.
        source: DriverError,
    },

    /// The connection has no handle and cannot open one.
    #[error("Lost connection [{connection}] and no reconnector is available")]
    LostConnection {
        /// Connection name.
        connection: String,
    },

    /// Opening the first handle failed.
    #[error("Failed to connect [{connection}]: {source}")]
    Connect {
        /// Connection name.
        connection: String,
        /// Driver error.
        source: DriverError,
    },

    /// Reopening the handle failed.
    #[error("Failed to reconnect [{connection}]: {source}")]
    Reconnect {
        /// Connection name.
        connection: String,
        /// Driver error.
        source: DriverError,
    },

    /// The connection is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query builder rejected the request.
    #[error(transparent)]
    Builder(#[from] strata_sql::Error),

    /// The schema grammar rejected the table definition.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Transaction bookkeeping went wrong.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    ConfigIo {
        /// File path.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        /// File path.
        path: PathBuf,
        /// TOML error.
        source: toml::de::Error,
    },
}

impl DbError {
    /// Wraps a driver error raised by `sql`.
    #[must_use]
    pub fn query(connection: &str, sql: &str, bindings: &[SqlValue], source: DriverError) -> Self {
        Self::Query {
            connection: String::from(connection),
            sql: String::from(sql),
            bindings: bindings.to_vec(),
            source,
        }
    }
}

/// Result type for connection operations.
pub type Result<T> = std::result::Result<T, DbError>;
