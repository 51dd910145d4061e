//! Error types for the ORM.

use strata_db::DbError;
use strata_sql::SqlValue;
use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Keys rejected by the fillable/guarded rules.
    #[error("Add [{}] to fillable property to allow mass assignment on [{model}]", .keys.join(", "))]
    MassAssignment {
        /// Model name.
        model: &'static str,
        /// Every rejected key.
        keys: Vec<String>,
    },

    /// No row matched.
    #[error(
        "No query results for model [{model}] {}",
        .ids.iter().map(SqlValue::to_sql_inline).collect::<Vec<_>>().join(", ")
    )]
    ModelNotFound {
        /// Model name.
        model: &'static str,
        /// Keys that were looked up.
        ids: Vec<SqlValue>,
    },

    /// The record has no primary key value to address it by.
    #[error("Model [{model}] has no value for key `{key}`")]
    MissingKey {
        /// Model name.
        model: &'static str,
        /// Key column.
        key: &'static str,
    },
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
