//! Error types for the migration runner.

use std::path::PathBuf;

use strata_db::DbError;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Ledger bookkeeping failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Reading migration files failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A migration name cannot be used.
    #[error("Invalid migration name '{0}'")]
    InvalidName(String),

    /// Two migrations share a name.
    #[error("Duplicate migration '{0}'")]
    Duplicate(String),

    /// A migration's `up` or `down` failed. The ledger was left as it was.
    #[error("Migration '{name}' failed: {source}")]
    Failed {
        /// Migration name.
        name: String,
        /// What went wrong.
        source: DbError,
    },

    /// No migrations directory found.
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(PathBuf),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
