//! Batch-tracked schema migrations.
//!
//! - **Migration**: a unit with `up` and `down`, written in Rust against the
//!   schema builder or loaded from `<name>.up.sql` / `<name>.down.sql` files
//! - **MigrationSet**: the caller-owned, name-ordered collection of units
//! - **MigrationRepository**: the ledger table recording `(migration, batch)`
//! - **Migrator**: applies pending units as one batch, reverts batches newest
//!   first, and reports status
//!
//! # Example
//!
//! ```rust
//! use strata_db::{Connection, SqliteDriver};
//! use strata_migrate::{MigrateOptions, MigrationRepository, MigrationSet, Migrator, Note, SqlMigration};
//! use strata_sql::Dialect;
//!
//! let mut conn = Connection::builder(Dialect::Sqlite)
//!     .driver(SqliteDriver::memory().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let mut set = MigrationSet::new();
//! set.add(
//!     "2024_01_01_000000_create_posts",
//!     SqlMigration::new("CREATE TABLE posts (id INTEGER PRIMARY KEY)", Some("DROP TABLE posts")),
//! )
//! .unwrap();
//!
//! let migrator = Migrator::new(&set, MigrationRepository::default());
//! let notes = migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
//! assert_eq!(notes.last(), Some(&Note::Migrated("2024_01_01_000000_create_posts".into())));
//!
//! let again = migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
//! assert_eq!(again, vec![Note::NothingToMigrate]);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Apply pending SQL migrations from ./migrations
//! strata-migrate --database sqlite://cms.db migrate
//!
//! # Show what the last batch rollback would run
//! strata-migrate rollback --pretend
//!
//! # Show migration status
//! strata-migrate status
//! ```

pub mod error;
pub mod migration;
pub mod migrator;
pub mod repository;
pub mod source;

pub use error::{MigrateError, Result};
pub use migration::Migration;
pub use migrator::{
    MigrateOptions, MigrationState, MigrationStatus, Migrator, Note, RollbackOptions, StatusReport,
};
pub use repository::{LedgerEntry, MigrationRepository, DEFAULT_TABLE};
pub use source::{split_statements, MigrationSet, SqlMigration};
