//! Schema definition DSL and DDL grammars.
//!
//! ```rust
//! use strata_sql::schema::{grammar::SqliteSchemaGrammar, Table};
//!
//! let mut table = Table::new("posts", "wp_");
//! table.create();
//! table.id();
//! table.string("slug", 255).unique();
//! table.timestamps();
//!
//! let statements = table.to_sql(&SqliteSchemaGrammar).unwrap();
//! assert_eq!(statements.len(), 2);
//! assert_eq!(
//!     statements[1],
//!     r#"CREATE UNIQUE INDEX "wp_posts_slug_unique" ON "wp_posts" ("slug")"#
//! );
//! ```

mod column;
mod command;
pub mod grammar;
mod table;

pub use column::{ColumnDefinition, ColumnType, DefaultValue, ForeignKeyAction, Generated, IntoDefault};
pub use command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
pub use table::Table;

use thiserror::Error;

/// Errors raised while compiling a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The dialect cannot perform the requested change.
    #[error("{grammar} does not support {feature}")]
    Unsupported {
        /// Schema grammar name.
        grammar: &'static str,
        /// What was asked for.
        feature: String,
    },

    /// The definition is incomplete or contradictory.
    #[error("invalid definition for table `{table}`: {reason}")]
    InvalidDefinition {
        /// Table name.
        table: String,
        /// What is wrong.
        reason: String,
    },
}

/// Result type for schema compilation.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
