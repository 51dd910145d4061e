//! # strata-sql
//!
//! Query and schema builders that compile to dialect-specific SQL.
//!
//! This crate does no I/O. It provides:
//! - [`query::Builder`], a fluent description of a SELECT/INSERT/UPDATE/DELETE
//!   request
//! - [`grammar::Grammar`] implementations turning a request into SQL text and
//!   bindings for MySQL, PostgreSQL, SQLite or plain ANSI SQL
//! - [`schema::Table`], a table blueprint compiled to DDL by a
//!   [`schema::grammar::SchemaGrammar`]
//!
//! ## Bindings
//!
//! Values never end up in the SQL text. Every value is returned as a binding
//! for a `?` placeholder, in the order the placeholders appear:
//!
//! ```rust
//! use strata_sql::grammar::SqliteGrammar;
//! use strata_sql::query::{Builder, Op};
//! use strata_sql::SqlValue;
//!
//! let user_input = "'; DROP TABLE users; --";
//! let compiled = Builder::table("users")
//!     .select(&["id"])
//!     .where_("name", Op::Eq, user_input)
//!     .to_sql(&SqliteGrammar);
//!
//! assert_eq!(compiled.sql, r#"SELECT "id" FROM "users" WHERE "name" = ?"#);
//! assert_eq!(compiled.bindings, vec![SqlValue::Text(user_input.to_string())]);
//! ```

pub mod dialect;
pub mod error;
pub mod grammar;
pub mod query;
pub mod schema;
pub mod value;

pub use dialect::Dialect;
pub use error::{Error, Result};
pub use query::{Builder, Compiled, Op};
pub use value::{interpolate, values, BindingKind, SqlValue, ToSqlValue, Values};
