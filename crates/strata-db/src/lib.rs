//! # strata-db
//!
//! Runs `strata-sql` requests against a database.
//!
//! A [`Connection`] owns one blocking [`Driver`] handle and puts every
//! statement through the same pipeline: pretend short-circuit, lazy connect,
//! a single retry after a lost connection, query logging and
//! [`QueryExecuted`] events. Transactions nest through savepoints.
//!
//! ```rust
//! use strata_db::{QueryExt, SqliteDriver, Connection};
//! use strata_sql::{values, Dialect};
//!
//! let mut conn = Connection::builder(Dialect::Sqlite)
//!     .prefix("wp_")
//!     .driver(SqliteDriver::memory().unwrap())
//!     .build()
//!     .unwrap();
//!
//! conn.schema()
//!     .create("posts", |table| {
//!         table.id();
//!         table.string("title", 200);
//!     })
//!     .unwrap();
//!
//! let posts = conn.table("posts");
//! posts.insert(&mut conn, &[values([("title", "Hello")])]).unwrap();
//! assert_eq!(posts.count(&mut conn).unwrap(), 1);
//! ```

pub mod classify;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod events;
pub mod log;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod transaction;

pub use classify::{ErrorClassifier, LostConnectionPatterns};
pub use config::{ConnectionConfig, DatabaseConfig};
pub use connection::{Connection, ConnectionBuilder, ExecMode, Outcome};
pub use driver::{Driver, DriverError, ExecResult, Row};
pub use error::{DbError, Result};
pub use events::{QueryExecuted, QueryListener};
pub use log::{LoggedQuery, QueryLog};
pub use query::QueryExt;
pub use schema::SchemaBuilder;
pub use sqlite::SqliteDriver;
pub use transaction::TransactionManager;
