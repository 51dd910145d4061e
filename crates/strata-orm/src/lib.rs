//! # strata-orm
//!
//! A minimal active-record layer over [`strata_db`].
//!
//! A [`Model`] describes a table: its key, timestamp columns and
//! mass-assignment rules. A [`Record`] holds one row of it, tracks which
//! attributes changed since it was loaded, and writes only those back.
//!
//! ```rust
//! use strata_db::{Connection, SqliteDriver};
//! use strata_orm::{Model, Record};
//! use strata_sql::{values, Dialect};
//!
//! struct Post;
//!
//! impl Model for Post {
//!     const TABLE: &'static str = "posts";
//!     const FILLABLE: &'static [&'static str] = &["title"];
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = Connection::builder(Dialect::Sqlite)
//!     .driver(SqliteDriver::memory()?)
//!     .build()?;
//! conn.schema().create("posts", |table| {
//!     table.id();
//!     table.string("title", 200);
//!     table.timestamps();
//! })?;
//!
//! let mut post = Record::<Post>::new();
//! post.fill(values([("title", "Hello")]))?;
//! post.save(&mut conn)?;
//! assert!(post.was_recently_created());
//!
//! let found = Record::<Post>::find_or_fail(&mut conn, 1_i64)?;
//! assert_eq!(found.get_attribute("title"), post.get_attribute("title"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod guard;
pub mod model;
pub mod record;

pub use error::{OrmError, Result};
pub use model::Model;
pub use record::Record;
