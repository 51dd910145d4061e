//! The migration unit.

use strata_db::{Connection, Result};

/// One reversible schema change.
///
/// ```rust
/// use strata_db::{Connection, Result};
/// use strata_migrate::Migration;
///
/// struct CreatePosts;
///
/// impl Migration for CreatePosts {
///     fn up(&self, conn: &mut Connection) -> Result<()> {
///         conn.schema().create("posts", |table| {
///             table.id();
///             table.string("slug", 255).unique();
///             table.timestamps();
///         })
///     }
///
///     fn down(&self, conn: &mut Connection) -> Result<()> {
///         conn.schema().drop_if_exists("posts")
///     }
/// }
/// ```
pub trait Migration: Send + Sync {
    /// Applies the change.
    fn up(&self, conn: &mut Connection) -> Result<()>;

    /// Reverts the change.
    fn down(&self, conn: &mut Connection) -> Result<()>;

    /// Whether `up` and `down` run inside a transaction when the dialect
    /// allows transactional DDL.
    fn within_transaction(&self) -> bool {
        true
    }
}
