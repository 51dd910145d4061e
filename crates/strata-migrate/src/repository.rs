//! The migration ledger.
//!
//! One row per applied migration: `(migration, batch)`. The table is created
//! through the schema builder so it follows the connection's dialect and
//! prefix.

use strata_db::{Connection, QueryExt, Result, Row};
use strata_sql::query::OrderDirection;
use strata_sql::{values, Builder, SqlValue};

/// Default ledger table name.
pub const DEFAULT_TABLE: &str = "migrations";

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Migration name.
    pub migration: String,
    /// Batch it was applied in.
    pub batch: i64,
}

impl LedgerEntry {
    fn from_row(row: &Row) -> Self {
        Self {
            migration: row
                .get("migration")
                .and_then(SqlValue::as_str)
                .map(String::from)
                .unwrap_or_default(),
            batch: row.get("batch").and_then(SqlValue::as_i64).unwrap_or(0),
        }
    }
}

/// Reads and writes the ledger table.
#[derive(Debug, Clone)]
pub struct MigrationRepository {
    table: String,
}

impl Default for MigrationRepository {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE)
    }
}

impl MigrationRepository {
    /// Uses `table` (before prefixing) as the ledger.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
        }
    }

    /// Ledger table name, without prefix.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    fn query(&self, conn: &Connection) -> Builder {
        conn.table(&self.table)
    }

    /// Whether the ledger table exists.
    pub fn exists(&self, conn: &mut Connection) -> Result<bool> {
        conn.schema().has_table(&self.table)
    }

    /// Creates the ledger table.
    pub fn create(&self, conn: &mut Connection) -> Result<()> {
        conn.schema().create(&self.table, |table| {
            table.increments("id");
            table.string("migration", 255).unique();
            table.integer("batch");
        })
    }

    /// Creates the ledger table unless it exists.
    pub fn create_if_missing(&self, conn: &mut Connection) -> Result<()> {
        if !self.exists(conn)? {
            self.create(conn)?;
        }
        Ok(())
    }

    /// Every entry in application order.
    pub fn entries(&self, conn: &mut Connection) -> Result<Vec<LedgerEntry>> {
        let rows = self
            .query(conn)
            .order_by("batch", OrderDirection::Asc)
            .order_by("migration", OrderDirection::Asc)
            .get(conn)?;
        Ok(rows.iter().map(LedgerEntry::from_row).collect())
    }

    /// Names of applied migrations in application order.
    pub fn ran(&self, conn: &mut Connection) -> Result<Vec<String>> {
        Ok(self
            .entries(conn)?
            .into_iter()
            .map(|entry| entry.migration)
            .collect())
    }

    /// Highest batch number, or 0 for an empty ledger.
    pub fn last_batch_number(&self, conn: &mut Connection) -> Result<i64> {
        let max = self.query(conn).max(conn, "batch")?;
        Ok(max.and_then(|value| value.as_i64()).unwrap_or(0))
    }

    /// Batch number the next run uses.
    pub fn next_batch_number(&self, conn: &mut Connection) -> Result<i64> {
        Ok(self.last_batch_number(conn)? + 1)
    }

    /// Entries of the most recent batch, in rollback order.
    pub fn last(&self, conn: &mut Connection) -> Result<Vec<LedgerEntry>> {
        self.batches(conn, 1)
    }

    /// Entries of the `steps` most recent batches, in rollback order.
    pub fn batches(&self, conn: &mut Connection, steps: u64) -> Result<Vec<LedgerEntry>> {
        let recent = self
            .query(conn)
            .distinct()
            .order_by_desc("batch")
            .take(steps)
            .pluck(conn, "batch")?;
        let Some(oldest) = recent.iter().filter_map(SqlValue::as_i64).min() else {
            return Ok(Vec::new());
        };
        let rows = self
            .query(conn)
            .where_("batch", strata_sql::Op::GtEq, oldest)
            .order_by_desc("batch")
            .order_by_desc("migration")
            .get(conn)?;
        Ok(rows.iter().map(LedgerEntry::from_row).collect())
    }

    /// Every entry, in rollback order.
    pub fn all_for_rollback(&self, conn: &mut Connection) -> Result<Vec<LedgerEntry>> {
        let rows = self
            .query(conn)
            .order_by_desc("batch")
            .order_by_desc("migration")
            .get(conn)?;
        Ok(rows.iter().map(LedgerEntry::from_row).collect())
    }

    /// Records `migration` as applied in `batch`.
    pub fn log(&self, conn: &mut Connection, migration: &str, batch: i64) -> Result<()> {
        let row = values([
            ("migration", SqlValue::Text(String::from(migration))),
            ("batch", SqlValue::Int(batch)),
        ]);
        self.query(conn).insert(conn, &[row])
    }

    /// Forgets `migration`.
    pub fn delete(&self, conn: &mut Connection, migration: &str) -> Result<()> {
        self.query(conn)
            .where_eq("migration", migration)
            .delete(conn)
            .map(|_| ())
    }
}
