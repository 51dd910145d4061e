//! The migration runner.
//!
//! Applies pending migrations in name order, groups each run into a batch,
//! and reverts batches newest first. Every operation returns a list of
//! [`Note`]s describing what happened, for the CLI to print.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use strata_db::{Connection, DbError};
use strata_sql::interpolate;
use tracing::{info, warn};

use crate::error::{MigrateError, Result};
use crate::migration::Migration;
use crate::repository::{LedgerEntry, MigrationRepository};
use crate::source::MigrationSet;

/// One line of runner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// No migration was pending.
    NothingToMigrate,
    /// About to apply a migration.
    Migrating(String),
    /// A migration was applied.
    Migrated(String),
    /// About to revert a migration.
    RollingBack(String),
    /// A migration was reverted.
    RolledBack(String),
    /// The ledger had nothing to revert.
    NothingToRollback,
    /// The ledger names a migration the set does not contain.
    MigrationNotFound(String),
    /// The ledger table does not exist.
    MigrationTableNotFound,
    /// The migrations directory does not exist.
    MigrationsDirNotFound(PathBuf),
    /// A statement a migration would run.
    Pretended {
        /// Migration name.
        migration: String,
        /// Statement with its bindings inlined.
        sql: String,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToMigrate => f.write_str("Nothing to migrate."),
            Self::Migrating(name) => write!(f, "Migrating: {name}"),
            Self::Migrated(name) => write!(f, "Migrated:  {name}"),
            Self::RollingBack(name) => write!(f, "Rolling back: {name}"),
            Self::RolledBack(name) => write!(f, "Rolled back:  {name}"),
            Self::NothingToRollback => f.write_str("Nothing to rollback."),
            Self::MigrationNotFound(name) => write!(f, "Migration not found: {name}"),
            Self::MigrationTableNotFound => f.write_str("Migration table not found."),
            Self::MigrationsDirNotFound(path) => {
                write!(f, "Migrations directory not found: {}", path.display())
            }
            Self::Pretended { migration, sql } => write!(f, "{migration}: {sql}"),
        }
    }
}

/// Where a migration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Not in the ledger.
    Pending,
    /// Applied in `batch`.
    Ran {
        /// Batch number.
        batch: i64,
    },
    /// In the ledger, but not in the set.
    Missing {
        /// Batch number.
        batch: i64,
    },
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Ran { batch } => write!(f, "[{batch}] Ran"),
            Self::Missing { batch } => write!(f, "[{batch}] Missing"),
        }
    }
}

/// Status line for one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration name.
    pub name: String,
    /// Its state.
    pub state: MigrationState,
}

/// Output of [`Migrator::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Conditions worth telling the user about.
    pub notes: Vec<Note>,
    /// Discovered migrations in name order, then ledger entries with no
    /// matching migration.
    pub migrations: Vec<MigrationStatus>,
}

/// Options for [`Migrator::migrate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrateOptions {
    /// Give every migration its own batch.
    pub step: bool,
    /// Collect SQL instead of running it.
    pub pretend: bool,
}

/// Options for [`Migrator::rollback`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    /// Number of batches to revert; the last batch when `None` or zero.
    pub steps: Option<u64>,
    /// Collect SQL instead of running it.
    pub pretend: bool,
}

/// Runs a [`MigrationSet`] against a connection.
#[derive(Debug)]
pub struct Migrator<'s> {
    set: &'s MigrationSet,
    repository: MigrationRepository,
}

impl<'s> Migrator<'s> {
    /// Creates a runner over `set` using `repository` as the ledger.
    #[must_use]
    pub const fn new(set: &'s MigrationSet, repository: MigrationRepository) -> Self {
        Self { set, repository }
    }

    /// The ledger.
    #[must_use]
    pub const fn repository(&self) -> &MigrationRepository {
        &self.repository
    }

    /// Applies every pending migration.
    ///
    /// Stops at the first failure. Migrations applied before it stay in the
    /// ledger; the failing one is not recorded.
    pub fn migrate(&self, conn: &mut Connection, options: MigrateOptions) -> Result<Vec<Note>> {
        let ran: BTreeSet<String> = if options.pretend {
            if self.repository.exists(conn)? {
                self.repository.ran(conn)?.into_iter().collect()
            } else {
                BTreeSet::new()
            }
        } else {
            self.repository.create_if_missing(conn)?;
            self.repository.ran(conn)?.into_iter().collect()
        };

        let pending: Vec<_> = self
            .set
            .iter()
            .filter(|(name, _)| !ran.contains(*name))
            .collect();
        self.run_pending(conn, &pending, options)
    }

    /// Reverts the last batch, or the `steps` most recent batches.
    pub fn rollback(&self, conn: &mut Connection, options: RollbackOptions) -> Result<Vec<Note>> {
        if !self.repository.exists(conn)? {
            return Ok(vec![Note::MigrationTableNotFound]);
        }
        let entries = match options.steps {
            Some(steps) if steps > 0 => self.repository.batches(conn, steps)?,
            _ => self.repository.last(conn)?,
        };
        self.roll_back(conn, &entries, options.pretend)
    }

    /// Reverts every applied migration.
    pub fn reset(&self, conn: &mut Connection, pretend: bool) -> Result<Vec<Note>> {
        if !self.repository.exists(conn)? {
            return Ok(vec![Note::MigrationTableNotFound]);
        }
        let entries = self.repository.all_for_rollback(conn)?;
        self.roll_back(conn, &entries, pretend)
    }

    /// Resets, then migrates from scratch.
    ///
    /// When pretending nothing is reverted for real, so every migration in
    /// the set is shown as pending.
    pub fn refresh(&self, conn: &mut Connection, pretend: bool) -> Result<Vec<Note>> {
        let mut notes = self.reset(conn, pretend)?;
        let options = MigrateOptions {
            step: false,
            pretend,
        };
        if pretend {
            let all: Vec<_> = self.set.iter().collect();
            notes.extend(self.run_pending(conn, &all, options)?);
        } else {
            notes.extend(self.migrate(conn, options)?);
        }
        Ok(notes)
    }

    /// Cross-references the set against the ledger.
    pub fn status(&self, conn: &mut Connection) -> Result<StatusReport> {
        let mut report = StatusReport::default();
        let entries = if self.repository.exists(conn)? {
            self.repository.entries(conn)?
        } else {
            report.notes.push(Note::MigrationTableNotFound);
            Vec::new()
        };

        for name in self.set.names() {
            let state = entries
                .iter()
                .find(|entry| entry.migration == name)
                .map_or(MigrationState::Pending, |entry| MigrationState::Ran {
                    batch: entry.batch,
                });
            report.migrations.push(MigrationStatus {
                name: String::from(name),
                state,
            });
        }
        for entry in entries.iter().filter(|entry| !self.set.contains(&entry.migration)) {
            report.migrations.push(MigrationStatus {
                name: entry.migration.clone(),
                state: MigrationState::Missing { batch: entry.batch },
            });
        }
        Ok(report)
    }

    fn run_pending(
        &self,
        conn: &mut Connection,
        pending: &[(&str, &dyn Migration)],
        options: MigrateOptions,
    ) -> Result<Vec<Note>> {
        if pending.is_empty() {
            info!("Nothing to migrate");
            return Ok(vec![Note::NothingToMigrate]);
        }

        let mut notes = Vec::new();
        let mut batch = if options.pretend {
            0
        } else {
            self.repository.next_batch_number(conn)?
        };
        for &(name, unit) in pending {
            if options.pretend {
                notes.extend(pretend(conn, name, |conn| unit.up(conn))?);
                continue;
            }

            info!(migration = %name, batch, "Migrating");
            notes.push(Note::Migrating(String::from(name)));
            run_unit(conn, unit, |conn| unit.up(conn))
                .map_err(|source| failed(name, source))?;
            self.repository.log(conn, name, batch)?;
            info!(migration = %name, batch, "Migrated");
            notes.push(Note::Migrated(String::from(name)));

            if options.step {
                batch += 1;
            }
        }
        Ok(notes)
    }

    fn roll_back(&self, conn: &mut Connection, entries: &[LedgerEntry], pretend_only: bool) -> Result<Vec<Note>> {
        if entries.is_empty() {
            info!("Nothing to rollback");
            return Ok(vec![Note::NothingToRollback]);
        }

        let mut notes = Vec::new();
        for entry in entries {
            let name = entry.migration.as_str();
            let Some(unit) = self.set.get(name) else {
                warn!(migration = %name, "Migration not found, leaving its ledger entry");
                notes.push(Note::MigrationNotFound(String::from(name)));
                continue;
            };
            if pretend_only {
                notes.extend(pretend(conn, name, |conn| unit.down(conn))?);
                continue;
            }

            info!(migration = %name, batch = entry.batch, "Rolling back");
            notes.push(Note::RollingBack(String::from(name)));
            run_unit(conn, unit, |conn| unit.down(conn))
                .map_err(|source| failed(name, source))?;
            self.repository.delete(conn, name)?;
            info!(migration = %name, "Rolled back");
            notes.push(Note::RolledBack(String::from(name)));
        }
        Ok(notes)
    }
}

/// Runs one direction of a unit, inside a transaction when both the unit and
/// the dialect allow it.
fn run_unit(
    conn: &mut Connection,
    unit: &dyn Migration,
    step: impl FnOnce(&mut Connection) -> strata_db::Result<()>,
) -> strata_db::Result<()> {
    if unit.within_transaction() && conn.schema().supports_transactions()? {
        conn.transaction(step)
    } else {
        step(conn)
    }
}

fn pretend(
    conn: &mut Connection,
    name: &str,
    step: impl FnOnce(&mut Connection) -> strata_db::Result<()>,
) -> Result<Vec<Note>> {
    let queries = conn.pretend(step).map_err(|source| failed(name, source))?;
    Ok(queries
        .into_iter()
        .map(|query| Note::Pretended {
            migration: String::from(name),
            sql: interpolate(&query.sql, &query.bindings),
        })
        .collect())
}

fn failed(name: &str, source: DbError) -> MigrateError {
    MigrateError::Failed {
        name: String::from(name),
        source,
    }
}
