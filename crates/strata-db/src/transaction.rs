//! Transaction depth bookkeeping.
//!
//! Level 0 means no transaction. Level 1 is a real `BEGIN`; each deeper level
//! is a savepoint named `trans{level}`.

use strata_sql::grammar::Grammar;

use crate::error::{DbError, Result};

/// Tracks how many transactions are open on one connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransactionManager {
    level: u32,
}

impl TransactionManager {
    /// Creates a manager with no open transaction.
    #[must_use]
    pub const fn new() -> Self {
        Self { level: 0 }
    }

    /// Current depth.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Whether at least one transaction is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.level > 0
    }

    /// Statement that opens the next level.
    pub fn begin_sql(&self, grammar: &dyn Grammar) -> Result<String> {
        if self.level == 0 {
            return Ok(String::from(grammar.compile_begin()));
        }
        if !grammar.supports_savepoints() {
            return Err(DbError::Transaction(format!(
                "{} does not support nested transactions",
                grammar.name()
            )));
        }
        Ok(grammar.compile_savepoint(&savepoint(self.level + 1)))
    }

    /// Statement that commits the innermost level.
    pub fn commit_sql(&self, grammar: &dyn Grammar) -> Result<String> {
        match self.level {
            0 => Err(DbError::Transaction(String::from(
                "No active transaction to commit",
            ))),
            1 => Ok(String::from("COMMIT")),
            level => Ok(grammar.compile_savepoint_release(&savepoint(level))),
        }
    }

    /// Statement that unwinds to `to`, or `None` when already there.
    #[must_use]
    pub fn rollback_sql(&self, grammar: &dyn Grammar, to: u32) -> Option<String> {
        if to >= self.level {
            return None;
        }
        if to == 0 {
            return Some(String::from("ROLLBACK"));
        }
        Some(grammar.compile_savepoint_rollback(&savepoint(to + 1)))
    }

    pub(crate) fn began(&mut self) {
        self.level += 1;
    }

    pub(crate) fn committed(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub(crate) fn rolled_back(&mut self, to: u32) {
        self.level = to.min(self.level);
    }

    /// Forgets every level. Used when the handle is lost.
    pub(crate) fn reset(&mut self) {
        self.level = 0;
    }
}

fn savepoint(level: u32) -> String {
    format!("trans{level}")
}
