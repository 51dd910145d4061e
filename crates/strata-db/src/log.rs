//! In-memory query log.

use std::time::Duration;

use strata_sql::SqlValue;

/// One executed (or pretended) statement.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedQuery {
    /// Statement text.
    pub sql: String,
    /// Bindings sent with it.
    pub bindings: Vec<SqlValue>,
    /// Wall time spent in the driver.
    pub elapsed: Duration,
    /// Whether the driver rejected it.
    pub failed: bool,
}

/// Ordered log of statements run on a connection.
#[derive(Debug, Default)]
pub struct QueryLog {
    enabled: bool,
    entries: Vec<LoggedQuery>,
}

impl QueryLog {
    /// Creates a disabled, empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether new statements are recorded.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns recording on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Records a statement when enabled, whether or not it succeeded.
    pub fn record(&mut self, sql: &str, bindings: &[SqlValue], elapsed: Duration, failed: bool) {
        if self.enabled {
            self.entries.push(LoggedQuery {
                sql: String::from(sql),
                bindings: bindings.to_vec(),
                elapsed,
                failed,
            });
        }
    }

    /// Recorded statements, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LoggedQuery] {
        &self.entries
    }

    /// Removes and returns every entry.
    pub fn take(&mut self) -> Vec<LoggedQuery> {
        std::mem::take(&mut self.entries)
    }

    /// Replaces the entries, returning the previous ones.
    pub fn replace(&mut self, entries: Vec<LoggedQuery>) -> Vec<LoggedQuery> {
        std::mem::replace(&mut self.entries, entries)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
