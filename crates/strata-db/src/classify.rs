//! Driver error classification.

use regex::{RegexSet, RegexSetBuilder};

use crate::driver::DriverError;

/// Messages that mean the handle is gone and a reconnect may help.
pub const LOST_CONNECTION_MESSAGES: &[&str] = &[
    "server has gone away",
    "no connection to the server",
    "lost connection",
    "is dead or not enabled",
    "error while sending",
    "decryption failed or bad record mac",
    "server closed the connection unexpectedly",
    "ssl connection has been closed unexpectedly",
    "error writing data to the connection",
    "resource deadlock avoided",
    "transaction() on null",
    "child connection forced to terminate due to client_idle_limit",
    "query_wait_timeout",
    "reset by peer",
    "physical connection is not usable",
    "connection refused",
    "broken pipe",
    "connection closed",
    "connection is no longer usable",
    "communication link failure",
    "temporary failure in name resolution",
    "ssl: connection timed out",
    "pool timed out",
];

/// Decides whether a driver error means the connection was lost.
pub trait ErrorClassifier: Send {
    /// Returns `true` when reconnecting and retrying may succeed.
    fn is_lost_connection(&self, error: &DriverError) -> bool;
}

/// Case-insensitive substring matcher over driver messages.
#[derive(Debug, Clone)]
pub struct LostConnectionPatterns {
    set: RegexSet,
}

impl LostConnectionPatterns {
    /// Builds the matcher from [`LOST_CONNECTION_MESSAGES`].
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_messages(LOST_CONNECTION_MESSAGES.iter().copied())
    }

    /// Builds a matcher from literal messages.
    pub fn with_messages<'a>(messages: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
        let set = RegexSetBuilder::new(messages.into_iter().map(regex::escape))
            .case_insensitive(true)
            .build()?;
        Ok(Self { set })
    }
}

impl ErrorClassifier for LostConnectionPatterns {
    fn is_lost_connection(&self, error: &DriverError) -> bool {
        self.set.is_match(&error.message)
    }
}
