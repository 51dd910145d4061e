//! Compiled statements.

use crate::value::SqlValue;

/// SQL text and its bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compiled {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// One binding per placeholder.
    pub bindings: Vec<SqlValue>,
}

impl Compiled {
    /// Creates a compiled statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Splits into `(sql, bindings)`.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.bindings)
    }
}

impl From<Compiled> for (String, Vec<SqlValue>) {
    fn from(compiled: Compiled) -> Self {
        compiled.into_parts()
    }
}
