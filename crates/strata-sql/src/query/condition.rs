//! WHERE clause nodes.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::value::SqlValue;

/// How a condition joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Connector {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Comparison operators accepted by `where_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl Op {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Op {
    type Err = Error;

    /// Parses an operator written the way it appears in SQL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "<>" | "!=" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::LtEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::GtEq),
            "like" => Ok(Self::Like),
            "not like" => Ok(Self::NotLike),
            other => Err(Error::InvalidArgument(format!("illegal operator `{other}`"))),
        }
    }
}

/// A single predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column op ?`
    Basic {
        /// Column reference.
        column: String,
        /// Comparison operator.
        op: Op,
        /// Bound value.
        value: SqlValue,
    },
    /// `column IS NULL`
    Null(String),
    /// `column IS NOT NULL`
    NotNull(String),
    /// `column IN (?, ...)`
    In {
        /// Column reference.
        column: String,
        /// Candidate values.
        values: Vec<SqlValue>,
    },
    /// `column NOT IN (?, ...)`
    NotIn {
        /// Column reference.
        column: String,
        /// Excluded values.
        values: Vec<SqlValue>,
    },
    /// `column [NOT] BETWEEN ? AND ?`
    Between {
        /// Column reference.
        column: String,
        /// Lower bound.
        low: SqlValue,
        /// Upper bound.
        high: SqlValue,
        /// Emits `NOT BETWEEN` when set.
        negated: bool,
    },
    /// Raw SQL fragment with its own bindings.
    Raw {
        /// SQL fragment, using `?` placeholders.
        sql: String,
        /// Bindings for the fragment.
        bindings: Vec<SqlValue>,
    },
    /// Parenthesised group.
    Nested(Vec<Where>),
}

impl Condition {
    /// Number of values this condition binds.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        match self {
            Self::Basic { .. } => 1,
            Self::Null(_) | Self::NotNull(_) => 0,
            Self::In { values, .. } | Self::NotIn { values, .. } => values.len(),
            Self::Between { .. } => 2,
            Self::Raw { bindings, .. } => bindings.len(),
            Self::Nested(wheres) => wheres.iter().map(|w| w.condition.binding_count()).sum(),
        }
    }
}

/// A condition together with its connector to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    /// Connector to the previous condition; ignored for the first.
    pub connector: Connector,
    /// The predicate.
    pub condition: Condition,
}
