//! Dialect selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grammar::{GenericGrammar, Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
use crate::schema::grammar::{
    MySqlSchemaGrammar, PostgresSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar,
};

/// The SQL dialects the grammars know how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI SQL with unquoted identifiers.
    Generic,
    /// MySQL / MariaDB.
    #[serde(alias = "mariadb")]
    Mysql,
    /// PostgreSQL.
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Returns the query grammar for this dialect.
    #[must_use]
    pub fn grammar(self) -> Box<dyn Grammar> {
        match self {
            Self::Generic => Box::new(GenericGrammar),
            Self::Mysql => Box::new(MySqlGrammar),
            Self::Postgres => Box::new(PostgresGrammar),
            Self::Sqlite => Box::new(SqliteGrammar),
        }
    }

    /// Returns the schema grammar for this dialect.
    ///
    /// The generic dialect has no DDL grammar.
    pub fn schema_grammar(self) -> Result<Box<dyn SchemaGrammar>> {
        match self {
            Self::Generic => Err(Error::Unsupported {
                grammar: "generic",
                feature: String::from("schema definitions"),
            }),
            Self::Mysql => Ok(Box::new(MySqlSchemaGrammar)),
            Self::Postgres => Ok(Box::new(PostgresSchemaGrammar)),
            Self::Sqlite => Ok(Box::new(SqliteSchemaGrammar)),
        }
    }

    /// Infers the dialect from a connection URL scheme.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::Mysql),
            _ => None,
        }
    }

    /// Lowercase dialect name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" | "pgsql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::InvalidArgument(format!("unknown dialect `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("postgres://u@h/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("mysql://u@h/db"), Some(Dialect::Mysql));
        assert_eq!(Dialect::from_url("redis://h"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PgSQL".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_generic_has_no_schema_grammar() {
        assert!(Dialect::Generic.schema_grammar().is_err());
        assert_eq!(Dialect::Sqlite.schema_grammar().map(|g| g.name()), Ok("sqlite"));
    }
}
