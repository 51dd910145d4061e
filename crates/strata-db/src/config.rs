//! Connection configuration.
//!
//! ```toml
//! default = "main"
//!
//! [connections.main]
//! url = "sqlite://cms.db"
//! prefix = "wp_"
//! log_queries = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use strata_sql::Dialect;

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{DbError, Result};
use crate::sqlite::SqliteDriver;

fn default_connection() -> String {
    String::from("default")
}

/// Named connections loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection used when none is named.
    #[serde(default = "default_connection")]
    pub default: String,
    /// Connections by name.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| DbError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| DbError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DbError::Configuration(e.to_string()))
    }

    /// Looks up `name`, or the default connection.
    pub fn connection(&self, name: Option<&str>) -> Result<&ConnectionConfig> {
        let name = name.unwrap_or(&self.default);
        self.connections
            .get(name)
            .ok_or_else(|| DbError::Configuration(format!("Database connection [{name}] not configured")))
    }
}

/// One connection's settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionConfig {
    /// Dialect; inferred from the URL scheme when absent.
    pub driver: Option<Dialect>,
    /// Connection URL.
    pub url: String,
    /// Database name reported to the schema grammar.
    #[serde(default)]
    pub database: String,
    /// Table-name prefix.
    #[serde(default)]
    pub prefix: String,
    /// Start with the query log enabled.
    #[serde(default)]
    pub log_queries: bool,
    /// Optional read replica.
    pub read_url: Option<String>,
}

impl ConnectionConfig {
    /// Settings for a bare URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        Self {
            url: String::from(url),
            ..Self::default()
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = String::from(prefix);
        self
    }

    /// The configured or inferred dialect.
    pub fn dialect(&self) -> Result<Dialect> {
        self.driver
            .or_else(|| Dialect::from_url(&self.url))
            .ok_or_else(|| DbError::Configuration(format!("Cannot infer a driver from `{}`", self.url)))
    }

    /// Opens a connection named `name`.
    ///
    /// Only SQLite has a bundled driver. Other dialects are assembled with
    /// [`ConnectionBuilder`](crate::ConnectionBuilder) around a custom
    /// [`Driver`].
    pub fn connect(&self, name: &str) -> Result<Connection> {
        let dialect = self.dialect()?;
        if dialect != Dialect::Sqlite {
            return Err(DbError::Configuration(format!(
                "No bundled driver for {dialect}; supply one through ConnectionBuilder"
            )));
        }

        let open = |url: &str| {
            SqliteDriver::connect(url).map_err(|source| DbError::Connect {
                connection: String::from(name),
                source,
            })
        };
        let url = self.url.clone();
        let mut builder = Connection::builder(dialect)
            .name(name)
            .database(&self.database)
            .prefix(&self.prefix)
            .log_queries(self.log_queries)
            .driver(open(&self.url)?)
            .reconnector(move || SqliteDriver::connect(&url).map(|d| Box::new(d) as Box<dyn Driver>));
        if let Some(read_url) = &self.read_url {
            builder = builder.read_driver(open(read_url)?);
        }
        builder.build()
    }
}
