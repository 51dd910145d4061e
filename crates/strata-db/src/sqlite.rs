//! Bundled SQLite driver.
//!
//! Wraps an async `sqlx` connection behind a private current-thread runtime,
//! so every call blocks until the statement finishes.

use std::str::FromStr;

use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, Sqlite, TypeInfo, ValueRef};
use strata_sql::{BindingKind, SqlValue};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use crate::driver::{Driver, DriverError, ExecResult, Row};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A single SQLite handle.
pub struct SqliteDriver {
    runtime: Runtime,
    conn: SqliteConnection,
}

impl SqliteDriver {
    /// Opens `url`, creating the database file when missing.
    ///
    /// Accepts `sqlite::memory:`, `sqlite://path` and `sqlite:path`.
    pub fn connect(url: &str) -> Result<Self, DriverError> {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DriverError::new(format!("Failed to start runtime: {e}")))?;
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let conn = runtime.block_on(options.connect())?;
        Ok(Self { runtime, conn })
    }

    /// Opens a private in-memory database.
    pub fn memory() -> Result<Self, DriverError> {
        Self::connect("sqlite::memory:")
    }
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver").finish_non_exhaustive()
    }
}

impl Driver for SqliteDriver {
    fn query(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>, DriverError> {
        let query = bind_all(sqlx::query(sql), bindings);
        let rows = self.runtime.block_on(query.fetch_all(&mut self.conn))?;
        rows.iter().map(decode_row).collect()
    }

    fn execute(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ExecResult, DriverError> {
        let query = bind_all(sqlx::query(sql), bindings);
        let result = self.runtime.block_on(query.execute(&mut self.conn))?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: (result.rows_affected() > 0).then(|| result.last_insert_rowid()),
        })
    }
}

fn bind_all<'q>(query: SqliteQuery<'q>, bindings: &[SqlValue]) -> SqliteQuery<'q> {
    bindings.iter().fold(query, bind_value)
}

/// Binds one value using the strategy its kind selects.
fn bind_value<'q>(query: SqliteQuery<'q>, value: &SqlValue) -> SqliteQuery<'q> {
    match (value.kind(), value) {
        (_, SqlValue::Null) => query.bind(Option::<i64>::None),
        (BindingKind::Integer, value) => query.bind(value.as_i64()),
        (BindingKind::LargeObject, SqlValue::Blob(bytes)) => query.bind(bytes.clone()),
        (_, SqlValue::Float(f)) => query.bind(*f),
        (_, SqlValue::Text(s)) => query.bind(s.clone()),
        (_, other) => query.bind(other.to_sql_inline()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, DriverError> {
    let mut out = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        out.insert(String::from(column.name()), value);
    }
    Ok(out)
}

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let error = Self::new(db.message());
                match db.code() {
                    Some(code) => error.with_code(code.into_owned()),
                    None => error,
                }
            }
            _ => Self::new(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_every_storage_class() {
        let mut driver = SqliteDriver::memory().unwrap();
        driver
            .execute(
                "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, i INTEGER, r REAL, s TEXT, b BLOB, n TEXT)",
                &[],
            )
            .unwrap();
        let result = driver
            .execute(
                "INSERT INTO t (i, r, s, b, n) VALUES (?, ?, ?, ?, ?)",
                &[
                    SqlValue::Bool(true),
                    SqlValue::Float(1.5),
                    SqlValue::Text(String::from("hi")),
                    SqlValue::Blob(vec![0xDE, 0xAD]),
                    SqlValue::Null,
                ],
            )
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let rows = driver.query("SELECT i, r, s, b, n FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["i"], SqlValue::Int(1));
        assert_eq!(row["r"], SqlValue::Float(1.5));
        assert_eq!(row["s"], SqlValue::Text(String::from("hi")));
        assert_eq!(row["b"], SqlValue::Blob(vec![0xDE, 0xAD]));
        assert_eq!(row["n"], SqlValue::Null);
        assert_eq!(row.keys().collect::<Vec<_>>(), ["i", "r", "s", "b", "n"]);
    }

    #[test]
    fn test_database_errors_carry_message() {
        let mut driver = SqliteDriver::memory().unwrap();
        let err = driver.query("SELECT * FROM missing", &[]).unwrap_err();
        assert!(err.message.contains("no such table"));
    }
}
