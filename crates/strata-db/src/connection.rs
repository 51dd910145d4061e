//! The connection pipeline.
//!
//! A [`Connection`] owns one driver handle and runs every statement through
//! the same path: optional pretend short-circuit, lazy (re)connect, one retry
//! after a lost connection, query logging and event dispatch.

use std::fmt;
use std::time::{Duration, Instant};

use strata_sql::grammar::Grammar;
use strata_sql::{Builder, Dialect, SqlValue};
use tracing::{debug, warn};

use crate::classify::{ErrorClassifier, LostConnectionPatterns};
use crate::driver::{Driver, DriverError, ExecResult, Reconnector, Row};
use crate::error::{DbError, Result};
use crate::events::{EventDispatcher, QueryExecuted, QueryListener};
use crate::log::{LoggedQuery, QueryLog};
use crate::schema::SchemaBuilder;
use crate::transaction::TransactionManager;

/// How a statement's result is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Fetch rows.
    Select,
    /// Report affected rows and the generated key.
    Affecting,
    /// Run and discard the outcome.
    Statement,
}

/// Result of [`Connection::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows returned by a select.
    Rows(Vec<Row>),
    /// Affected count of a write.
    Affected(ExecResult),
    /// A statement ran.
    Done,
}

impl Outcome {
    /// Rows, or nothing for non-select outcomes.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected(_) | Self::Done => Vec::new(),
        }
    }

    /// Execution summary, or the default for rows and plain statements.
    #[must_use]
    pub fn into_exec_result(self) -> ExecResult {
        match self {
            Self::Affected(result) => result,
            Self::Rows(_) | Self::Done => ExecResult::default(),
        }
    }
}

/// Assembles a [`Connection`].
pub struct ConnectionBuilder {
    name: String,
    database: String,
    prefix: String,
    dialect: Dialect,
    grammar: Option<Box<dyn Grammar>>,
    driver: Option<Box<dyn Driver>>,
    read_driver: Option<Box<dyn Driver>>,
    reconnector: Option<Box<Reconnector>>,
    classifier: Option<Box<dyn ErrorClassifier>>,
    log_queries: bool,
    events: EventDispatcher,
}

impl ConnectionBuilder {
    /// Starts a builder for `dialect` named `default`.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            name: String::from("default"),
            database: String::new(),
            prefix: String::new(),
            dialect,
            grammar: None,
            driver: None,
            read_driver: None,
            reconnector: None,
            classifier: None,
            log_queries: false,
            events: EventDispatcher::new(),
        }
    }

    /// Connection name used in errors and logs.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = String::from(name);
        self
    }

    /// Target database name.
    #[must_use]
    pub fn database(mut self, database: &str) -> Self {
        self.database = String::from(database);
        self
    }

    /// Table-name prefix applied by [`Connection::table`] and the schema builder.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = String::from(prefix);
        self
    }

    /// Replaces the dialect's query grammar.
    #[must_use]
    pub fn grammar(mut self, grammar: impl Grammar + 'static) -> Self {
        self.grammar = Some(Box::new(grammar));
        self
    }

    /// Primary (write) handle.
    #[must_use]
    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    /// Read-replica handle used for selects outside transactions.
    #[must_use]
    pub fn read_driver(mut self, driver: impl Driver + 'static) -> Self {
        self.read_driver = Some(Box::new(driver));
        self
    }

    /// Opens a new write handle on demand.
    #[must_use]
    pub fn reconnector<F>(mut self, reconnector: F) -> Self
    where
        F: FnMut() -> std::result::Result<Box<dyn Driver>, DriverError> + Send + 'static,
    {
        self.reconnector = Some(Box::new(reconnector));
        self
    }

    /// Replaces the lost-connection classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    /// Starts with the query log enabled.
    #[must_use]
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Registers a query listener.
    #[must_use]
    pub fn listen(mut self, listener: impl QueryListener + 'static) -> Self {
        self.events.listen(listener);
        self
    }

    /// Builds the connection.
    ///
    /// Fails when there is neither a driver nor a way to open one.
    pub fn build(self) -> Result<Connection> {
        if self.driver.is_none() && self.reconnector.is_none() {
            return Err(DbError::Configuration(format!(
                "Connection [{}] has neither a driver nor a reconnector",
                self.name
            )));
        }
        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Box::new(
                LostConnectionPatterns::new()
                    .map_err(|e| DbError::Configuration(e.to_string()))?,
            ),
        };
        let mut log = QueryLog::new();
        log.set_enabled(self.log_queries);
        Ok(Connection {
            name: self.name,
            database: self.database,
            prefix: self.prefix,
            dialect: self.dialect,
            grammar: self.grammar.unwrap_or_else(|| self.dialect.grammar()),
            driver: self.driver,
            read_driver: self.read_driver,
            reconnector: self.reconnector,
            classifier,
            log,
            events: self.events,
            transactions: TransactionManager::new(),
            pretending: false,
            sticky_write: false,
        })
    }
}

/// A named database connection.
pub struct Connection {
    name: String,
    database: String,
    prefix: String,
    dialect: Dialect,
    grammar: Box<dyn Grammar>,
    driver: Option<Box<dyn Driver>>,
    read_driver: Option<Box<dyn Driver>>,
    reconnector: Option<Box<Reconnector>>,
    classifier: Box<dyn ErrorClassifier>,
    log: QueryLog,
    events: EventDispatcher,
    transactions: TransactionManager,
    pretending: bool,
    sticky_write: bool,
}

impl Connection {
    /// Starts a [`ConnectionBuilder`].
    #[must_use]
    pub fn builder(dialect: Dialect) -> ConnectionBuilder {
        ConnectionBuilder::new(dialect)
    }

    /// Connection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Table-name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// SQL dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Query grammar.
    #[must_use]
    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    /// A query builder on `table` carrying this connection's prefix.
    #[must_use]
    pub fn table(&self, table: &str) -> Builder {
        Builder::table(table).with_prefix(&self.prefix)
    }

    /// Schema builder bound to this connection.
    pub fn schema(&mut self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self)
    }

    /// Whether a write handle is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Whether a read replica is configured.
    #[must_use]
    pub fn has_read_connection(&self) -> bool {
        self.read_driver.is_some()
    }

    /// Sends subsequent selects to the write handle.
    pub fn use_write_connection(&mut self) -> &mut Self {
        self.sticky_write = true;
        self
    }

    /// Whether statements are being collected instead of run.
    #[must_use]
    pub const fn is_pretending(&self) -> bool {
        self.pretending
    }

    /// Current transaction depth.
    #[must_use]
    pub const fn transaction_level(&self) -> u32 {
        self.transactions.level()
    }

    /// Query log.
    #[must_use]
    pub const fn query_log(&self) -> &QueryLog {
        &self.log
    }

    /// Starts recording statements.
    pub fn enable_query_log(&mut self) {
        self.log.set_enabled(true);
    }

    /// Stops recording statements.
    pub fn disable_query_log(&mut self) {
        self.log.set_enabled(false);
    }

    /// Removes and returns the recorded statements.
    pub fn flush_query_log(&mut self) -> Vec<LoggedQuery> {
        self.log.take()
    }

    /// Registers a query listener.
    pub fn listen(&mut self, listener: impl QueryListener + 'static) {
        self.events.listen(listener);
    }

    /// Drops the read and write handles. The next statement reconnects.
    pub fn disconnect(&mut self) {
        self.driver = None;
        self.read_driver = None;
    }

    /// Replaces the write handle with a fresh one from the reconnector.
    pub fn reconnect(&mut self) -> Result<()> {
        let Some(reconnector) = self.reconnector.as_mut() else {
            return Err(DbError::LostConnection {
                connection: self.name.clone(),
            });
        };
        let driver = reconnector().map_err(|source| DbError::Reconnect {
            connection: self.name.clone(),
            source,
        })?;
        debug!(connection = %self.name, "Reconnected");
        self.driver = Some(driver);
        Ok(())
    }

    /// Runs one statement through the pipeline.
    pub fn execute(&mut self, sql: &str, bindings: &[SqlValue], mode: ExecMode) -> Result<Outcome> {
        let bindings = self.grammar.prepare_bindings(bindings);
        if self.pretending {
            self.record(sql, &bindings, Duration::ZERO, false);
            return Ok(match mode {
                ExecMode::Select => Outcome::Rows(Vec::new()),
                ExecMode::Affecting => Outcome::Affected(ExecResult::default()),
                ExecMode::Statement => Outcome::Done,
            });
        }

        let start = Instant::now();
        let result = self.run(sql, &bindings, mode);
        let elapsed = start.elapsed();
        debug!(
            connection = %self.name,
            sql = %sql,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            failed = result.is_err(),
            "Executed query"
        );
        self.record(sql, &bindings, elapsed, result.is_err());
        result
    }

    /// Runs a select and returns every row.
    pub fn select(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        Ok(self.execute(sql, bindings, ExecMode::Select)?.into_rows())
    }

    /// Runs a select and returns the first row.
    pub fn select_one(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<Option<Row>> {
        Ok(self.select(sql, bindings)?.into_iter().next())
    }

    /// Runs an insert.
    pub fn insert(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<()> {
        self.statement(sql, bindings)
    }

    /// Runs an update and returns the affected count.
    pub fn update(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting_statement(sql, bindings)
    }

    /// Runs a delete and returns the affected count.
    pub fn delete(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        self.affecting_statement(sql, bindings)
    }

    /// Runs a write and returns the affected count.
    pub fn affecting_statement(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        Ok(self
            .execute(sql, bindings, ExecMode::Affecting)?
            .into_exec_result()
            .rows_affected)
    }

    /// Runs a statement and discards its outcome.
    pub fn statement(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<()> {
        self.execute(sql, bindings, ExecMode::Statement).map(|_| ())
    }

    /// Runs an insert and returns the generated key.
    ///
    /// Dialects that return the key from the statement are read as a row;
    /// others report it through the driver. Pretend mode yields `None`.
    pub fn insert_get_id(&mut self, sql: &str, bindings: &[SqlValue], key: &str) -> Result<Option<i64>> {
        if self.grammar.returns_inserted_id() {
            let row = self.select_one(sql, bindings)?;
            return Ok(row.and_then(|row| row.get(key).and_then(SqlValue::as_i64)));
        }
        Ok(self
            .execute(sql, bindings, ExecMode::Affecting)?
            .into_exec_result()
            .last_insert_id)
    }

    /// Opens a transaction, or a savepoint when one is already open.
    pub fn begin_transaction(&mut self) -> Result<()> {
        let sql = self.transactions.begin_sql(self.grammar.as_ref())?;
        self.control(&sql)?;
        self.transactions.began();
        debug!(connection = %self.name, level = self.transactions.level(), "Began transaction");
        Ok(())
    }

    /// Commits the innermost transaction level.
    pub fn commit(&mut self) -> Result<()> {
        let sql = self.transactions.commit_sql(self.grammar.as_ref())?;
        self.control(&sql)?;
        self.transactions.committed();
        debug!(connection = %self.name, level = self.transactions.level(), "Committed");
        Ok(())
    }

    /// Rolls back the innermost transaction level. A no-op outside transactions.
    pub fn rollback(&mut self) -> Result<()> {
        match self.transactions.level() {
            0 => Ok(()),
            level => self.rollback_to(level - 1),
        }
    }

    /// Rolls back to transaction level `to`.
    pub fn rollback_to(&mut self, to: u32) -> Result<()> {
        let Some(sql) = self.transactions.rollback_sql(self.grammar.as_ref(), to) else {
            return Ok(());
        };
        let result = self.control(&sql);
        if result.is_err() && self.driver.is_none() {
            self.transactions.reset();
        }
        result?;
        self.transactions.rolled_back(to);
        debug!(connection = %self.name, level = to, "Rolled back");
        Ok(())
    }

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    pub fn transaction<T, E>(&mut self, f: impl FnOnce(&mut Self) -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<DbError>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback() {
                    warn!(connection = %self.name, error = %rollback, "Rollback after a failed transaction failed");
                }
                Err(e)
            }
        }
    }

    /// Runs `f` without touching the database and returns what it would run.
    ///
    /// Selects return no rows. The previous log and pretend state are
    /// restored however `f` exits.
    pub fn pretend<E>(&mut self, f: impl FnOnce(&mut Self) -> std::result::Result<(), E>) -> std::result::Result<Vec<LoggedQuery>, E> {
        let mut scope = PretendScope::enter(self);
        f(&mut *scope.connection)?;
        Ok(scope.connection.log.take())
    }

    fn record(&mut self, sql: &str, bindings: &[SqlValue], elapsed: Duration, failed: bool) {
        self.log.record(sql, bindings, elapsed, failed);
        if self.events.has_listeners() {
            self.events.dispatch(&QueryExecuted {
                connection: &self.name,
                sql,
                bindings,
                elapsed,
                failed,
            });
        }
    }

    /// Transaction control statements bypass logging and pretend collection.
    fn control(&mut self, sql: &str) -> Result<()> {
        if self.pretending {
            return Ok(());
        }
        debug!(connection = %self.name, sql = %sql, "Transaction control");
        self.run(sql, &[], ExecMode::Statement).map(|_| ())
    }

    fn run(&mut self, sql: &str, bindings: &[SqlValue], mode: ExecMode) -> Result<Outcome> {
        let use_read = mode == ExecMode::Select
            && !self.sticky_write
            && !self.transactions.is_active()
            && self.read_driver.is_some();
        if use_read {
            if let Some(driver) = self.read_driver.as_deref_mut() {
                return run_on(driver, sql, bindings, mode)
                    .map_err(|source| DbError::query(&self.name, sql, bindings, source));
            }
        }

        let first = run_on(self.write_driver()?, sql, bindings, mode);
        match first {
            Ok(outcome) => Ok(outcome),
            Err(source) if self.classifier.is_lost_connection(&source) => {
                self.driver = None;
                if self.transactions.is_active() {
                    warn!(connection = %self.name, error = %source, "Lost connection inside a transaction");
                    self.transactions.reset();
                    return Err(DbError::query(&self.name, sql, bindings, source));
                }
                warn!(connection = %self.name, error = %source, "Lost connection, retrying once");
                self.reconnect()?;
                run_on(self.write_driver()?, sql, bindings, mode)
                    .map_err(|source| DbError::query(&self.name, sql, bindings, source))
            }
            Err(source) => Err(DbError::query(&self.name, sql, bindings, source)),
        }
    }

    fn write_driver(&mut self) -> Result<&mut dyn Driver> {
        if self.driver.is_none() {
            self.reconnect()?;
        }
        match self.driver.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(DbError::LostConnection {
                connection: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("prefix", &self.prefix)
            .field("connected", &self.driver.is_some())
            .field("transaction_level", &self.transactions.level())
            .field("pretending", &self.pretending)
            .finish_non_exhaustive()
    }
}

fn run_on(
    driver: &mut dyn Driver,
    sql: &str,
    bindings: &[SqlValue],
    mode: ExecMode,
) -> std::result::Result<Outcome, DriverError> {
    match mode {
        ExecMode::Select => driver.query(sql, bindings).map(Outcome::Rows),
        ExecMode::Affecting => driver.execute(sql, bindings).map(Outcome::Affected),
        ExecMode::Statement => driver.execute(sql, bindings).map(|_| Outcome::Done),
    }
}

/// Restores log and pretend state when dropped.
struct PretendScope<'c> {
    connection: &'c mut Connection,
    pretending: bool,
    log_enabled: bool,
    entries: Vec<LoggedQuery>,
}

impl<'c> PretendScope<'c> {
    fn enter(connection: &'c mut Connection) -> Self {
        let pretending = connection.pretending;
        let log_enabled = connection.log.is_enabled();
        let entries = connection.log.take();
        connection.pretending = true;
        connection.log.set_enabled(true);
        Self {
            connection,
            pretending,
            log_enabled,
            entries,
        }
    }
}

impl Drop for PretendScope<'_> {
    fn drop(&mut self) {
        self.connection.pretending = self.pretending;
        self.connection.log.set_enabled(self.log_enabled);
        self.connection.log.replace(std::mem::take(&mut self.entries));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use strata_sql::values;

    use super::*;

    /// Driver that replays scripted failures and records what it ran.
    #[derive(Clone, Default)]
    struct Scripted {
        failures: Arc<Mutex<VecDeque<DriverError>>>,
        ran: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn fail_with(&self, message: &str) {
            self.failures.lock().unwrap().push_back(DriverError::new(message));
        }

        fn ran(&self) -> Vec<String> {
            self.ran.lock().unwrap().clone()
        }

        fn step(&self, sql: &str) -> std::result::Result<(), DriverError> {
            self.ran.lock().unwrap().push(String::from(sql));
            self.failures.lock().unwrap().pop_front().map_or(Ok(()), Err)
        }
    }

    impl Driver for Scripted {
        fn query(&mut self, sql: &str, _bindings: &[SqlValue]) -> std::result::Result<Vec<Row>, DriverError> {
            self.step(sql)?;
            Ok(vec![values([("id", 1_i64)])])
        }

        fn execute(&mut self, sql: &str, _bindings: &[SqlValue]) -> std::result::Result<ExecResult, DriverError> {
            self.step(sql)?;
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: Some(7),
            })
        }
    }

    fn connection(driver: &Scripted) -> Connection {
        let reconnect_with = driver.clone();
        Connection::builder(Dialect::Sqlite)
            .driver(driver.clone())
            .reconnector(move || Ok(Box::new(reconnect_with.clone()) as Box<dyn Driver>))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_without_driver_or_reconnector_fails() {
        let err = Connection::builder(Dialect::Sqlite).build().unwrap_err();
        assert!(matches!(err, DbError::Configuration(_)));
    }

    #[test]
    fn test_lost_connection_is_retried_once() {
        let driver = Scripted::default();
        driver.fail_with("server has gone away");
        let mut conn = connection(&driver);

        let rows = conn.select("SELECT 1", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(driver.ran(), ["SELECT 1", "SELECT 1"]);
    }

    #[test]
    fn test_second_lost_connection_surfaces() {
        let driver = Scripted::default();
        driver.fail_with("server has gone away");
        driver.fail_with("server has gone away");
        let mut conn = connection(&driver);

        let err = conn.select("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, DbError::Query { .. }));
        assert_eq!(driver.ran().len(), 2);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let driver = Scripted::default();
        driver.fail_with("no such table: posts");
        let mut conn = connection(&driver);

        let err = conn
            .select("SELECT * FROM posts WHERE id = ?", &[SqlValue::Int(3)])
            .unwrap_err();
        assert_eq!(driver.ran().len(), 1);
        assert!(err.to_string().contains("SELECT * FROM posts WHERE id = 3"));
    }

    #[test]
    fn test_lost_connection_inside_transaction_is_not_retried() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);
        conn.begin_transaction().unwrap();
        driver.fail_with("Lost connection to server");

        assert!(conn.statement("UPDATE posts SET views = 1", &[]).is_err());
        assert_eq!(conn.transaction_level(), 0);
        assert_eq!(driver.ran(), ["BEGIN", "UPDATE posts SET views = 1"]);
    }

    #[test]
    fn test_missing_handle_without_reconnector() {
        let mut conn = Connection::builder(Dialect::Sqlite)
            .driver(Scripted::default())
            .build()
            .unwrap();
        conn.disconnect();
        assert!(matches!(
            conn.select("SELECT 1", &[]),
            Err(DbError::LostConnection { .. })
        ));
    }

    #[test]
    fn test_nested_transactions_use_savepoints() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);

        conn.transaction(|conn| {
            conn.transaction(|conn| conn.statement("DELETE FROM a", &[]))?;
            conn.begin_transaction()?;
            conn.rollback()
        })
        .unwrap();

        assert_eq!(
            driver.ran(),
            [
                "BEGIN",
                "SAVEPOINT trans2",
                "DELETE FROM a",
                "RELEASE SAVEPOINT trans2",
                "SAVEPOINT trans2",
                "ROLLBACK TO SAVEPOINT trans2",
                "COMMIT",
            ]
        );
        assert_eq!(conn.transaction_level(), 0);
    }

    #[test]
    fn test_failed_closure_rolls_back() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);

        let result: Result<()> = conn.transaction(|conn| {
            conn.statement("DELETE FROM a", &[])?;
            Err(DbError::Transaction(String::from("boom")))
        });
        assert!(result.is_err());
        assert_eq!(driver.ran(), ["BEGIN", "DELETE FROM a", "ROLLBACK"]);
    }

    #[test]
    fn test_failed_rollback_keeps_closure_error() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);

        let result: Result<()> = conn.transaction(|conn| {
            driver.fail_with("disk I/O error");
            Err(DbError::Transaction(String::from("boom")))
        });
        match result {
            Err(DbError::Transaction(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(driver.ran(), ["BEGIN", "ROLLBACK"]);
    }

    #[test]
    fn test_pretend_collects_and_restores_state() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);
        conn.enable_query_log();
        conn.statement("SELECT 0", &[]).unwrap();

        let queries = conn
            .pretend(|conn| {
                conn.transaction(|conn| conn.statement("DROP TABLE a", &[]))?;
                let rows = conn.select("SELECT * FROM b WHERE x = ?", &[SqlValue::Bool(true)])?;
                assert!(rows.is_empty());
                Ok::<_, DbError>(())
            })
            .unwrap();

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].sql, "DROP TABLE a");
        assert_eq!(queries[1].bindings, vec![SqlValue::Int(1)]);
        assert!(!conn.is_pretending());
        assert_eq!(conn.query_log().entries().len(), 1);
        assert_eq!(driver.ran(), ["SELECT 0"]);
    }

    #[test]
    fn test_pretend_restores_state_on_error() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);

        let result = conn.pretend(|conn| {
            conn.statement("DROP TABLE a", &[])?;
            Err(DbError::Transaction(String::from("stop")))
        });
        assert!(result.is_err());
        assert!(!conn.is_pretending());
        assert!(!conn.query_log().is_enabled());
        assert!(conn.query_log().entries().is_empty());
    }

    #[test]
    fn test_listeners_see_every_statement() {
        let driver = Scripted::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut conn = Connection::builder(Dialect::Sqlite)
            .name("replica-test")
            .driver(driver.clone())
            .listen(move |event: &QueryExecuted<'_>| {
                sink.lock()
                    .unwrap()
                    .push((event.connection.to_owned(), event.sql.to_owned(), event.failed));
            })
            .build()
            .unwrap();

        driver.fail_with("syntax error");
        assert!(conn.statement("SELEC 1", &[]).is_err());
        conn.statement("SELECT 1", &[]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].2);
        assert_eq!(seen[1], (String::from("replica-test"), String::from("SELECT 1"), false));
    }

    #[test]
    fn test_selects_go_to_read_replica_outside_transactions() {
        let write = Scripted::default();
        let read = Scripted::default();
        let mut conn = Connection::builder(Dialect::Sqlite)
            .driver(write.clone())
            .read_driver(read.clone())
            .build()
            .unwrap();

        conn.select("SELECT 1", &[]).unwrap();
        conn.transaction(|conn| conn.select("SELECT 2", &[]).map(|_| ()))
            .unwrap();
        conn.use_write_connection();
        conn.select("SELECT 3", &[]).unwrap();

        assert_eq!(read.ran(), ["SELECT 1"]);
        assert_eq!(write.ran(), ["BEGIN", "SELECT 2", "COMMIT", "SELECT 3"]);
    }

    #[test]
    fn test_insert_get_id_reads_driver_key() {
        let driver = Scripted::default();
        let mut conn = connection(&driver);
        let id = conn
            .insert_get_id("INSERT INTO a (x) VALUES (?)", &[SqlValue::Int(1)], "id")
            .unwrap();
        assert_eq!(id, Some(7));
    }

    #[test]
    fn test_insert_get_id_reads_returning_row_on_postgres() {
        let driver = Scripted::default();
        let mut conn = Connection::builder(Dialect::Postgres)
            .driver(driver.clone())
            .build()
            .unwrap();
        let id = conn
            .insert_get_id("INSERT INTO a (x) VALUES (?) RETURNING \"id\"", &[], "id")
            .unwrap();
        assert_eq!(id, Some(1));
    }

    #[test]
    fn test_table_carries_prefix() {
        let conn = Connection::builder(Dialect::Sqlite)
            .prefix("wp_")
            .driver(Scripted::default())
            .build()
            .unwrap();
        assert_eq!(conn.table("posts").prefix(), "wp_");
    }
}
