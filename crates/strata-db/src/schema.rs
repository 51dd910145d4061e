//! Executing table definitions.

use strata_sql::schema::grammar::SchemaGrammar;
use strata_sql::schema::Table;
use tracing::debug;

use crate::connection::Connection;
use crate::error::Result;

/// Runs [`Table`] definitions against a connection.
///
/// Each definition compiles to an ordered list of statements that run one
/// after another. Nothing is wrapped in a transaction here, so a failure part
/// way through leaves the earlier statements applied.
#[derive(Debug)]
pub struct SchemaBuilder<'c> {
    conn: &'c mut Connection,
}

impl<'c> SchemaBuilder<'c> {
    pub(crate) fn new(conn: &'c mut Connection) -> Self {
        Self { conn }
    }

    /// Schema grammar of the connection's dialect.
    pub fn grammar(&self) -> Result<Box<dyn SchemaGrammar>> {
        Ok(self.conn.dialect().schema_grammar()?)
    }

    /// Whether DDL can run inside a transaction on this dialect.
    pub fn supports_transactions(&self) -> Result<bool> {
        Ok(self.grammar()?.supports_schema_transactions())
    }

    /// An empty definition for `table` carrying the connection prefix.
    #[must_use]
    pub fn blueprint(&self, table: &str) -> Table {
        Table::new(table, self.conn.prefix())
    }

    /// Compiles and runs a definition.
    pub fn build(&mut self, table: Table) -> Result<()> {
        let grammar = self.grammar()?;
        let statements = table.to_sql(grammar.as_ref())?;
        for sql in &statements {
            debug!(sql = %sql, "Executing schema statement");
            self.conn.statement(sql, &[])?;
        }
        Ok(())
    }

    /// Creates `table`.
    pub fn create(&mut self, table: &str, define: impl FnOnce(&mut Table)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.create();
        define(&mut blueprint);
        self.build(blueprint)
    }

    /// Creates `table` unless it exists. Returns whether it was created.
    pub fn create_if_missing(&mut self, table: &str, define: impl FnOnce(&mut Table)) -> Result<bool> {
        if self.has_table(table)? {
            return Ok(false);
        }
        self.create(table, define)?;
        Ok(true)
    }

    /// Alters an existing `table`.
    pub fn table(&mut self, table: &str, define: impl FnOnce(&mut Table)) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        define(&mut blueprint);
        self.build(blueprint)
    }

    /// Drops `table`.
    pub fn drop(&mut self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop();
        self.build(blueprint)
    }

    /// Drops `table` if it exists.
    pub fn drop_if_exists(&mut self, table: &str) -> Result<()> {
        let mut blueprint = self.blueprint(table);
        blueprint.drop_if_exists();
        self.build(blueprint)
    }

    /// Renames `from` to `to`.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let mut blueprint = self.blueprint(from);
        blueprint.rename(to);
        self.build(blueprint)
    }

    /// Whether `table` exists. Always `false` while pretending.
    pub fn has_table(&mut self, table: &str) -> Result<bool> {
        let grammar = self.grammar()?;
        let prefixed = format!("{}{table}", self.conn.prefix());
        let (sql, bindings) = grammar.compile_table_exists(self.conn.database(), &prefixed);
        Ok(!self.conn.select(&sql, &bindings)?.is_empty())
    }
}
