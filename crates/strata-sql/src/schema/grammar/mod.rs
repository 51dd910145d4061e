//! Dialect-specific DDL compilers.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlSchemaGrammar;
pub use postgres::PostgresSchemaGrammar;
pub use sqlite::SqliteSchemaGrammar;

use crate::value::SqlValue;

use super::column::{ColumnDefinition, DefaultValue};
use super::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
use super::table::Table;
use super::{SchemaError, SchemaResult};

/// Compiles [`Table`] commands into DDL statements for one dialect.
pub trait SchemaGrammar: Send + Sync {
    /// Dialect name.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quote_char(&self) -> char {
        '"'
    }

    /// Whether DDL can run inside a transaction.
    fn supports_schema_transactions(&self) -> bool {
        true
    }

    /// Quotes an identifier.
    fn wrap(&self, name: &str) -> String {
        let q = self.quote_char();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quotes the prefixed table name.
    fn wrap_table(&self, table: &Table) -> String {
        self.wrap(&table.prefixed_name())
    }

    /// Quotes a comma-separated column list.
    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// An error for a feature this grammar lacks.
    fn unsupported(&self, feature: &str) -> SchemaError {
        SchemaError::Unsupported {
            grammar: self.name(),
            feature: String::from(feature),
        }
    }

    /// Dispatches one command.
    fn compile_command(&self, table: &Table, command: &Command) -> SchemaResult<Vec<String>> {
        match command {
            Command::Create => self.compile_create(table),
            Command::Drop => Ok(vec![format!("DROP TABLE {}", self.wrap_table(table))]),
            Command::DropIfExists => Ok(vec![format!(
                "DROP TABLE IF EXISTS {}",
                self.wrap_table(table)
            )]),
            Command::Rename { to } => Ok(vec![self.compile_rename(table, to)]),
            Command::Add => self.compile_add(table),
            Command::Change => self.compile_change(table),
            Command::DropColumn { columns } => Ok(self.compile_drop_column(table, columns)),
            Command::RenameColumn { from, to } => Ok(vec![format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                self.wrap_table(table),
                self.wrap(from),
                self.wrap(to)
            )]),
            Command::Index(index) => self.compile_index(table, index),
            Command::DropIndex(index) => self.compile_drop_index(table, index),
            Command::Foreign(foreign) => self.compile_foreign(table, foreign),
            Command::DropForeign { name } => self.compile_drop_foreign(table, name),
        }
    }

    /// SQL type of a column.
    fn type_sql(&self, column: &ColumnDefinition) -> String;

    /// Rejects column definitions the dialect cannot express.
    fn check_column(&self, _column: &ColumnDefinition) -> SchemaResult<()> {
        Ok(())
    }

    /// Modifier appended to auto-increment integer columns.
    fn increment_modifier(&self) -> &'static str {
        " PRIMARY KEY"
    }

    /// Boolean literal for defaults.
    fn render_bool(&self, value: bool) -> &'static str {
        if value {
            "'1'"
        } else {
            "'0'"
        }
    }

    /// Renders a default value.
    fn render_default(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Null => String::from("NULL"),
            DefaultValue::Boolean(b) => String::from(self.render_bool(*b)),
            DefaultValue::Integer(i) => i.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::Expression(e) => e.clone(),
        }
    }

    /// Column modifiers, each with a leading space.
    fn compile_modifiers(&self, column: &ColumnDefinition) -> String {
        let mut sql = String::new();
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" COLLATE {collation}"));
        }
        if let Some(generated) = &column.generated {
            let storage = if generated.stored { "STORED" } else { "VIRTUAL" };
            sql.push_str(&format!(
                " GENERATED ALWAYS AS ({}) {storage}",
                generated.expression
            ));
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if column.auto_increment && column.column_type.is_integer() {
            sql.push_str(self.increment_modifier());
        }
        sql
    }

    /// Full column definition: name, type and modifiers.
    fn column_definition(&self, column: &ColumnDefinition) -> SchemaResult<String> {
        self.check_column(column)?;
        Ok(format!(
            "{} {}{}",
            self.wrap(&column.name),
            self.type_sql(column),
            self.compile_modifiers(column)
        ))
    }

    /// Table constraints emitted inside CREATE TABLE.
    fn compile_inline_constraints(&self, _table: &Table) -> SchemaResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Text appended after the CREATE TABLE column list.
    fn compile_table_options(&self, _table: &Table) -> String {
        String::new()
    }

    /// Extra statements documenting columns.
    fn compile_comments<'a>(
        &self,
        _table: &Table,
        _columns: &mut dyn Iterator<Item = &'a ColumnDefinition>,
    ) -> Vec<String> {
        Vec::new()
    }

    /// Compiles CREATE TABLE.
    fn compile_create(&self, table: &Table) -> SchemaResult<Vec<String>> {
        let mut definitions = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect::<SchemaResult<Vec<_>>>()?;
        definitions.extend(self.compile_inline_constraints(table)?);
        let temporary = if table.is_temporary() { "TEMPORARY " } else { "" };
        let mut statements = vec![format!(
            "CREATE {temporary}TABLE {} ({}){}",
            self.wrap_table(table),
            definitions.join(", "),
            self.compile_table_options(table)
        )];
        statements.extend(self.compile_comments(table, &mut table.columns().iter()));
        Ok(statements)
    }

    /// Compiles ADD COLUMN for every added column.
    fn compile_add(&self, table: &Table) -> SchemaResult<Vec<String>> {
        let clauses = table
            .added_columns()
            .map(|c| self.column_definition(c).map(|d| format!("ADD COLUMN {d}")))
            .collect::<SchemaResult<Vec<_>>>()?;
        let mut statements = vec![format!(
            "ALTER TABLE {} {}",
            self.wrap_table(table),
            clauses.join(", ")
        )];
        statements.extend(self.compile_comments(table, &mut table.added_columns()));
        Ok(statements)
    }

    /// Compiles column modifications.
    fn compile_change(&self, _table: &Table) -> SchemaResult<Vec<String>> {
        Err(self.unsupported("changing columns"))
    }

    /// Compiles DROP COLUMN.
    fn compile_drop_column(&self, table: &Table, columns: &[String]) -> Vec<String> {
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("DROP COLUMN {}", self.wrap(c)))
            .collect();
        vec![format!(
            "ALTER TABLE {} {}",
            self.wrap_table(table),
            clauses.join(", ")
        )]
    }

    /// Compiles a table rename.
    fn compile_rename(&self, table: &Table, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.wrap_table(table),
            self.wrap(&format!("{}{to}", table.prefix()))
        )
    }

    /// Whether a primary key command is already declared inline by the
    /// table's auto-increment column.
    ///
    /// A primary key over any other column set conflicts with that column.
    fn primary_is_inline(&self, table: &Table, index: &IndexCommand) -> SchemaResult<bool> {
        let Some(increment) = table
            .columns()
            .iter()
            .find(|c| c.auto_increment && c.column_type.is_integer())
        else {
            return Ok(false);
        };
        if matches!(index.columns.as_slice(), [only] if *only == increment.name) {
            return Ok(true);
        }
        Err(SchemaError::InvalidDefinition {
            table: String::from(table.name()),
            reason: format!(
                "primary key ({}) conflicts with auto-increment column `{}`",
                index.columns.join(", "),
                increment.name
            ),
        })
    }

    /// Compiles index and key creation.
    fn compile_index(&self, table: &Table, index: &IndexCommand) -> SchemaResult<Vec<String>> {
        let sql = match index.kind {
            IndexKind::Primary if self.primary_is_inline(table, index)? => return Ok(Vec::new()),
            IndexKind::Primary => format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                self.wrap_table(table),
                self.columnize(&index.columns)
            ),
            IndexKind::Unique => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                self.wrap_table(table),
                self.wrap(&index.name),
                self.columnize(&index.columns)
            ),
            IndexKind::Index => format!(
                "CREATE INDEX {} ON {} ({})",
                self.wrap(&index.name),
                self.wrap_table(table),
                self.columnize(&index.columns)
            ),
        };
        Ok(vec![sql])
    }

    /// Compiles index and key removal.
    fn compile_drop_index(
        &self,
        table: &Table,
        index: &DropIndexCommand,
    ) -> SchemaResult<Vec<String>> {
        let sql = match index.kind {
            IndexKind::Primary | IndexKind::Unique => format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                self.wrap_table(table),
                self.wrap(&index.name)
            ),
            IndexKind::Index => format!("DROP INDEX {}", self.wrap(&index.name)),
        };
        Ok(vec![sql])
    }

    /// `FOREIGN KEY (...) REFERENCES ...` clause shared by ALTER and CREATE.
    fn foreign_key_clause(&self, table: &Table, foreign: &ForeignKeyCommand) -> SchemaResult<String> {
        if foreign.on.is_empty() {
            return Err(SchemaError::InvalidDefinition {
                table: String::from(table.name()),
                reason: format!("foreign key `{}` has no referenced table", foreign.name),
            });
        }
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.columnize(&foreign.columns),
            self.wrap(&format!("{}{}", table.prefix(), foreign.on)),
            self.columnize(&foreign.references)
        );
        if let Some(action) = foreign.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        Ok(sql)
    }

    /// Compiles a foreign key constraint.
    fn compile_foreign(&self, table: &Table, foreign: &ForeignKeyCommand) -> SchemaResult<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} ADD CONSTRAINT {} {}",
            self.wrap_table(table),
            self.wrap(&foreign.name),
            self.foreign_key_clause(table, foreign)?
        )])
    }

    /// Compiles foreign key removal.
    fn compile_drop_foreign(&self, table: &Table, name: &str) -> SchemaResult<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.wrap_table(table),
            self.wrap(name)
        )])
    }

    /// Query returning a row when `table` (already prefixed) exists.
    fn compile_table_exists(&self, _database: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            String::from(
                "SELECT * FROM information_schema.tables WHERE table_schema = current_schema() \
                 AND table_name = ? AND table_type = 'BASE TABLE'",
            ),
            vec![SqlValue::Text(String::from(table))],
        )
    }
}
