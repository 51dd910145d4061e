//! SQLite DDL.

use crate::value::SqlValue;

use super::super::column::{ColumnDefinition, ColumnType};
use super::super::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
use super::super::table::Table;
use super::super::SchemaResult;
use super::SchemaGrammar;

/// SQLite schema grammar.
///
/// Primary and foreign keys can only be declared while creating a table, so
/// they are folded into the CREATE TABLE statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSchemaGrammar;

impl SchemaGrammar for SqliteSchemaGrammar {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        let sql = match column.column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::Boolean => "INTEGER",
            ColumnType::String(_) | ColumnType::Char(_) | ColumnType::Uuid => "VARCHAR",
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText | ColumnType::Json => {
                "TEXT"
            }
            ColumnType::Decimal(..) => "NUMERIC",
            ColumnType::Float | ColumnType::Double => "REAL",
            ColumnType::Date => "DATE",
            ColumnType::DateTime(_) | ColumnType::Timestamp(_) => "DATETIME",
            ColumnType::Time => "TIME",
            ColumnType::Binary => "BLOB",
        };
        String::from(sql)
    }

    fn increment_modifier(&self) -> &'static str {
        " PRIMARY KEY AUTOINCREMENT"
    }

    fn compile_inline_constraints(&self, table: &Table) -> SchemaResult<Vec<String>> {
        let mut constraints = Vec::new();
        for command in table.commands() {
            match command {
                Command::Index(index @ IndexCommand {
                    kind: IndexKind::Primary,
                    ..
                }) => {
                    if !self.primary_is_inline(table, index)? {
                        constraints.push(format!("PRIMARY KEY ({})", self.columnize(&index.columns)));
                    }
                }
                Command::Foreign(foreign) => {
                    constraints.push(self.foreign_key_clause(table, foreign)?);
                }
                _ => {}
            }
        }
        Ok(constraints)
    }

    fn compile_add(&self, table: &Table) -> SchemaResult<Vec<String>> {
        table
            .added_columns()
            .map(|column| {
                self.column_definition(column).map(|definition| {
                    format!(
                        "ALTER TABLE {} ADD COLUMN {definition}",
                        self.wrap_table(table)
                    )
                })
            })
            .collect()
    }

    fn compile_drop_column(&self, table: &Table, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|c| {
                format!(
                    "ALTER TABLE {} DROP COLUMN {}",
                    self.wrap_table(table),
                    self.wrap(c)
                )
            })
            .collect()
    }

    fn compile_index(&self, table: &Table, index: &IndexCommand) -> SchemaResult<Vec<String>> {
        let unique = match index.kind {
            IndexKind::Primary if table.is_creating() => return Ok(Vec::new()),
            IndexKind::Primary => {
                return Err(self.unsupported("adding a primary key to an existing table"))
            }
            IndexKind::Unique => "UNIQUE ",
            IndexKind::Index => "",
        };
        Ok(vec![format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            self.wrap(&index.name),
            self.wrap_table(table),
            self.columnize(&index.columns)
        )])
    }

    fn compile_drop_index(
        &self,
        _table: &Table,
        index: &DropIndexCommand,
    ) -> SchemaResult<Vec<String>> {
        match index.kind {
            IndexKind::Primary => Err(self.unsupported("dropping a primary key")),
            IndexKind::Unique | IndexKind::Index => {
                Ok(vec![format!("DROP INDEX {}", self.wrap(&index.name))])
            }
        }
    }

    fn compile_foreign(&self, table: &Table, _foreign: &ForeignKeyCommand) -> SchemaResult<Vec<String>> {
        if table.is_creating() {
            Ok(Vec::new())
        } else {
            Err(self.unsupported("adding a foreign key to an existing table"))
        }
    }

    fn compile_drop_foreign(&self, _table: &Table, _name: &str) -> SchemaResult<Vec<String>> {
        Err(self.unsupported("dropping a foreign key"))
    }

    fn compile_table_exists(&self, _database: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            String::from("SELECT * FROM sqlite_master WHERE type = 'table' AND name = ?"),
            vec![SqlValue::Text(String::from(table))],
        )
    }
}
