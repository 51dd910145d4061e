//! PostgreSQL DDL.

use super::super::column::{ColumnDefinition, ColumnType};
use super::super::table::Table;
use super::super::SchemaResult;
use super::SchemaGrammar;

/// PostgreSQL schema grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSchemaGrammar;

impl PostgresSchemaGrammar {
    fn base_type(column_type: ColumnType) -> String {
        match column_type {
            ColumnType::TinyInteger | ColumnType::SmallInteger => String::from("SMALLINT"),
            ColumnType::Integer => String::from("INTEGER"),
            ColumnType::BigInteger => String::from("BIGINT"),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Text | ColumnType::MediumText | ColumnType::LongText => {
                String::from("TEXT")
            }
            ColumnType::Boolean => String::from("BOOLEAN"),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Float => String::from("REAL"),
            ColumnType::Double => String::from("DOUBLE PRECISION"),
            ColumnType::Date => String::from("DATE"),
            ColumnType::DateTime(None) | ColumnType::Timestamp(None) => {
                String::from("TIMESTAMP(0) WITHOUT TIME ZONE")
            }
            ColumnType::DateTime(Some(p)) | ColumnType::Timestamp(Some(p)) => {
                format!("TIMESTAMP({p}) WITHOUT TIME ZONE")
            }
            ColumnType::Time => String::from("TIME(0) WITHOUT TIME ZONE"),
            ColumnType::Json => String::from("JSONB"),
            ColumnType::Binary => String::from("BYTEA"),
            ColumnType::Uuid => String::from("UUID"),
        }
    }
}

impl SchemaGrammar for PostgresSchemaGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        if column.auto_increment {
            match column.column_type {
                ColumnType::TinyInteger | ColumnType::SmallInteger => {
                    return String::from("SMALLSERIAL")
                }
                ColumnType::Integer => return String::from("SERIAL"),
                ColumnType::BigInteger => return String::from("BIGSERIAL"),
                _ => {}
            }
        }
        Self::base_type(column.column_type)
    }

    fn check_column(&self, column: &ColumnDefinition) -> SchemaResult<()> {
        match &column.generated {
            Some(generated) if !generated.stored => {
                Err(self.unsupported("virtual generated columns"))
            }
            _ => Ok(()),
        }
    }

    fn render_bool(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn compile_comments<'a>(
        &self,
        table: &Table,
        columns: &mut dyn Iterator<Item = &'a ColumnDefinition>,
    ) -> Vec<String> {
        columns
            .filter_map(|column| {
                column.comment.as_ref().map(|comment| {
                    format!(
                        "COMMENT ON COLUMN {}.{} IS '{}'",
                        self.wrap_table(table),
                        self.wrap(&column.name),
                        comment.replace('\'', "''")
                    )
                })
            })
            .collect()
    }

    fn compile_change(&self, table: &Table) -> SchemaResult<Vec<String>> {
        let mut clauses = Vec::new();
        for column in table.changed_columns() {
            self.check_column(column)?;
            let name = self.wrap(&column.name);
            clauses.push(format!(
                "ALTER COLUMN {name} TYPE {}",
                Self::base_type(column.column_type)
            ));
            clauses.push(if column.nullable {
                format!("ALTER COLUMN {name} DROP NOT NULL")
            } else {
                format!("ALTER COLUMN {name} SET NOT NULL")
            });
            clauses.push(match &column.default {
                Some(default) => format!(
                    "ALTER COLUMN {name} SET DEFAULT {}",
                    self.render_default(default)
                ),
                None => format!("ALTER COLUMN {name} DROP DEFAULT"),
            });
        }
        let mut statements = vec![format!(
            "ALTER TABLE {} {}",
            self.wrap_table(table),
            clauses.join(", ")
        )];
        statements.extend(self.compile_comments(table, &mut table.changed_columns()));
        Ok(statements)
    }
}
