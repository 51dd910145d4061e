//! MySQL grammar.

use crate::query::{Builder, Compiled, Upsert};
use crate::value::SqlValue;

use super::Grammar;

/// MySQL / MariaDB grammar: backtick quoting and `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl Grammar for MySqlGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> Option<char> {
        Some('`')
    }

    fn compile_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            // OFFSET is only valid after LIMIT.
            (None, Some(offset)) => format!(" LIMIT 18446744073709551615 OFFSET {offset}"),
            (limit, offset) => {
                let mut sql = String::new();
                if let Some(limit) = limit {
                    sql.push_str(&format!(" LIMIT {limit}"));
                }
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
                sql
            }
        }
    }

    fn compile_insert_empty(&self, table: &str) -> String {
        format!("INSERT INTO {table} () VALUES ()")
    }

    fn compile_delete(&self, query: &Builder) -> Compiled {
        let mut bindings = Vec::new();
        let wheres = self.compile_wheres(query.wheres(), &mut bindings);
        let mut sql = format!(
            "DELETE FROM {}{wheres}",
            self.wrap_table(query.prefix(), query.table_name())
        );
        sql.push_str(&self.compile_orders(query.orders()));
        if let Some(limit) = query.limit_value() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Compiled::new(sql, bindings)
    }

    fn compile_upsert_clause(&self, upsert: &Upsert, bindings: &mut Vec<SqlValue>) -> String {
        let sets = self.compile_upsert_assignments(upsert, bindings);
        format!("ON DUPLICATE KEY UPDATE {sets}")
    }

    fn compile_begin(&self) -> &'static str {
        "START TRANSACTION"
    }
}
