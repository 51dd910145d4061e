//! Dialect-specific SQL compilers.
//!
//! [`Grammar`] carries the shared compilation logic as provided methods.
//! Dialects override only what differs: identifier quoting, boolean bindings,
//! the upsert conflict clause, empty inserts, id returning and LIMIT quirks.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

pub use generic::GenericGrammar;
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;

use std::slice;

use crate::error::{Error, Result};
use crate::query::{
    Aggregate, Builder, ColumnRef, Compiled, Condition, OrderBy, Upsert, Where,
};
use crate::value::{SqlValue, Values};

/// Splits `"expr as alias"` (case-insensitive) into its two halves.
pub(crate) fn split_alias(value: &str) -> Option<(&str, &str)> {
    let idx = value.to_ascii_lowercase().find(" as ")?;
    Some((value[..idx].trim(), value[idx + 4..].trim()))
}

/// Compiles builder requests to SQL for one dialect.
pub trait Grammar: Send + Sync {
    /// Dialect name.
    fn name(&self) -> &'static str;

    /// Identifier quote character, or `None` for bare identifiers.
    fn identifier_quote(&self) -> Option<char> {
        Some('"')
    }

    /// Quotes a single identifier segment.
    fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return String::from(value);
        }
        match self.identifier_quote() {
            Some(q) => {
                let escaped = value.replace(q, &format!("{q}{q}"));
                format!("{q}{escaped}{q}")
            }
            None => String::from(value),
        }
    }

    /// Quotes a possibly qualified or aliased identifier.
    fn wrap(&self, value: &str) -> String {
        if let Some((column, alias)) = split_alias(value) {
            return format!("{} AS {}", self.wrap(column), self.wrap_value(alias));
        }
        value
            .split('.')
            .map(|segment| self.wrap_value(segment))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a table name after applying the prefix.
    fn wrap_table(&self, prefix: &str, table: &str) -> String {
        if let Some((table, alias)) = split_alias(table) {
            return format!(
                "{} AS {}",
                self.wrap_table(prefix, table),
                self.wrap_value(alias)
            );
        }
        self.wrap(&format!("{prefix}{table}"))
    }

    /// Normalises a binding for this dialect.
    ///
    /// Booleans become integers unless the dialect has a native type.
    fn prepare_binding(&self, value: &SqlValue) -> SqlValue {
        match value {
            SqlValue::Bool(b) => SqlValue::Int(i64::from(*b)),
            other => other.clone(),
        }
    }

    /// Normalises a list of bindings.
    fn prepare_bindings(&self, values: &[SqlValue]) -> Vec<SqlValue> {
        values.iter().map(|v| self.prepare_binding(v)).collect()
    }

    /// Comma-separated placeholders, one per value.
    fn parameterize(&self, count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    /// Compiles the select list.
    fn compile_columns(&self, query: &Builder) -> String {
        if query.columns().is_empty() {
            return String::from("*");
        }
        query
            .columns()
            .iter()
            .map(|c| match c {
                ColumnRef::Column(name) => self.wrap(name),
                ColumnRef::Raw(expr) => expr.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Compiles the FROM target.
    fn compile_from(&self, query: &Builder) -> String {
        let table = self.wrap_table(query.prefix(), query.table_name());
        match query.alias() {
            Some(alias) => format!("{table} AS {}", self.wrap_value(alias)),
            None => table,
        }
    }

    /// Compiles one condition, pushing its bindings.
    fn compile_condition(&self, condition: &Condition, bindings: &mut Vec<SqlValue>) -> String {
        match condition {
            Condition::Basic { column, op, value } => {
                bindings.push(self.prepare_binding(value));
                format!("{} {} ?", self.wrap(column), op.as_sql())
            }
            Condition::Null(column) => format!("{} IS NULL", self.wrap(column)),
            Condition::NotNull(column) => format!("{} IS NOT NULL", self.wrap(column)),
            Condition::In { values, .. } if values.is_empty() => String::from("0 = 1"),
            Condition::NotIn { values, .. } if values.is_empty() => String::from("1 = 1"),
            Condition::In { column, values } | Condition::NotIn { column, values } => {
                bindings.extend(values.iter().map(|v| self.prepare_binding(v)));
                let keyword = if matches!(condition, Condition::In { .. }) {
                    "IN"
                } else {
                    "NOT IN"
                };
                format!(
                    "{} {keyword} ({})",
                    self.wrap(column),
                    self.parameterize(values.len())
                )
            }
            Condition::Between {
                column,
                low,
                high,
                negated,
            } => {
                bindings.push(self.prepare_binding(low));
                bindings.push(self.prepare_binding(high));
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {keyword} ? AND ?", self.wrap(column))
            }
            Condition::Raw {
                sql,
                bindings: raw_bindings,
            } => {
                bindings.extend(raw_bindings.iter().map(|v| self.prepare_binding(v)));
                sql.clone()
            }
            Condition::Nested(wheres) => {
                format!("({})", self.compile_conditions(wheres, bindings))
            }
        }
    }

    /// Joins conditions by their connectors; the first connector is dropped.
    fn compile_conditions(&self, wheres: &[Where], bindings: &mut Vec<SqlValue>) -> String {
        let mut sql = String::new();
        for (i, w) in wheres.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(w.connector.as_sql());
                sql.push(' ');
            }
            sql.push_str(&self.compile_condition(&w.condition, bindings));
        }
        sql
    }

    /// Compiles the WHERE clause, with a leading space, or nothing.
    fn compile_wheres(&self, wheres: &[Where], bindings: &mut Vec<SqlValue>) -> String {
        if wheres.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.compile_conditions(wheres, bindings))
    }

    /// Compiles the ORDER BY clause, with a leading space, or nothing.
    fn compile_orders(&self, orders: &[OrderBy]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let terms: Vec<String> = orders
            .iter()
            .map(|o| format!("{} {}", self.wrap(&o.column), o.direction.as_sql()))
            .collect();
        format!(" ORDER BY {}", terms.join(", "))
    }

    /// Compiles LIMIT/OFFSET, with a leading space, or nothing.
    fn compile_limit(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    /// Compiles a SELECT.
    fn compile_select(&self, query: &Builder) -> Compiled {
        let mut bindings = Vec::new();
        let mut sql = String::from("SELECT ");
        if query.is_distinct() {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.compile_columns(query));
        sql.push_str(" FROM ");
        sql.push_str(&self.compile_from(query));
        sql.push_str(&self.compile_wheres(query.wheres(), &mut bindings));
        sql.push_str(&self.compile_orders(query.orders()));
        sql.push_str(&self.compile_limit(query.limit_value(), query.offset_value()));
        Compiled::new(sql, bindings)
    }

    /// Wraps the current select and reads one `aggregate` column.
    fn compile_aggregate(&self, query: &Builder, aggregate: &Aggregate) -> Compiled {
        let inner = self.compile_select(query);
        let columns = if aggregate.columns.is_empty() {
            String::from("*")
        } else {
            aggregate
                .columns
                .iter()
                .map(|c| self.wrap(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let sql = format!(
            "SELECT {}({columns}) AS {} FROM ({}) AS {}",
            aggregate.function.as_sql(),
            self.wrap_value("aggregate"),
            inner.sql,
            self.wrap_value("aggregate_table"),
        );
        Compiled::new(sql, inner.bindings)
    }

    /// Compiles `SELECT EXISTS(...)`, read back through the `aggregate` column.
    fn compile_exists(&self, query: &Builder) -> Compiled {
        let inner = self.compile_select(query);
        let sql = format!(
            "SELECT EXISTS({}) AS {}",
            inner.sql,
            self.wrap("aggregate")
        );
        Compiled::new(sql, inner.bindings)
    }

    /// Statement used when every insert row is empty.
    fn compile_insert_empty(&self, table: &str) -> String {
        format!("INSERT INTO {table} DEFAULT VALUES")
    }

    /// Compiles a single- or multi-row INSERT.
    ///
    /// Columns come from the first row; later rows must carry the same keys.
    fn compile_insert(&self, query: &Builder, rows: &[Values]) -> Result<Compiled> {
        let table = self.wrap_table(query.prefix(), query.table_name());
        if rows.iter().all(Values::is_empty) {
            return Ok(Compiled::new(self.compile_insert_empty(&table), Vec::new()));
        }
        let columns: Vec<&String> = rows[0].keys().collect();
        let mut bindings = Vec::with_capacity(columns.len() * rows.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::InvalidArgument(format!(
                    "insert row {i} has {} columns, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            for column in &columns {
                let value = row.get(*column).ok_or_else(|| {
                    Error::InvalidArgument(format!("insert row {i} is missing column `{column}`"))
                })?;
                bindings.push(self.prepare_binding(value));
            }
            tuples.push(format!("({})", self.parameterize(columns.len())));
        }
        let column_list = columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({column_list}) VALUES {}",
            tuples.join(", ")
        );
        Ok(Compiled::new(sql, bindings))
    }

    /// Whether [`Grammar::compile_insert_get_id`] yields a row holding the key.
    fn returns_inserted_id(&self) -> bool {
        false
    }

    /// Compiles an INSERT whose generated key the caller reads back.
    fn compile_insert_get_id(&self, query: &Builder, values: &Values, _key: &str) -> Result<Compiled> {
        self.compile_insert(query, slice::from_ref(values))
    }

    /// Compiles an UPDATE.
    fn compile_update(&self, query: &Builder, values: &Values) -> Result<Compiled> {
        if values.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "update requires at least one value",
            )));
        }
        let mut bindings = Vec::with_capacity(values.len());
        let sets: Vec<String> = values
            .iter()
            .map(|(column, value)| {
                bindings.push(self.prepare_binding(value));
                format!("{} = ?", self.wrap(column))
            })
            .collect();
        let wheres = self.compile_wheres(query.wheres(), &mut bindings);
        let sql = format!(
            "UPDATE {} SET {}{wheres}",
            self.compile_from(query),
            sets.join(", ")
        );
        Ok(Compiled::new(sql, bindings))
    }

    /// Compiles `UPDATE ... SET column = column + ?`.
    fn compile_increment(&self, query: &Builder, column: &str, amount: i64) -> Compiled {
        let wrapped = self.wrap(column);
        let mut bindings = vec![SqlValue::Int(amount)];
        let wheres = self.compile_wheres(query.wheres(), &mut bindings);
        let sql = format!(
            "UPDATE {} SET {wrapped} = {wrapped} + ?{wheres}",
            self.compile_from(query)
        );
        Compiled::new(sql, bindings)
    }

    /// Compiles a DELETE.
    fn compile_delete(&self, query: &Builder) -> Compiled {
        let mut bindings = Vec::new();
        let wheres = self.compile_wheres(query.wheres(), &mut bindings);
        let sql = format!(
            "DELETE FROM {}{wheres}",
            self.wrap_table(query.prefix(), query.table_name())
        );
        Compiled::new(sql, bindings)
    }

    /// Compiles the `column = ?` list of an upsert's update half.
    fn compile_upsert_assignments(&self, upsert: &Upsert, bindings: &mut Vec<SqlValue>) -> String {
        upsert
            .update_values()
            .iter()
            .map(|(column, value)| {
                bindings.push(self.prepare_binding(value));
                format!("{} = ?", self.wrap(column))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Compiles the conflict clause appended to an upsert's INSERT.
    fn compile_upsert_clause(&self, upsert: &Upsert, bindings: &mut Vec<SqlValue>) -> String {
        let sets = self.compile_upsert_assignments(upsert, bindings);
        format!(
            "ON CONFLICT ({}) DO UPDATE SET {sets}",
            self.wrap(upsert.unique_by())
        )
    }

    /// Compiles an upsert: insert bindings first, then update bindings.
    fn compile_upsert(&self, query: &Builder, upsert: &Upsert) -> Result<Compiled> {
        let insert = self.compile_insert(query, slice::from_ref(upsert.insert_values()))?;
        let mut bindings = insert.bindings;
        let clause = self.compile_upsert_clause(upsert, &mut bindings);
        Ok(Compiled::new(format!("{} {clause}", insert.sql), bindings))
    }

    /// Statement opening an outermost transaction.
    fn compile_begin(&self) -> &'static str {
        "BEGIN"
    }

    /// Whether nested transactions can use savepoints.
    fn supports_savepoints(&self) -> bool {
        true
    }

    /// Creates a savepoint.
    fn compile_savepoint(&self, name: &str) -> String {
        format!("SAVEPOINT {name}")
    }

    /// Releases a savepoint.
    fn compile_savepoint_release(&self, name: &str) -> String {
        format!("RELEASE SAVEPOINT {name}")
    }

    /// Rolls back to a savepoint.
    fn compile_savepoint_rollback(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {name}")
    }
}
