//! Running builder requests on a connection.

use strata_sql::query::{Aggregate, AggregateFunction, Builder, Upsert};
use strata_sql::{SqlValue, ToSqlValue, Values};

use crate::connection::Connection;
use crate::driver::Row;
use crate::error::Result;

/// Column the aggregate wrapper reads back.
const AGGREGATE_COLUMN: &str = "aggregate";

/// Executes a [`Builder`] on a [`Connection`].
///
/// The builder only describes the request; each call here compiles it with
/// the connection's grammar and runs it.
pub trait QueryExt {
    /// Runs the SELECT and returns every row.
    fn get(&self, conn: &mut Connection) -> Result<Vec<Row>>;

    /// Runs the SELECT with `LIMIT 1`.
    fn first(&self, conn: &mut Connection) -> Result<Option<Row>>;

    /// Finds a row by its `id` column.
    fn find(&self, conn: &mut Connection, id: impl ToSqlValue) -> Result<Option<Row>>;

    /// Reads one column of the first row.
    fn value(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>>;

    /// Reads one column of every row.
    fn pluck(&self, conn: &mut Connection, column: &str) -> Result<Vec<SqlValue>>;

    /// `COUNT(*)` over the current select.
    fn count(&self, conn: &mut Connection) -> Result<i64>;

    /// Smallest value of `column`, `None` when there are no rows.
    fn min(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>>;

    /// Largest value of `column`, `None` when there are no rows.
    fn max(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>>;

    /// Sum of `column`; zero when there are no rows.
    fn sum(&self, conn: &mut Connection, column: &str) -> Result<SqlValue>;

    /// Average of `column`.
    fn avg(&self, conn: &mut Connection, column: &str) -> Result<Option<f64>>;

    /// Whether the select matches any row.
    fn exists(&self, conn: &mut Connection) -> Result<bool>;

    /// Inserts zero or more rows in one statement.
    fn insert(&self, conn: &mut Connection, rows: &[Values]) -> Result<()>;

    /// Inserts one row and returns its generated key.
    fn insert_get_id(&self, conn: &mut Connection, values: &Values, key: &str) -> Result<Option<i64>>;

    /// Updates matching rows.
    fn update(&self, conn: &mut Connection, values: &Values) -> Result<u64>;

    /// Deletes matching rows.
    fn delete(&self, conn: &mut Connection) -> Result<u64>;

    /// Inserts a row, or updates it when `unique_by` conflicts.
    fn upsert(&self, conn: &mut Connection, unique_by: &str, insert: Values, update: Values) -> Result<u64>;

    /// Adds `amount` to `column` on matching rows.
    fn increment(&self, conn: &mut Connection, column: &str, amount: i64) -> Result<u64>;

    /// Subtracts `amount` from `column` on matching rows.
    fn decrement(&self, conn: &mut Connection, column: &str, amount: i64) -> Result<u64>;
}

impl QueryExt for Builder {
    fn get(&self, conn: &mut Connection) -> Result<Vec<Row>> {
        let compiled = self.to_sql(conn.grammar());
        conn.select(&compiled.sql, &compiled.bindings)
    }

    fn first(&self, conn: &mut Connection) -> Result<Option<Row>> {
        Ok(self.clone().take(1).get(conn)?.into_iter().next())
    }

    fn find(&self, conn: &mut Connection, id: impl ToSqlValue) -> Result<Option<Row>> {
        self.clone().where_eq("id", id).first(conn)
    }

    fn value(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>> {
        let row = self.clone().select(&[column]).first(conn)?;
        Ok(row.and_then(|row| row.into_iter().next().map(|(_, value)| value)))
    }

    fn pluck(&self, conn: &mut Connection, column: &str) -> Result<Vec<SqlValue>> {
        let rows = self.clone().select(&[column]).get(conn)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().map(|(_, value)| value))
            .collect())
    }

    fn count(&self, conn: &mut Connection) -> Result<i64> {
        let value = aggregate(self, conn, &Aggregate::count())?;
        Ok(value.as_i64().unwrap_or(0))
    }

    fn min(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>> {
        let value = aggregate(self, conn, &Aggregate::of(AggregateFunction::Min, column))?;
        Ok((!value.is_null()).then_some(value))
    }

    fn max(&self, conn: &mut Connection, column: &str) -> Result<Option<SqlValue>> {
        let value = aggregate(self, conn, &Aggregate::of(AggregateFunction::Max, column))?;
        Ok((!value.is_null()).then_some(value))
    }

    fn sum(&self, conn: &mut Connection, column: &str) -> Result<SqlValue> {
        let value = aggregate(self, conn, &Aggregate::of(AggregateFunction::Sum, column))?;
        Ok(if value.is_null() { SqlValue::Int(0) } else { value })
    }

    fn avg(&self, conn: &mut Connection, column: &str) -> Result<Option<f64>> {
        let value = aggregate(self, conn, &Aggregate::of(AggregateFunction::Avg, column))?;
        Ok(value.as_f64())
    }

    fn exists(&self, conn: &mut Connection) -> Result<bool> {
        let compiled = self.to_exists_sql(conn.grammar());
        let row = conn.select_one(&compiled.sql, &compiled.bindings)?;
        Ok(row
            .and_then(|row| row.get("aggregate").and_then(SqlValue::as_i64))
            .is_some_and(|flag| flag != 0))
    }

    fn insert(&self, conn: &mut Connection, rows: &[Values]) -> Result<()> {
        let compiled = self.to_insert_sql(conn.grammar(), rows)?;
        conn.insert(&compiled.sql, &compiled.bindings)
    }

    fn insert_get_id(&self, conn: &mut Connection, values: &Values, key: &str) -> Result<Option<i64>> {
        let compiled = self.to_insert_get_id_sql(conn.grammar(), values, key)?;
        conn.insert_get_id(&compiled.sql, &compiled.bindings, key)
    }

    fn update(&self, conn: &mut Connection, values: &Values) -> Result<u64> {
        let compiled = self.to_update_sql(conn.grammar(), values)?;
        conn.update(&compiled.sql, &compiled.bindings)
    }

    fn delete(&self, conn: &mut Connection) -> Result<u64> {
        let compiled = self.to_delete_sql(conn.grammar());
        conn.delete(&compiled.sql, &compiled.bindings)
    }

    fn upsert(&self, conn: &mut Connection, unique_by: &str, insert: Values, update: Values) -> Result<u64> {
        let upsert = Upsert::new(unique_by, insert, update)?;
        let compiled = self.to_upsert_sql(conn.grammar(), &upsert)?;
        conn.affecting_statement(&compiled.sql, &compiled.bindings)
    }

    fn increment(&self, conn: &mut Connection, column: &str, amount: i64) -> Result<u64> {
        let compiled = self.to_increment_sql(conn.grammar(), column, amount);
        conn.update(&compiled.sql, &compiled.bindings)
    }

    fn decrement(&self, conn: &mut Connection, column: &str, amount: i64) -> Result<u64> {
        self.increment(conn, column, -amount)
    }
}

fn aggregate(query: &Builder, conn: &mut Connection, aggregate: &Aggregate) -> Result<SqlValue> {
    let compiled = query.to_aggregate_sql(conn.grammar(), aggregate);
    let row = conn.select_one(&compiled.sql, &compiled.bindings)?;
    Ok(row
        .and_then(|mut row| row.shift_remove(AGGREGATE_COLUMN))
        .unwrap_or(SqlValue::Null))
}
