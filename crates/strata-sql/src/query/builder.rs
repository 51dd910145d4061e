//! Fluent query builder.
//!
//! A [`Builder`] only describes a request. Compiling it needs a [`Grammar`],
//! and running it needs a connection.
//!
//! ```rust
//! use strata_sql::grammar::GenericGrammar;
//! use strata_sql::query::{Builder, Op};
//!
//! let compiled = Builder::table("posts")
//!     .where_("status", Op::Eq, "published")
//!     .or_where("featured", Op::Eq, 1)
//!     .to_sql(&GenericGrammar);
//!
//! assert_eq!(compiled.sql, "SELECT * FROM posts WHERE status = ? OR featured = ?");
//! assert_eq!(compiled.bindings.len(), 2);
//! ```

use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::value::{SqlValue, ToSqlValue, Values};

use super::compiled::Compiled;
use super::condition::{Condition, Connector, Op, Where};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column reference.
    pub column: String,
    /// Direction.
    pub direction: OrderDirection,
}

/// An entry of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Identifier, quoted by the grammar. May be `table.column` or `column as alias`.
    Column(String),
    /// Emitted verbatim.
    Raw(String),
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `COUNT`
    Count,
    /// `MIN`
    Min,
    /// `MAX`
    Max,
    /// `SUM`
    Sum,
    /// `AVG`
    Avg,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// An aggregate over the current select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Function to apply.
    pub function: AggregateFunction,
    /// Columns passed to the function; empty means `*`.
    pub columns: Vec<String>,
}

impl Aggregate {
    /// `COUNT(*)`
    #[must_use]
    pub const fn count() -> Self {
        Self {
            function: AggregateFunction::Count,
            columns: Vec::new(),
        }
    }

    /// Aggregate over a single column.
    #[must_use]
    pub fn of(function: AggregateFunction, column: &str) -> Self {
        Self {
            function,
            columns: vec![String::from(column)],
        }
    }
}

/// A validated insert-or-update request.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    unique_by: String,
    insert: Values,
    update: Values,
}

impl Upsert {
    /// Validates and builds an upsert.
    ///
    /// `unique_by` must be a key of `insert`, and neither map may be empty.
    pub fn new(unique_by: &str, insert: Values, update: Values) -> Result<Self> {
        if insert.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "upsert requires at least one insert value",
            )));
        }
        if update.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "upsert requires at least one update value",
            )));
        }
        if !insert.contains_key(unique_by) {
            return Err(Error::InvalidArgument(format!(
                "upsert unique column `{unique_by}` is not among the insert values"
            )));
        }
        Ok(Self {
            unique_by: String::from(unique_by),
            insert,
            update,
        })
    }

    /// The conflict target column.
    #[must_use]
    pub fn unique_by(&self) -> &str {
        &self.unique_by
    }

    /// Values inserted when no row conflicts.
    #[must_use]
    pub const fn insert_values(&self) -> &Values {
        &self.insert
    }

    /// Values written to the conflicting row.
    #[must_use]
    pub const fn update_values(&self) -> &Values {
        &self.update
    }
}

/// A query request against one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Builder {
    prefix: String,
    table: String,
    alias: Option<String>,
    columns: Vec<ColumnRef>,
    distinct: bool,
    wheres: Vec<Where>,
    orders: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Builder {
    /// Starts a request against `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            ..Self::default()
        }
    }

    /// Sets the table-name prefix applied when the table is compiled.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = String::from(prefix);
        self
    }

    /// Switches the target table and gives it an alias.
    #[must_use]
    pub fn from_as(mut self, table: &str, alias: &str) -> Self {
        self.table = String::from(table);
        self.alias = Some(String::from(alias));
        self
    }

    /// Replaces the select list.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns
            .iter()
            .map(|c| ColumnRef::Column(String::from(*c)))
            .collect();
        self
    }

    /// Appends to the select list.
    #[must_use]
    pub fn add_select(mut self, column: &str) -> Self {
        self.columns.push(ColumnRef::Column(String::from(column)));
        self
    }

    /// Appends a raw expression to the select list.
    #[must_use]
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.columns.push(ColumnRef::Raw(String::from(expression)));
        self
    }

    /// Emits `SELECT DISTINCT`.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn push_where(mut self, connector: Connector, condition: Condition) -> Self {
        self.wheres.push(Where {
            connector,
            condition,
        });
        self
    }

    fn basic(column: &str, op: Op, value: SqlValue) -> Condition {
        let column = String::from(column);
        match (op, value) {
            (Op::Eq, SqlValue::Null) => Condition::Null(column),
            (Op::NotEq, SqlValue::Null) => Condition::NotNull(column),
            (op, value) => Condition::Basic { column, op, value },
        }
    }

    /// Adds `column op ?` joined with `AND`.
    ///
    /// Comparing against NULL with `=` or `<>` becomes `IS [NOT] NULL`.
    #[must_use]
    pub fn where_(self, column: &str, op: Op, value: impl ToSqlValue) -> Self {
        let condition = Self::basic(column, op, value.to_sql_value());
        self.push_where(Connector::And, condition)
    }

    /// Shorthand for `where_(column, Op::Eq, value)`.
    #[must_use]
    pub fn where_eq(self, column: &str, value: impl ToSqlValue) -> Self {
        self.where_(column, Op::Eq, value)
    }

    /// Adds `column op ?` joined with `OR`.
    #[must_use]
    pub fn or_where(self, column: &str, op: Op, value: impl ToSqlValue) -> Self {
        let condition = Self::basic(column, op, value.to_sql_value());
        self.push_where(Connector::Or, condition)
    }

    /// Adds `column IN (...)`.
    #[must_use]
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.push_where(
            Connector::And,
            Condition::In {
                column: String::from(column),
                values,
            },
        )
    }

    /// Adds `column IN (...)` joined with `OR`.
    #[must_use]
    pub fn or_where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.push_where(
            Connector::Or,
            Condition::In {
                column: String::from(column),
                values,
            },
        )
    }

    /// Adds `column NOT IN (...)`.
    #[must_use]
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        self.push_where(
            Connector::And,
            Condition::NotIn {
                column: String::from(column),
                values,
            },
        )
    }

    /// Adds `column IS NULL`.
    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(Connector::And, Condition::Null(String::from(column)))
    }

    /// Adds `column IS NULL` joined with `OR`.
    #[must_use]
    pub fn or_where_null(self, column: &str) -> Self {
        self.push_where(Connector::Or, Condition::Null(String::from(column)))
    }

    /// Adds `column IS NOT NULL`.
    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(Connector::And, Condition::NotNull(String::from(column)))
    }

    /// Adds `column BETWEEN ? AND ?`.
    #[must_use]
    pub fn where_between(self, column: &str, low: impl ToSqlValue, high: impl ToSqlValue) -> Self {
        self.push_where(
            Connector::And,
            Condition::Between {
                column: String::from(column),
                low: low.to_sql_value(),
                high: high.to_sql_value(),
                negated: false,
            },
        )
    }

    /// Adds `column NOT BETWEEN ? AND ?`.
    #[must_use]
    pub fn where_not_between(
        self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> Self {
        self.push_where(
            Connector::And,
            Condition::Between {
                column: String::from(column),
                low: low.to_sql_value(),
                high: high.to_sql_value(),
                negated: true,
            },
        )
    }

    /// Adds a raw fragment with its bindings.
    #[must_use]
    pub fn where_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.push_where(
            Connector::And,
            Condition::Raw {
                sql: String::from(sql),
                bindings,
            },
        )
    }

    /// Adds a raw fragment joined with `OR`.
    #[must_use]
    pub fn or_where_raw(self, sql: &str, bindings: Vec<SqlValue>) -> Self {
        self.push_where(
            Connector::Or,
            Condition::Raw {
                sql: String::from(sql),
                bindings,
            },
        )
    }

    fn nested(self, connector: Connector, build: impl FnOnce(Self) -> Self) -> Self {
        let group = build(Self::table(&self.table)).wheres;
        if group.is_empty() {
            return self;
        }
        self.push_where(connector, Condition::Nested(group))
    }

    /// Adds a parenthesised group built by `build`.
    #[must_use]
    pub fn where_nested(self, build: impl FnOnce(Self) -> Self) -> Self {
        self.nested(Connector::And, build)
    }

    /// Adds a parenthesised group joined with `OR`.
    #[must_use]
    pub fn or_where_nested(self, build: impl FnOnce(Self) -> Self) -> Self {
        self.nested(Connector::Or, build)
    }

    /// Appends an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.orders.push(OrderBy {
            column: String::from(column),
            direction,
        });
        self
    }

    /// Appends a descending ORDER BY term.
    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Newest first by `column`.
    #[must_use]
    pub fn latest(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Oldest first by `column`.
    #[must_use]
    pub fn oldest(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Sets the row limit.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Alias for [`Builder::limit`].
    #[must_use]
    pub const fn take(self, limit: u64) -> Self {
        self.limit(limit)
    }

    /// Sets the row offset.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Alias for [`Builder::offset`].
    #[must_use]
    pub const fn skip(self, offset: u64) -> Self {
        self.offset(offset)
    }

    /// Target table, without prefix.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Table-name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Table alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Select list; empty means `*`.
    #[must_use]
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    /// Whether `DISTINCT` is requested.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Conditions in insertion order.
    #[must_use]
    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    /// ORDER BY terms in insertion order.
    #[must_use]
    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    /// Row limit.
    #[must_use]
    pub const fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Row offset.
    #[must_use]
    pub const fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Compiles the SELECT.
    #[must_use]
    pub fn to_sql(&self, grammar: &dyn Grammar) -> Compiled {
        grammar.compile_select(self)
    }

    /// Compiles a (multi-row) INSERT into the target table.
    pub fn to_insert_sql(&self, grammar: &dyn Grammar, rows: &[Values]) -> Result<Compiled> {
        grammar.compile_insert(self, rows)
    }

    /// Compiles an INSERT that yields the generated key.
    pub fn to_insert_get_id_sql(
        &self,
        grammar: &dyn Grammar,
        values: &Values,
        key: &str,
    ) -> Result<Compiled> {
        grammar.compile_insert_get_id(self, values, key)
    }

    /// Compiles an UPDATE restricted by the current conditions.
    pub fn to_update_sql(&self, grammar: &dyn Grammar, values: &Values) -> Result<Compiled> {
        grammar.compile_update(self, values)
    }

    /// Compiles `column = column + amount`.
    #[must_use]
    pub fn to_increment_sql(&self, grammar: &dyn Grammar, column: &str, amount: i64) -> Compiled {
        grammar.compile_increment(self, column, amount)
    }

    /// Compiles a DELETE restricted by the current conditions.
    #[must_use]
    pub fn to_delete_sql(&self, grammar: &dyn Grammar) -> Compiled {
        grammar.compile_delete(self)
    }

    /// Compiles an upsert.
    pub fn to_upsert_sql(&self, grammar: &dyn Grammar, upsert: &Upsert) -> Result<Compiled> {
        grammar.compile_upsert(self, upsert)
    }

    /// Compiles an aggregate over the current select.
    #[must_use]
    pub fn to_aggregate_sql(&self, grammar: &dyn Grammar, aggregate: &Aggregate) -> Compiled {
        grammar.compile_aggregate(self, aggregate)
    }

    /// Compiles an existence check over the current select.
    #[must_use]
    pub fn to_exists_sql(&self, grammar: &dyn Grammar) -> Compiled {
        grammar.compile_exists(self)
    }
}
