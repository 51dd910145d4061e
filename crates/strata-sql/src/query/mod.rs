//! The fluent query builder and its request model.

mod builder;
mod compiled;
mod condition;

pub use builder::{Aggregate, AggregateFunction, Builder, ColumnRef, OrderBy, OrderDirection, Upsert};
pub use compiled::Compiled;
pub use condition::{Condition, Connector, Op, Where};
