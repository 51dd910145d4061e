//! Model metadata.

use chrono::Utc;
use strata_sql::SqlValue;

/// Table-level settings of an active-record model.
///
/// Implemented on a marker type; rows are held by
/// [`Record`](crate::Record).
///
/// ```rust
/// use strata_orm::Model;
///
/// struct Post;
///
/// impl Model for Post {
///     const TABLE: &'static str = "posts";
///     const FILLABLE: &'static [&'static str] = &["title", "body"];
/// }
///
/// assert_eq!(Post::KEY, "id");
/// assert_eq!(Post::model_name(), "Post");
/// ```
pub trait Model: Sized + 'static {
    /// Table name, before the connection prefix.
    const TABLE: &'static str;

    /// Primary key column.
    const KEY: &'static str = "id";

    /// Whether the key is generated by the database.
    const INCREMENTING: bool = true;

    /// Whether `created_at`/`updated_at` are maintained.
    const TIMESTAMPS: bool = true;

    /// Creation timestamp column.
    const CREATED_AT: &'static str = "created_at";

    /// Update timestamp column.
    const UPDATED_AT: &'static str = "updated_at";

    /// Keys allowed in mass assignment. Empty means no whitelist.
    const FILLABLE: &'static [&'static str] = &[];

    /// Keys refused in mass assignment. `["*"]` refuses everything not
    /// whitelisted.
    const GUARDED: &'static [&'static str] = &["*"];

    /// Short type name used in errors.
    #[must_use]
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Value written to the timestamp columns.
    #[must_use]
    fn fresh_timestamp() -> SqlValue {
        SqlValue::Text(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
