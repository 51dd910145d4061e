//! Active-record instances.

use std::fmt;
use std::marker::PhantomData;

use strata_db::{Connection, QueryExt, Row};
use strata_sql::{Builder, SqlValue, ToSqlValue, Values};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::guard;
use crate::model::Model;

/// One row of `M`'s table, with change tracking.
pub struct Record<M: Model> {
    attributes: Values,
    original: Values,
    changes: Values,
    exists: bool,
    was_recently_created: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Record<M> {
    /// A new, unsaved record with no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: Values::new(),
            original: Values::new(),
            changes: Values::new(),
            exists: false,
            was_recently_created: false,
            _model: PhantomData,
        }
    }

    /// A record for a row already in the table.
    #[must_use]
    pub fn hydrate(row: Row) -> Self {
        Self {
            original: row.clone(),
            attributes: row,
            changes: Values::new(),
            exists: true,
            was_recently_created: false,
            _model: PhantomData,
        }
    }

    /// A query builder scoped to the model's table.
    #[must_use]
    pub fn query(conn: &Connection) -> Builder {
        conn.table(M::TABLE)
    }

    /// Looks a record up by primary key.
    pub fn find(conn: &mut Connection, id: impl ToSqlValue) -> Result<Option<Self>> {
        let row = Self::query(conn).where_eq(M::KEY, id).first(conn)?;
        Ok(row.map(Self::hydrate))
    }

    /// Like [`find`](Self::find), failing with
    /// [`OrmError::ModelNotFound`] when no row matches.
    pub fn find_or_fail(conn: &mut Connection, id: impl ToSqlValue) -> Result<Self> {
        let id = id.to_sql_value();
        Self::find(conn, &id)?.ok_or_else(|| OrmError::ModelNotFound {
            model: M::model_name(),
            ids: vec![id],
        })
    }

    /// The first record matched by `query`.
    pub fn first_or_fail(conn: &mut Connection, query: &Builder) -> Result<Self> {
        query
            .first(conn)?
            .map(Self::hydrate)
            .ok_or_else(|| OrmError::ModelNotFound {
                model: M::model_name(),
                ids: Vec::new(),
            })
    }

    /// Every record matched by `query`.
    pub fn get(conn: &mut Connection, query: &Builder) -> Result<Vec<Self>> {
        Ok(query.get(conn)?.into_iter().map(Self::hydrate).collect())
    }

    /// Mass assigns `attributes` through the fillable/guarded rules.
    ///
    /// Nothing is assigned when any key is rejected; the error lists
    /// all of them.
    pub fn fill(&mut self, attributes: Values) -> Result<&mut Self> {
        let rejected: Vec<String> = attributes
            .keys()
            .filter(|key| !guard::is_fillable::<M>(key))
            .cloned()
            .collect();
        if !rejected.is_empty() {
            return Err(OrmError::MassAssignment {
                model: M::model_name(),
                keys: rejected,
            });
        }
        Ok(self.force_fill(attributes))
    }

    /// Assigns `attributes` bypassing the guard.
    pub fn force_fill(&mut self, attributes: Values) -> &mut Self {
        self.attributes.extend(attributes);
        self
    }

    /// Current value of `key`.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&SqlValue> {
        self.attributes.get(key)
    }

    /// Sets a single attribute.
    pub fn set_attribute(&mut self, key: &str, value: impl ToSqlValue) -> &mut Self {
        self.attributes.insert(key.to_string(), value.to_sql_value());
        self
    }

    /// All current attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Values {
        &self.attributes
    }

    /// Primary key value, if assigned.
    #[must_use]
    pub fn key(&self) -> Option<&SqlValue> {
        self.attributes.get(M::KEY).filter(|value| !value.is_null())
    }

    /// Whether the record is backed by a row.
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.exists
    }

    /// Whether the last save inserted the row.
    #[must_use]
    pub const fn was_recently_created(&self) -> bool {
        self.was_recently_created
    }

    /// Whether any attribute differs from the originals.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.attributes
            .iter()
            .any(|(key, value)| self.differs(key, value))
    }

    /// Whether `key` differs from its original value.
    #[must_use]
    pub fn is_dirty_key(&self, key: &str) -> bool {
        self.attributes
            .get(key)
            .is_some_and(|value| self.differs(key, value))
    }

    /// Attributes that differ from the originals.
    #[must_use]
    pub fn get_dirty(&self) -> Values {
        self.attributes
            .iter()
            .filter(|(key, value)| self.differs(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Columns written by the last update.
    #[must_use]
    pub const fn get_changes(&self) -> &Values {
        &self.changes
    }

    /// Value of `key` as last loaded or saved.
    #[must_use]
    pub fn get_original(&self, key: &str) -> Option<&SqlValue> {
        self.original.get(key)
    }

    /// Inserts or updates the row.
    pub fn save(&mut self, conn: &mut Connection) -> Result<()> {
        if self.exists {
            self.perform_update(conn)?;
        } else {
            self.perform_insert(conn)?;
        }
        self.sync_original();
        Ok(())
    }

    /// Deletes the row. Returns `false` for a record never saved.
    pub fn delete(&mut self, conn: &mut Connection) -> Result<bool> {
        if !self.exists {
            return Ok(false);
        }
        let key = self.key_for_query()?;
        Self::query(conn).where_eq(M::KEY, key).delete(conn)?;
        self.exists = false;
        debug!(model = M::model_name(), "Deleted record");
        Ok(true)
    }

    /// Reloads the attributes from the table.
    pub fn refresh(&mut self, conn: &mut Connection) -> Result<()> {
        if !self.exists {
            return Ok(());
        }
        let key = self.key_for_query()?;
        let row = Self::query(conn).where_eq(M::KEY, &key).first(conn)?;
        let row = row.ok_or_else(|| OrmError::ModelNotFound {
            model: M::model_name(),
            ids: vec![key],
        })?;
        self.attributes = row;
        self.changes.clear();
        self.sync_original();
        Ok(())
    }

    fn perform_update(&mut self, conn: &mut Connection) -> Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        if M::TIMESTAMPS && !self.is_dirty_key(M::UPDATED_AT) {
            self.set_attribute(M::UPDATED_AT, M::fresh_timestamp());
        }
        let dirty = self.get_dirty();
        let key = self.key_for_query()?;
        Self::query(conn).where_eq(M::KEY, key).update(conn, &dirty)?;
        debug!(model = M::model_name(), columns = dirty.len(), "Updated record");
        self.changes = dirty;
        Ok(())
    }

    fn perform_insert(&mut self, conn: &mut Connection) -> Result<()> {
        if M::TIMESTAMPS {
            let now = M::fresh_timestamp();
            if !self.is_dirty_key(M::UPDATED_AT) {
                self.set_attribute(M::UPDATED_AT, &now);
            }
            if !self.is_dirty_key(M::CREATED_AT) {
                self.set_attribute(M::CREATED_AT, now);
            }
        }
        let query = Self::query(conn);
        if M::INCREMENTING {
            if let Some(id) = query.insert_get_id(conn, &self.attributes, M::KEY)? {
                self.set_attribute(M::KEY, id);
            }
        } else {
            query.insert(conn, std::slice::from_ref(&self.attributes))?;
        }
        debug!(model = M::model_name(), "Inserted record");
        self.exists = true;
        self.was_recently_created = true;
        self.changes.clear();
        Ok(())
    }

    /// The key as last persisted, falling back to the current one.
    fn key_for_query(&self) -> Result<SqlValue> {
        self.original
            .get(M::KEY)
            .filter(|value| !value.is_null())
            .or_else(|| self.key())
            .cloned()
            .ok_or(OrmError::MissingKey {
                model: M::model_name(),
                key: M::KEY,
            })
    }

    fn sync_original(&mut self) {
        self.original.clone_from(&self.attributes);
    }

    fn differs(&self, key: &str, value: &SqlValue) -> bool {
        !self
            .original
            .get(key)
            .is_some_and(|original| is_equivalent(value, original))
    }
}

impl<M: Model> Default for Record<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            original: self.original.clone(),
            changes: self.changes.clone(),
            exists: self.exists,
            was_recently_created: self.was_recently_created,
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(M::model_name())
            .field("attributes", &self.attributes)
            .field("exists", &self.exists)
            .finish_non_exhaustive()
    }
}

/// Whether a current value matches its original.
///
/// Same-typed values compare exactly. Across types an integer matches only
/// its exact decimal text, a float holding exactly that integer, or a bool
/// stored as 0/1.
fn is_equivalent(current: &SqlValue, original: &SqlValue) -> bool {
    use SqlValue::{Bool, Float, Int, Text};

    match (current, original) {
        (Int(i), Text(s)) | (Text(s), Int(i)) => *s == i.to_string(),
        (Int(i), Float(f)) | (Float(f), Int(i)) => holds_integer(*f, *i),
        (Int(i), Bool(b)) | (Bool(b), Int(i)) => *i == i64::from(*b),
        _ => current == original,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
fn holds_integer(f: f64, i: i64) -> bool {
    f.fract() == 0.0 && f as i64 == i && i as f64 == f
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post;
    impl Model for Post {
        const TABLE: &'static str = "posts";
        const FILLABLE: &'static [&'static str] = &["title", "body"];
    }

    fn loaded() -> Record<Post> {
        Record::hydrate(strata_sql::values([
            ("id", SqlValue::Int(1)),
            ("title", SqlValue::Text("Hello".into())),
            ("views", SqlValue::Int(10)),
        ]))
    }

    #[test]
    fn test_hydrated_record_is_clean() {
        let record = loaded();
        assert!(record.exists());
        assert!(!record.is_dirty());
        assert_eq!(record.key(), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn test_numeric_equivalence_is_not_dirty() {
        let mut record = loaded();
        record.set_attribute("views", "10");
        assert!(!record.is_dirty());
        record.set_attribute("views", 10.0_f64);
        assert!(!record.is_dirty());
        record.set_attribute("views", true);
        assert!(record.is_dirty_key("views"));
        record.set_attribute("views", 11_i64);
        assert!(record.is_dirty_key("views"));
        assert_eq!(record.get_dirty().len(), 1);
    }

    #[test]
    fn test_differently_spelled_numbers_are_dirty() {
        let mut record = loaded();
        for spelling in ["010", "10.0", " 10"] {
            record.set_attribute("views", spelling);
            assert!(record.is_dirty_key("views"), "{spelling:?} should be dirty");
        }

        let mut record = Record::<Post>::hydrate(strata_sql::values([("title", "7")]));
        record.set_attribute("title", "007");
        assert!(record.is_dirty_key("title"));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let mut record =
            Record::<Post>::hydrate(strata_sql::values([("views", 9_007_199_254_740_993_i64)]));
        record.set_attribute("views", 9_007_199_254_740_992_i64);
        assert!(record.is_dirty_key("views"));
        record.set_attribute("views", 9_007_199_254_740_992.0_f64);
        assert!(record.is_dirty_key("views"));
    }

    #[test]
    fn test_null_is_never_equivalent() {
        let mut record = loaded();
        record.set_attribute("title", SqlValue::Null);
        assert!(record.is_dirty_key("title"));
        assert_eq!(record.get_original("title"), Some(&SqlValue::Text("Hello".into())));
    }

    #[test]
    fn test_fill_rejects_every_offending_key() {
        let mut record = Record::<Post>::new();
        let err = record
            .fill(strata_sql::values([
                ("title", "x"),
                ("is_admin", "1"),
                ("secret", "y"),
            ]))
            .unwrap_err();
        match err {
            OrmError::MassAssignment { model, keys } => {
                assert_eq!(model, "Post");
                assert_eq!(keys, vec!["is_admin".to_string(), "secret".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(record.get_attribute("title").is_none());
    }

    #[test]
    fn test_force_fill_skips_guard() {
        let mut record = Record::<Post>::new();
        record.force_fill(strata_sql::values([("is_admin", true)]));
        assert_eq!(record.get_attribute("is_admin"), Some(&SqlValue::Bool(true)));
        assert!(record.is_dirty());
    }
}
