//! ANSI grammar with bare identifiers.

use super::Grammar;

/// Grammar emitting portable SQL without identifier quoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericGrammar;

impl Grammar for GenericGrammar {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn identifier_quote(&self) -> Option<char> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Builder, Op, OrderDirection};
    use crate::value::{values, SqlValue};

    #[test]
    fn test_or_where_in_insertion_order() {
        let compiled = Builder::table("posts")
            .where_("status", Op::Eq, "published")
            .or_where("featured", Op::Eq, 1)
            .to_sql(&GenericGrammar);
        assert_eq!(
            compiled.sql,
            "SELECT * FROM posts WHERE status = ? OR featured = ?"
        );
        assert_eq!(
            compiled.bindings,
            vec![SqlValue::Text(String::from("published")), SqlValue::Int(1)]
        );
    }

    #[test]
    fn test_select_with_everything() {
        let compiled = Builder::table("posts")
            .with_prefix("wp_")
            .select(&["id", "title as heading"])
            .distinct()
            .where_in("id", [1, 2, 3])
            .where_nested(|q| q.where_null("deleted_at").or_where("status", Op::Eq, "draft"))
            .where_between("views", 10, 20)
            .order_by("created_at", OrderDirection::Desc)
            .order_by("id", OrderDirection::Asc)
            .limit(10)
            .offset(20)
            .to_sql(&GenericGrammar);
        assert_eq!(
            compiled.sql,
            "SELECT DISTINCT id, title AS heading FROM wp_posts \
             WHERE id IN (?, ?, ?) AND (deleted_at IS NULL OR status = ?) \
             AND views BETWEEN ? AND ? ORDER BY created_at DESC, id ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(compiled.bindings.len(), 6);
    }

    #[test]
    fn test_empty_in_lists() {
        let compiled = Builder::table("posts")
            .where_in("id", Vec::<i64>::new())
            .where_not_in("id", Vec::<i64>::new())
            .to_sql(&GenericGrammar);
        assert_eq!(compiled.sql, "SELECT * FROM posts WHERE 0 = 1 AND 1 = 1");
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_raw_where_keeps_binding_order() {
        let compiled = Builder::table("posts")
            .where_("a", Op::Eq, 1)
            .where_raw("LOWER(title) = ?", vec![SqlValue::Text(String::from("x"))])
            .where_("b", Op::Eq, 2)
            .to_sql(&GenericGrammar);
        assert_eq!(
            compiled.sql,
            "SELECT * FROM posts WHERE a = ? AND LOWER(title) = ? AND b = ?"
        );
        assert_eq!(
            compiled.bindings,
            vec![
                SqlValue::Int(1),
                SqlValue::Text(String::from("x")),
                SqlValue::Int(2)
            ]
        );
    }

    #[test]
    fn test_insert_many_rows() {
        let rows = vec![
            values([("title", "a"), ("status", "draft")]),
            values([("status", "published"), ("title", "b")]),
        ];
        let compiled = Builder::table("posts")
            .to_insert_sql(&GenericGrammar, &rows)
            .unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO posts (title, status) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(
            compiled.bindings,
            vec![
                SqlValue::Text(String::from("a")),
                SqlValue::Text(String::from("draft")),
                SqlValue::Text(String::from("b")),
                SqlValue::Text(String::from("published")),
            ]
        );
    }

    #[test]
    fn test_insert_rows_must_share_columns() {
        let rows = vec![values([("title", "a")]), values([("slug", "b")])];
        assert!(Builder::table("posts")
            .to_insert_sql(&GenericGrammar, &rows)
            .is_err());
    }

    #[test]
    fn test_empty_insert_uses_default_values() {
        let compiled = Builder::table("posts")
            .to_insert_sql(&GenericGrammar, &[])
            .unwrap();
        assert_eq!(compiled.sql, "INSERT INTO posts DEFAULT VALUES");
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_update_binds_values_before_wheres() {
        let compiled = Builder::table("posts")
            .where_("id", Op::Eq, 5)
            .to_update_sql(&GenericGrammar, &values([("title", "x")]))
            .unwrap();
        assert_eq!(compiled.sql, "UPDATE posts SET title = ? WHERE id = ?");
        assert_eq!(
            compiled.bindings,
            vec![SqlValue::Text(String::from("x")), SqlValue::Int(5)]
        );
    }

    #[test]
    fn test_update_without_values_is_rejected() {
        assert!(Builder::table("posts")
            .to_update_sql(&GenericGrammar, &values(Vec::<(&str, i64)>::new()))
            .is_err());
    }

    #[test]
    fn test_delete_and_increment() {
        let query = Builder::table("posts").where_("id", Op::Eq, 5);
        assert_eq!(
            query.to_delete_sql(&GenericGrammar).sql,
            "DELETE FROM posts WHERE id = ?"
        );
        let increment = query.to_increment_sql(&GenericGrammar, "views", -2);
        assert_eq!(increment.sql, "UPDATE posts SET views = views + ? WHERE id = ?");
        assert_eq!(increment.bindings, vec![SqlValue::Int(-2), SqlValue::Int(5)]);
    }

    #[test]
    fn test_aggregate_wraps_select() {
        use crate::query::{Aggregate, AggregateFunction};

        let query = Builder::table("posts").where_("status", Op::Eq, "draft");
        let count = query.to_aggregate_sql(&GenericGrammar, &Aggregate::count());
        assert_eq!(
            count.sql,
            "SELECT COUNT(*) AS aggregate FROM (SELECT * FROM posts WHERE status = ?) AS aggregate_table"
        );
        assert_eq!(count.bindings.len(), 1);
        let max = query.to_aggregate_sql(
            &GenericGrammar,
            &Aggregate::of(AggregateFunction::Max, "views"),
        );
        assert!(max.sql.starts_with("SELECT MAX(views) AS aggregate FROM (SELECT"));
        let exists = query.to_exists_sql(&GenericGrammar);
        assert_eq!(
            exists.sql,
            "SELECT EXISTS(SELECT * FROM posts WHERE status = ?) AS aggregate"
        );
    }
}
