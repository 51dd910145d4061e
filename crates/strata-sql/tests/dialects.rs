//! Cross-dialect compilation tests.
//!
//! The same request compiled by every grammar must keep its shape and its
//! binding order, and differ only where the dialects genuinely disagree.

use strata_sql::grammar::{GenericGrammar, Grammar, MySqlGrammar, PostgresGrammar, SqliteGrammar};
use strata_sql::query::{Builder, Op, OrderDirection, Upsert};
use strata_sql::schema::grammar::{
    MySqlSchemaGrammar, PostgresSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar,
};
use strata_sql::schema::{Command, IndexCommand, IndexKind, Table};
use strata_sql::{values, Dialect, SqlValue};

fn grammars() -> Vec<Box<dyn Grammar>> {
    vec![
        Box::new(GenericGrammar),
        Box::new(MySqlGrammar),
        Box::new(PostgresGrammar),
        Box::new(SqliteGrammar),
    ]
}

// =============================================================================
// Test: status/featured filter
// =============================================================================

#[test]
fn test_or_where_compiles_in_order_on_generic() {
    let compiled = Builder::table("posts")
        .where_("status", Op::Eq, "published")
        .or_where("featured", Op::Eq, 1)
        .to_sql(&GenericGrammar);

    assert_eq!(compiled.sql, "SELECT * FROM posts WHERE status = ? OR featured = ?");
    assert_eq!(
        compiled.bindings,
        vec![SqlValue::Text(String::from("published")), SqlValue::Int(1)]
    );
}

#[test]
fn test_quote_characters() {
    let query = Builder::table("posts").select(&["id"]).where_("id", Op::Gt, 1);
    let sql: Vec<String> = grammars().iter().map(|g| query.to_sql(g.as_ref()).sql).collect();
    assert_eq!(
        sql,
        vec![
            "SELECT id FROM posts WHERE id > ?",
            "SELECT `id` FROM `posts` WHERE `id` > ?",
            r#"SELECT "id" FROM "posts" WHERE "id" > ?"#,
            r#"SELECT "id" FROM "posts" WHERE "id" > ?"#,
        ]
    );
}

// =============================================================================
// Test: binding count and order
// =============================================================================

#[test]
fn test_binding_count_matches_value_conditions() {
    let query = Builder::table("posts")
        .where_("status", Op::Eq, "published")
        .where_null("deleted_at")
        .where_in("category_id", [3, 4])
        .or_where_nested(|q| q.where_("views", Op::GtEq, 100).where_not_null("pinned_at"))
        .order_by("id", OrderDirection::Desc);

    for grammar in grammars() {
        let compiled = query.to_sql(grammar.as_ref());
        let placeholders = compiled.sql.matches('?').count();
        assert_eq!(placeholders, 4, "{}", grammar.name());
        assert_eq!(compiled.bindings.len(), placeholders, "{}", grammar.name());
        assert_eq!(compiled.bindings[0], SqlValue::Text(String::from("published")));
        assert_eq!(compiled.bindings[3], SqlValue::Int(100));
    }
}

#[test]
fn test_multi_row_insert_binding_count() {
    let rows: Vec<_> = (0..5)
        .map(|i| values([("title", SqlValue::Text(format!("post {i}"))), ("views", SqlValue::Int(i))]))
        .collect();
    for grammar in grammars() {
        let compiled = Builder::table("posts")
            .to_insert_sql(grammar.as_ref(), &rows)
            .unwrap();
        assert_eq!(compiled.bindings.len(), 10);
        assert_eq!(compiled.sql.matches("(?, ?)").count(), 5);
    }
}

#[test]
fn test_empty_insert_has_no_bindings() {
    for grammar in grammars() {
        let compiled = Builder::table("posts").to_insert_sql(grammar.as_ref(), &[]).unwrap();
        assert!(compiled.bindings.is_empty());
        assert!(!compiled.sql.contains('?'));
    }
}

#[test]
fn test_upsert_binds_insert_then_update() {
    let upsert = Upsert::new(
        "slug",
        values([("slug", "hello"), ("title", "Hello")]),
        values([("title", "Hello, again")]),
    )
    .unwrap();
    for grammar in grammars() {
        let compiled = Builder::table("posts")
            .to_upsert_sql(grammar.as_ref(), &upsert)
            .unwrap();
        assert_eq!(
            compiled.bindings,
            vec![
                SqlValue::Text(String::from("hello")),
                SqlValue::Text(String::from("Hello")),
                SqlValue::Text(String::from("Hello, again")),
            ]
        );
    }
}

#[test]
fn test_booleans_per_dialect() {
    let query = Builder::table("posts").where_("featured", Op::Eq, true);
    assert_eq!(query.to_sql(&MySqlGrammar).bindings, vec![SqlValue::Int(1)]);
    assert_eq!(query.to_sql(&SqliteGrammar).bindings, vec![SqlValue::Int(1)]);
    assert_eq!(query.to_sql(&PostgresGrammar).bindings, vec![SqlValue::Bool(true)]);
}

// =============================================================================
// Test: schema blueprints
// =============================================================================

#[test]
fn test_slug_unique_marker_synthesizes_named_command() {
    let mut table = Table::new("posts", "wp_");
    table.string("slug", 255).unique();
    table.add_implied_commands();

    let unique: Vec<&IndexCommand> = table
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Index(index) if index.kind == IndexKind::Unique => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].name, "wp_posts_slug_unique");
}

#[test]
fn test_schema_transactions_per_dialect() {
    let grammars: Vec<Box<dyn SchemaGrammar>> = vec![
        Box::new(MySqlSchemaGrammar),
        Box::new(PostgresSchemaGrammar),
        Box::new(SqliteSchemaGrammar),
    ];
    let support: Vec<bool> = grammars
        .iter()
        .map(|g| g.supports_schema_transactions())
        .collect();
    assert_eq!(support, [false, true, true]);
}

#[test]
fn test_auto_increment_per_dialect() {
    let expected = [
        (Dialect::Mysql, "`id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY"),
        (Dialect::Postgres, r#""id" BIGSERIAL NOT NULL PRIMARY KEY"#),
        (Dialect::Sqlite, r#""id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT"#),
    ];
    for (dialect, column) in expected {
        let mut table = Table::new("posts", "");
        table.create();
        table.id();
        let grammar = dialect.schema_grammar().unwrap();
        let statements = table.to_sql(grammar.as_ref()).unwrap();
        assert!(statements[0].contains(column), "{dialect}: {}", statements[0]);
    }
}

#[test]
fn test_primary_on_increment_column_is_declared_once_per_dialect() {
    for dialect in [Dialect::Mysql, Dialect::Postgres, Dialect::Sqlite] {
        let mut table = Table::new("things", "wp_");
        table.create();
        table.id();
        table.primary(&["id"], None);
        let grammar = dialect.schema_grammar().unwrap();
        let sql = table.to_sql(grammar.as_ref()).unwrap().join("; ");
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1, "{dialect}: {sql}");
    }
}

#[test]
fn test_exists_alias_is_not_a_keyword() {
    let query = Builder::table("posts");
    let grammars: [(&dyn Grammar, &str); 4] = [
        (&GenericGrammar, " AS aggregate"),
        (&MySqlGrammar, " AS `aggregate`"),
        (&PostgresGrammar, r#" AS "aggregate""#),
        (&SqliteGrammar, r#" AS "aggregate""#),
    ];
    for (grammar, alias) in grammars {
        let sql = query.to_exists_sql(grammar).sql;
        assert!(sql.ends_with(alias), "{}: {sql}", grammar.name());
    }
}
