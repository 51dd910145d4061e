//! PostgreSQL grammar.

use crate::error::Result;
use crate::query::{Builder, Compiled};
use crate::value::{SqlValue, Values};

use super::Grammar;

/// PostgreSQL grammar: native booleans and `RETURNING` for generated keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn prepare_binding(&self, value: &SqlValue) -> SqlValue {
        value.clone()
    }

    fn returns_inserted_id(&self) -> bool {
        true
    }

    fn compile_insert_get_id(&self, query: &Builder, values: &Values, key: &str) -> Result<Compiled> {
        let mut compiled = self.compile_insert(query, std::slice::from_ref(values))?;
        compiled.sql.push_str(&format!(" RETURNING {}", self.wrap(key)));
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Op, Upsert};
    use crate::value::values;

    #[test]
    fn test_native_booleans() {
        let compiled = Builder::table("posts")
            .where_("featured", Op::Eq, false)
            .to_sql(&PostgresGrammar);
        assert_eq!(compiled.sql, r#"SELECT * FROM "posts" WHERE "featured" = ?"#);
        assert_eq!(compiled.bindings, vec![SqlValue::Bool(false)]);
    }

    #[test]
    fn test_insert_get_id_returns_key() {
        let compiled = Builder::table("posts")
            .to_insert_get_id_sql(&PostgresGrammar, &values([("title", "a")]), "id")
            .unwrap();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "posts" ("title") VALUES (?) RETURNING "id""#
        );
    }

    #[test]
    fn test_upsert_on_conflict() {
        let upsert = Upsert::new(
            "slug",
            values([("slug", "hello"), ("views", "1")]),
            values([("views", "2")]),
        )
        .unwrap();
        let compiled = Builder::table("posts")
            .to_upsert_sql(&PostgresGrammar, &upsert)
            .unwrap();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "posts" ("slug", "views") VALUES (?, ?) ON CONFLICT ("slug") DO UPDATE SET "views" = ?"#
        );
    }

    #[test]
    fn test_quote_inside_identifier_is_doubled() {
        assert_eq!(PostgresGrammar.wrap(r#"we"ird"#), r#""we""ird""#);
    }
}
