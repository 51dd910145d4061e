//! MySQL DDL.

use crate::value::SqlValue;

use super::super::column::{ColumnDefinition, ColumnType};
use super::super::command::{DropIndexCommand, IndexCommand, IndexKind};
use super::super::table::Table;
use super::super::SchemaResult;
use super::SchemaGrammar;

/// MySQL schema grammar.
///
/// DDL statements commit implicitly, so migrations are not wrapped in
/// transactions on this dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSchemaGrammar;

impl SchemaGrammar for MySqlSchemaGrammar {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn supports_schema_transactions(&self) -> bool {
        false
    }

    fn type_sql(&self, column: &ColumnDefinition) -> String {
        let base = match column.column_type {
            ColumnType::TinyInteger => String::from("TINYINT"),
            ColumnType::SmallInteger => String::from("SMALLINT"),
            ColumnType::Integer => String::from("INT"),
            ColumnType::BigInteger => String::from("BIGINT"),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Char(len) => format!("CHAR({len})"),
            ColumnType::Text => String::from("TEXT"),
            ColumnType::MediumText => String::from("MEDIUMTEXT"),
            ColumnType::LongText => String::from("LONGTEXT"),
            ColumnType::Boolean => String::from("TINYINT(1)"),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Float => String::from("FLOAT"),
            ColumnType::Double => String::from("DOUBLE"),
            ColumnType::Date => String::from("DATE"),
            ColumnType::DateTime(None) => String::from("DATETIME"),
            ColumnType::DateTime(Some(p)) => format!("DATETIME({p})"),
            ColumnType::Time => String::from("TIME"),
            ColumnType::Timestamp(None) => String::from("TIMESTAMP"),
            ColumnType::Timestamp(Some(p)) => format!("TIMESTAMP({p})"),
            ColumnType::Json => String::from("JSON"),
            ColumnType::Binary => String::from("BLOB"),
            ColumnType::Uuid => String::from("CHAR(36)"),
        };
        if column.unsigned && column.column_type.is_integer() {
            format!("{base} UNSIGNED")
        } else {
            base
        }
    }

    fn compile_modifiers(&self, column: &ColumnDefinition) -> String {
        let mut sql = String::new();
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" COLLATE '{collation}'"));
        }
        if let Some(generated) = &column.generated {
            let storage = if generated.stored { "STORED" } else { "VIRTUAL" };
            sql.push_str(&format!(" AS ({}) {storage}", generated.expression));
            if !column.nullable {
                sql.push_str(" NOT NULL");
            }
        } else if column.nullable {
            sql.push_str(" NULL");
        } else {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if column.auto_increment && column.column_type.is_integer() {
            sql.push_str(" AUTO_INCREMENT PRIMARY KEY");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
        }
        sql
    }

    fn compile_table_options(&self, table: &Table) -> String {
        let mut sql = String::new();
        if let Some(charset) = table.charset() {
            sql.push_str(&format!(" DEFAULT CHARACTER SET {charset}"));
        }
        if let Some(collation) = table.collation() {
            sql.push_str(&format!(" COLLATE '{collation}'"));
        }
        if let Some(engine) = table.engine() {
            sql.push_str(&format!(" ENGINE = {engine}"));
        }
        sql
    }

    fn compile_change(&self, table: &Table) -> SchemaResult<Vec<String>> {
        let clauses = table
            .changed_columns()
            .map(|c| self.column_definition(c).map(|d| format!("MODIFY {d}")))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(vec![format!(
            "ALTER TABLE {} {}",
            self.wrap_table(table),
            clauses.join(", ")
        )])
    }

    fn compile_rename(&self, table: &Table, to: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            self.wrap_table(table),
            self.wrap(&format!("{}{to}", table.prefix()))
        )
    }

    fn compile_index(&self, table: &Table, index: &IndexCommand) -> SchemaResult<Vec<String>> {
        let columns = self.columnize(&index.columns);
        let sql = match index.kind {
            IndexKind::Primary if self.primary_is_inline(table, index)? => return Ok(Vec::new()),
            IndexKind::Primary => format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({columns})",
                self.wrap_table(table)
            ),
            IndexKind::Unique => format!(
                "ALTER TABLE {} ADD UNIQUE {}({columns})",
                self.wrap_table(table),
                self.wrap(&index.name)
            ),
            IndexKind::Index => format!(
                "ALTER TABLE {} ADD INDEX {}({columns})",
                self.wrap_table(table),
                self.wrap(&index.name)
            ),
        };
        Ok(vec![sql])
    }

    fn compile_drop_index(
        &self,
        table: &Table,
        index: &DropIndexCommand,
    ) -> SchemaResult<Vec<String>> {
        let sql = match index.kind {
            IndexKind::Primary => format!("ALTER TABLE {} DROP PRIMARY KEY", self.wrap_table(table)),
            IndexKind::Unique | IndexKind::Index => format!(
                "ALTER TABLE {} DROP INDEX {}",
                self.wrap_table(table),
                self.wrap(&index.name)
            ),
        };
        Ok(vec![sql])
    }

    fn compile_drop_foreign(&self, table: &Table, name: &str) -> SchemaResult<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.wrap_table(table),
            self.wrap(name)
        )])
    }

    fn compile_table_exists(&self, database: &str, table: &str) -> (String, Vec<SqlValue>) {
        (
            String::from(
                "SELECT * FROM information_schema.tables WHERE table_schema = ? \
                 AND table_name = ? AND table_type = 'BASE TABLE'",
            ),
            vec![
                SqlValue::Text(String::from(database)),
                SqlValue::Text(String::from(table)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ForeignKeyAction;

    #[test]
    fn test_create_table() {
        let mut table = Table::new("posts", "wp_");
        table.create();
        table.set_engine("InnoDB");
        table.id();
        table.string("title", 200).comment("Post title");
        table.boolean("featured").default(false);
        table.timestamp("published_at").nullable().use_current();

        let statements = table.to_sql(&MySqlSchemaGrammar).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE `wp_posts` (\
                 `id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
                 `title` VARCHAR(200) NOT NULL COMMENT 'Post title', \
                 `featured` TINYINT(1) NOT NULL DEFAULT '0', \
                 `published_at` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP) ENGINE = InnoDB"
            ]
        );
    }

    #[test]
    fn test_alter_table_adds_and_indexes() {
        let mut table = Table::new("posts", "");
        table.string("slug", 255).unique();
        table.foreign_id("user_id");
        table
            .foreign(&["user_id"])
            .on("users")
            .on_delete(ForeignKeyAction::Cascade);

        let statements = table.to_sql(&MySqlSchemaGrammar).unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE `posts` ADD COLUMN `slug` VARCHAR(255) NOT NULL, \
                 ADD COLUMN `user_id` BIGINT UNSIGNED NOT NULL",
                "ALTER TABLE `posts` ADD CONSTRAINT `posts_user_id_foreign` \
                 FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE",
                "ALTER TABLE `posts` ADD UNIQUE `posts_slug_unique`(`slug`)",
            ]
        );
    }

    #[test]
    fn test_change_uses_modify() {
        let mut table = Table::new("posts", "");
        table.string("title", 500).nullable().change();
        let statements = table.to_sql(&MySqlSchemaGrammar).unwrap();
        assert_eq!(
            statements,
            vec!["ALTER TABLE `posts` MODIFY `title` VARCHAR(500) NULL"]
        );
    }

    #[test]
    fn test_drops_and_renames() {
        let mut table = Table::new("posts", "wp_");
        table.drop_primary(None);
        table.drop_index("posts_views_index");
        table.drop_foreign("posts_user_id_foreign");
        table.rename("articles");
        let statements = table.to_sql(&MySqlSchemaGrammar).unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE `wp_posts` DROP PRIMARY KEY",
                "ALTER TABLE `wp_posts` DROP INDEX `posts_views_index`",
                "ALTER TABLE `wp_posts` DROP FOREIGN KEY `posts_user_id_foreign`",
                "RENAME TABLE `wp_posts` TO `wp_articles`",
            ]
        );
    }

    #[test]
    fn test_no_schema_transactions() {
        assert!(!MySqlSchemaGrammar.supports_schema_transactions());
    }
}
