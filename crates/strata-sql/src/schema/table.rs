//! Table definitions.
//!
//! A [`Table`] collects columns and commands, then compiles them into DDL
//! statements through a [`SchemaGrammar`]. It is built once and consumed.

use super::column::{ColumnDefinition, ColumnType};
use super::command::{Command, DropIndexCommand, ForeignKeyCommand, IndexCommand, IndexKind};
use super::grammar::SchemaGrammar;
use super::SchemaResult;

fn index_name(prefix: &str, table: &str, kind: &str, columns: &[String]) -> String {
    format!("{prefix}{table}_{}_{kind}", columns.join("_"))
        .to_lowercase()
        .replace(['-', '.'], "_")
}

/// Blueprint of a table change.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    prefix: String,
    creating: bool,
    temporary: bool,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    columns: Vec<ColumnDefinition>,
    commands: Vec<Command>,
    implied: bool,
}

impl Table {
    /// Starts a blueprint for `name`.
    #[must_use]
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: String::from(name),
            prefix: String::from(prefix),
            creating: false,
            temporary: false,
            engine: None,
            charset: None,
            collation: None,
            columns: Vec::new(),
            commands: Vec::new(),
            implied: false,
        }
    }

    /// Table name, without prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table-name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixed table name.
    #[must_use]
    pub fn prefixed_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    /// Whether the blueprint creates the table.
    #[must_use]
    pub const fn is_creating(&self) -> bool {
        self.creating
    }

    /// Whether the table is temporary.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Storage engine (MySQL).
    #[must_use]
    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    /// Default character set (MySQL).
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Default collation (MySQL).
    #[must_use]
    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    /// All columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Columns to add.
    pub fn added_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| !c.change)
    }

    /// Columns to modify.
    pub fn changed_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.change)
    }

    /// Commands in compilation order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Creates the table.
    pub fn create(&mut self) -> &mut Self {
        self.creating = true;
        self.commands.push(Command::Create);
        self
    }

    /// Creates the table as a temporary table.
    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    /// Sets the storage engine (MySQL).
    pub fn set_engine(&mut self, engine: &str) -> &mut Self {
        self.engine = Some(String::from(engine));
        self
    }

    /// Sets the default character set (MySQL).
    pub fn set_charset(&mut self, charset: &str) -> &mut Self {
        self.charset = Some(String::from(charset));
        self
    }

    /// Sets the default collation (MySQL).
    pub fn set_collation(&mut self, collation: &str) -> &mut Self {
        self.collation = Some(String::from(collation));
        self
    }

    /// Drops the table.
    pub fn drop(&mut self) -> &mut Self {
        self.commands.push(Command::Drop);
        self
    }

    /// Drops the table if it exists.
    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    /// Renames the table.
    pub fn rename(&mut self, to: &str) -> &mut Self {
        self.commands.push(Command::Rename {
            to: String::from(to),
        });
        self
    }

    /// Adds a column of `column_type` and returns it for modifiers.
    pub fn add_column(&mut self, column_type: ColumnType, name: &str) -> &mut ColumnDefinition {
        let idx = self.columns.len();
        self.columns.push(ColumnDefinition::new(name, column_type));
        &mut self.columns[idx]
    }

    /// Auto-increment unsigned integer primary key.
    pub fn increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Integer, name)
            .unsigned()
            .auto_increment()
    }

    /// Auto-increment unsigned big integer primary key.
    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::BigInteger, name)
            .unsigned()
            .auto_increment()
    }

    /// `big_increments("id")`.
    pub fn id(&mut self) -> &mut ColumnDefinition {
        self.big_increments("id")
    }

    /// 4-byte integer.
    pub fn integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Integer, name)
    }

    /// 8-byte integer.
    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::BigInteger, name)
    }

    /// 2-byte integer.
    pub fn small_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::SmallInteger, name)
    }

    /// 1-byte integer.
    pub fn tiny_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::TinyInteger, name)
    }

    /// Unsigned 4-byte integer.
    pub fn unsigned_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.integer(name).unsigned()
    }

    /// Unsigned 8-byte integer.
    pub fn unsigned_big_integer(&mut self, name: &str) -> &mut ColumnDefinition {
        self.big_integer(name).unsigned()
    }

    /// Unsigned big integer meant to hold a foreign key.
    pub fn foreign_id(&mut self, name: &str) -> &mut ColumnDefinition {
        self.unsigned_big_integer(name)
    }

    /// VARCHAR of `length`.
    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnType::String(length), name)
    }

    /// CHAR of `length`.
    pub fn char(&mut self, name: &str, length: u32) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Char(length), name)
    }

    /// TEXT.
    pub fn text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Text, name)
    }

    /// MEDIUMTEXT.
    pub fn medium_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::MediumText, name)
    }

    /// LONGTEXT.
    pub fn long_text(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::LongText, name)
    }

    /// Boolean.
    pub fn boolean(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Boolean, name)
    }

    /// DECIMAL(precision, scale).
    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Decimal(precision, scale), name)
    }

    /// Single-precision float.
    pub fn float(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Float, name)
    }

    /// Double-precision float.
    pub fn double(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Double, name)
    }

    /// DATE.
    pub fn date(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Date, name)
    }

    /// DATETIME.
    pub fn date_time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::DateTime(None), name)
    }

    /// TIME.
    pub fn time(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Time, name)
    }

    /// TIMESTAMP.
    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Timestamp(None), name)
    }

    /// Nullable `created_at` and `updated_at` timestamps.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// Nullable `deleted_at` timestamp.
    pub fn soft_deletes(&mut self) -> &mut ColumnDefinition {
        self.timestamp("deleted_at").nullable()
    }

    /// JSON.
    pub fn json(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Json, name)
    }

    /// Binary data.
    pub fn binary(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Binary, name)
    }

    /// UUID.
    pub fn uuid(&mut self, name: &str) -> &mut ColumnDefinition {
        self.add_column(ColumnType::Uuid, name)
    }

    /// Drops columns.
    pub fn drop_column(&mut self, columns: &[&str]) -> &mut Self {
        self.commands.push(Command::DropColumn {
            columns: columns.iter().map(|c| String::from(*c)).collect(),
        });
        self
    }

    /// Renames a column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: String::from(from),
            to: String::from(to),
        });
        self
    }

    /// Generated name for an index of `kind` over `columns`.
    #[must_use]
    pub fn create_index_name(&self, kind: &str, columns: &[String]) -> String {
        index_name(&self.prefix, &self.name, kind, columns)
    }

    fn index_command(&mut self, kind: IndexKind, columns: &[&str], name: Option<&str>) -> &mut Self {
        let columns: Vec<String> = columns.iter().map(|c| String::from(*c)).collect();
        let name = name.map_or_else(
            || self.create_index_name(kind.suffix(), &columns),
            String::from,
        );
        self.commands
            .push(Command::Index(IndexCommand { kind, name, columns }));
        self
    }

    /// Adds a primary key.
    pub fn primary(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Primary, columns, name)
    }

    /// Adds a unique index.
    pub fn unique(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Unique, columns, name)
    }

    /// Adds a plain index.
    pub fn index(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.index_command(IndexKind::Index, columns, name)
    }

    fn drop_index_command(&mut self, kind: IndexKind, name: String) -> &mut Self {
        self.commands
            .push(Command::DropIndex(DropIndexCommand { kind, name }));
        self
    }

    /// Drops the primary key; the name defaults to `<table>_pkey`.
    pub fn drop_primary(&mut self, name: Option<&str>) -> &mut Self {
        let name = name.map_or_else(|| format!("{}_pkey", self.prefixed_name()), String::from);
        self.drop_index_command(IndexKind::Primary, name)
    }

    /// Drops a unique index by name.
    pub fn drop_unique(&mut self, name: &str) -> &mut Self {
        self.drop_index_command(IndexKind::Unique, String::from(name))
    }

    /// Drops a plain index by name.
    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.drop_index_command(IndexKind::Index, String::from(name))
    }

    /// Adds a foreign key over `columns`; finish it with `references`/`on`.
    pub fn foreign(&mut self, columns: &[&str]) -> &mut ForeignKeyCommand {
        let columns: Vec<String> = columns.iter().map(|c| String::from(*c)).collect();
        let name = self.create_index_name("foreign", &columns);
        self.commands.push(Command::Foreign(ForeignKeyCommand {
            name,
            columns,
            on: String::new(),
            references: vec![String::from("id")],
            on_delete: None,
            on_update: None,
        }));
        match self.commands.last_mut() {
            Some(Command::Foreign(foreign)) => foreign,
            _ => unreachable!("a foreign key command was just pushed"),
        }
    }

    /// Drops a foreign key by name.
    pub fn drop_foreign(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropForeign {
            name: String::from(name),
        });
        self
    }

    /// Adds the commands implied by the columns. Runs once per blueprint.
    ///
    /// Inline index markers become index commands appended after the
    /// explicit ones, then `Add` and `Change` are put in front.
    pub fn add_implied_commands(&mut self) {
        if self.implied {
            return;
        }
        self.implied = true;

        let mut promoted = Vec::new();
        let (prefix, table) = (&self.prefix, &self.name);
        for column in &mut self.columns {
            for (kind, marker) in [
                (IndexKind::Primary, column.primary.take()),
                (IndexKind::Unique, column.unique.take()),
                (IndexKind::Index, column.index.take()),
            ] {
                if let Some(name) = marker {
                    let columns = vec![column.name.clone()];
                    let name = name
                        .unwrap_or_else(|| index_name(prefix, table, kind.suffix(), &columns));
                    promoted.push(Command::Index(IndexCommand { kind, name, columns }));
                }
            }
        }
        self.commands.extend(promoted);

        if !self.creating && self.added_columns().next().is_some() {
            self.commands.insert(0, Command::Add);
        }
        if self.changed_columns().next().is_some() {
            self.commands.insert(0, Command::Change);
        }
    }

    /// Compiles the blueprint into ordered DDL statements.
    pub fn to_sql(mut self, grammar: &dyn SchemaGrammar) -> SchemaResult<Vec<String>> {
        self.add_implied_commands();
        let mut statements = Vec::new();
        for command in &self.commands {
            statements.extend(grammar.compile_command(&self, command)?);
        }
        Ok(statements)
    }
}
