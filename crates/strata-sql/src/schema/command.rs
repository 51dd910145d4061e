//! Typed DDL commands recorded on a [`Table`](super::Table).

use super::column::ForeignKeyAction;

/// Index flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Primary key.
    Primary,
    /// Unique index.
    Unique,
    /// Plain index.
    Index,
}

impl IndexKind {
    /// Suffix used in generated index names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
        }
    }
}

/// Creates an index or key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCommand {
    /// Kind of index.
    pub kind: IndexKind,
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
}

/// Drops an index or key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexCommand {
    /// Kind of index.
    pub kind: IndexKind,
    /// Index name.
    pub name: String,
}

/// Adds a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyCommand {
    /// Constraint name.
    pub name: String,
    /// Local columns.
    pub columns: Vec<String>,
    /// Referenced table, without prefix.
    pub on: String,
    /// Referenced columns.
    pub references: Vec<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyCommand {
    /// Sets the referenced columns.
    pub fn references(&mut self, columns: &[&str]) -> &mut Self {
        self.references = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// Sets the referenced table.
    pub fn on(&mut self, table: &str) -> &mut Self {
        self.on = String::from(table);
        self
    }

    /// Sets the delete action.
    pub fn on_delete(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the update action.
    pub fn on_update(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_update = Some(action);
        self
    }

    /// Shorthand for `on_delete(Cascade)`.
    pub fn cascade_on_delete(&mut self) -> &mut Self {
        self.on_delete(ForeignKeyAction::Cascade)
    }
}

/// One DDL operation against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the table with its columns.
    Create,
    /// Drop the table.
    Drop,
    /// Drop the table if it exists.
    DropIfExists,
    /// Rename the table.
    Rename {
        /// New name, without prefix.
        to: String,
    },
    /// Add the table's non-`change` columns.
    Add,
    /// Modify the table's `change` columns.
    Change,
    /// Drop columns.
    DropColumn {
        /// Columns to drop.
        columns: Vec<String>,
    },
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Create an index or key.
    Index(IndexCommand),
    /// Drop an index or key.
    DropIndex(DropIndexCommand),
    /// Add a foreign key.
    Foreign(ForeignKeyCommand),
    /// Drop a foreign key.
    DropForeign {
        /// Constraint name.
        name: String,
    },
}
