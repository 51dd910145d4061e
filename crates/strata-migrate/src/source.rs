//! Where migrations come from.
//!
//! A [`MigrationSet`] is an explicit, name-ordered collection owned by the
//! caller. Names usually start with a timestamp, so name order is also
//! creation order.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use strata_db::Connection;
use tracing::{debug, warn};

use crate::error::{MigrateError, Result};
use crate::migration::Migration;
use crate::migrator::Note;

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// Migrations keyed by name.
#[derive(Default)]
pub struct MigrationSet {
    units: BTreeMap<String, Box<dyn Migration>>,
}

impl MigrationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every `<name>.up.sql` (and optional `<name>.down.sql`) in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::new();
        set.load_dir(dir)?;
        Ok(set)
    }

    /// Like [`from_dir`](Self::from_dir), but a missing directory gives an
    /// empty set and a note instead of an error.
    ///
    /// Commands that only read the ledger (`status`, `rollback`) still work
    /// without the directory.
    pub fn discover(dir: &Path) -> Result<(Self, Option<Note>)> {
        match Self::from_dir(dir) {
            Ok(set) => Ok((set, None)),
            Err(MigrateError::MigrationsDirNotFound(path)) => {
                warn!(path = %path.display(), "Migrations directory not found");
                Ok((Self::new(), Some(Note::MigrationsDirNotFound(path))))
            }
            Err(e) => Err(e),
        }
    }

    /// Adds a migration.
    pub fn add(&mut self, name: &str, migration: impl Migration + 'static) -> Result<&mut Self> {
        validate_name(name)?;
        if self.units.contains_key(name) {
            return Err(MigrateError::Duplicate(String::from(name)));
        }
        self.units.insert(String::from(name), Box::new(migration));
        Ok(self)
    }

    /// Adds the SQL migrations found in `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<&mut Self> {
        if !dir.is_dir() {
            return Err(MigrateError::MigrationsDirNotFound(dir.to_path_buf()));
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(UP_SUFFIX) {
                found.push((String::from(name), path.clone()));
            }
        }
        found.sort();

        for (name, up_path) in found {
            let up = fs::read_to_string(&up_path)?;
            let down_path = dir.join(format!("{name}{DOWN_SUFFIX}"));
            let down = if down_path.is_file() {
                Some(fs::read_to_string(&down_path)?)
            } else {
                None
            };
            debug!(migration = %name, path = %up_path.display(), "Discovered SQL migration");
            self.add(&name, SqlMigration::new(&up, down.as_deref()))?;
        }
        Ok(self)
    }

    /// Looks up a migration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.units.get(name).map(|unit| unit.as_ref())
    }

    /// Whether `name` is in the set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Migrations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Migration)> {
        self.units.iter().map(|(name, unit)| (name.as_str(), unit.as_ref()))
    }

    /// Number of migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for MigrationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.units.keys()).finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MigrateError::InvalidName(String::from(name)))
    }
}

/// A migration made of raw SQL scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    up: Vec<String>,
    down: Vec<String>,
}

impl SqlMigration {
    /// Splits both scripts into statements. A missing `down` reverts nothing.
    #[must_use]
    pub fn new(up: &str, down: Option<&str>) -> Self {
        Self {
            up: split_statements(up),
            down: down.map(split_statements).unwrap_or_default(),
        }
    }

    /// Statements run by `up`.
    #[must_use]
    pub fn up_statements(&self) -> &[String] {
        &self.up
    }

    /// Statements run by `down`.
    #[must_use]
    pub fn down_statements(&self) -> &[String] {
        &self.down
    }
}

impl Migration for SqlMigration {
    fn up(&self, conn: &mut Connection) -> strata_db::Result<()> {
        self.up.iter().try_for_each(|sql| conn.statement(sql, &[]))
    }

    fn down(&self, conn: &mut Connection) -> strata_db::Result<()> {
        self.down.iter().try_for_each(|sql| conn.statement(sql, &[]))
    }
}

/// Splits a script on `;`, ignoring semicolons inside quotes and comments.
///
/// Comments are dropped. Blank statements are skipped.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                current.push(' ');
            }
            ';' => push_statement(&mut statements, &mut current),
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(String::from(statement));
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Migration for Noop {
        fn up(&self, _conn: &mut Connection) -> strata_db::Result<()> {
            Ok(())
        }

        fn down(&self, _conn: &mut Connection) -> strata_db::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_split_respects_quotes_and_comments() {
        let script = "-- create things\n\
                      CREATE TABLE a (x TEXT DEFAULT ';');\n\
                      /* block; comment */ INSERT INTO a VALUES ('it''s; fine');\n\
                      \n;";
        assert_eq!(
            split_statements(script),
            vec![
                "CREATE TABLE a (x TEXT DEFAULT ';')",
                "INSERT INTO a VALUES ('it''s; fine')",
            ]
        );
    }

    #[test]
    fn test_set_orders_by_name_and_rejects_duplicates() {
        let mut set = MigrationSet::new();
        set.add("2024_01_02_000000_b", Noop).unwrap();
        set.add("2024_01_01_000000_a", Noop).unwrap();
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            ["2024_01_01_000000_a", "2024_01_02_000000_b"]
        );
        assert!(matches!(
            set.add("2024_01_01_000000_a", Noop),
            Err(MigrateError::Duplicate(_))
        ));
        assert!(matches!(set.add("bad name", Noop), Err(MigrateError::InvalidName(_))));
        assert!(matches!(set.add("", Noop), Err(MigrateError::InvalidName(_))));
    }

    #[test]
    fn test_from_dir_pairs_up_and_down_scripts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("2024_01_01_000000_create_a.up.sql"),
            "CREATE TABLE a (id INTEGER);",
        )
        .unwrap();
        fs::write(
            dir.path().join("2024_01_01_000000_create_a.down.sql"),
            "DROP TABLE a;",
        )
        .unwrap();
        fs::write(
            dir.path().join("2024_01_02_000000_seed.up.sql"),
            "INSERT INTO a VALUES (1); INSERT INTO a VALUES (2);",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let set = MigrationSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("2024_01_02_000000_seed"));
    }

    #[test]
    fn test_discover_tolerates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let (set, note) = MigrationSet::discover(&missing).unwrap();
        assert!(set.is_empty());
        assert_eq!(note, Some(Note::MigrationsDirNotFound(missing)));

        let (_, note) = MigrationSet::discover(dir.path()).unwrap();
        assert_eq!(note, None);
    }

    #[test]
    fn test_missing_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            MigrationSet::from_dir(&missing),
            Err(MigrateError::MigrationsDirNotFound(_))
        ));
    }
}
