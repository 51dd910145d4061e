//! Migration runner tests against an in-memory SQLite database.

use std::fs;

use strata_db::{Connection, QueryExt, SqliteDriver};
use strata_migrate::{
    MigrateError, MigrateOptions, Migration, MigrationRepository, MigrationSet, MigrationState,
    Migrator, Note, RollbackOptions,
};
use strata_sql::Dialect;

const A: &str = "2024_01_01_000000_create_a";
const B: &str = "2024_01_01_000001_create_b";
const C: &str = "2024_01_01_000002_create_c";

struct CreateTable(&'static str);

impl Migration for CreateTable {
    fn up(&self, conn: &mut Connection) -> strata_db::Result<()> {
        conn.schema().create(self.0, |table| {
            table.id();
            table.string("name", 50);
        })
    }

    fn down(&self, conn: &mut Connection) -> strata_db::Result<()> {
        conn.schema().drop_if_exists(self.0)
    }
}

struct Broken;

impl Migration for Broken {
    fn up(&self, conn: &mut Connection) -> strata_db::Result<()> {
        conn.schema().create("half", |table| {
            table.id();
        })?;
        conn.statement("INSERT INTO nowhere VALUES (1)", &[])
    }

    fn down(&self, _conn: &mut Connection) -> strata_db::Result<()> {
        Ok(())
    }
}

fn connection() -> Connection {
    Connection::builder(Dialect::Sqlite)
        .driver(SqliteDriver::memory().unwrap())
        .build()
        .unwrap()
}

fn set_of(names: &[(&str, &'static str)]) -> MigrationSet {
    let mut set = MigrationSet::new();
    for &(name, table) in names {
        set.add(name, CreateTable(table)).unwrap();
    }
    set
}

fn abc() -> MigrationSet {
    set_of(&[(A, "a"), (B, "b"), (C, "c")])
}

fn states(migrator: &Migrator<'_>, conn: &mut Connection) -> Vec<(String, MigrationState)> {
    migrator
        .status(conn)
        .unwrap()
        .migrations
        .into_iter()
        .map(|m| (m.name, m.state))
        .collect()
}

fn has_table(conn: &mut Connection, table: &str) -> bool {
    conn.schema().has_table(table).unwrap()
}

// =============================================================================
// Test: one batch per run
// =============================================================================

#[test]
fn test_first_run_puts_everything_in_batch_one() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());

    let notes = migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
    assert_eq!(
        notes,
        vec![
            Note::Migrating(A.into()),
            Note::Migrated(A.into()),
            Note::Migrating(B.into()),
            Note::Migrated(B.into()),
            Note::Migrating(C.into()),
            Note::Migrated(C.into()),
        ]
    );
    assert_eq!(
        states(&migrator, &mut conn),
        vec![
            (A.into(), MigrationState::Ran { batch: 1 }),
            (B.into(), MigrationState::Ran { batch: 1 }),
            (C.into(), MigrationState::Ran { batch: 1 }),
        ]
    );
    assert!(has_table(&mut conn, "c"));
}

#[test]
fn test_rollback_reverts_in_reverse_order() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();

    let notes = migrator.rollback(&mut conn, RollbackOptions::default()).unwrap();
    let rolled: Vec<_> = notes
        .iter()
        .filter_map(|note| match note {
            Note::RolledBack(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(rolled, [C, B, A]);
    assert!(!has_table(&mut conn, "a"));
    assert!(states(&migrator, &mut conn)
        .iter()
        .all(|(_, state)| *state == MigrationState::Pending));
}

#[test]
fn test_second_run_writes_nothing() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();

    let notes = migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
    assert_eq!(notes, vec![Note::NothingToMigrate]);
    assert_eq!(conn.table("migrations").count(&mut conn).unwrap(), 3);
    assert_eq!(
        migrator.repository().last_batch_number(&mut conn).unwrap(),
        1
    );
}

#[test]
fn test_rollback_only_touches_latest_batch() {
    let mut conn = connection();
    let first = set_of(&[(A, "a"), (B, "b")]);
    Migrator::new(&first, MigrationRepository::default())
        .migrate(&mut conn, MigrateOptions::default())
        .unwrap();

    let all = abc();
    let migrator = Migrator::new(&all, MigrationRepository::default());
    migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
    migrator.rollback(&mut conn, RollbackOptions::default()).unwrap();

    assert_eq!(
        states(&migrator, &mut conn),
        vec![
            (A.into(), MigrationState::Ran { batch: 1 }),
            (B.into(), MigrationState::Ran { batch: 1 }),
            (C.into(), MigrationState::Pending),
        ]
    );
    assert!(has_table(&mut conn, "b"));
    assert!(!has_table(&mut conn, "c"));
}

// =============================================================================
// Test: --step
// =============================================================================

#[test]
fn test_step_gives_each_migration_its_own_batch() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator
        .migrate(
            &mut conn,
            MigrateOptions {
                step: true,
                pretend: false,
            },
        )
        .unwrap();
    assert_eq!(
        states(&migrator, &mut conn),
        vec![
            (A.into(), MigrationState::Ran { batch: 1 }),
            (B.into(), MigrationState::Ran { batch: 2 }),
            (C.into(), MigrationState::Ran { batch: 3 }),
        ]
    );

    migrator
        .rollback(
            &mut conn,
            RollbackOptions {
                steps: Some(2),
                pretend: false,
            },
        )
        .unwrap();
    assert_eq!(
        states(&migrator, &mut conn),
        vec![
            (A.into(), MigrationState::Ran { batch: 1 }),
            (B.into(), MigrationState::Pending),
            (C.into(), MigrationState::Pending),
        ]
    );
}

// =============================================================================
// Test: failures and missing pieces
// =============================================================================

#[test]
fn test_failed_up_aborts_without_writing_ledger() {
    let mut conn = connection();
    let mut set = set_of(&[(A, "a")]);
    set.add("2024_01_01_000001_broken", Broken).unwrap();
    set.add(C, CreateTable("c")).unwrap();
    let migrator = Migrator::new(&set, MigrationRepository::default());

    let err = migrator
        .migrate(&mut conn, MigrateOptions::default())
        .unwrap_err();
    match err {
        MigrateError::Failed { name, .. } => assert_eq!(name, "2024_01_01_000001_broken"),
        other => panic!("unexpected error: {other}"),
    }

    let ran = migrator.repository().ran(&mut conn).unwrap();
    assert_eq!(ran, vec![String::from(A)]);
    assert!(!has_table(&mut conn, "half"), "transaction should undo partial DDL");
    assert!(!has_table(&mut conn, "c"));
}

#[test]
fn test_missing_units_are_reported_not_fatal() {
    let mut conn = connection();
    let full = set_of(&[(A, "a"), (B, "b")]);
    Migrator::new(&full, MigrationRepository::default())
        .migrate(&mut conn, MigrateOptions::default())
        .unwrap();

    let partial = set_of(&[(A, "a")]);
    let migrator = Migrator::new(&partial, MigrationRepository::default());
    assert_eq!(
        states(&migrator, &mut conn),
        vec![
            (A.into(), MigrationState::Ran { batch: 1 }),
            (B.into(), MigrationState::Missing { batch: 1 }),
        ]
    );

    let notes = migrator.rollback(&mut conn, RollbackOptions::default()).unwrap();
    assert_eq!(notes[0], Note::MigrationNotFound(B.into()));
    assert_eq!(notes.last(), Some(&Note::RolledBack(A.into())));
    assert_eq!(
        migrator.repository().ran(&mut conn).unwrap(),
        vec![String::from(B)]
    );
}

#[test]
fn test_missing_ledger_is_a_note() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::new("schema_log"));

    assert_eq!(
        migrator.rollback(&mut conn, RollbackOptions::default()).unwrap(),
        vec![Note::MigrationTableNotFound]
    );
    assert_eq!(
        migrator.reset(&mut conn, false).unwrap(),
        vec![Note::MigrationTableNotFound]
    );
    let report = migrator.status(&mut conn).unwrap();
    assert_eq!(report.notes, vec![Note::MigrationTableNotFound]);
    assert_eq!(report.migrations.len(), 3);
}

#[test]
fn test_rollback_with_empty_ledger() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator.repository().create(&mut conn).unwrap();

    assert_eq!(
        migrator.rollback(&mut conn, RollbackOptions::default()).unwrap(),
        vec![Note::NothingToRollback]
    );
}

// =============================================================================
// Test: pretend, reset and refresh
// =============================================================================

#[test]
fn test_pretend_reports_sql_and_changes_nothing() {
    let mut conn = connection();
    let set = set_of(&[(A, "a")]);
    let migrator = Migrator::new(&set, MigrationRepository::default());

    let notes = migrator
        .migrate(
            &mut conn,
            MigrateOptions {
                step: false,
                pretend: true,
            },
        )
        .unwrap();
    assert_eq!(
        notes,
        vec![Note::Pretended {
            migration: A.into(),
            sql: String::from(
                r#"CREATE TABLE "a" ("id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, "name" VARCHAR NOT NULL)"#
            ),
        }]
    );
    assert!(!has_table(&mut conn, "a"));
    assert!(!has_table(&mut conn, "migrations"));
}

#[test]
fn test_reset_reverts_every_batch() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator
        .migrate(
            &mut conn,
            MigrateOptions {
                step: true,
                pretend: false,
            },
        )
        .unwrap();

    migrator.reset(&mut conn, false).unwrap();
    assert!(migrator.repository().ran(&mut conn).unwrap().is_empty());
    assert!(!has_table(&mut conn, "a"));
}

#[test]
fn test_refresh_starts_over_in_batch_one() {
    let mut conn = connection();
    let set = abc();
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator
        .migrate(
            &mut conn,
            MigrateOptions {
                step: true,
                pretend: false,
            },
        )
        .unwrap();

    let notes = migrator.refresh(&mut conn, false).unwrap();
    assert_eq!(notes.first(), Some(&Note::RollingBack(C.into())));
    assert_eq!(notes.last(), Some(&Note::Migrated(C.into())));
    assert!(states(&migrator, &mut conn)
        .iter()
        .all(|(_, state)| *state == MigrationState::Ran { batch: 1 }));
}

#[test]
fn test_refresh_pretend_shows_down_then_up() {
    let mut conn = connection();
    let set = set_of(&[(A, "a")]);
    let migrator = Migrator::new(&set, MigrationRepository::default());
    migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();

    let notes = migrator.refresh(&mut conn, true).unwrap();
    let sql: Vec<_> = notes
        .iter()
        .filter_map(|note| match note {
            Note::Pretended { sql, .. } => Some(sql.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sql.len(), 2);
    assert!(sql[0].starts_with(r#"DROP TABLE IF EXISTS "a""#));
    assert!(sql[1].starts_with(r#"CREATE TABLE "a""#));
    assert!(has_table(&mut conn, "a"));
}

// =============================================================================
// Test: SQL file migrations
// =============================================================================

#[test]
fn test_sql_directory_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("2024_02_01_000000_create_terms.up.sql"),
        "CREATE TABLE terms (id INTEGER PRIMARY KEY, name TEXT);\n\
         INSERT INTO terms (name) VALUES ('Uncategorized');",
    )
    .unwrap();
    fs::write(
        dir.path().join("2024_02_01_000000_create_terms.down.sql"),
        "DROP TABLE terms;",
    )
    .unwrap();

    let mut conn = connection();
    let set = MigrationSet::from_dir(dir.path()).unwrap();
    let migrator = Migrator::new(&set, MigrationRepository::default());

    migrator.migrate(&mut conn, MigrateOptions::default()).unwrap();
    assert_eq!(conn.table("terms").count(&mut conn).unwrap(), 1);

    migrator.rollback(&mut conn, RollbackOptions::default()).unwrap();
    assert!(!has_table(&mut conn, "terms"));
}

// =============================================================================
// Test: ledger constraints
// =============================================================================

#[test]
fn test_ledger_rejects_duplicate_names() {
    let mut conn = connection();
    let repository = MigrationRepository::default();
    repository.create(&mut conn).unwrap();

    repository.log(&mut conn, A, 1).unwrap();
    let err = repository.log(&mut conn, A, 2).unwrap_err();

    assert!(matches!(err, strata_db::DbError::Query { .. }), "{err}");
    assert_eq!(repository.entries(&mut conn).unwrap().len(), 1);
}
