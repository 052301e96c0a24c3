//! Integration tests for the sqlite-wrapper crate.

use std::sync::{Arc, Barrier};
use std::thread;

use rusqlite::types::Value;
use sqlite_wrapper::{
    Database, MigrationError, MigrationOutcome, Migrator, StoreId, crud, list_tables, read_version,
    table_exists,
};
use sqlite_wrapper_core::{ScriptSet, ScriptTarget, ValidationError, Version};
use sqlite_wrapper_scripts::ScriptRepository;
use tempfile::TempDir;

const MARKER: &str = "schema_version";

/// Scripts whose alter steps append to a log table, so tests can see exactly
/// which steps ran and in what order.
fn logging_scripts() -> ScriptSet {
    ScriptSet::new()
        .with_creation("CREATE TABLE log (entry TEXT NOT NULL)")
        .with_creation("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .with_alter(Version::new(1, 0), "INSERT INTO log VALUES ('A')")
        .with_alter(Version::new(2, 0), "INSERT INTO log VALUES ('C')")
        .with_alter(Version::new(1, 5), "INSERT INTO log VALUES ('B')")
}

fn store(dir: &TempDir) -> StoreId {
    StoreId::new(dir.path(), "app.db")
}

fn log_entries(id: &StoreId) -> Vec<String> {
    let db = Database::open(id).unwrap();
    crud::select_rows(db.connection(), "SELECT entry FROM log ORDER BY rowid", &[])
        .unwrap()
        .into_iter()
        .map(|row| match &row["entry"] {
            Value::Text(text) => text.clone(),
            other => panic!("unexpected value {other:?}"),
        })
        .collect()
}

fn stored_version(id: &StoreId) -> Option<Version> {
    let db = Database::open(id).unwrap();
    read_version(db.connection(), MARKER).unwrap()
}

/// Brings a fresh store to `version` by running the creation path.
fn store_at(dir: &TempDir, version: Version) -> StoreId {
    let id = store(dir);
    Migrator::new(id.clone(), logging_scripts())
        .migrate(&version)
        .unwrap();
    id
}

// =============================================================================
// Creation Path
// =============================================================================

#[test]
fn test_absent_store_is_created_at_target() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let migrator = Migrator::new(id.clone(), logging_scripts());
    assert!(!migrator.exists().unwrap());

    let report = migrator.migrate(&Version::new(1, 0)).unwrap();
    assert_eq!(report.outcome, MigrationOutcome::Created);
    assert_eq!(report.previous_version, None);
    assert_eq!(report.version, Version::new(1, 0));
    assert_eq!(report.creation_scripts_applied, 2);
    assert!(report.alter_scripts_applied.is_empty());

    assert!(migrator.exists().unwrap());
    assert_eq!(stored_version(&id), Some(Version::new(1, 0)));
    let db = Database::open(&id).unwrap();
    assert!(table_exists(db.connection(), "log").unwrap());
    assert!(table_exists(db.connection(), "users").unwrap());
}

#[test]
fn test_creation_path_skips_alter_scripts() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE Foo (id INTEGER PRIMARY KEY)")
        .with_alter(Version::new(1, 0), "CREATE TABLE Bar (id INTEGER)")
        .with_alter(Version::new(2, 0), "CREATE TABLE Baz (id INTEGER)");

    let report = Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(2, 0))
        .unwrap();
    assert_eq!(report.outcome, MigrationOutcome::Created);

    let db = Database::open(&id).unwrap();
    let tables = list_tables(db.connection()).unwrap();
    assert!(tables.contains(&"Foo".to_string()));
    assert!(!tables.contains(&"Bar".to_string()));
    assert!(!tables.contains(&"Baz".to_string()));
    assert_eq!(stored_version(&id), Some(Version::new(2, 0)));
}

#[test]
fn test_failed_first_run_leaves_store_absent() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE ok (id INTEGER)")
        .with_creation("CREATE TABLE broken (");

    let err = Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(1, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Statement {
            target: ScriptTarget::Creation { index: 1 },
            ..
        }
    ));
    assert!(!id.exists().unwrap());
}

#[test]
fn test_store_without_marker_takes_creation_path() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    id.create().unwrap();

    let report = Migrator::new(id.clone(), logging_scripts())
        .migrate(&Version::new(1, 5))
        .unwrap();
    assert_eq!(report.outcome, MigrationOutcome::Created);
    assert_eq!(stored_version(&id), Some(Version::new(1, 5)));
    assert!(log_entries(&id).is_empty());
}

#[test]
fn test_invalid_scripts_are_rejected_before_touching_store() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE t (id INTEGER)")
        .with_alter(Version::new(1, 1), "SELECT 1")
        .with_alter(Version::new(1, 1), "SELECT 2");

    let err = Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(1, 1))
        .unwrap_err();
    match err {
        MigrationError::InvalidScripts(problems) => {
            assert_eq!(
                problems,
                vec![ValidationError::DuplicateVersion(Version::new(1, 1))]
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!id.exists().unwrap());
}

// =============================================================================
// Alter Path
// =============================================================================

#[test]
fn test_upgrade_applies_pending_scripts_in_version_order() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));

    let report = Migrator::new(id.clone(), logging_scripts())
        .migrate(&Version::new(2, 0))
        .unwrap();
    assert_eq!(report.outcome, MigrationOutcome::Upgraded);
    assert_eq!(report.previous_version, Some(Version::new(1, 0)));
    assert_eq!(
        report.alter_scripts_applied,
        vec![Version::new(1, 5), Version::new(2, 0)]
    );
    assert_eq!(log_entries(&id), vec!["B", "C"]);
    assert_eq!(stored_version(&id), Some(Version::new(2, 0)));
}

#[test]
fn test_partial_upgrade_stops_at_target() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));
    let migrator = Migrator::new(id.clone(), logging_scripts());

    migrator.migrate(&Version::new(1, 5)).unwrap();
    assert_eq!(log_entries(&id), vec!["B"]);

    migrator.migrate(&Version::new(2, 0)).unwrap();
    assert_eq!(log_entries(&id), vec!["B", "C"]);
}

#[test]
fn test_lower_or_equal_target_is_noop() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 5));
    let migrator = Migrator::new(id.clone(), logging_scripts());

    for target in [Version::new(1, 5), Version::new(1, 0)] {
        let report = migrator.migrate(&target).unwrap();
        assert_eq!(report.outcome, MigrationOutcome::UpToDate);
        assert_eq!(report.version, Version::new(1, 5));
    }
    assert!(log_entries(&id).is_empty());
    assert_eq!(stored_version(&id), Some(Version::new(1, 5)));
}

#[test]
fn test_failing_alter_script_rolls_back_everything() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));
    let scripts = logging_scripts()
        .with_alter(Version::new(1, 7), "ALTER TABLE users ADD COLUMN email TEXT")
        .with_alter(Version::new(1, 8), "ALTER TABLE missing ADD COLUMN x TEXT");

    let err = Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(2, 0))
        .unwrap_err();
    match &err {
        MigrationError::Statement { target, .. } => {
            assert_eq!(*target, ScriptTarget::Alter(Version::new(1, 8)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("1.8"));

    assert!(log_entries(&id).is_empty());
    assert_eq!(stored_version(&id), Some(Version::new(1, 0)));
    let db = Database::open(&id).unwrap();
    assert!(!sqlite_wrapper::column_exists(db.connection(), "users", "email").unwrap());
}

#[test]
fn test_marker_write_failure_rolls_back_alter_scripts() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    id.create().unwrap();
    {
        // Marker table from an older layout without `updated_at`.
        let conn = rusqlite::Connection::open(id.path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (id INTEGER PRIMARY KEY, version TEXT NOT NULL);
             INSERT INTO schema_version (id, version) VALUES (1, '1.0');
             CREATE TABLE t (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
    }
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE t (id INTEGER PRIMARY KEY)")
        .with_alter(Version::new(1, 1), "ALTER TABLE t ADD COLUMN x TEXT");

    let err = Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(1, 1))
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::VersionRecordFailure { version, .. } if version == Version::new(1, 1)
    ));

    let db = Database::open(&id).unwrap();
    assert!(!sqlite_wrapper::column_exists(db.connection(), "t", "x").unwrap());
    assert_eq!(
        read_version(db.connection(), MARKER).unwrap(),
        Some(Version::new(1, 0))
    );
}

#[test]
fn test_migrate_twice_equals_once() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));
    let migrator = Migrator::new(id.clone(), logging_scripts());

    let first = migrator.migrate(&Version::new(2, 0)).unwrap();
    let second = migrator.migrate(&Version::new(2, 0)).unwrap();
    assert_eq!(first.outcome, MigrationOutcome::Upgraded);
    assert_eq!(second.outcome, MigrationOutcome::UpToDate);
    assert_eq!(log_entries(&id), vec!["B", "C"]);
}

#[test]
fn test_four_part_versions_order_after_two_part() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE log (entry TEXT NOT NULL)")
        .with_alter("1.0.0.1".parse().unwrap(), "INSERT INTO log VALUES ('patch')")
        .with_alter(Version::new(1, 1), "INSERT INTO log VALUES ('minor')");

    Migrator::new(id.clone(), scripts)
        .migrate(&Version::new(1, 1))
        .unwrap();
    assert_eq!(log_entries(&id), vec!["patch", "minor"]);
}

// =============================================================================
// Options, Status and Concurrency
// =============================================================================

#[test]
fn test_custom_version_table() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let migrator = Migrator::new(id.clone(), logging_scripts())
        .with_version_table("app_meta")
        .unwrap()
        .vacuum_after_migrate(true);
    let report = migrator.migrate(&Version::new(1, 0)).unwrap();
    assert!(report.vacuumed);

    let db = Database::open(&id).unwrap();
    assert!(table_exists(db.connection(), "app_meta").unwrap());
    assert!(!table_exists(db.connection(), MARKER).unwrap());
    assert_eq!(
        read_version(db.connection(), "app_meta").unwrap(),
        Some(Version::new(1, 0))
    );
}

#[test]
fn test_status_through_lifecycle() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let migrator = Migrator::new(id.clone(), logging_scripts());

    let status = migrator.status().unwrap();
    assert!(!status.exists);
    assert!(status.needs_creation());
    assert!(!id.exists().unwrap());

    migrator.migrate(&Version::new(1, 0)).unwrap();
    let status = migrator.status().unwrap();
    assert!(status.exists);
    assert_eq!(status.version, Some(Version::new(1, 0)));
    assert_eq!(status.pending, vec![Version::new(1, 5), Version::new(2, 0)]);

    migrator.migrate(&Version::new(2, 0)).unwrap();
    assert!(migrator.status().unwrap().pending.is_empty());
}

#[test]
fn test_status_serializes_versions_as_strings() {
    let dir = TempDir::new().unwrap();
    let id = store_at(&dir, Version::new(1, 0));
    let status = Migrator::new(id, logging_scripts()).status().unwrap();
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["version"], "1.0");
    assert_eq!(json["pending"], serde_json::json!(["1.5", "2.0"]));
}

#[test]
fn test_concurrent_migrators_apply_creation_once() {
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let id = id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let scripts = logging_scripts().with_creation("INSERT INTO log VALUES ('created')");
                barrier.wait();
                Migrator::new(id, scripts).migrate(&Version::new(1, 0))
            })
        })
        .collect();

    let mut outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().outcome)
        .collect();
    outcomes.sort_by_key(|o| format!("{o:?}"));
    assert_eq!(
        outcomes,
        vec![MigrationOutcome::Created, MigrationOutcome::UpToDate]
    );
    assert_eq!(log_entries(&id), vec!["created"]);
}

// =============================================================================
// Scripts From Disk
// =============================================================================

#[test]
fn test_migrate_with_scripts_loaded_from_directory() {
    let scripts_dir = TempDir::new().unwrap();
    let create = scripts_dir.path().join("create");
    let alter = scripts_dir.path().join("alter");
    std::fs::create_dir_all(&create).unwrap();
    std::fs::create_dir_all(&alter).unwrap();
    std::fs::write(
        create.join("001_notes.sql"),
        "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);",
    )
    .unwrap();
    std::fs::write(
        alter.join("1.1__add_title.sql"),
        "ALTER TABLE notes ADD COLUMN title TEXT;",
    )
    .unwrap();

    let repository = ScriptRepository::from_dir(scripts_dir.path()).unwrap();
    let dir = TempDir::new().unwrap();
    let id = store(&dir);
    let migrator = Migrator::new(id.clone(), repository);

    migrator.migrate(&Version::new(1, 0)).unwrap();
    let report = migrator.migrate(&Version::new(1, 1)).unwrap();
    assert_eq!(report.alter_scripts_applied, vec![Version::new(1, 1)]);

    let db = Database::open(&id).unwrap();
    crud::insert(
        db.connection(),
        "notes",
        &[
            ("body", Value::Text("hello".into())),
            ("title", Value::Text("greeting".into())),
        ],
    )
    .unwrap();
    assert_eq!(crud::count_rows(db.connection(), "notes").unwrap(), 1);
}
