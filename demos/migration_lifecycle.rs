//! Store lifecycle example.
//!
//! Creates a store from creation scripts, upgrades it twice, then uses the
//! schema and CRUD helpers on the migrated tables.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p sqlite-wrapper-demos --example migration_lifecycle
//! ```

use rusqlite::types::Value;
use sqlite_wrapper::{Database, Migrator, StoreId, add_table, crud, list_tables};
use sqlite_wrapper_core::{ColumnDef, ColumnType, DefaultValue, ScriptSet, Version};

fn scripts() -> ScriptSet {
    ScriptSet::new()
        .with_creation("CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)")
        .with_alter(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN title TEXT")
        .with_alter(
            Version::new(1, 2),
            "CREATE INDEX idx_notes_title ON notes (title)",
        )
}

fn main() {
    // === Step 1: Pick a scratch location ===
    let dir = std::env::temp_dir().join(format!("sqlwrap_lifecycle_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let id = StoreId::new(&dir, "notes.db");

    // === Step 2: First run creates the store at 1.0 ===
    println!("=== Migration ===");
    let migrator = Migrator::new(id.clone(), scripts());
    println!("Before: {:?}", migrator.status().unwrap());

    let report = migrator.migrate(&Version::new(1, 0)).unwrap();
    println!(
        "{:?} at {} ({} creation scripts)",
        report.outcome, report.version, report.creation_scripts_applied
    );

    // === Step 3: Later runs apply only the pending alter scripts ===
    for target in [Version::new(1, 1), Version::new(1, 2), Version::new(1, 2)] {
        let report = migrator.migrate(&target).unwrap();
        println!(
            "migrate({target}): {:?}, applied {:?}",
            report.outcome,
            report
                .alter_scripts_applied
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        );
    }

    // === Step 4: Work with the migrated store ===
    println!("\n=== Data ===");
    let db = Database::open(&id).unwrap();
    let conn = db.connection();

    add_table(
        conn,
        "tags",
        &[
            ColumnDef::new("id", ColumnType::Integer).identity(),
            ColumnDef::new("label", ColumnType::Text).not_null(),
            ColumnDef::new("pinned", ColumnType::Boolean)
                .with_default(DefaultValue::Boolean(false)),
        ],
    )
    .unwrap();

    for (body, title) in [("buy milk", "errand"), ("call mom", "family")] {
        crud::insert(
            conn,
            "notes",
            &[
                ("body", Value::Text(body.into())),
                ("title", Value::Text(title.into())),
            ],
        )
        .unwrap();
    }
    crud::insert(conn, "tags", &[("label", Value::Text("home".into()))]).unwrap();

    for table in list_tables(conn).unwrap() {
        println!("{table}: {} rows", crud::count_rows(conn, &table).unwrap());
    }
    println!(
        "Latest note id: {:?}",
        crud::max_value(conn, "notes", "id").unwrap()
    );

    // === Step 5: Cleanup ===
    db.delete().unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
    println!("\nDone.");
}
