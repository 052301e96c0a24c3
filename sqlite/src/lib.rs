//! Version-driven SQLite store management.
//!
//! This crate keeps a SQLite file at the schema version an application
//! expects. Given a set of creation scripts and versioned alter scripts, a
//! [`Migrator`] creates the store on first run or applies the pending alter
//! scripts on later runs, recording the reached version in a single-row
//! marker table. Each run is one transaction: a failure leaves the store as
//! it was.
//!
//! # Architecture
//!
//! - **`database`**: store identifiers and the owned connection handle
//! - **`migration`**: the coordinator and the script-application steps
//! - **`marker`**: reading and recording the stored version
//! - **`schema`**: table and column helpers with validated identifiers
//! - **`crud`**: parameter-bound row operations
//!
//! # Quick start
//!
//! ```no_run
//! use sqlite_wrapper::{Migrator, MigrationOutcome, StoreId};
//! use sqlite_wrapper_core::{ScriptSet, Version};
//!
//! let scripts = ScriptSet::new()
//!     .with_creation("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)")
//!     .with_alter(Version::new(1, 1), "ALTER TABLE users ADD COLUMN email TEXT");
//!
//! let migrator = Migrator::new(StoreId::new("data", "app.db"), scripts);
//! let report = migrator.migrate(&Version::new(1, 1)).unwrap();
//! if report.outcome == MigrationOutcome::Created {
//!     println!("new store at {}", report.version);
//! }
//! ```
//!
//! # Concurrency
//!
//! Migrations open their scope with `BEGIN IMMEDIATE` and wait up to five
//! seconds for the write lock. Two processes migrating the same file run
//! one after the other; the second sees the version the first recorded.

pub mod crud;
mod database;
mod error;
mod marker;
mod migration;
mod schema;

pub use database::{Database, StoreId};
pub use error::{MigrationError, Result, StorageError};
pub use marker::{read_version, record_version};
pub use migration::{
    MigrationOutcome, MigrationReport, MigrationStatus, Migrator, apply_alter_scripts,
    apply_creation_scripts,
};
pub use schema::{
    add_column, add_table, column_exists, column_sql, create_table_sql, drop_table, list_tables,
    table_exists,
};
pub use sqlite_wrapper_core::DEFAULT_VERSION_TABLE;
