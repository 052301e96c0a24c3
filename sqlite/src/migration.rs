//! Version-driven schema migration.
//!
//! [`Migrator`] decides, for a store and a target version, whether the store
//! must be created from its creation scripts or upgraded with its pending
//! alter scripts, and applies the chosen statements together with the
//! version marker in one transaction.
//!
//! # Lifecycle
//!
//! ```text
//! Absent ──migrate(v)──▶ AtVersion(v) ──migrate(v2 > v)──▶ AtVersion(v2)
//!                             │
//!                             └──migrate(v2 <= v)──▶ AtVersion(v)   (no-op)
//! ```
//!
//! A first run applies only the creation scripts; alter scripts are for
//! stores that already carry a version. A failed run leaves the store as it
//! was: the transaction is rolled back, and a store file created by the
//! failed run is removed again.
//!
//! # Example
//!
//! ```no_run
//! use sqlite_wrapper::{Migrator, StoreId};
//! use sqlite_wrapper_core::{ScriptSet, Version};
//!
//! let scripts = ScriptSet::new()
//!     .with_creation("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, title TEXT)")
//!     .with_alter(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN title TEXT");
//!
//! let migrator = Migrator::new(StoreId::new("/var/lib/notes", "notes.db"), scripts);
//! let report = migrator.migrate(&Version::new(1, 1)).unwrap();
//! println!("{:?}: now at {}", report.outcome, report.version);
//! ```

use rusqlite::Transaction;
use serde::Serialize;
use sqlite_wrapper_core::{
    AlterScript, DEFAULT_VERSION_TABLE, DatabaseScripts, ScriptTarget, Version, pending_scripts,
    validate_identifier, validate_scripts,
};
use tracing::{debug, info, warn};

use crate::database::{Database, StoreId};
use crate::error::{MigrationError, StorageError};
use crate::marker::{read_version, record_version};

/// Executes every creation script inside `tx`, in order.
///
/// Returns the number of scripts executed. On failure the caller must drop
/// `tx` without committing so that no partial schema survives.
///
/// # Errors
///
/// Returns [`MigrationError::Statement`] naming the first failing script.
pub fn apply_creation_scripts(
    tx: &Transaction<'_>,
    scripts: &[String],
) -> Result<usize, MigrationError> {
    for (index, statement) in scripts.iter().enumerate() {
        let target = ScriptTarget::Creation { index };
        debug!(script = %target, "Applying script");
        run_statement(tx, target, statement)?;
    }
    Ok(scripts.len())
}

/// Executes the alter scripts with `current < version <= target` inside
/// `tx`, by ascending version.
///
/// Returns the versions applied, in order. An empty selection succeeds
/// without executing anything.
///
/// # Errors
///
/// Returns [`MigrationError::Statement`] naming the version of the failing
/// script.
pub fn apply_alter_scripts(
    tx: &Transaction<'_>,
    current: &Version,
    target: &Version,
    scripts: &[AlterScript],
) -> Result<Vec<Version>, MigrationError> {
    let pending = pending_scripts(scripts, Some(current), target);
    let mut applied = Vec::with_capacity(pending.len());
    for script in pending {
        let script_target = ScriptTarget::Alter(script.version);
        debug!(script = %script_target, "Applying script");
        run_statement(tx, script_target, &script.statement)?;
        applied.push(script.version);
    }
    Ok(applied)
}

fn run_statement(
    tx: &Transaction<'_>,
    target: ScriptTarget,
    statement: &str,
) -> Result<(), MigrationError> {
    tx.execute_batch(statement)
        .map_err(|source| MigrationError::Statement {
            target,
            statement: statement.to_string(),
            source,
        })
}

/// Runs `VACUUM` on a store whose migration is already committed.
///
/// A failure is logged and reported as `false`; the committed version stays.
fn vacuum_committed(db: &Database) -> bool {
    match db.vacuum() {
        Ok(()) => true,
        Err(err) => {
            warn!(
                store = %db.id().path().display(),
                error = %err,
                "Vacuum after migration failed; migration remains committed"
            );
            false
        }
    }
}

/// What a call to [`Migrator::migrate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationOutcome {
    /// The store was initialized from its creation scripts.
    Created,
    /// Pending alter scripts were applied.
    Upgraded,
    /// The store was already at or above the target version.
    UpToDate,
}

/// Report of a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    /// Version recorded before the run; `None` for a fresh store.
    pub previous_version: Option<Version>,
    /// Version recorded after the run.
    pub version: Version,
    /// Number of creation scripts executed.
    pub creation_scripts_applied: usize,
    /// Alter script versions executed, in order.
    pub alter_scripts_applied: Vec<Version>,
    /// Whether `VACUUM` ran after the commit. A failed vacuum leaves this
    /// `false` without failing the migration.
    pub vacuumed: bool,
}

/// Snapshot of a store's migration state.
///
/// Returned by [`Migrator::status`]. Reading the status never creates or
/// modifies the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Whether the store file exists.
    pub exists: bool,
    /// Recorded version; `None` if the store is absent or uninitialized.
    pub version: Option<Version>,
    /// Alter script versions above the recorded version, ascending. Empty
    /// when the store still needs its creation scripts.
    pub pending: Vec<Version>,
}

impl MigrationStatus {
    /// `true` when the next migration will run the creation scripts.
    pub fn needs_creation(&self) -> bool {
        self.version.is_none()
    }
}

/// Creates and upgrades one store from a set of scripts.
///
/// The migrator owns the store identifier and the scripts; every call opens
/// its own connection and closes it before returning. Each run happens in a
/// single `BEGIN IMMEDIATE` transaction, so concurrent migrators on the same
/// file take turns.
pub struct Migrator<S> {
    store: StoreId,
    scripts: S,
    version_table: String,
    vacuum: bool,
}

impl<S: DatabaseScripts> Migrator<S> {
    pub fn new(store: StoreId, scripts: S) -> Self {
        Self {
            store,
            scripts,
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            vacuum: false,
        }
    }

    /// Uses `table` instead of [`DEFAULT_VERSION_TABLE`] for the marker.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidIdentifier`] for an invalid name.
    pub fn with_version_table(mut self, table: impl Into<String>) -> Result<Self, StorageError> {
        let table = table.into();
        validate_identifier(&table)?;
        self.version_table = table;
        Ok(self)
    }

    /// Runs `VACUUM` after every migration that changed the store. A vacuum
    /// failure is logged and shows up as [`MigrationReport::vacuumed`]
    /// being `false`; it never fails the migration.
    pub fn vacuum_after_migrate(mut self, enabled: bool) -> Self {
        self.vacuum = enabled;
        self
    }

    pub fn store(&self) -> &StoreId {
        &self.store
    }

    pub fn scripts(&self) -> &S {
        &self.scripts
    }

    pub fn version_table(&self) -> &str {
        &self.version_table
    }

    /// Reports whether the store file exists.
    pub fn exists(&self) -> Result<bool, StorageError> {
        self.store.exists()
    }

    /// Creates an empty store file.
    pub fn create(&self) -> Result<(), StorageError> {
        self.store.create()
    }

    /// Brings the store to `target`.
    ///
    /// - Absent store (or one without a version marker): runs the creation
    ///   scripts and records `target`.
    /// - Store below `target`: runs the alter scripts in
    ///   `(recorded, target]` by ascending version and records `target`.
    /// - Store at or above `target`: does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::InvalidScripts`] before touching the store
    /// if the scripts fail validation. Any other error leaves the store as
    /// it was before the call.
    pub fn migrate(&self, target: &Version) -> Result<MigrationReport, MigrationError> {
        let problems = validate_scripts(&self.scripts);
        if !problems.is_empty() {
            return Err(MigrationError::InvalidScripts(problems));
        }

        let report = if self.store.exists()? {
            self.migrate_file(target, false)?
        } else {
            match self.store.create() {
                Ok(()) => self.migrate_file(target, true)?,
                // Lost the creation race to another migrator.
                Err(StorageError::AlreadyExists(_)) => self.migrate_file(target, false)?,
                Err(err) => return Err(err.into()),
            }
        };

        match report.outcome {
            MigrationOutcome::Created => info!(
                store = %self.store.path().display(),
                version = %report.version,
                scripts = report.creation_scripts_applied,
                "Store created"
            ),
            MigrationOutcome::Upgraded => info!(
                store = %self.store.path().display(),
                from = ?report.previous_version.map(|v| v.to_string()),
                to = %report.version,
                scripts = report.alter_scripts_applied.len(),
                "Store upgraded"
            ),
            MigrationOutcome::UpToDate => info!(
                store = %self.store.path().display(),
                version = %report.version,
                "Store is up to date"
            ),
        }

        Ok(report)
    }

    /// Reads the store's current migration state.
    pub fn status(&self) -> Result<MigrationStatus, MigrationError> {
        if !self.store.exists()? {
            return Ok(MigrationStatus {
                exists: false,
                version: None,
                pending: Vec::new(),
            });
        }

        let db = Database::open(&self.store)?;
        let version = read_version(db.connection(), &self.version_table)?;
        let pending = match &version {
            Some(current) => {
                let mut pending: Vec<Version> = self
                    .scripts
                    .alter_scripts()
                    .iter()
                    .map(|s| s.version)
                    .filter(|v| v > current)
                    .collect();
                pending.sort();
                pending
            }
            None => Vec::new(),
        };

        Ok(MigrationStatus {
            exists: true,
            version,
            pending,
        })
    }

    /// Migrates a store file that exists. `fresh` marks a file created by
    /// this call, which is removed again if the run fails.
    fn migrate_file(
        &self,
        target: &Version,
        fresh: bool,
    ) -> Result<MigrationReport, MigrationError> {
        let result = Database::open(&self.store).map_err(MigrationError::from).and_then(|mut db| {
            let report = self.run_scope(&mut db, target, fresh)?;
            Ok((db, report))
        });
        let (db, mut report) = match result {
            Ok(done) => done,
            Err(err) => {
                if fresh {
                    self.discard_new_store();
                }
                return Err(err);
            }
        };

        if self.vacuum && report.outcome != MigrationOutcome::UpToDate {
            report.vacuumed = vacuum_committed(&db);
        }
        Ok(report)
    }

    /// Reads the marker and applies whatever the store needs, in one
    /// IMMEDIATE transaction.
    fn run_scope(
        &self,
        db: &mut Database,
        target: &Version,
        fresh: bool,
    ) -> Result<MigrationReport, MigrationError> {
        let tx = db.scope()?;
        let report = match read_version(&tx, &self.version_table)? {
            None => {
                if !fresh {
                    warn!(
                        store = %self.store.path().display(),
                        "Store has no version marker; applying creation scripts"
                    );
                }
                self.initialize(&tx, target)?
            }
            Some(current) if *target <= current => {
                return Ok(MigrationReport {
                    outcome: MigrationOutcome::UpToDate,
                    previous_version: Some(current),
                    version: current,
                    creation_scripts_applied: 0,
                    alter_scripts_applied: Vec::new(),
                    vacuumed: false,
                });
            }
            Some(current) => {
                let applied =
                    apply_alter_scripts(&tx, &current, target, self.scripts.alter_scripts())?;
                record_version(&tx, &self.version_table, target)?;
                MigrationReport {
                    outcome: MigrationOutcome::Upgraded,
                    previous_version: Some(current),
                    version: *target,
                    creation_scripts_applied: 0,
                    alter_scripts_applied: applied,
                    vacuumed: false,
                }
            }
        };
        tx.commit()?;
        Ok(report)
    }

    /// Runs the creation scripts and records `target`, all inside `tx`.
    fn initialize(
        &self,
        tx: &Transaction<'_>,
        target: &Version,
    ) -> Result<MigrationReport, MigrationError> {
        let applied = apply_creation_scripts(tx, self.scripts.creation_scripts())?;
        record_version(tx, &self.version_table, target)?;
        Ok(MigrationReport {
            outcome: MigrationOutcome::Created,
            previous_version: None,
            version: *target,
            creation_scripts_applied: applied,
            alter_scripts_applied: Vec::new(),
            vacuumed: false,
        })
    }

    /// Removes a store file created by a run that then failed, unless a
    /// concurrent migrator has initialized it in the meantime.
    fn discard_new_store(&self) {
        let initialized = Database::open(&self.store)
            .map_err(MigrationError::from)
            .and_then(|db| read_version(db.connection(), &self.version_table))
            .is_ok_and(|version| version.is_some());
        if initialized {
            debug!(store = %self.store.path().display(), "Keeping store initialized by another migrator");
            return;
        }

        let path = self.store.path();
        if let Err(err) = std::fs::remove_file(&path) {
            warn!(store = %path.display(), error = %err, "Failed to remove store after failed creation");
        }
    }
}
