//! Store identifiers and the owned database handle.
//!
//! A [`StoreId`] names a SQLite file as a directory plus a file name.
//! [`Database`] owns one open connection to that file. There is no global
//! instance: the application creates the handle, passes it where it is
//! needed, and drops it to close the connection.
//!
//! # Example
//!
//! ```no_run
//! use sqlite_wrapper::{Database, StoreId};
//!
//! let id = StoreId::new("/var/lib/notes", "notes.db");
//! let db = if id.exists().unwrap() {
//!     Database::open(&id).unwrap()
//! } else {
//!     Database::create(&id).unwrap()
//! };
//! db.vacuum().unwrap();
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::{Result, StorageError};

/// How long a connection waits for another writer before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Identifies a store file by directory and file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId {
    directory: PathBuf,
    name: String,
}

impl StoreId {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
        }
    }

    /// Splits a full file path into directory and name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidIdentifier`] if the path has no file
    /// name component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidIdentifier(path.display().to_string()))?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::new(directory, name))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the store file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    /// Checks that the identifier is well formed.
    ///
    /// The name must be a plain file name: non-empty, not `.` or `..`, and
    /// free of path separators and NUL bytes. The directory must not be
    /// empty.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        let bad_name = name.trim().is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if bad_name || self.directory.as_os_str().is_empty() {
            return Err(StorageError::InvalidIdentifier(
                self.path().display().to_string(),
            ));
        }
        Ok(())
    }

    /// Reports whether the store file exists. No side effects.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidIdentifier`] for a malformed identifier.
    pub fn exists(&self) -> Result<bool> {
        self.validate()?;
        Ok(self.path().is_file())
    }

    /// Creates an empty store file.
    ///
    /// SQLite treats a zero-length file as an empty database, so the file is
    /// usable as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if the file exists, or
    /// [`StorageError::IoFailure`] if the file system rejects the creation
    /// (missing directory, permissions, disk full).
    pub fn create(&self) -> Result<()> {
        self.validate()?;
        let path = self.path();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(path = %path.display(), "Created store file");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path))
            }
            Err(source) => Err(StorageError::IoFailure { path, source }),
        }
    }
}

/// An open connection to a store.
///
/// Foreign keys are enforced and a busy timeout is set, so a second writer
/// waits for the first instead of failing immediately.
pub struct Database {
    conn: Connection,
    id: StoreId,
}

impl Database {
    /// Opens an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist, or
    /// [`StorageError::Database`] if SQLite cannot open it.
    pub fn open(id: &StoreId) -> Result<Self> {
        if !id.exists()? {
            return Err(StorageError::NotFound(id.path()));
        }
        let conn = Connection::open_with_flags(
            id.path(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            id: id.clone(),
        })
    }

    /// Creates a new store file and opens it.
    ///
    /// # Errors
    ///
    /// See [`StoreId::create`] and [`Database::open`].
    pub fn create(id: &StoreId) -> Result<Self> {
        id.create()?;
        Self::open(id)
    }

    /// Returns the identifier this handle was opened with.
    pub fn id(&self) -> &StoreId {
        &self.id
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begins an atomic scope.
    ///
    /// The transaction takes the write lock immediately, so concurrent
    /// writers serialize at the start of the scope. Dropping the returned
    /// transaction without committing rolls it back.
    pub fn scope(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Rebuilds the database file to release unused pages.
    ///
    /// Must not be called while a scope is open.
    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM;")?;
        debug!(path = %self.id.path().display(), "Vacuumed store");
        Ok(())
    }

    /// Closes the connection and removes the store file.
    ///
    /// Returns `false` if the file was already gone.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the connection cannot be
    /// closed, or [`StorageError::IoFailure`] if the file cannot be removed.
    pub fn delete(self) -> Result<bool> {
        let Self { conn, id } = self;
        conn.close().map_err(|(_, err)| StorageError::Database(err))?;
        let path = id.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::IoFailure { path, source }),
        }
    }

    /// Consumes the handle and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }
}
