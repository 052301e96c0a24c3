//! Error types for store and migration operations.
//!
//! [`StorageError`] covers the store handle, CRUD and schema helpers.
//! [`MigrationError`] covers the migration coordinator and always names the
//! script that caused a failure.

use std::path::PathBuf;

use sqlite_wrapper_core::{ScriptTarget, ValidationError, Version};
use thiserror::Error;

/// Errors raised by the store handle and the CRUD/schema helpers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Store name or SQL identifier is malformed.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Store file already exists.
    #[error("database '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Store file does not exist.
    #[error("database '{}' not found", .0.display())]
    NotFound(PathBuf),

    /// The file system rejected an operation on the store file.
    #[error("I/O failure on '{}': {source}", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// SQLite operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("column '{column}' already exists in table '{table}'")]
    ColumnAlreadyExists { table: String, column: String },

    /// Column list is empty or a column cannot be expressed in SQLite.
    #[error("invalid column definition: {0}")]
    InvalidColumns(String),
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            other => Self::InvalidIdentifier(other.to_string()),
        }
    }
}

/// Errors raised by the migration coordinator.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Store could not be located, created, or opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Scripts failed validation; nothing was executed.
    #[error("invalid scripts: {}", format_validation(.0))]
    InvalidScripts(Vec<ValidationError>),

    /// A script failed to execute. The enclosing transaction was rolled back.
    #[error("{target} failed: {source}")]
    Statement {
        target: ScriptTarget,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Writing the version marker failed after the scripts ran. The
    /// enclosing transaction was rolled back together with the scripts.
    #[error("failed to record version {version}: {source}")]
    VersionRecordFailure {
        version: Version,
        #[source]
        source: rusqlite::Error,
    },

    /// Attempted to record a version lower than the stored one.
    #[error("refusing to move store version back from {current} to {requested}")]
    VersionRegression { current: Version, requested: Version },

    /// The stored marker is not a valid version string.
    #[error("stored version marker '{0}' is not a valid version")]
    CorruptVersionMarker(String),

    /// Transaction or marker-table failure outside of any script.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`StorageError`].
pub type Result<T> = std::result::Result<T, StorageError>;
