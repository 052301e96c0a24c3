//! The single-row table that records a store's schema version.

use rusqlite::{Connection, OptionalExtension, Transaction};
use sqlite_wrapper_core::Version;

use crate::error::MigrationError;
use crate::schema::{quote_identifier, table_exists};

fn version_table_sql(quoted: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {quoted} (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version TEXT NOT NULL,
    updated_at TEXT NOT NULL
);"
    )
}


/// Reads the recorded version.
///
/// Returns `None` when the marker table or its row does not exist, which
/// marks a store that was never initialized.
///
/// # Errors
///
/// Returns [`MigrationError::CorruptVersionMarker`] if the stored text is
/// not a valid version.
pub fn read_version(conn: &Connection, table: &str) -> Result<Option<Version>, MigrationError> {
    if !table_exists(conn, table)? {
        return Ok(None);
    }
    let sql = format!("SELECT version FROM {} WHERE id = 1", quote_identifier(table)?);
    let raw: Option<String> = conn.query_row(&sql, [], |row| row.get(0)).optional()?;
    raw.map(|text| {
        text.parse::<Version>()
            .map_err(|_| MigrationError::CorruptVersionMarker(text.clone()))
    })
    .transpose()
}

/// Records `version` inside the caller's scope.
///
/// The marker only moves forward; recording the version already stored is
/// a no-op write that refreshes `updated_at`.
///
/// # Errors
///
/// Returns [`MigrationError::VersionRegression`] if `version` is lower than
/// the stored one, or [`MigrationError::VersionRecordFailure`] if creating
/// the marker table or writing the row fails.
pub fn record_version(
    tx: &Transaction<'_>,
    table: &str,
    version: &Version,
) -> Result<(), MigrationError> {
    if let Some(current) = read_version(tx, table)? {
        if *version < current {
            return Err(MigrationError::VersionRegression {
                current,
                requested: *version,
            });
        }
    }

    let record_failure = |source: rusqlite::Error| MigrationError::VersionRecordFailure {
        version: *version,
        source,
    };
    let quoted = quote_identifier(table)?;
    tx.execute_batch(&version_table_sql(&quoted)).map_err(record_failure)?;

    let sql = format!(
        "INSERT INTO {quoted} (id, version, updated_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET version = excluded.version, updated_at = excluded.updated_at"
    );
    let updated_at = chrono::Utc::now().to_rfc3339();
    tx.execute(&sql, (version.to_string(), updated_at))
        .map_err(record_failure)?;
    Ok(())
}
