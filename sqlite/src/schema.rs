//! Schema helpers: DDL generation and existence checks.
//!
//! [`column_sql`] translates an engine-neutral [`ColumnDef`] into a SQLite
//! column definition. The remaining helpers create, extend, drop, and
//! inspect tables. Existence is always answered by querying the catalog,
//! never by running a statement and watching it fail.
//!
//! All helpers take a [`Connection`]; pass a [`Transaction`] (which
//! dereferences to one) to run them inside an atomic scope.
//!
//! [`Transaction`]: rusqlite::Transaction
//!
//! # Type mapping
//!
//! | `ColumnType` | SQLite |
//! |---|---|
//! | `Text` | `TEXT` |
//! | `Integer` | `INTEGER` |
//! | `Real` | `NUMERIC` |
//! | `Boolean` | `INTEGER` (defaults to `0`) |
//! | `DateTime` | `DATETIME` |

use rusqlite::{Connection, OptionalExtension};
use sqlite_wrapper_core::{ColumnDef, ColumnType, DefaultValue, validate_identifier};

use crate::error::{Result, StorageError};

/// Validates an identifier and returns it double-quoted for SQL.
pub(crate) fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{name}\""))
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Text => "TEXT",
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Real => "NUMERIC",
        ColumnType::DateTime => "DATETIME",
    }
}

/// Renders a default value as a SQL literal.
fn default_literal(value: &DefaultValue) -> Result<String> {
    match value {
        DefaultValue::Text(text) => Ok(format!("'{}'", text.replace('\'', "''"))),
        DefaultValue::Integer(n) => Ok(n.to_string()),
        DefaultValue::Real(x) if x.is_finite() => Ok(format!("{x:?}")),
        DefaultValue::Real(x) => Err(StorageError::InvalidColumns(format!(
            "default {x} is not a finite number"
        ))),
        DefaultValue::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
    }
}

/// Translates a column descriptor into a SQLite column definition.
///
/// # Errors
///
/// Returns [`StorageError::InvalidIdentifier`] for a bad column name, or
/// [`StorageError::InvalidColumns`] when an identity column is not an
/// integer or a default cannot be written as a literal.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper::column_sql;
/// use sqlite_wrapper_core::{ColumnDef, ColumnType, DefaultValue};
///
/// let id = ColumnDef::new("id", ColumnType::Integer).identity();
/// assert_eq!(column_sql(&id).unwrap(), r#""id" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"#);
///
/// let title = ColumnDef::new("title", ColumnType::Text)
///     .not_null()
///     .with_default(DefaultValue::Text("it's new".into()));
/// assert_eq!(column_sql(&title).unwrap(), r#""title" TEXT NOT NULL DEFAULT 'it''s new'"#);
/// ```
pub fn column_sql(column: &ColumnDef) -> Result<String> {
    let mut parts = vec![quote_identifier(&column.name)?, sql_type(column.column_type).to_string()];

    if column.identity {
        if column.column_type != ColumnType::Integer {
            return Err(StorageError::InvalidColumns(format!(
                "identity column '{}' must be an integer",
                column.name
            )));
        }
        parts.push("PRIMARY KEY AUTOINCREMENT".to_string());
    }

    parts.push(if column.nullable { "NULL" } else { "NOT NULL" }.to_string());

    match &column.default {
        Some(value) => parts.push(format!("DEFAULT {}", default_literal(value)?)),
        None if column.column_type == ColumnType::Boolean => parts.push("DEFAULT 0".to_string()),
        None => {}
    }

    Ok(parts.join(" "))
}

/// Generates a `CREATE TABLE` statement.
///
/// # Errors
///
/// Returns [`StorageError::InvalidColumns`] if `columns` is empty or a column
/// is invalid, or [`StorageError::InvalidIdentifier`] for a bad name.
pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> Result<String> {
    let table = quote_identifier(table)?;
    if columns.is_empty() {
        return Err(StorageError::InvalidColumns(format!(
            "table {table} needs at least one column"
        )));
    }
    let columns = columns
        .iter()
        .map(column_sql)
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("CREATE TABLE {table} ({})", columns.join(", ")))
}

/// Returns `true` if a table named `table` exists.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    validate_identifier(table)?;
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Returns `true` if `table` exists and has a column named `column`.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    validate_identifier(table)?;
    validate_identifier(column)?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Creates a table from column descriptors.
///
/// # Errors
///
/// Returns [`StorageError::TableAlreadyExists`] if the table exists.
pub fn add_table(conn: &Connection, table: &str, columns: &[ColumnDef]) -> Result<()> {
    if table_exists(conn, table)? {
        return Err(StorageError::TableAlreadyExists(table.to_string()));
    }
    let sql = create_table_sql(table, columns)?;
    conn.execute_batch(&sql)?;
    Ok(())
}

/// Adds a column to an existing table.
///
/// # Errors
///
/// Returns [`StorageError::TableNotFound`] if the table is missing, or
/// [`StorageError::ColumnAlreadyExists`] if the column is already present.
pub fn add_column(conn: &Connection, table: &str, column: &ColumnDef) -> Result<()> {
    if !table_exists(conn, table)? {
        return Err(StorageError::TableNotFound(table.to_string()));
    }
    if column_exists(conn, table, &column.name)? {
        return Err(StorageError::ColumnAlreadyExists {
            table: table.to_string(),
            column: column.name.clone(),
        });
    }
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_identifier(table)?,
        column_sql(column)?
    );
    conn.execute_batch(&sql)?;
    Ok(())
}

/// Drops a table if it exists.
///
/// Returns `true` when the table is gone afterwards.
pub fn drop_table(conn: &Connection, table: &str) -> Result<bool> {
    let quoted = quote_identifier(table)?;
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {quoted}"))?;
    Ok(!table_exists(conn, table)?)
}

/// Lists user tables in name order, excluding SQLite's internal tables.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}
