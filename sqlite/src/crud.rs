//! Row-level helpers: insert, update, delete, and simple reads.
//!
//! Table and column names are validated and quoted; every value and every
//! filter argument is passed as a bound parameter. Filters are SQL fragments
//! written by the caller with `?` placeholders.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use rusqlite::types::Value;
//! use sqlite_wrapper::crud;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)").unwrap();
//!
//! crud::insert(&conn, "notes", &[("body", Value::Text("hello".into()))]).unwrap();
//! crud::update(
//!     &conn,
//!     "notes",
//!     &[("body", Value::Text("hello, world".into()))],
//!     "id = ?",
//!     &[Value::Integer(1)],
//! )
//! .unwrap();
//! assert_eq!(crud::count_rows(&conn, "notes").unwrap(), 1);
//! ```

use std::collections::BTreeMap;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::error::Result;
use crate::schema::quote_identifier;

/// A result row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Inserts one row and returns the number of rows inserted.
///
/// An empty `values` slice inserts nothing and returns `0`.
pub fn insert(conn: &Connection, table: &str, values: &[(&str, Value)]) -> Result<usize> {
    if values.is_empty() {
        return Ok(0);
    }
    let table = quote_identifier(table)?;
    let columns = values
        .iter()
        .map(|(name, _)| quote_identifier(name))
        .collect::<Result<Vec<_>>>()?;
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    );
    Ok(conn.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?)
}

/// Updates rows matching `filter` and returns the number of rows changed.
///
/// `filter` is bound with `filter_args` after the `SET` values. An empty
/// `values` slice changes nothing and returns `0`.
pub fn update(
    conn: &Connection,
    table: &str,
    values: &[(&str, Value)],
    filter: &str,
    filter_args: &[Value],
) -> Result<usize> {
    if values.is_empty() {
        return Ok(0);
    }
    let table = quote_identifier(table)?;
    let assignments = values
        .iter()
        .map(|(name, _)| quote_identifier(name).map(|col| format!("{col} = ?")))
        .collect::<Result<Vec<_>>>()?;
    let sql = format!(
        "UPDATE {table} SET {} WHERE {filter}",
        assignments.join(", ")
    );
    let args = values.iter().map(|(_, v)| v).chain(filter_args.iter());
    Ok(conn.execute(&sql, params_from_iter(args))?)
}

/// Deletes rows matching `filter` and returns the number of rows removed.
pub fn delete(conn: &Connection, table: &str, filter: &str, filter_args: &[Value]) -> Result<usize> {
    let table = quote_identifier(table)?;
    let sql = format!("DELETE FROM {table} WHERE {filter}");
    Ok(conn.execute(&sql, params_from_iter(filter_args.iter()))?)
}

/// Deletes every row of `table` and returns the number of rows removed.
pub fn clear_table(conn: &Connection, table: &str) -> Result<usize> {
    let table = quote_identifier(table)?;
    Ok(conn.execute(&format!("DELETE FROM {table}"), [])?)
}

/// Returns the largest value in `column`, or `None` for an empty table.
pub fn max_value(conn: &Connection, table: &str, column: &str) -> Result<Option<Value>> {
    let sql = format!(
        "SELECT MAX({}) FROM {}",
        quote_identifier(column)?,
        quote_identifier(table)?
    );
    let value: Value = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(match value {
        Value::Null => None,
        other => Some(other),
    })
}

/// Counts the rows of `table`.
pub fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table)?);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Runs a query and collects every row.
pub fn select_rows(conn: &Connection, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            let mut out = Row::new();
            for (i, name) in names.iter().enumerate() {
                out.insert(name.clone(), row.get::<_, Value>(i)?);
            }
            Ok(out)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Runs a query and returns the first column of the first row.
///
/// Returns `None` when the query yields no rows.
pub fn query_scalar(conn: &Connection, sql: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = conn
        .query_row(sql, params_from_iter(args.iter()), |row| row.get::<_, Value>(0))
        .optional()?;
    Ok(value)
}
