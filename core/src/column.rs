//! Engine-neutral column descriptors.
//!
//! [`ColumnDef`] describes a column by name, logical type and constraints.
//! Turning it into DDL is the storage backend's job.

use serde::{Deserialize, Serialize};

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    DateTime,
}

/// Default value attached to a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

/// Description of a single table column.
///
/// Columns are nullable by default. Use the builder methods to tighten
/// constraints.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::{ColumnDef, ColumnType, DefaultValue};
///
/// let id = ColumnDef::new("id", ColumnType::Integer).identity();
/// let title = ColumnDef::new("title", ColumnType::Text)
///     .not_null()
///     .with_size(120)
///     .with_default(DefaultValue::Text("untitled".into()));
///
/// assert!(id.identity);
/// assert!(!title.nullable);
/// assert_eq!(title.size, Some(120));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    /// Declared size. Informational for engines without sized types.
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Auto-incrementing primary key.
    #[serde(default)]
    pub identity: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            size: None,
            nullable: true,
            identity: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as an auto-incrementing primary key. Identity
    /// columns are never nullable.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.nullable = false;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_is_nullable() {
        let col = ColumnDef::new("name", ColumnType::Text);
        assert!(col.nullable);
        assert!(!col.identity);
        assert!(col.default.is_none());
    }

    #[test]
    fn test_identity_implies_not_null() {
        let col = ColumnDef::new("id", ColumnType::Integer).identity();
        assert!(col.identity);
        assert!(!col.nullable);
    }

    #[test]
    fn test_deserialize_defaults_nullable() {
        let col: ColumnDef =
            serde_json::from_str(r#"{"name":"x","column_type":"Boolean"}"#).unwrap();
        assert!(col.nullable);
        assert_eq!(col.column_type, ColumnType::Boolean);
    }
}
