//! Script type definitions for schema creation and migration.
//!
//! A store is initialized once from its *creation scripts* and afterwards
//! brought forward by *alter scripts*, each tagged with the version at which
//! it must be applied. The types here are plain data and can round-trip
//! through JSON and YAML.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Version;

/// Name of the table holding a store's recorded version, unless configured
/// otherwise.
pub const DEFAULT_VERSION_TABLE: &str = "schema_version";

/// A schema-changing statement and the version it belongs to.
///
/// An alter script applies to a store whose recorded version is strictly
/// lower than [`version`](AlterScript::version), as long as the version does
/// not exceed the migration target.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::{AlterScript, Version};
///
/// let script = AlterScript::new(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN pinned INTEGER");
/// assert_eq!(script.version.to_string(), "1.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterScript {
    /// Version at which this statement is applied.
    pub version: Version,
    /// SQL text. May contain several `;`-separated statements.
    pub statement: String,
}

impl AlterScript {
    pub fn new(version: Version, statement: impl Into<String>) -> Self {
        Self {
            version,
            statement: statement.into(),
        }
    }
}

/// Identifies a script in error messages and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptTarget {
    /// The creation script at this position.
    Creation { index: usize },
    /// The alter script for this version.
    Alter(Version),
}

impl fmt::Display for ScriptTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creation { index } => write!(f, "creation script #{index}"),
            Self::Alter(version) => write!(f, "alter script {version}"),
        }
    }
}

/// Source of the statements a store is created and migrated with.
///
/// [`ScriptSet`] is the ready-made implementation; applications that build
/// their scripts in code can implement this trait on their own type.
pub trait DatabaseScripts {
    /// Statements that establish the initial schema of an empty store.
    fn creation_scripts(&self) -> &[String];

    /// Version-tagged statements that upgrade an existing store.
    fn alter_scripts(&self) -> &[AlterScript];
}

/// Creation and alter scripts for one store.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::{DatabaseScripts, ScriptSet, Version};
///
/// let scripts = ScriptSet::new()
///     .with_creation("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
///     .with_alter(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN title TEXT");
///
/// assert_eq!(scripts.creation_scripts().len(), 1);
/// assert_eq!(scripts.alter_scripts()[0].version, Version::new(1, 1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSet {
    /// Initial schema statements, executed in order on first run.
    #[serde(default)]
    pub creation: Vec<String>,
    /// Upgrade statements. Order in this list is irrelevant; they are applied
    /// by ascending version.
    #[serde(default)]
    pub alter: Vec<AlterScript>,
}

impl ScriptSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a creation statement.
    pub fn with_creation(mut self, statement: impl Into<String>) -> Self {
        self.creation.push(statement.into());
        self
    }

    /// Appends an alter statement for `version`.
    pub fn with_alter(mut self, version: Version, statement: impl Into<String>) -> Self {
        self.alter.push(AlterScript::new(version, statement));
        self
    }

    /// Returns `true` if there are neither creation nor alter scripts.
    pub fn is_empty(&self) -> bool {
        self.creation.is_empty() && self.alter.is_empty()
    }

    /// Returns the highest alter script version, if any.
    pub fn latest_version(&self) -> Option<Version> {
        self.alter.iter().map(|s| s.version).max()
    }
}

impl DatabaseScripts for ScriptSet {
    fn creation_scripts(&self) -> &[String] {
        &self.creation
    }

    fn alter_scripts(&self) -> &[AlterScript] {
        &self.alter
    }
}
