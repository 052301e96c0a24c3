use serde::{Deserialize, Serialize};

use crate::{AlterScript, DatabaseScripts, ScriptSet};

/// Serializable script bundle used for distribution.
///
/// A package carries the creation and alter scripts of one store together
/// with descriptive metadata, so a whole migration history can ship as a
/// single JSON or YAML file.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::*;
///
/// let mut package = ScriptPackage::new("1.0");
/// package.name = Some("notes".into());
/// package.creation.push("CREATE TABLE notes (id INTEGER PRIMARY KEY)".into());
/// package.alter.push(AlterScript::new(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN body TEXT"));
///
/// assert_eq!(package.script_count(), 2);
/// let scripts: ScriptSet = package.into_script_set();
/// assert_eq!(scripts.alter.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPackage {
    /// Package format version.
    pub format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional SHA-256 hex digest of the package scripts, checked on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_hash: Option<String>,
    #[serde(default)]
    pub creation: Vec<String>,
    #[serde(default)]
    pub alter: Vec<AlterScript>,
}

impl ScriptPackage {
    pub fn new(format_version: impl Into<String>) -> Self {
        Self {
            format_version: format_version.into(),
            name: None,
            description: None,
            bundle_hash: None,
            creation: Vec::new(),
            alter: Vec::new(),
        }
    }

    /// Wraps an existing script set.
    pub fn from_script_set(format_version: impl Into<String>, scripts: ScriptSet) -> Self {
        let mut package = Self::new(format_version);
        package.creation = scripts.creation;
        package.alter = scripts.alter;
        package
    }

    /// Total number of creation and alter scripts.
    pub fn script_count(&self) -> usize {
        self.creation.len() + self.alter.len()
    }

    /// Drops the metadata and keeps the scripts.
    pub fn into_script_set(self) -> ScriptSet {
        ScriptSet {
            creation: self.creation,
            alter: self.alter,
        }
    }
}

impl DatabaseScripts for ScriptPackage {
    fn creation_scripts(&self) -> &[String] {
        &self.creation
    }

    fn alter_scripts(&self) -> &[AlterScript] {
        &self.alter
    }
}
