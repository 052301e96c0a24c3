//! Migration configuration.
//!
//! Defines the YAML-serializable configuration naming the store to migrate,
//! where its scripts live, and the version to bring it to.
//!
//! # Example YAML
//!
//! ```yaml
//! database:
//!   directory: /var/lib/notes
//!   name: notes.db
//! scripts: db/scripts
//! target_version: "1.2"
//! version_table: schema_version
//! vacuum: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlite_wrapper_core::{DEFAULT_VERSION_TABLE, Version};

use crate::error::Result;

/// Location of the store: a directory and a file name inside it.
///
/// # Examples
///
/// ```
/// # use sqlite_wrapper_scripts::DatabaseLocation;
/// let loc = DatabaseLocation {
///     directory: "/var/lib/notes".into(),
///     name: "notes.db".into(),
/// };
/// assert_eq!(loc.path(), std::path::Path::new("/var/lib/notes/notes.db"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseLocation {
    pub directory: PathBuf,
    pub name: String,
}

impl DatabaseLocation {
    /// Full path of the database file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }
}

/// Top-level migration configuration.
///
/// Relative `scripts` and `database.directory` paths are resolved against
/// the directory containing the configuration file by [`load`](Self::load).
///
/// # Examples
///
/// ```no_run
/// use sqlite_wrapper_scripts::MigrateConfig;
///
/// let config = MigrateConfig::load("migrate.yml").unwrap();
/// println!("migrating {} to {}", config.database.path().display(), config.target_version);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Store location.
    pub database: DatabaseLocation,
    /// Script directory or bundle file.
    pub scripts: PathBuf,
    /// Version the store is migrated to.
    pub target_version: Version,
    /// Name of the single-row table holding the store version.
    #[serde(default = "default_version_table")]
    pub version_table: String,
    /// Run `VACUUM` after a successful migration.
    #[serde(default)]
    pub vacuum: bool,
}

fn default_version_table() -> String {
    DEFAULT_VERSION_TABLE.to_string()
}

impl MigrateConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ScriptError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ScriptError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ScriptError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ScriptError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if self.scripts.is_relative() {
            self.scripts = base.join(&self.scripts);
        }
        if self.database.directory.is_relative() {
            self.database.directory = base.join(&self.database.directory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
database:
  directory: /var/lib/notes
  name: notes.db
scripts: /opt/notes/scripts
target_version: "1.2.3"
version_table: notes_version
vacuum: true
"#
    }

    fn minimal_yaml() -> &'static str {
        r#"
database:
  directory: data
  name: app.db
scripts: scripts
target_version: "2.0"
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: MigrateConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.database.name, "notes.db");
        assert_eq!(config.database.path(), Path::new("/var/lib/notes/notes.db"));
        assert_eq!(config.target_version, Version::new(1, 2).with_build(3));
        assert_eq!(config.version_table, "notes_version");
        assert!(config.vacuum);
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: MigrateConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert_eq!(config.version_table, DEFAULT_VERSION_TABLE);
        assert!(!config.vacuum);
    }

    #[test]
    fn test_invalid_target_version_is_rejected() {
        let yaml = minimal_yaml().replace("\"2.0\"", "\"two\"");
        assert!(serde_yaml::from_str::<MigrateConfig>(&yaml).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrate.yml");
        std::fs::write(&path, minimal_yaml()).unwrap();

        let config = MigrateConfig::load(&path).unwrap();
        assert_eq!(config.scripts, dir.path().join("scripts"));
        assert_eq!(config.database.directory, dir.path().join("data"));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrate.yml");

        let original: MigrateConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = MigrateConfig::load(&path).unwrap();
        assert_eq!(loaded.database, original.database);
        assert_eq!(loaded.scripts, original.scripts);
        assert_eq!(loaded.target_version, original.target_version);
        assert_eq!(loaded.vacuum, original.vacuum);
    }
}
