//! Script loading with builder pattern and fallback chains.
//!
//! Provides [`ScriptRepository`] for holding a loaded [`ScriptSet`] and
//! [`RepositoryBuilder`] for loading from several sources with automatic
//! fallback.
//!
//! # Directory layout
//!
//! ```text
//! scripts/
//! ├── create/
//! │   ├── 001_notes.sql
//! │   └── 002_tags.sql
//! └── alter/
//!     ├── 1.1__add_title.sql
//!     └── 1.2.sql
//! ```
//!
//! Creation scripts run in file-name order. Each alter script's version is
//! the file stem up to the first `__`.
//!
//! # Loading patterns
//!
//! ```no_run
//! use sqlite_wrapper_scripts::ScriptRepository;
//!
//! // Load from a directory
//! let repo = ScriptRepository::from_dir("db/scripts/").unwrap();
//! println!("{} alter scripts", repo.scripts().alter.len());
//!
//! // Load from a single bundle file
//! let repo = ScriptRepository::from_bundle("scripts.yml").unwrap();
//!
//! // Use the builder for a fallback chain
//! let repo = ScriptRepository::builder()
//!     .from_dir("db/scripts/")
//!     .from_bundle("/usr/share/app/scripts.json")
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};

use sqlite_wrapper_core::{
    AlterScript, DatabaseScripts, ScriptPackage, ScriptSet, Version, validate_package,
};
use tracing::debug;

use crate::checksum::verify_bundle_hash;
use crate::error::{Result, ScriptError};

/// Describes where a [`ScriptRepository`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A directory with `create/` and `alter/` subdirectories.
    Directory(PathBuf),
    /// A single [`ScriptPackage`] JSON or YAML file.
    Bundle(PathBuf),
    /// Built in code.
    Inline,
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<ScriptSource>),
}

/// A loaded script set together with its origin.
///
/// # Examples
///
/// ```no_run
/// use sqlite_wrapper_scripts::ScriptRepository;
///
/// let repo = ScriptRepository::from_path("db/scripts").unwrap();
/// if let Some(latest) = repo.scripts().latest_version() {
///     println!("scripts go up to {latest}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScriptRepository {
    scripts: ScriptSet,
    name: Option<String>,
    source: ScriptSource,
}

impl ScriptRepository {
    /// Returns a new [`RepositoryBuilder`] for configuring a fallback chain.
    pub fn builder() -> RepositoryBuilder {
        RepositoryBuilder::new()
    }

    /// Wraps scripts built in code.
    pub fn inline(scripts: ScriptSet) -> Self {
        Self {
            scripts,
            name: None,
            source: ScriptSource::Inline,
        }
    }

    /// Loads from a directory when `path` is one, otherwise from a bundle file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_bundle(path)
        }
    }

    /// Loads scripts from a directory.
    ///
    /// Missing `create/` or `alter/` subdirectories count as empty.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::IoError`] if the directory or a file cannot be
    /// read, or [`ScriptError::InvalidScriptName`] if an alter script's file
    /// name does not start with a valid version.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ScriptError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("script directory '{}' not found", path.display()),
            )));
        }

        let mut scripts = ScriptSet::new();

        for file in sql_files(&path.join("create"))? {
            debug!(file = %file.display(), "Loading creation script");
            scripts.creation.push(std::fs::read_to_string(&file)?);
        }

        for file in sql_files(&path.join("alter"))? {
            let version = version_from_file_name(&file)?;
            debug!(file = %file.display(), %version, "Loading alter script");
            let statement = std::fs::read_to_string(&file)?;
            scripts.alter.push(AlterScript::new(version, statement));
        }

        Ok(Self {
            scripts,
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            source: ScriptSource::Directory(path.to_path_buf()),
        })
    }

    /// Loads scripts from a single [`ScriptPackage`] file.
    ///
    /// The format follows the extension: `.json`, `.yml`, or `.yaml`. When
    /// the package carries a `bundle_hash`, it is verified.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnsupportedFormat`] for other extensions,
    /// [`ScriptError::IoError`] if the file cannot be read,
    /// [`ScriptError::JsonError`]/[`ScriptError::YamlError`] if parsing
    /// fails, or [`ScriptError::InvalidChecksum`] on a hash mismatch.
    pub fn from_bundle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let package = read_package(path)?;
        verify_bundle_hash(&package)?;

        for problem in validate_package(&package) {
            debug!(bundle = %path.display(), %problem, "Bundle validation issue");
        }

        Ok(Self {
            name: package.name.clone(),
            scripts: package.into_script_set(),
            source: ScriptSource::Bundle(path.to_path_buf()),
        })
    }

    /// Returns the loaded scripts.
    pub fn scripts(&self) -> &ScriptSet {
        &self.scripts
    }

    /// Consumes the repository and returns the scripts.
    pub fn into_scripts(self) -> ScriptSet {
        self.scripts
    }

    /// Bundle name, or directory name for directory sources.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &ScriptSource {
        &self.source
    }
}

impl DatabaseScripts for ScriptRepository {
    fn creation_scripts(&self) -> &[String] {
        self.scripts.creation_scripts()
    }

    fn alter_scripts(&self) -> &[AlterScript] {
        self.scripts.alter_scripts()
    }
}

/// Builder for constructing a [`ScriptRepository`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`ScriptError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use sqlite_wrapper_scripts::ScriptRepository;
///
/// let repo = ScriptRepository::builder()
///     .from_dir("/opt/app/scripts/")
///     .from_bundle("/opt/app/scripts.yml")
///     .build()
///     .unwrap();
/// ```
pub struct RepositoryBuilder {
    sources: Vec<ScriptSource>,
}

impl RepositoryBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a script directory as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ScriptSource::Directory(path.into()));
        self
    }

    /// Adds a bundle file as a source.
    pub fn from_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ScriptSource::Bundle(path.into()));
        self
    }

    /// Attempts to load scripts from configured sources in order.
    ///
    /// Returns the first successfully loaded repository. If all sources
    /// fail, returns [`ScriptError::NoSourcesAvailable`].
    pub fn build(self) -> Result<ScriptRepository> {
        if self.sources.is_empty() {
            return Err(ScriptError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                ScriptSource::Directory(path) => ScriptRepository::from_dir(path),
                ScriptSource::Bundle(path) => ScriptRepository::from_bundle(path),
                ScriptSource::Inline | ScriptSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut repo) => {
                    repo.source = ScriptSource::Multiple(all_sources);
                    return Ok(repo);
                }
                Err(err) => debug!(?source, error = %err, "Script source failed, trying next"),
            }
        }

        Err(ScriptError::NoSourcesAvailable)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a package file in the format its extension names.
fn read_package(path: &Path) -> Result<ScriptPackage> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => {
            let reader = std::io::BufReader::new(std::fs::File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        Some("yml" | "yaml") => {
            let reader = std::io::BufReader::new(std::fs::File::open(path)?);
            Ok(serde_yaml::from_reader(reader)?)
        }
        _ => Err(ScriptError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Lists `*.sql` files in `dir` sorted by file name. A missing directory
/// yields an empty list.
fn sql_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts the version from `1.2__description.sql` or `1.2.sql`.
fn version_from_file_name(path: &Path) -> Result<Version> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ScriptError::InvalidScriptName {
            path: path.to_path_buf(),
            reason: "file name is not valid UTF-8".into(),
        })?;

    let raw = stem.split_once("__").map_or(stem, |(version, _)| version);
    raw.parse().map_err(|e| ScriptError::InvalidScriptName {
        path: path.to_path_buf(),
        reason: format!("{e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_version_from_file_name() {
        let v = version_from_file_name(Path::new("alter/1.2__add_title.sql")).unwrap();
        assert_eq!(v, Version::new(1, 2));
        let v = version_from_file_name(Path::new("alter/2.0.1.sql")).unwrap();
        assert_eq!(v, Version::new(2, 0).with_build(1));
        assert!(matches!(
            version_from_file_name(Path::new("alter/add_title.sql")),
            Err(ScriptError::InvalidScriptName { .. })
        ));
    }

    #[test]
    fn test_from_dir_sorts_creation_scripts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "create/002_b.sql", "CREATE TABLE b (id INTEGER)");
        write(dir.path(), "create/001_a.sql", "CREATE TABLE a (id INTEGER)");
        write(dir.path(), "create/README.md", "ignored");
        write(dir.path(), "alter/1.1__a_name.sql", "ALTER TABLE a ADD COLUMN name TEXT");

        let repo = ScriptRepository::from_dir(dir.path()).unwrap();
        let scripts = repo.scripts();
        assert_eq!(
            scripts.creation,
            vec!["CREATE TABLE a (id INTEGER)", "CREATE TABLE b (id INTEGER)"]
        );
        assert_eq!(scripts.alter.len(), 1);
        assert_eq!(scripts.alter[0].version, Version::new(1, 1));
        assert_eq!(repo.source(), &ScriptSource::Directory(dir.path().to_path_buf()));
    }

    #[test]
    fn test_from_dir_without_subdirectories_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ScriptRepository::from_dir(dir.path()).unwrap();
        assert!(repo.scripts().is_empty());
    }

    #[test]
    fn test_from_dir_rejects_unversioned_alter_script() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "alter/add_column.sql", "ALTER TABLE a ADD COLUMN x TEXT");
        assert!(matches!(
            ScriptRepository::from_dir(dir.path()),
            Err(ScriptError::InvalidScriptName { .. })
        ));
    }

    #[test]
    fn test_from_bundle_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scripts.toml", "");
        assert!(matches!(
            ScriptRepository::from_bundle(dir.path().join("scripts.toml")),
            Err(ScriptError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_builder_without_sources_fails() {
        assert!(matches!(
            ScriptRepository::builder().build(),
            Err(ScriptError::NoSourcesAvailable)
        ));
    }

    #[test]
    fn test_builder_falls_back_to_second_source() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "scripts.yml",
            "format_version: \"1.0\"\ncreation:\n  - CREATE TABLE t (id INTEGER)\n",
        );

        let repo = ScriptRepository::builder()
            .from_dir("/nonexistent/scripts/")
            .from_bundle(dir.path().join("scripts.yml"))
            .build()
            .unwrap();
        assert_eq!(repo.scripts().creation.len(), 1);
        assert!(matches!(repo.source(), ScriptSource::Multiple(s) if s.len() == 2));
    }
}
