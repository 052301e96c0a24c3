//! Script and identifier validation.
//!
//! Catches script sets that cannot be applied deterministically (empty
//! statements, two alter scripts for the same version) and SQL identifiers
//! that are unsafe to splice into DDL, before anything touches a store.
//!
//! # Examples
//!
//! ```
//! use sqlite_wrapper_core::*;
//!
//! let scripts = ScriptSet::new().with_creation("CREATE TABLE t (id INTEGER)");
//! assert!(validate_scripts(&scripts).is_empty());
//!
//! let bad = ScriptSet::new()
//!     .with_alter(Version::new(1, 1), "ALTER TABLE t ADD COLUMN a TEXT")
//!     .with_alter(Version::new(1, 1), "ALTER TABLE t ADD COLUMN b TEXT");
//! assert!(!validate_scripts(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{DatabaseScripts, ScriptPackage, ScriptTarget, Version};

/// Script and identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A script contains only whitespace.
    #[error("{0} is empty")]
    EmptyStatement(ScriptTarget),
    /// Two alter scripts target the same version, so their relative order
    /// would be ambiguous.
    #[error("duplicate alter script version: {0}")]
    DuplicateVersion(Version),
    /// A table or column name contains characters other than ASCII
    /// alphanumerics and underscores, is empty, or starts with a digit.
    #[error("invalid identifier '{0}': must be non-empty, start with a letter or underscore, and contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),
    /// Package format version string is empty.
    #[error("package format version cannot be empty")]
    EmptyFormatVersion,
}

/// Validates a SQL identifier (table or column name).
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::validate_identifier;
///
/// assert!(validate_identifier("schema_version").is_ok());
/// assert!(validate_identifier("drop;--").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(name.to_string()))
    }
}

/// Validates a script source.
///
/// Returns every problem found; an empty vector means the scripts can be
/// applied.
pub fn validate_scripts<S: DatabaseScripts + ?Sized>(scripts: &S) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (index, statement) in scripts.creation_scripts().iter().enumerate() {
        if statement.trim().is_empty() {
            errors.push(ValidationError::EmptyStatement(ScriptTarget::Creation {
                index,
            }));
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for script in scripts.alter_scripts() {
        if script.statement.trim().is_empty() {
            errors.push(ValidationError::EmptyStatement(ScriptTarget::Alter(
                script.version,
            )));
        }
        if !seen.insert(script.version) && reported.insert(script.version) {
            errors.push(ValidationError::DuplicateVersion(script.version));
        }
    }

    errors
}

/// Validates a script package: its format version plus its scripts.
pub fn validate_package(package: &ScriptPackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if package.format_version.trim().is_empty() {
        errors.push(ValidationError::EmptyFormatVersion);
    }
    errors.extend(validate_scripts(package));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptSet;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("notes").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("A_B_9").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        for bad in ["", "9lives", "drop;--", "two words", "dash-ed", "quo\"te", "é"] {
            assert_eq!(
                validate_identifier(bad),
                Err(ValidationError::InvalidIdentifier(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_validate_scripts_reports_empty_statements() {
        let scripts = ScriptSet::new()
            .with_creation("CREATE TABLE a (id INTEGER)")
            .with_creation("   ")
            .with_alter(Version::new(1, 1), "\n");
        let errors = validate_scripts(&scripts);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyStatement(ScriptTarget::Creation { index: 1 }),
                ValidationError::EmptyStatement(ScriptTarget::Alter(Version::new(1, 1))),
            ]
        );
    }

    #[test]
    fn test_validate_scripts_reports_each_duplicate_once() {
        let scripts = ScriptSet::new()
            .with_alter(Version::new(1, 1), "A")
            .with_alter(Version::new(1, 1), "B")
            .with_alter(Version::new(1, 1), "C")
            .with_alter(Version::new(1, 2), "D");
        assert_eq!(
            validate_scripts(&scripts),
            vec![ValidationError::DuplicateVersion(Version::new(1, 1))]
        );
    }

    #[test]
    fn test_distinct_component_counts_are_not_duplicates() {
        let scripts = ScriptSet::new()
            .with_alter("1.0".parse().unwrap(), "A")
            .with_alter("1.0.0".parse().unwrap(), "B");
        assert!(validate_scripts(&scripts).is_empty());
    }

    #[test]
    fn test_validate_package_rejects_empty_format_version() {
        let mut package = ScriptPackage::new("1.0");
        package.format_version = " ".into();
        assert_eq!(
            validate_package(&package),
            vec![ValidationError::EmptyFormatVersion]
        );
    }
}
