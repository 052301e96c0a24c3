//! Core types for versioned SQL schema scripts.
//!
//! This crate defines the engine-neutral data model used by the storage and
//! loader crates:
//!
//! - [`Version`]: a `Major.Minor[.Build[.Revision]]` version with numeric
//!   ordering.
//! - [`AlterScript`]: a statement tagged with the version it upgrades to.
//! - [`ScriptSet`] / [`DatabaseScripts`]: creation plus alter scripts for
//!   one store.
//! - [`ScriptPackage`]: a serializable bundle of scripts for distribution.
//! - [`ColumnDef`]: a column descriptor that backends translate into DDL.
//!
//! [`pending_scripts`] selects the alter scripts between a stored version and
//! a target version. Validation ([`validate_scripts`], [`validate_package`],
//! [`validate_identifier`]) rejects inputs that cannot be applied safely.
//!
//! # Example
//!
//! ```
//! use sqlite_wrapper_core::*;
//!
//! let scripts = ScriptSet::new()
//!     .with_creation("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
//!     .with_alter(Version::new(1, 1), "ALTER TABLE notes ADD COLUMN title TEXT")
//!     .with_alter(Version::new(1, 2), "CREATE INDEX idx_notes_title ON notes(title)");
//!
//! assert!(validate_scripts(&scripts).is_empty());
//!
//! let stored = Version::new(1, 1);
//! let pending = pending_scripts(scripts.alter_scripts(), Some(&stored), &Version::new(1, 2));
//! assert_eq!(pending.len(), 1);
//! ```

mod column;
mod package;
mod pending;
mod types;
mod validate;
mod version;

pub use column::{ColumnDef, ColumnType, DefaultValue};
pub use package::ScriptPackage;
pub use pending::pending_scripts;
pub use types::*;
pub use validate::{ValidationError, validate_identifier, validate_package, validate_scripts};
pub use version::{Version, VersionParseError};
