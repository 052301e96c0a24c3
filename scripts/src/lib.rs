//! Loading versioned SQL scripts and migration configuration.
//!
//! This crate reads the scripts a store is created and migrated with from
//! disk, either a directory of `.sql` files or a single JSON/YAML bundle,
//! and loads the YAML configuration used by the `sqlwrap` command.
//!
//! # Quick start
//!
//! ```no_run
//! use sqlite_wrapper_scripts::{MigrateConfig, ScriptRepository};
//!
//! let config = MigrateConfig::load("migrate.yml").unwrap();
//! let repo = ScriptRepository::from_path(&config.scripts).unwrap();
//! println!(
//!     "{} creation scripts, {} alter scripts",
//!     repo.scripts().creation.len(),
//!     repo.scripts().alter.len()
//! );
//! ```
//!
//! Bundles can carry a SHA-256 `bundle_hash` ([`bundle_checksum`]); a bundle
//! whose scripts were edited after sealing fails to load.

mod checksum;
mod config;
mod error;
mod loader;

pub use checksum::{bundle_checksum, seal_package, verify_bundle_hash};
pub use config::{DatabaseLocation, MigrateConfig};
pub use error::{Result, ScriptError};
pub use loader::{RepositoryBuilder, ScriptRepository, ScriptSource};
