//! SHA-256 integrity hashes for script bundles.
//!
//! A bundle hash covers the scripts only, never the descriptive metadata, so
//! renaming a package keeps its hash. Every script is framed with a kind tag
//! and NUL separators so moving text between adjacent scripts changes the
//! digest.

use sha2::{Digest, Sha256};
use sqlite_wrapper_core::{DatabaseScripts, ScriptPackage};

use crate::error::{Result, ScriptError};

/// Computes the SHA-256 hex digest of a script source.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::ScriptSet;
/// use sqlite_wrapper_scripts::bundle_checksum;
///
/// let a = ScriptSet::new().with_creation("CREATE TABLE t (id INTEGER)");
/// let b = ScriptSet::new().with_creation("CREATE TABLE t (id INTEGER, x TEXT)");
/// assert_eq!(bundle_checksum(&a).len(), 64);
/// assert_ne!(bundle_checksum(&a), bundle_checksum(&b));
/// ```
pub fn bundle_checksum<S: DatabaseScripts + ?Sized>(scripts: &S) -> String {
    let mut hasher = Sha256::new();
    for statement in scripts.creation_scripts() {
        hasher.update(b"create\0");
        hasher.update(statement.as_bytes());
        hasher.update(b"\0");
    }
    for script in scripts.alter_scripts() {
        hasher.update(b"alter\0");
        hasher.update(script.version.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(script.statement.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// Sets `bundle_hash` to the checksum of the package's current scripts.
pub fn seal_package(package: &mut ScriptPackage) {
    package.bundle_hash = Some(bundle_checksum(package));
}

/// Verifies a package's `bundle_hash`, if it has one.
///
/// # Errors
///
/// Returns [`ScriptError::InvalidChecksum`] when the recorded hash differs
/// from the computed one (case-insensitive).
pub fn verify_bundle_hash(package: &ScriptPackage) -> Result<()> {
    let Some(expected) = package.bundle_hash.as_deref() else {
        return Ok(());
    };
    let actual = bundle_checksum(package);
    if expected.eq_ignore_ascii_case(&actual) {
        Ok(())
    } else {
        Err(ScriptError::InvalidChecksum(format!(
            "bundle hash {expected} does not match scripts ({actual})"
        )))
    }
}
