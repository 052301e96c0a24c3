//! Selection of alter scripts that still have to run.

use crate::{AlterScript, Version};

/// Returns the alter scripts with `current < version <= target`, sorted by
/// ascending version.
///
/// `current` is `None` for a store that has no recorded version; every
/// script up to `target` is then pending. Scripts sharing a version keep
/// their relative order.
///
/// # Examples
///
/// ```
/// use sqlite_wrapper_core::{pending_scripts, AlterScript, Version};
///
/// let scripts = vec![
///     AlterScript::new(Version::new(2, 0), "C"),
///     AlterScript::new(Version::new(1, 0), "A"),
///     AlterScript::new(Version::new(1, 5), "B"),
/// ];
///
/// let pending = pending_scripts(&scripts, Some(&Version::new(1, 0)), &Version::new(2, 0));
/// let statements: Vec<_> = pending.iter().map(|s| s.statement.as_str()).collect();
/// assert_eq!(statements, ["B", "C"]);
/// ```
pub fn pending_scripts<'a>(
    scripts: &'a [AlterScript],
    current: Option<&Version>,
    target: &Version,
) -> Vec<&'a AlterScript> {
    let mut pending: Vec<&AlterScript> = scripts
        .iter()
        .filter(|s| current.is_none_or(|c| s.version > *c) && s.version <= *target)
        .collect();
    pending.sort_by_key(|s| s.version);
    pending
}
