//! Script bundle example.
//!
//! Packs scripts into a sealed JSON bundle, loads it back through the
//! repository fallback chain, and migrates a store from it.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p sqlite-wrapper-demos --example script_bundle
//! ```

use sqlite_wrapper::{Migrator, StoreId};
use sqlite_wrapper_core::{ScriptPackage, ScriptSet, Version};
use sqlite_wrapper_scripts::{ScriptRepository, bundle_checksum, seal_package};

fn main() {
    let dir = std::env::temp_dir().join(format!("sqlwrap_bundle_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    // Build and seal a bundle
    let scripts = ScriptSet::new()
        .with_creation("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .with_alter(Version::new(1, 1), "ALTER TABLE users ADD COLUMN email TEXT");
    let mut package = ScriptPackage::from_script_set("1.0", scripts);
    package.name = Some("users".to_string());
    seal_package(&mut package);

    let bundle_path = dir.join("users.json");
    std::fs::write(&bundle_path, serde_json::to_string_pretty(&package).unwrap()).unwrap();
    println!("Wrote {} (hash {:?})", bundle_path.display(), package.bundle_hash);

    // The directory source does not exist, so the bundle is used
    let repository = ScriptRepository::builder()
        .from_dir(dir.join("scripts"))
        .from_bundle(&bundle_path)
        .build()
        .unwrap();
    println!(
        "Loaded '{}' from {:?}, checksum {}",
        repository.name().unwrap_or("unnamed"),
        repository.source(),
        bundle_checksum(&repository)
    );

    let migrator = Migrator::new(StoreId::new(&dir, "users.db"), repository);
    for target in [Version::new(1, 0), Version::new(1, 1)] {
        let report = migrator.migrate(&target).unwrap();
        println!("migrate({target}): {:?}", report.outcome);
    }
    println!("Status: {:?}", migrator.status().unwrap());

    std::fs::remove_dir_all(&dir).unwrap();
}
