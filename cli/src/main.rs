use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sqlite_wrapper::{
    Database, DEFAULT_VERSION_TABLE, MigrationOutcome, MigrationReport, Migrator, StoreId, crud,
    list_tables,
};
use sqlite_wrapper_core::{DatabaseScripts, ScriptSet, Version, validate_scripts};
use sqlite_wrapper_scripts::{MigrateConfig, ScriptRepository};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlwrap")]
#[command(about = "Create, migrate and inspect versioned SQLite stores")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the store or bring it up to a target version.
    Migrate(MigrateArgs),
    /// Show the recorded version and pending alter scripts.
    Status(StatusArgs),
    /// Check a script directory or bundle without touching any store.
    Validate(ValidateArgs),
    /// List user tables with their row counts.
    Tables(DbArgs),
    /// Rebuild the store file to release unused pages.
    Vacuum(DbArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// YAML migration config; the flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path of the SQLite store.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Script directory or bundle file (.json, .yml, .yaml).
    #[arg(long)]
    scripts: Option<PathBuf>,
    /// Version to migrate to (e.g. 1.2 or 1.2.0.3).
    #[arg(long)]
    target: Option<Version>,
    /// Name of the version marker table.
    #[arg(long)]
    version_table: Option<String>,
    /// Run VACUUM after a migration that changed the store.
    #[arg(long)]
    vacuum: bool,
    /// Print the migration report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Path of the SQLite store.
    #[arg(long)]
    db: PathBuf,
    /// Script directory or bundle file used to list pending alter scripts.
    #[arg(long)]
    scripts: Option<PathBuf>,
    /// Name of the version marker table.
    #[arg(long, default_value = DEFAULT_VERSION_TABLE)]
    version_table: String,
    /// Print the status as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Script directory or bundle file.
    #[arg(long)]
    scripts: PathBuf,
}

#[derive(Debug, Args)]
struct DbArgs {
    /// Path of the SQLite store.
    #[arg(long)]
    db: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Migrate(args) => run_migrate(args),
        Command::Status(args) => run_status(args),
        Command::Validate(args) => run_validate(args),
        Command::Tables(args) => run_tables(args),
        Command::Vacuum(args) => run_vacuum(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

/// Migration settings after merging the config file with command-line flags.
#[derive(Debug)]
struct MigratePlan {
    db: PathBuf,
    scripts: PathBuf,
    target: Version,
    version_table: String,
    vacuum: bool,
}

impl MigratePlan {
    fn from_args(args: &MigrateArgs) -> Result<Self, String> {
        let config = match &args.config {
            Some(path) => Some(MigrateConfig::load(path).map_err(|e| {
                format!("Failed to load config '{}': {e}", path.display())
            })?),
            None => None,
        };

        let db = args
            .db
            .clone()
            .or_else(|| config.as_ref().map(|c| c.database.path()))
            .ok_or("--db is required without --config")?;
        let scripts = args
            .scripts
            .clone()
            .or_else(|| config.as_ref().map(|c| c.scripts.clone()))
            .ok_or("--scripts is required without --config")?;
        let target = args
            .target
            .or_else(|| config.as_ref().map(|c| c.target_version))
            .ok_or("--target is required without --config")?;
        let version_table = args
            .version_table
            .clone()
            .or_else(|| config.as_ref().map(|c| c.version_table.clone()))
            .unwrap_or_else(|| DEFAULT_VERSION_TABLE.to_string());
        let vacuum = args.vacuum || config.as_ref().is_some_and(|c| c.vacuum);

        Ok(Self {
            db,
            scripts,
            target,
            version_table,
            vacuum,
        })
    }
}

fn run_migrate(args: MigrateArgs) -> Result<(), String> {
    let plan = MigratePlan::from_args(&args)?;
    let repository = load_scripts(&plan.scripts)?;
    let migrator = Migrator::new(store_id(&plan.db)?, repository)
        .with_version_table(&plan.version_table)
        .map_err(|e| format!("Invalid version table: {e}"))?
        .vacuum_after_migrate(plan.vacuum);

    let report = migrator
        .migrate(&plan.target)
        .map_err(|e| format!("Migration of '{}' failed: {e}", plan.db.display()))?;

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&plan.db, &report);
        if plan.vacuum && report.outcome != MigrationOutcome::UpToDate && !report.vacuumed {
            eprintln!("warning: vacuum failed; the migration is committed");
        }
    }
    Ok(())
}

fn print_report(db: &Path, report: &MigrationReport) {
    match report.outcome {
        MigrationOutcome::Created => println!(
            "Created '{}' at version {} ({} creation scripts applied).",
            db.display(),
            report.version,
            report.creation_scripts_applied
        ),
        MigrationOutcome::Upgraded => {
            let previous = report
                .previous_version
                .map_or_else(|| "none".to_string(), |v| v.to_string());
            println!(
                "Upgraded '{}' from {previous} to {} ({} alter scripts applied).",
                db.display(),
                report.version,
                report.alter_scripts_applied.len()
            );
            for version in &report.alter_scripts_applied {
                println!("  applied {version}");
            }
        }
        MigrationOutcome::UpToDate => println!(
            "'{}' is up to date at version {}.",
            db.display(),
            report.version
        ),
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

fn run_status(args: StatusArgs) -> Result<(), String> {
    let repository = match &args.scripts {
        Some(path) => load_scripts(path)?,
        None => ScriptRepository::inline(ScriptSet::new()),
    };
    let migrator = Migrator::new(store_id(&args.db)?, repository)
        .with_version_table(&args.version_table)
        .map_err(|e| format!("Invalid version table: {e}"))?;
    let status = migrator
        .status()
        .map_err(|e| format!("Failed to get status of '{}': {e}", args.db.display()))?;

    if args.json {
        return print_json(&status);
    }

    println!("Store: {}", args.db.display());
    println!("  Exists: {}", if status.exists { "yes" } else { "no" });
    match status.version {
        Some(version) => println!("  Version: {version}"),
        None => println!("  Version: none (creation scripts pending)"),
    }
    if args.scripts.is_some() && !status.needs_creation() {
        if status.pending.is_empty() {
            println!("  Pending: none");
        } else {
            let pending: Vec<String> = status.pending.iter().map(ToString::to_string).collect();
            println!("  Pending: {}", pending.join(", "));
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let repository = load_scripts(&args.scripts)?;
    let problems = validate_scripts(&repository);
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  {problem}");
        }
        return Err(format!(
            "{} problem(s) in '{}'",
            problems.len(),
            args.scripts.display()
        ));
    }

    let scripts = repository.scripts();
    let latest = scripts
        .latest_version()
        .map_or_else(|| "none".to_string(), |v| v.to_string());
    println!(
        "Scripts OK: {} creation, {} alter (latest version {latest}).",
        repository.creation_scripts().len(),
        repository.alter_scripts().len()
    );
    Ok(())
}

fn run_tables(args: DbArgs) -> Result<(), String> {
    let db = open_store(&args.db)?;
    let conn = db.connection();
    let tables = list_tables(conn).map_err(|e| format!("Failed to list tables: {e}"))?;
    for table in tables {
        let rows = crud::count_rows(conn, &table)
            .map_err(|e| format!("Failed to count rows of '{table}': {e}"))?;
        println!("{table}\t{rows}");
    }
    Ok(())
}

fn run_vacuum(args: DbArgs) -> Result<(), String> {
    let db = open_store(&args.db)?;
    db.vacuum()
        .map_err(|e| format!("Vacuum of '{}' failed: {e}", args.db.display()))?;
    println!("Vacuumed '{}'.", args.db.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_scripts(path: &Path) -> Result<ScriptRepository, String> {
    ScriptRepository::from_path(path)
        .map_err(|e| format!("Failed to load scripts from '{}': {e}", path.display()))
}

fn store_id(path: &Path) -> Result<StoreId, String> {
    StoreId::from_path(path).map_err(|e| format!("Invalid database path: {e}"))
}

fn open_store(path: &Path) -> Result<Database, String> {
    Database::open(&store_id(path)?).map_err(|e| format!("Failed to open database: {e}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}
