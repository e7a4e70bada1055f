use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use trellis_orm::generate::generate_model;
use trellis_orm::migrate::{
    default_migrations_dir, default_schema_path, load_artifact, run_migrations,
};
use trellis_orm::seed::{default_seed_path, run_seeds};
use trellis_store::{DatabaseConfig, Store, default_config_path};

#[derive(Debug, Parser)]
#[command(name = "trellis")]
#[command(about = "Convention-driven ORM, migrations, and code generation")]
struct Cli {
    /// Path to the database configuration file.
    #[arg(long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate project source files.
    Generate(GenerateArgs),
    /// Database lifecycle operations.
    Db(DbArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(subcommand)]
    target: GenerateTarget,
}

#[derive(Debug, Subcommand)]
enum GenerateTarget {
    /// Generate a model skeleton and its create-table migration.
    Model(ModelArgs),
}

#[derive(Debug, Args)]
struct ModelArgs {
    /// Model name in UpperCamelCase (e.g. DrinkOrder).
    name: String,
    /// Column specs as name:type (string, text, integer, references).
    columns: Vec<String>,
}

#[derive(Debug, Args)]
struct DbArgs {
    #[command(subcommand)]
    operation: DbOperation,
}

#[derive(Debug, Subcommand)]
enum DbOperation {
    /// Create the configured database.
    Create,
    /// Drop the configured database.
    Drop,
    /// Apply pending migrations and re-dump the schema artifact.
    Migrate(MigrateArgs),
    /// Print the live schema as YAML.
    Schema,
    /// Insert rows from the seed file.
    Seed,
    /// Delete every row of one table.
    DestroyAll(DestroyAllArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    /// Directory holding migration files.
    #[arg(long, default_value_os_t = default_migrations_dir())]
    migrations_dir: PathBuf,
    /// Where to write the schema artifact.
    #[arg(long, default_value_os_t = default_schema_path())]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct DestroyAllArgs {
    /// Pluralized table name.
    table: String,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Db(args) => run_db(&cli.config, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    match args.target {
        GenerateTarget::Model(args) => run_generate_model(args),
    }
}

fn run_generate_model(args: ModelArgs) -> Result<(), String> {
    let generated = generate_model(
        Path::new("."),
        &args.name,
        &args.columns,
        chrono::Utc::now(),
    )
    .map_err(|e| format!("Failed to generate model '{}': {e}", args.name))?;
    println!("created {}", generated.model_path.display());
    println!("created {}", generated.migration_path.display());
    Ok(())
}

fn run_db(config_path: &Path, args: DbArgs) -> Result<(), String> {
    let config = DatabaseConfig::load(config_path)
        .map_err(|e| format!("Failed to load '{}': {e}", config_path.display()))?;
    let mut store = config
        .open_store()
        .map_err(|e| format!("Failed to open store: {e}"))?;

    match args.operation {
        DbOperation::Create => run_db_create(&mut *store),
        DbOperation::Drop => run_db_drop(&mut *store),
        DbOperation::Migrate(args) => run_db_migrate(&mut *store, args),
        DbOperation::Schema => run_db_schema(&*store),
        DbOperation::Seed => run_db_seed(&mut *store),
        DbOperation::DestroyAll(args) => run_db_destroy_all(&mut *store, &args.table),
    }
}

fn run_db_create(store: &mut dyn Store) -> Result<(), String> {
    store
        .create_database()
        .map_err(|e| format!("Failed to create database: {e}"))?;
    store
        .initialize_database()
        .map_err(|e| format!("Failed to initialize database: {e}"))?;
    println!("Database created.");
    Ok(())
}

fn run_db_drop(store: &mut dyn Store) -> Result<(), String> {
    store
        .drop_database()
        .map_err(|e| format!("Failed to drop database: {e}"))?;
    println!("Database dropped.");
    Ok(())
}

fn run_db_migrate(store: &mut dyn Store, args: MigrateArgs) -> Result<(), String> {
    let applied = run_migrations(store, &args.migrations_dir, &args.schema)
        .map_err(|e| format!("Migration run failed: {e}"))?;
    if applied.is_empty() {
        println!("No pending migrations.");
    } else {
        for version in &applied {
            println!("applied {version}");
        }
        println!("{} migration(s) applied.", applied.len());
    }
    Ok(())
}

fn run_db_schema(store: &dyn Store) -> Result<(), String> {
    let artifact = store
        .dump_schema()
        .map_err(|e| format!("Failed to introspect schema: {e}"))?;
    let yaml =
        serde_yaml::to_string(&artifact).map_err(|e| format!("Failed to serialize schema: {e}"))?;
    print!("{yaml}");
    Ok(())
}

fn run_db_seed(store: &mut dyn Store) -> Result<(), String> {
    let artifact = load_artifact(&default_schema_path())
        .map_err(|e| format!("Failed to load schema artifact: {e}"))?;
    let schema = trellis_core::SchemaRegistry::from_artifact(artifact);
    if schema.is_empty() {
        return Err("Schema artifact is empty; run `trellis db migrate` first".to_string());
    }
    let inserted = run_seeds(store, &schema, &default_seed_path())
        .map_err(|e| format!("Seed failed: {e}"))?;
    println!("Inserted {inserted} seed row(s).");
    Ok(())
}

fn run_db_destroy_all(store: &mut dyn Store, table: &str) -> Result<(), String> {
    store
        .destroy_all(table)
        .map_err(|e| format!("Failed to destroy rows in '{table}': {e}"))?;
    println!("Destroyed all rows in '{table}'.");
    Ok(())
}
