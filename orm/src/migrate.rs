//! Migration discovery and the migration runner.
//!
//! Migrations are declarative YAML files in `db/migrations`, named
//! `<14-digit-timestamp>_<snake_words>.yml`. Discovery is a directory scan;
//! the filename timestamp is the version and versions compare
//! lexicographically, so the scan order is the apply order.
//!
//! The runner applies every unit whose version is strictly greater than the
//! high-water mark (the largest applied version, `"0"` on a fresh
//! database). A failing unit halts the run; later units are not attempted.
//! The schema artifact is re-dumped after the loop whether or not a unit
//! failed, so `db/schema.yml` always reflects the live structure.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use trellis_core::naming::parse_migration_stem;
use trellis_core::schema::{DataType, SchemaArtifact};
use trellis_store::Store;

use crate::error::{OrmError, Result};

/// Where a project keeps its migration files.
pub fn default_migrations_dir() -> PathBuf {
    PathBuf::from("db").join("migrations")
}

/// Where the generated schema artifact lives.
pub fn default_schema_path() -> PathBuf {
    PathBuf::from("db").join("schema.yml")
}

/// The declarative body of one migration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationChange {
    /// The single supported change: create a table.
    pub create_table: CreateTable,
}

/// A table creation, in declaration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTable {
    /// Pluralized table name.
    pub table: String,
    /// Column name → declared type (`references` not yet expanded).
    #[serde(default)]
    pub columns: BTreeMap<String, DataType>,
    /// Whether to inject `created_at`/`updated_at`.
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

fn default_true() -> bool {
    true
}

/// One discovered migration unit, not yet parsed.
///
/// The body is loaded lazily when the unit is applied, so a malformed file
/// surfaces as that unit's failure rather than aborting discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// 14-digit version timestamp.
    pub version: String,
    /// Display name derived from the filename words.
    pub class_name: String,
    /// File the body will be loaded from.
    pub path: PathBuf,
}

impl MigrationUnit {
    fn load(&self) -> Result<MigrationChange> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

/// Scans the migrations directory and returns units sorted by version.
///
/// Only `.yml` files are considered. A missing directory yields an empty
/// list rather than an error.
///
/// # Errors
///
/// Returns [`OrmError::InvalidMigrationFile`] for a `.yml` file whose stem
/// does not follow the `<14-digit>_<snake_words>` convention.
pub fn discover_migrations(dir: &Path) -> Result<Vec<MigrationUnit>> {
    let mut units = Vec::new();
    if !dir.is_dir() {
        return Ok(units);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("yml") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| OrmError::InvalidMigrationFile {
                path: path.clone(),
                message: "filename is not valid UTF-8".to_string(),
            })?;
        let name = parse_migration_stem(stem).map_err(|err| OrmError::InvalidMigrationFile {
            path: path.clone(),
            message: err.to_string(),
        })?;
        units.push(MigrationUnit {
            version: name.version,
            class_name: name.class_name,
            path,
        });
    }

    units.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(units)
}

/// Reads the schema artifact, returning an empty artifact when the file
/// does not exist yet.
pub fn load_artifact(path: &Path) -> Result<SchemaArtifact> {
    if !path.is_file() {
        return Ok(SchemaArtifact::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Writes the schema artifact, creating parent directories as needed.
pub fn write_artifact(path: &Path, artifact: &SchemaArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_yaml::to_string(artifact)?)?;
    Ok(())
}

/// Runs every pending migration and re-dumps the schema artifact.
///
/// Returns the versions applied by this run, in order. On a unit failure
/// the error is returned after the schema dump, so partial progress is
/// still reflected in the artifact.
///
/// # Errors
///
/// Returns [`OrmError::MigrationFailure`] naming the version of the unit
/// that failed, or any discovery or dump error.
pub fn run_migrations(
    store: &mut dyn Store,
    migrations_dir: &Path,
    schema_path: &Path,
) -> Result<Vec<String>> {
    let units = discover_migrations(migrations_dir)?;
    let high_water_mark = store
        .applied_migrations()?
        .into_iter()
        .next_back()
        .unwrap_or_else(|| "0".to_string());

    let mut applied = Vec::new();
    let mut failure = None;

    for unit in units {
        if unit.version.as_str() <= high_water_mark.as_str() {
            continue;
        }
        info!(version = %unit.version, name = %unit.class_name, "applying migration");
        match apply_unit(store, &unit) {
            Ok(()) => {
                store.mark_migration_done(&unit.version)?;
                applied.push(unit.version);
            }
            Err(err) => {
                error!(version = %unit.version, %err, "migration failed, halting");
                failure = Some(OrmError::MigrationFailure {
                    version: unit.version,
                    source: Box::new(err),
                });
                break;
            }
        }
    }

    // Dump even after a failure: the artifact mirrors the live structure.
    let artifact = store.dump_schema()?;
    write_artifact(schema_path, &artifact)?;

    match failure {
        Some(err) => Err(err),
        None => Ok(applied),
    }
}

fn apply_unit(store: &mut dyn Store, unit: &MigrationUnit) -> Result<()> {
    let change = unit.load()?;
    let spec = change.create_table;
    store.create_table(&spec.table, &spec.columns, spec.timestamps)?;
    Ok(())
}
