//! Source generation for new models.
//!
//! Generating a model produces two files: a model skeleton under
//! `app/models/<table_ref>.rs` and a `create_table` migration under
//! `db/migrations/<version>_create_<table>.yml`, with the version taken
//! from the current timestamp. Existing files are never overwritten.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;
use trellis_core::naming::{
    model_name_to_table_name, model_name_to_table_ref, validate_model_name,
};
use trellis_core::schema::{DataType, parse_column_spec};

use crate::error::{OrmError, Result};
use crate::migrate::{CreateTable, MigrationChange, default_migrations_dir};

/// Where a project keeps its model sources.
pub fn default_models_dir() -> PathBuf {
    PathBuf::from("app").join("models")
}

/// Formats a timestamp as a 14-digit migration version.
pub fn migration_version(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// The files a model generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModel {
    /// Model skeleton source file.
    pub model_path: PathBuf,
    /// Migration file creating the model's table.
    pub migration_path: PathBuf,
}

/// Generates a model skeleton and its `create_table` migration under
/// `root`.
///
/// `column_specs` are `name:type` pairs; `references` columns additionally
/// get a `belongs_to` declaration in the skeleton.
///
/// # Errors
///
/// Returns naming errors for a non-UpperCamelCase model name or malformed
/// column specs, and [`OrmError::FileExists`] rather than overwriting
/// either output file.
pub fn generate_model(
    root: &Path,
    model_name: &str,
    column_specs: &[String],
    now: DateTime<Utc>,
) -> Result<GeneratedModel> {
    validate_model_name(model_name)?;

    let mut columns: BTreeMap<String, DataType> = BTreeMap::new();
    for spec in column_specs {
        let (column, data_type) = parse_column_spec(spec)?;
        columns.insert(column, data_type);
    }

    let table_name = model_name_to_table_name(model_name);
    let table_ref = model_name_to_table_ref(model_name);

    let model_path = root
        .join(default_models_dir())
        .join(format!("{table_ref}.rs"));
    let migration_path = root.join(default_migrations_dir()).join(format!(
        "{}_create_{table_name}.yml",
        migration_version(now)
    ));

    for path in [&model_path, &migration_path] {
        if path.exists() {
            return Err(OrmError::FileExists { path: path.clone() });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }

    let change = MigrationChange {
        create_table: CreateTable {
            table: table_name.clone(),
            columns: columns.clone(),
            timestamps: true,
        },
    };
    fs::write(&migration_path, serde_yaml::to_string(&change)?)?;
    fs::write(&model_path, render_model_source(model_name, &table_name, &columns))?;

    info!(model = model_name, table = %table_name, "generated model");
    Ok(GeneratedModel {
        model_path,
        migration_path,
    })
}

fn render_model_source(
    model_name: &str,
    table_name: &str,
    columns: &BTreeMap<String, DataType>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "use trellis_core::RelationRegistry;");
    let _ = writeln!(out);
    let _ = writeln!(out, "/// Model definition for the `{table_name}` table.");
    let _ = writeln!(out, "pub struct {model_name};");
    let _ = writeln!(out);
    let _ = writeln!(out, "impl {model_name} {{");
    let _ = writeln!(
        out,
        "    pub const MODEL_NAME: &'static str = \"{model_name}\";"
    );
    let _ = writeln!(
        out,
        "    pub const TABLE_NAME: &'static str = \"{table_name}\";"
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "    /// Declares this model's relationships.");

    let references: Vec<&str> = columns
        .iter()
        .filter(|(_, data_type)| **data_type == DataType::References)
        .map(|(column, _)| column.as_str())
        .collect();

    if references.is_empty() {
        let _ = writeln!(
            out,
            "    pub fn register_relations(_relations: &mut RelationRegistry) {{}}"
        );
    } else {
        let _ = writeln!(
            out,
            "    pub fn register_relations(relations: &mut RelationRegistry) {{"
        );
        for column in references {
            let _ = writeln!(
                out,
                "        relations.belongs_to(Self::MODEL_NAME, \"{column}\", None);"
            );
        }
        let _ = writeln!(out, "    }}");
    }

    let _ = writeln!(out, "}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_migration_version_format() {
        assert_eq!(migration_version(fixed_now()), "20230102030405");
    }

    #[test]
    fn test_generate_model_writes_both_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let generated = generate_model(
            dir.path(),
            "DrinkOrder",
            &["item:string".to_string(), "user:references".to_string()],
            fixed_now(),
        )
        .unwrap();

        assert!(generated.model_path.ends_with("app/models/drink_order.rs"));
        assert!(
            generated
                .migration_path
                .ends_with("db/migrations/20230102030405_create_drink_orders.yml")
        );

        let change: MigrationChange =
            serde_yaml::from_str(&fs::read_to_string(&generated.migration_path).unwrap()).unwrap();
        assert_eq!(change.create_table.table, "drink_orders");
        assert_eq!(change.create_table.columns["item"], DataType::String);
        assert_eq!(change.create_table.columns["user"], DataType::References);
        assert!(change.create_table.timestamps);

        let source = fs::read_to_string(&generated.model_path).unwrap();
        assert!(source.contains("pub struct DrinkOrder;"));
        assert!(source.contains("TABLE_NAME: &'static str = \"drink_orders\""));
        assert!(source.contains("relations.belongs_to(Self::MODEL_NAME, \"user\", None);"));
    }

    #[test]
    fn test_generate_model_without_references() {
        let dir = tempfile::TempDir::new().unwrap();
        let generated =
            generate_model(dir.path(), "User", &["name:string".to_string()], fixed_now()).unwrap();

        let source = fs::read_to_string(&generated.model_path).unwrap();
        assert!(source.contains("register_relations(_relations: &mut RelationRegistry) {}"));
    }

    #[test]
    fn test_generate_model_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        generate_model(dir.path(), "User", &[], fixed_now()).unwrap();
        assert!(matches!(
            generate_model(dir.path(), "User", &[], fixed_now()),
            Err(OrmError::FileExists { .. })
        ));
    }

    #[test]
    fn test_generate_model_rejects_bad_names() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(generate_model(dir.path(), "user", &[], fixed_now()).is_err());
        assert!(
            generate_model(dir.path(), "User", &["Name:string".to_string()], fixed_now()).is_err()
        );
    }
}
