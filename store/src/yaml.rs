//! Flat-file YAML storage adapter.
//!
//! Each table lives in one YAML document under the database directory:
//! the column header (declaration types already expanded), the foreign-key
//! constraints, the next id to hand out, and the rows. Migration
//! bookkeeping is a plain list of versions in `schema_migrations.yml`.
//!
//! The relationship traversal of [`select_where`](Store::select_where) is
//! performed in memory with the same pairwise, pluralization-driven hop
//! logic the SQL adapter renders into JOIN clauses.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use trellis_core::grammar::{is_plural, pluralize, singularize};
use trellis_core::naming::foreign_key_column;
use trellis_core::schema::{DataType, SchemaArtifact, TableSchema, TIMESTAMP_COLUMNS};
use trellis_core::value::Value;

use crate::backend::{ColumnSpecs, Row, Store};
use crate::error::{Result, StoreError};

const MIGRATIONS_FILE: &str = "schema_migrations.yml";

/// On-disk form of one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TableFile {
    columns: BTreeMap<String, DataType>,
    #[serde(default)]
    constraints: BTreeMap<String, String>,
    next_id: i64,
    rows: Vec<Row>,
}

/// Flat-file store rooted at a directory.
pub struct YamlStore {
    dir: PathBuf,
}

impl YamlStore {
    /// Creates a store handle for the given database directory.
    ///
    /// The directory itself is created by
    /// [`create_database`](Store::create_database).
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn table_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{table_name}.yml"))
    }

    fn load_table(&self, table_name: &str) -> Result<TableFile> {
        let path = self.table_path(table_name);
        if !path.is_file() {
            return Err(StoreError::MissingTable(table_name.to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn save_table(&self, table_name: &str, table: &TableFile) -> Result<()> {
        let raw = serde_yaml::to_string(table)?;
        std::fs::write(self.table_path(table_name), raw)?;
        Ok(())
    }

    fn now() -> Value {
        Value::Text(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }

    fn row_id(row: &Row) -> Option<i64> {
        row.get("id").and_then(Value::as_integer)
    }
}

impl Store for YamlStore {
    fn create_database(&mut self) -> Result<()> {
        debug!(dir = %self.dir.display(), "create database directory");
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn drop_database(&mut self) -> Result<()> {
        debug!(dir = %self.dir.display(), "drop database directory");
        if self.dir.is_dir() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn initialize_database(&mut self) -> Result<()> {
        Ok(())
    }

    fn create_table(
        &mut self,
        table_name: &str,
        columns: &ColumnSpecs,
        timestamps: bool,
    ) -> Result<()> {
        let mut table = TableFile {
            next_id: 1,
            ..TableFile::default()
        };

        table
            .columns
            .insert("id".to_string(), DataType::Integer);
        for (column, data_type) in columns {
            match data_type {
                DataType::References => {
                    table
                        .columns
                        .insert(foreign_key_column(column), DataType::Integer);
                    table
                        .constraints
                        .insert(format!("fk_{table_name}_{column}"), pluralize(column));
                }
                other => {
                    table.columns.insert(column.clone(), *other);
                }
            }
        }
        if timestamps {
            for column in TIMESTAMP_COLUMNS {
                table.columns.insert(column.to_string(), DataType::String);
            }
        }

        debug!(table = table_name, "create table file");
        self.save_table(table_name, &table)
    }

    fn destroy_all(&mut self, table_name: &str) -> Result<()> {
        let mut table = self.load_table(table_name)?;
        debug!(table = table_name, "destroy all rows");
        table.rows.clear();
        self.save_table(table_name, &table)
    }

    fn select_all(&self, table_name: &str) -> Result<Vec<Row>> {
        Ok(self.load_table(table_name)?.rows)
    }

    fn select_where(
        &self,
        table_name: &str,
        _schema: &TableSchema,
        through: &[String],
        filters: &[(String, Value)],
    ) -> Result<(Vec<Row>, String)> {
        let owner = self.load_table(table_name)?;
        let mut current: Vec<Row> = owner
            .rows
            .into_iter()
            .filter(|row| {
                filters
                    .iter()
                    .all(|(column, value)| row.get(column) == Some(value))
            })
            .collect();

        let mut previous_ref = if is_plural(table_name) {
            singularize(table_name)
        } else {
            table_name.to_string()
        };

        for join_table in through {
            if is_plural(join_table) {
                // Has-many direction: the next table carries the foreign key.
                let fk = foreign_key_column(&previous_ref);
                let ids: BTreeSet<i64> = current.iter().filter_map(Self::row_id).collect();
                current = self
                    .load_table(join_table)?
                    .rows
                    .into_iter()
                    .filter(|row| {
                        row.get(&fk)
                            .and_then(Value::as_integer)
                            .is_some_and(|id| ids.contains(&id))
                    })
                    .collect();
            } else {
                // Belongs-to direction: the previous rows carry the key.
                let fk = foreign_key_column(join_table);
                let ids: BTreeSet<i64> = current
                    .iter()
                    .filter_map(|row| row.get(&fk).and_then(Value::as_integer))
                    .collect();
                current = self
                    .load_table(&pluralize(join_table))?
                    .rows
                    .into_iter()
                    .filter(|row| Self::row_id(row).is_some_and(|id| ids.contains(&id)))
                    .collect();
            }

            previous_ref = if is_plural(join_table) {
                singularize(join_table)
            } else {
                join_table.clone()
            };
        }

        let target_table = through.last().cloned().unwrap_or_else(|| table_name.to_string());
        Ok((current, target_table))
    }

    fn insert(
        &mut self,
        table_name: &str,
        _schema: &TableSchema,
        values: &[(String, Value)],
    ) -> Result<i64> {
        let mut table = self.load_table(table_name)?;
        let id = table.next_id;
        table.next_id += 1;

        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(id));
        for (column, value) in values {
            if TIMESTAMP_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            if !table.columns.contains_key(column) {
                return Err(StoreError::UnknownFilterColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                });
            }
            row.insert(column.clone(), value.clone());
        }
        let now = Self::now();
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        debug!(table = table_name, id, "insert row");
        table.rows.push(row);
        self.save_table(table_name, &table)?;
        Ok(id)
    }

    fn update(
        &mut self,
        table_name: &str,
        _schema: &TableSchema,
        id: i64,
        values: &[(String, Value)],
    ) -> Result<()> {
        let mut table = self.load_table(table_name)?;

        for (column, _) in values {
            if !TIMESTAMP_COLUMNS.contains(&column.as_str())
                && !table.columns.contains_key(column)
            {
                return Err(StoreError::UnknownFilterColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                });
            }
        }

        for row in &mut table.rows {
            if Self::row_id(row) != Some(id) {
                continue;
            }
            for (column, value) in values {
                if TIMESTAMP_COLUMNS.contains(&column.as_str()) {
                    continue;
                }
                row.insert(column.clone(), value.clone());
            }
            row.insert("updated_at".to_string(), Self::now());
        }

        debug!(table = table_name, id, "update row");
        self.save_table(table_name, &table)
    }

    fn applied_migrations(&mut self) -> Result<Vec<String>> {
        let path = self.dir.join(MIGRATIONS_FILE);
        if !path.is_file() {
            debug!("create migrations file");
            std::fs::create_dir_all(&self.dir)?;
            std::fs::write(&path, serde_yaml::to_string(&Vec::<String>::new())?)?;
            return Ok(Vec::new());
        }
        let mut versions: Vec<String> = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;
        versions.sort();
        Ok(versions)
    }

    fn mark_migration_done(&mut self, version: &str) -> Result<()> {
        let mut versions = self.applied_migrations()?;
        versions.push(version.to_string());
        let path = self.dir.join(MIGRATIONS_FILE);
        std::fs::write(&path, serde_yaml::to_string(&versions)?)?;
        Ok(())
    }

    fn dump_schema(&self) -> Result<SchemaArtifact> {
        let mut artifact = SchemaArtifact::default();
        if !self.dir.is_dir() {
            return Ok(artifact);
        }

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("yml") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if format!("{stem}.yml") == MIGRATIONS_FILE {
                continue;
            }

            let table = self.load_table(stem)?;
            artifact.create_table(
                stem,
                TableSchema {
                    columns: table.columns,
                    constraints: table.constraints,
                },
            );
        }

        Ok(artifact)
    }
}
