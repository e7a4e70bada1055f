//! Column types, table schemas, and the process-wide schema registry.
//!
//! The registry is populated exactly once, from a [`SchemaArtifact`] parsed
//! out of the generated `db/schema.yml`. Re-running migrations regenerates
//! the artifact; the process reloads it on the next start. There is no
//! mutation API after construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::naming::validate_column_name;

/// Column names injected by every table creation.
pub const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// The supported column data types.
///
/// `References` is a declaration-time type only: creating a table expands a
/// `references` column `supplier` into a `supplier_id` integer column plus a
/// foreign-key constraint against the `suppliers` table, so introspected
/// schemas never contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Short text, stored as `VARCHAR`.
    String,
    /// Long text, stored as `TEXT`.
    Text,
    /// 64-bit integer.
    Integer,
    /// Foreign-key reference to another model's table.
    References,
}

impl DataType {
    /// Returns the lowercase spec-string form (`"string"`, `"integer"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::References => "references",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(DataType::String),
            "text" => Ok(DataType::Text),
            "integer" => Ok(DataType::Integer),
            "references" => Ok(DataType::References),
            other => Err(CoreError::UnsupportedDataType(other.to_string())),
        }
    }
}

/// Parses a `"<snake_case_name>:<type>"` column spec string.
///
/// # Errors
///
/// Returns [`CoreError::NamingConvention`] for malformed specs or
/// non-snake_case names, and [`CoreError::UnsupportedDataType`] for unknown
/// types.
pub fn parse_column_spec(spec: &str) -> Result<(String, DataType)> {
    let (column, data_type) = spec.split_once(':').ok_or_else(|| {
        CoreError::NamingConvention(format!("column spec {spec} should look like name:string"))
    })?;
    validate_column_name(column)?;
    Ok((column.to_string(), data_type.parse()?))
}

/// Column and constraint metadata for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column name → data type.
    pub columns: BTreeMap<String, DataType>,
    /// Constraint name → referenced table.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

/// The generated schema definition: one [`TableSchema`] per table.
///
/// Serialized as `db/schema.yml` after each migration run, and parsed back
/// at process start to populate the [`SchemaRegistry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaArtifact {
    /// Table name → table definition.
    pub tables: BTreeMap<String, TableSchema>,
}

impl SchemaArtifact {
    /// Registers one table definition, replacing any previous entry.
    ///
    /// This is the callback surface the generated artifact drives; the
    /// schema dumper and the YAML adapter use it as well.
    pub fn create_table(&mut self, table_name: &str, schema: TableSchema) {
        self.tables.insert(table_name.to_string(), schema);
    }
}

/// Read-only mapping from table name to column/constraint metadata.
///
/// Constructed once per process from the parsed schema artifact, before any
/// relationship registration or query. All later access goes through
/// [`get`](Self::get).
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaRegistry {
    /// Populates the registry from a parsed schema artifact.
    pub fn from_artifact(artifact: SchemaArtifact) -> Self {
        Self {
            tables: artifact.tables,
        }
    }

    /// Looks up the schema for a table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SchemaLookup`] if the table is unknown.
    pub fn get(&self, table_name: &str) -> Result<&TableSchema> {
        self.tables
            .get(table_name)
            .ok_or_else(|| CoreError::SchemaLookup(table_name.to_string()))
    }

    /// Returns `true` if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterates over registered table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
