//! The capability interface every backing store implements.

use std::collections::BTreeMap;

use trellis_core::schema::{DataType, SchemaArtifact, TableSchema};
use trellis_core::value::Value;

use crate::error::Result;

/// One result row: column name → scalar value.
pub type Row = BTreeMap<String, Value>;

/// Column specifications handed to [`Store::create_table`], in declaration
/// form (`references` not yet expanded).
pub type ColumnSpecs = BTreeMap<String, DataType>;

/// Capability interface over a backing store.
///
/// Two implementations exist: [`SqliteStore`](crate::SqliteStore) for the
/// relational engine and [`YamlStore`](crate::YamlStore) for the flat-file
/// variant. Which one a process uses is decided once, from configuration.
///
/// All calls are blocking round-trips; any driver failure is surfaced as a
/// [`StoreError`](crate::StoreError) and is fatal for the invocation.
pub trait Store {
    /// Creates the database itself (file or directory). Administrative,
    /// outside any transaction.
    fn create_database(&mut self) -> Result<()>;

    /// Destroys the database itself. Administrative, outside any
    /// transaction; the store handle is not usable afterwards.
    fn drop_database(&mut self) -> Result<()>;

    /// One-time post-create setup (pragmas, trigger support).
    fn initialize_database(&mut self) -> Result<()>;

    /// Creates a table from declaration-form column specs.
    ///
    /// Injects an `id` primary key; expands each `references` column
    /// `<name>` into `<name>_id` plus a foreign-key constraint against the
    /// pluralized `<name>` table; appends `created_at`/`updated_at` unless
    /// `timestamps` is false, wiring up an update trigger where the engine
    /// supports one.
    fn create_table(&mut self, table_name: &str, columns: &ColumnSpecs, timestamps: bool)
    -> Result<()>;

    /// Deletes every row of a table.
    fn destroy_all(&mut self, table_name: &str) -> Result<()>;

    /// Returns every row of a table.
    fn select_all(&self, table_name: &str) -> Result<Vec<Row>>;

    /// Runs the relationship traversal query.
    ///
    /// Filters apply to the owner table's columns and are quoted according
    /// to `schema` (the owner's table schema). `through` is the ordered join
    /// path; the returned table name is the resolved target (the last
    /// through entry, or the owner table when the path is empty).
    fn select_where(
        &self,
        table_name: &str,
        schema: &TableSchema,
        through: &[String],
        filters: &[(String, Value)],
    ) -> Result<(Vec<Row>, String)>;

    /// Inserts a row and returns the generated id. Timestamp columns are
    /// skipped; the store fills them itself.
    fn insert(&mut self, table_name: &str, schema: &TableSchema, values: &[(String, Value)])
    -> Result<i64>;

    /// Updates the row with the given id. Timestamp columns are skipped;
    /// the store refreshes `updated_at` itself.
    fn update(
        &mut self,
        table_name: &str,
        schema: &TableSchema,
        id: i64,
        values: &[(String, Value)],
    ) -> Result<()>;

    /// Returns the applied migration versions, sorted ascending. Creates
    /// the bookkeeping table lazily on first use.
    fn applied_migrations(&mut self) -> Result<Vec<String>>;

    /// Records a migration version as applied.
    fn mark_migration_done(&mut self, version: &str) -> Result<()>;

    /// Introspects live table metadata into a schema artifact.
    ///
    /// Round-trips structure, not row data: the artifact contains every
    /// live column (including the injected `id` and timestamps) and the
    /// foreign-key constraints.
    fn dump_schema(&self) -> Result<SchemaArtifact>;
}
