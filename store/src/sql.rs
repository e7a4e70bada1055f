//! SQLite storage adapter.
//!
//! Generates and executes the SQL for table creation (with injected `id`,
//! expanded `references` columns, timestamp columns, and an `updated_at`
//! refresh trigger), row CRUD, the relationship join query, migration
//! bookkeeping, and live schema introspection.
//!
//! # Query text
//!
//! Query text is built by literal rendering, quoted per the column's
//! declared data type (`string`/`text` single-quoted with `''` escaping,
//! `integer` bare). This mirrors the select/insert/update contract of the
//! mapping engine; prepared-statement parameterization is used only for
//! the migration bookkeeping table.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};
use tracing::debug;

use trellis_core::grammar::{is_plural, pluralize, singularize};
use trellis_core::naming::table_aliases;
use trellis_core::schema::{DataType, SchemaArtifact, TableSchema, TIMESTAMP_COLUMNS};
use trellis_core::value::Value;

use crate::backend::{ColumnSpecs, Row, Store};
use crate::error::{Result, StoreError};

const MIGRATIONS_TABLE: &str = "schema_migrations";

/// Renders a value as a SQL literal according to the column's declared type.
pub(crate) fn render_literal(value: &Value, data_type: DataType) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    let raw = match value {
        Value::Integer(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        Value::Null => unreachable!(),
    };
    match data_type {
        DataType::String | DataType::Text => format!("'{}'", raw.replace('\'', "''")),
        DataType::Integer | DataType::References => raw,
    }
}

/// Builds the relationship traversal query.
///
/// Returns the SQL and the resolved target table. The join direction of
/// each hop is inferred from the pluralization of the next table name:
/// a plural name carries the foreign key to the previous table (has-many
/// direction), a singular name means the previous table carries the key
/// (belongs-to direction).
pub(crate) fn build_select_where(
    table_name: &str,
    schema: &TableSchema,
    through: &[String],
    filters: &[(String, Value)],
) -> Result<(String, String)> {
    let (model_alias, through_aliases) = table_aliases(table_name, through);

    let (target_table, target_alias) = match through.last() {
        Some(last) => (last.clone(), through_aliases.last().unwrap().clone()),
        None => (table_name.to_string(), model_alias.clone()),
    };

    let mut sql = format!("SELECT {target_alias}.*\nFROM {table_name} {model_alias}");

    let mut previous_ref = if is_plural(table_name) {
        singularize(table_name)
    } else {
        table_name.to_string()
    };
    let mut previous_alias = model_alias.clone();

    for (join_table, join_alias) in through.iter().zip(&through_aliases) {
        if is_plural(join_table) {
            write!(
                sql,
                "\nJOIN {join_table} {join_alias} ON {join_alias}.\"{previous_ref}_id\" = {previous_alias}.id"
            )
            .expect("write to string");
        } else {
            write!(
                sql,
                "\nJOIN {} {join_alias} ON {join_alias}.id = {previous_alias}.\"{join_table}_id\"",
                pluralize(join_table)
            )
            .expect("write to string");
        }

        previous_ref = if is_plural(join_table) {
            singularize(join_table)
        } else {
            join_table.clone()
        };
        previous_alias = join_alias.clone();
    }

    if !filters.is_empty() {
        let mut clauses = Vec::with_capacity(filters.len());
        for (column, value) in filters {
            let data_type = schema.columns.get(column).copied().ok_or_else(|| {
                StoreError::UnknownFilterColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                }
            })?;
            clauses.push(format!(
                "{model_alias}.\"{column}\" = {}",
                render_literal(value, data_type)
            ));
        }
        sql.push_str("\nWHERE ");
        sql.push_str(&clauses.join("\nAND "));
    }

    sql.push(';');
    Ok((sql, target_table))
}

/// Builds the `CREATE TABLE` statement plus the `updated_at` trigger.
pub(crate) fn build_create_table(
    table_name: &str,
    columns: &ColumnSpecs,
    timestamps: bool,
) -> String {
    let mut lines = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];

    for (column, data_type) in columns {
        match data_type {
            DataType::String => lines.push(format!("\"{column}\" VARCHAR NULL")),
            DataType::Text => lines.push(format!("\"{column}\" TEXT NULL")),
            DataType::Integer => lines.push(format!("\"{column}\" BIGINT NULL")),
            DataType::References => lines.push(format!("{column}_id BIGINT NOT NULL")),
        }
    }

    if timestamps {
        lines.push("created_at TIMESTAMP NOT NULL DEFAULT (datetime('now'))".to_string());
        lines.push("updated_at TIMESTAMP NOT NULL DEFAULT (datetime('now'))".to_string());
    }

    for (column, data_type) in columns {
        if *data_type == DataType::References {
            lines.push(format!(
                "CONSTRAINT fk_{table_name}_{column} FOREIGN KEY ({column}_id) REFERENCES {}(id)",
                pluralize(column)
            ));
        }
    }

    let mut sql = format!("CREATE TABLE \"{table_name}\" (\n{}\n);", lines.join(",\n"));

    if timestamps {
        write!(
            sql,
            "\nCREATE TRIGGER set_timestamp_{table_name}\nAFTER UPDATE ON {table_name}\nFOR EACH ROW\nBEGIN\n  UPDATE {table_name} SET updated_at = datetime('now') WHERE id = NEW.id;\nEND;"
        )
        .expect("write to string");
    }

    sql
}

/// SQLite-backed store.
///
/// Holds a single connection for the lifetime of the process; all use is
/// sequential. Multi-statement operations (table plus trigger) run inside
/// one transaction, committed immediately.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (and creates if absent) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens an in-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn table_exists(&self, table_name: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        let count: i64 = stmt.query_row([table_name], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        debug!("{sql}");
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, name) in names.iter().enumerate() {
                let value = match row.get_ref(index)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(n) => Value::Integer(n),
                    ValueRef::Real(f) => Value::Text(f.to_string()),
                    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
                };
                record.insert(name.clone(), value);
            }
            out.push(record);
        }
        Ok(out)
    }

    fn user_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='table' \
             AND name NOT LIKE 'sqlite_%' AND name != ?1 ORDER BY name",
        )?;
        let names = stmt
            .query_map([MIGRATIONS_TABLE], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn data_type_from_sql(table: &str, column: &str, sql_type: &str) -> Result<DataType> {
        match sql_type.to_ascii_uppercase().as_str() {
            "VARCHAR" => Ok(DataType::String),
            "TEXT" => Ok(DataType::Text),
            "BIGINT" | "INTEGER" => Ok(DataType::Integer),
            // timestamps read back as plain text
            "TIMESTAMP" => Ok(DataType::String),
            other => Err(StoreError::UnmappedColumnType {
                table: table.to_string(),
                column: column.to_string(),
                sql_type: other.to_string(),
            }),
        }
    }

    fn ensure_migrations_table(&mut self) -> Result<()> {
        if !self.table_exists(MIGRATIONS_TABLE)? {
            debug!("create migrations table");
            self.conn.execute_batch(&format!(
                "CREATE TABLE {MIGRATIONS_TABLE} (\n  version TEXT\n);"
            ))?;
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn create_database(&mut self) -> Result<()> {
        // The database file comes into existence when the connection opens;
        // forcing a write here guarantees it is on disk.
        self.conn.execute_batch("PRAGMA user_version = 0;")?;
        if let Some(path) = &self.path {
            debug!(path = %path.display(), "created database");
        }
        Ok(())
    }

    fn drop_database(&mut self) -> Result<()> {
        match &self.path {
            Some(path) => {
                debug!(path = %path.display(), "dropping database file");
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
            None => {
                // In-memory database: dropping means removing every table.
                let mut tables = self.user_tables()?;
                if self.table_exists(MIGRATIONS_TABLE)? {
                    tables.push(MIGRATIONS_TABLE.to_string());
                }
                for table in tables {
                    self.conn
                        .execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\";"))?;
                }
            }
        }
        Ok(())
    }

    fn initialize_database(&mut self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    fn create_table(
        &mut self,
        table_name: &str,
        columns: &ColumnSpecs,
        timestamps: bool,
    ) -> Result<()> {
        let sql = build_create_table(table_name, columns, timestamps);
        debug!("{sql}");

        // Table and trigger creation form one logical operation.
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(())
    }

    fn destroy_all(&mut self, table_name: &str) -> Result<()> {
        let sql = format!("DELETE FROM {table_name};");
        debug!("{sql}");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn select_all(&self, table_name: &str) -> Result<Vec<Row>> {
        self.query_rows(&format!("SELECT * FROM {table_name};"))
    }

    fn select_where(
        &self,
        table_name: &str,
        schema: &TableSchema,
        through: &[String],
        filters: &[(String, Value)],
    ) -> Result<(Vec<Row>, String)> {
        let (sql, target_table) = build_select_where(table_name, schema, through, filters)?;
        let rows = self.query_rows(&sql)?;
        Ok((rows, target_table))
    }

    fn insert(
        &mut self,
        table_name: &str,
        schema: &TableSchema,
        values: &[(String, Value)],
    ) -> Result<i64> {
        let mut names = Vec::new();
        let mut literals = Vec::new();
        for (column, value) in values {
            if TIMESTAMP_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            let data_type = schema.columns.get(column).copied().ok_or_else(|| {
                StoreError::UnknownFilterColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                }
            })?;
            names.push(format!("\"{column}\""));
            literals.push(render_literal(value, data_type));
        }

        let sql = format!(
            "INSERT INTO {table_name} ({}\n) VALUES ({}\n);",
            names.join(", "),
            literals.join(", ")
        );
        debug!("{sql}");
        self.conn.execute_batch(&sql)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(
        &mut self,
        table_name: &str,
        schema: &TableSchema,
        id: i64,
        values: &[(String, Value)],
    ) -> Result<()> {
        let mut assignments = Vec::new();
        for (column, value) in values {
            if TIMESTAMP_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            let data_type = schema.columns.get(column).copied().ok_or_else(|| {
                StoreError::UnknownFilterColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                }
            })?;
            assignments.push(format!(
                "\"{column}\" = {}",
                render_literal(value, data_type)
            ));
        }

        let sql = format!(
            "UPDATE {table_name} SET {}\nWHERE id = {id};",
            assignments.join(",\n")
        );
        debug!("{sql}");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn applied_migrations(&mut self) -> Result<Vec<String>> {
        self.ensure_migrations_table()?;

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT version FROM {MIGRATIONS_TABLE}"))?;
        let mut versions = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        versions.sort();
        Ok(versions)
    }

    fn mark_migration_done(&mut self, version: &str) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO {MIGRATIONS_TABLE} (version) VALUES (?1)"),
            params![version],
        )?;
        Ok(())
    }

    fn dump_schema(&self) -> Result<SchemaArtifact> {
        let mut artifact = SchemaArtifact::default();

        for table in self.user_tables()? {
            let mut schema = TableSchema::default();

            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
            let columns = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (column, sql_type) in columns {
                let data_type = Self::data_type_from_sql(&table, &column, &sql_type)?;
                schema.columns.insert(column, data_type);
            }

            let mut stmt = self
                .conn
                .prepare(&format!("PRAGMA foreign_key_list(\"{table}\")"))?;
            let foreign_keys = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(2)?, row.get::<_, String>(3)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (referenced_table, from_column) in foreign_keys {
                let referenced_ref = from_column.strip_suffix("_id").unwrap_or(&from_column);
                schema
                    .constraints
                    .insert(format!("fk_{table}_{referenced_ref}"), referenced_table);
            }

            artifact.create_table(&table, schema);
        }

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> TableSchema {
        let mut schema = TableSchema::default();
        schema.columns.insert("id".to_string(), DataType::Integer);
        schema.columns.insert("name".to_string(), DataType::String);
        schema.columns.insert("age".to_string(), DataType::Integer);
        schema
    }

    #[test]
    fn test_render_literal_quoting() {
        assert_eq!(
            render_literal(&Value::from("latte"), DataType::String),
            "'latte'"
        );
        assert_eq!(render_literal(&Value::Integer(3), DataType::Integer), "3");
        assert_eq!(render_literal(&Value::Null, DataType::String), "NULL");
        assert_eq!(
            render_literal(&Value::from("O'Brien"), DataType::String),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_build_select_where_no_through() {
        let (sql, target) =
            build_select_where("users", &users_schema(), &[], &[("id".into(), 1.into())]).unwrap();
        assert_eq!(target, "users");
        assert_eq!(
            sql,
            "SELECT u.*\nFROM users u\nWHERE u.\"id\" = 1;"
        );
    }

    #[test]
    fn test_build_select_where_has_many_hop() {
        let through = vec!["drink_orders".to_string()];
        let (sql, target) = build_select_where(
            "users",
            &users_schema(),
            &through,
            &[("id".into(), 7.into())],
        )
        .unwrap();
        assert_eq!(target, "drink_orders");
        assert!(sql.starts_with("SELECT d.*\nFROM users u"));
        assert!(sql.contains("JOIN drink_orders d ON d.\"user_id\" = u.id"));
        assert!(sql.ends_with("WHERE u.\"id\" = 7;"));
    }

    #[test]
    fn test_build_select_where_belongs_to_hop() {
        let mut schema = users_schema();
        schema
            .columns
            .insert("user_id".to_string(), DataType::Integer);
        let through = vec!["user".to_string()];
        let (sql, target) = build_select_where(
            "drink_orders",
            &schema,
            &through,
            &[("id".into(), 2.into())],
        )
        .unwrap();
        assert_eq!(target, "user");
        assert!(sql.contains("JOIN users u ON u.id = d.\"user_id\""));
    }

    #[test]
    fn test_build_select_where_two_hops() {
        let through = vec!["drink_orders".to_string(), "items".to_string()];
        let (sql, target) = build_select_where(
            "users",
            &users_schema(),
            &through,
            &[("name".into(), "ada".into())],
        )
        .unwrap();
        assert_eq!(target, "items");
        assert!(sql.contains("JOIN drink_orders d ON d.\"user_id\" = u.id"));
        assert!(sql.contains("JOIN items i ON i.\"drink_order_id\" = d.id"));
        assert!(sql.contains("WHERE u.\"name\" = 'ada'"));
    }

    #[test]
    fn test_build_select_where_unknown_filter_column() {
        let err = build_select_where(
            "users",
            &users_schema(),
            &[],
            &[("missing".into(), 1.into())],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::UnknownFilterColumn { .. }));
    }

    #[test]
    fn test_build_create_table_expands_references() {
        let mut columns = ColumnSpecs::new();
        columns.insert("name".to_string(), DataType::String);
        columns.insert("supplier".to_string(), DataType::References);

        let sql = build_create_table("drinks", &columns, true);
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"name\" VARCHAR NULL"));
        assert!(sql.contains("supplier_id BIGINT NOT NULL"));
        assert!(sql.contains(
            "CONSTRAINT fk_drinks_supplier FOREIGN KEY (supplier_id) REFERENCES suppliers(id)"
        ));
        assert!(sql.contains("created_at TIMESTAMP NOT NULL"));
        assert!(sql.contains("CREATE TRIGGER set_timestamp_drinks"));
    }

    #[test]
    fn test_build_create_table_without_timestamps() {
        let mut columns = ColumnSpecs::new();
        columns.insert("name".to_string(), DataType::String);

        let sql = build_create_table("drinks", &columns, false);
        assert!(!sql.contains("created_at"));
        assert!(!sql.contains("CREATE TRIGGER"));
    }
}
