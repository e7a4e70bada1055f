//! Database configuration loading.
//!
//! The configuration lives in `config/database.yml`:
//!
//! ```yaml
//! database:
//!   type: sql            # or "yaml"
//!   params:
//!     connection:
//!       host: localhost
//!       port: 5432
//!       dbname: db/app.sqlite3
//!       user: app
//!       password: secret
//! ```
//!
//! Required keys are validated one by one so that a missing key produces an
//! error naming both the key and the file it was expected in. For the
//! SQLite adapter `dbname` is the database file path; for the flat-file
//! adapter it is the database directory.

use std::path::{Path, PathBuf};

use serde_yaml::Value as YamlValue;

use crate::backend::Store;
use crate::error::{Result, StoreError};
use crate::sql::SqliteStore;
use crate::yaml::YamlStore;

/// Which adapter the configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Flat-file YAML adapter.
    Yaml,
    /// SQLite adapter.
    Sql,
}

/// Connection parameters for the selected adapter.
///
/// Only `dbname` is required; the remaining fields exist for engines that
/// need network credentials and are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Server host, if any.
    pub host: Option<String>,
    /// Server port, if any.
    pub port: Option<u16>,
    /// Database file path (sql) or directory (yaml).
    pub dbname: String,
    /// Authentication user, if any.
    pub user: Option<String>,
    /// Authentication password, if any.
    pub password: Option<String>,
}

/// Parsed and validated database configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Adapter selection.
    pub kind: StoreKind,
    /// Connection parameters.
    pub connection: ConnectionParams,
}

impl DatabaseConfig {
    /// Loads and validates `config/database.yml`-style configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingConfigKey`] naming the first absent
    /// required key, or [`StoreError::InvalidConfigValue`] for malformed
    /// values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let root: YamlValue = serde_yaml::from_str(&raw)?;

        let database = require(&root, "database", path)?;
        let kind = match require_str(database, "type", "database.type", path)? {
            "yaml" => StoreKind::Yaml,
            "sql" => StoreKind::Sql,
            other => {
                return Err(StoreError::InvalidConfigValue {
                    path: path.to_path_buf(),
                    message: format!("unknown database type '{other}', expected yaml or sql"),
                });
            }
        };

        let params = require(database, "params", path)?;
        let connection = require(params, "connection", path)?;
        let dbname =
            require_str(connection, "dbname", "database.params.connection.dbname", path)?
                .to_string();

        let port = match connection.get("port") {
            None | Some(YamlValue::Null) => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|port| u16::try_from(port).ok())
                    .ok_or_else(|| StoreError::InvalidConfigValue {
                        path: path.to_path_buf(),
                        message: "port should be an integer between 0 and 65535".to_string(),
                    })?,
            ),
        };

        Ok(Self {
            kind,
            connection: ConnectionParams {
                host: optional_str(connection, "host"),
                port,
                dbname,
                user: optional_str(connection, "user"),
                password: optional_str(connection, "password"),
            },
        })
    }

    /// Instantiates the configured store adapter.
    pub fn open_store(&self) -> Result<Box<dyn Store>> {
        match self.kind {
            StoreKind::Yaml => Ok(Box::new(YamlStore::open(&self.connection.dbname))),
            StoreKind::Sql => Ok(Box::new(SqliteStore::open(&self.connection.dbname)?)),
        }
    }
}

fn require<'a>(value: &'a YamlValue, key: &str, path: &Path) -> Result<&'a YamlValue> {
    match value.get(key) {
        Some(found) if !found.is_null() => Ok(found),
        _ => Err(StoreError::MissingConfigKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
    }
}

fn require_str<'a>(
    value: &'a YamlValue,
    key: &str,
    full_key: &str,
    path: &Path,
) -> Result<&'a str> {
    let found = value.get(key).ok_or_else(|| StoreError::MissingConfigKey {
        path: path.to_path_buf(),
        key: full_key.to_string(),
    })?;
    found.as_str().ok_or_else(|| StoreError::InvalidConfigValue {
        path: path.to_path_buf(),
        message: format!("{full_key} should be a string"),
    })
}

fn optional_str(value: &YamlValue, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(YamlValue::as_str)
        .map(str::to_string)
}

/// Where a project keeps its database configuration.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config").join("database.yml")
}
