//! Error types for storage adapter operations.
//!
//! Driver errors are never caught or retried inside the adapters; they
//! convert into [`StoreError`] and propagate to the caller, which treats
//! them as fatal for the current invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during backing-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File or directory I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite driver failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Convention or registry failure surfaced through a store operation.
    #[error(transparent)]
    Core(#[from] trellis_core::CoreError),

    /// A required configuration key is absent.
    #[error("invalid parameters in {}: missing {key} key", path.display())]
    MissingConfigKey {
        /// Configuration file that was read.
        path: PathBuf,
        /// Dotted key that was missing.
        key: String,
    },

    /// A configuration key holds a value of the wrong shape.
    #[error("invalid parameters in {}: {message}", path.display())]
    InvalidConfigValue {
        /// Configuration file that was read.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// A filter or value column is absent from the table schema, so its
    /// literal quoting cannot be decided.
    #[error("column '{column}' is not in the schema for table '{table}'")]
    UnknownFilterColumn {
        /// Table the schema describes.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// An operation referenced a table the store has never created.
    #[error("table '{0}' does not exist in the store")]
    MissingTable(String),

    /// Introspection met a column type the type map does not cover.
    #[error("cannot map column {table}.{column} of type '{sql_type}' back to a data type")]
    UnmappedColumnType {
        /// Table being introspected.
        table: String,
        /// Column being introspected.
        column: String,
        /// Declared storage type.
        sql_type: String,
    },
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
