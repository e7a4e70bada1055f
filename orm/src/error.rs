//! Error types for the mapping engine, migration runner, and generator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the ORM layer.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Convention or registry failure.
    #[error(transparent)]
    Core(#[from] trellis_core::CoreError),

    /// Backing-store failure.
    #[error(transparent)]
    Store(#[from] trellis_store::StoreError),

    /// File or directory I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A migration unit failed to apply; later units were not attempted.
    #[error("migration {version} failed: {source}")]
    MigrationFailure {
        /// Version of the unit that failed.
        version: String,
        /// What went wrong inside the unit.
        #[source]
        source: Box<OrmError>,
    },

    /// A file in the migrations directory does not follow the filename
    /// convention.
    #[error("invalid migration file {}: {message}", path.display())]
    InvalidMigrationFile {
        /// Offending file.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },

    /// Saving a record whose reference attribute points at an unsaved
    /// record; the foreign key has no value yet.
    #[error("cannot save {model}: referenced {relation} record has no id yet")]
    UnsavedReference {
        /// Model being saved.
        model: String,
        /// Name of the unsaved reference attribute.
        relation: String,
    },

    /// An operation needed a persisted record but the record has no id.
    #[error("{model} record has not been saved yet")]
    MissingId {
        /// Model of the unsaved record.
        model: String,
    },

    /// A generated file already exists and would be clobbered.
    #[error("refusing to overwrite existing file {}", path.display())]
    FileExists {
        /// Path that already exists.
        path: PathBuf,
    },
}

/// Convenience alias for results with [`OrmError`].
pub type Result<T> = std::result::Result<T, OrmError>;
