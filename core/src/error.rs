//! Error types for naming, schema, and relationship operations.
//!
//! Provides a unified error type covering convention violations, unsupported
//! column types, and failed registry lookups.

use thiserror::Error;

/// Errors that can occur in the convention and registry layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A model or column identifier violates its case convention.
    #[error("naming convention violation: {0}")]
    NamingConvention(String),

    /// A column type is not in the supported set.
    #[error("invalid data type '{0}', supported: string, text, integer, references")]
    UnsupportedDataType(String),

    /// A table was requested that the schema registry does not know.
    #[error("unknown table '{0}' in schema registry")]
    SchemaLookup(String),

    /// A relationship was accessed that was never declared.
    #[error("unknown relation '{relation}' on model {model}")]
    UnknownRelation {
        /// Owner model name.
        model: String,
        /// Requested relationship name.
        relation: String,
    },
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
