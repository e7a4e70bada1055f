//! Storage adapters for the Trellis ORM.
//!
//! Exposes one capability interface, [`Store`], with two implementations
//! selected by configuration: [`SqliteStore`] over a relational engine and
//! [`YamlStore`] over flat files. Both provide table creation with injected
//! ids and timestamps, row CRUD, the relationship traversal query,
//! migration bookkeeping, and live schema introspection.
//!
//! # Quick start
//!
//! ```no_run
//! use trellis_store::{DatabaseConfig, Store};
//!
//! let config = DatabaseConfig::load("config/database.yml").unwrap();
//! let mut store = config.open_store().unwrap();
//! store.create_database().unwrap();
//! store.initialize_database().unwrap();
//!
//! let versions = store.applied_migrations().unwrap();
//! println!("{} migrations applied", versions.len());
//! ```
//!
//! # Failure semantics
//!
//! Adapters never catch or retry driver errors; every failure converts to
//! [`StoreError`] and is fatal for the current invocation. Multi-statement
//! operations (table plus trigger) are transactional per logical operation,
//! but there is no cross-operation transaction and no rollback of earlier
//! operations.

mod backend;
mod config;
mod error;
mod sql;
mod yaml;

pub use backend::{ColumnSpecs, Row, Store};
pub use config::{ConnectionParams, DatabaseConfig, StoreKind, default_config_path};
pub use error::{Result, StoreError};
pub use sql::SqliteStore;
pub use yaml::YamlStore;
