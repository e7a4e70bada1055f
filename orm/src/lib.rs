//! The Trellis relational mapping layer.
//!
//! Ties the convention crate and the storage adapters together into an
//! active-record style workflow:
//!
//! - [`Record`] and [`Engine`] for mapping rows to in-memory records,
//!   saving them, and traversing declared relationships;
//! - [`migrate`] for discovering and running declarative migrations and
//!   maintaining the `db/schema.yml` artifact;
//! - [`generate`] for producing model skeletons and migration files;
//! - [`seed`] for loading fixture rows from `db/seeds.yml`.
//!
//! # Quick start
//!
//! ```no_run
//! use trellis_core::{RelationRegistry, SchemaRegistry};
//! use trellis_orm::{Engine, Record, migrate};
//! use trellis_store::SqliteStore;
//!
//! let mut store = SqliteStore::open("db/app.sqlite3").unwrap();
//! migrate::run_migrations(
//!     &mut store,
//!     &migrate::default_migrations_dir(),
//!     &migrate::default_schema_path(),
//! )
//! .unwrap();
//!
//! let artifact = migrate::load_artifact(&migrate::default_schema_path()).unwrap();
//! let mut relations = RelationRegistry::new();
//! relations.has_many("User", "drink_orders", None);
//! relations.belongs_to("DrinkOrder", "user", None);
//!
//! let mut engine = Engine::new(
//!     SchemaRegistry::from_artifact(artifact),
//!     relations,
//!     Box::new(store),
//! );
//!
//! let mut user = Record::new("User");
//! user.set("name", "ada");
//! engine.save(&mut user).unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod generate;
pub mod migrate;
pub mod record;
pub mod seed;

pub use engine::Engine;
pub use error::{OrmError, Result};
pub use record::{Attribute, Record};
