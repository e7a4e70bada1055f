//! Core conventions and registries for the Trellis ORM.
//!
//! This is the pure leaf crate of the workspace: grammar rules, naming
//! transforms, the schema registry, the relationship registry, and the
//! scalar value type. It performs no I/O.
//!
//! # Quick start
//!
//! ```
//! use trellis_core::grammar::pluralize;
//! use trellis_core::naming::model_name_to_table_name;
//! use trellis_core::relations::RelationRegistry;
//!
//! assert_eq!(model_name_to_table_name("DrinkOrder"), "drink_orders");
//! assert_eq!(pluralize("candy"), "candies");
//!
//! let mut relations = RelationRegistry::new();
//! relations.belongs_to("DrinkOrder", "user", None);
//! relations.has_many("User", "drink_orders", None);
//! ```

pub mod error;
pub mod grammar;
pub mod naming;
pub mod relations;
pub mod schema;
pub mod value;

pub use error::{CoreError, Result};
pub use relations::{Relation, RelationRegistry, ResolvedRelation};
pub use schema::{DataType, SchemaArtifact, SchemaRegistry, TableSchema, TIMESTAMP_COLUMNS};
pub use value::Value;
