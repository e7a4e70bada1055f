//! Declarative relationship registry.
//!
//! Models declare `belongs_to`/`has_many` relationships once, up front; the
//! registry stores them in two maps keyed by owner model name. Re-declaring
//! a relationship replaces the previous entry. Access to an undeclared name
//! is a typed error rather than a runtime dispatch fallback.
//!
//! Initialization order matters: the schema registry is loaded first, then
//! relationships are registered, then the first query runs.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::grammar::{is_plural, singularize};
use crate::naming::table_ref_to_model_name;

/// One declared relationship from an owner model to a target model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Target model name (UpperCamelCase).
    pub target_model: String,
    /// Explicit join path of intermediate table names; empty means the
    /// default path `[relation_name]` applies at access time.
    pub through: Vec<String>,
}

impl Relation {
    /// Returns the traversal path for this relation under `name`.
    pub fn through_path(&self, name: &str) -> Vec<String> {
        if self.through.is_empty() {
            vec![name.to_string()]
        } else {
            self.through.clone()
        }
    }
}

/// A resolved relationship lookup, tagged by cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedRelation<'a> {
    /// Single-valued relationship (`belongs_to`).
    BelongsTo(&'a Relation),
    /// Many-valued relationship (`has_many`).
    HasMany(&'a Relation),
}

/// Registry of `belongs_to` (`one`) and `has_many` (`many`) declarations.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    one: BTreeMap<String, BTreeMap<String, Relation>>,
    many: BTreeMap<String, BTreeMap<String, Relation>>,
}

impl RelationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a single-valued relationship on `owner`.
    ///
    /// `name` is the singular accessor name (`"supplier"`); the target model
    /// name is derived from it. `through` overrides the default one-hop join
    /// path.
    pub fn belongs_to(&mut self, owner: &str, name: &str, through: Option<Vec<String>>) {
        let relation = Relation {
            target_model: table_ref_to_model_name(name),
            through: through.unwrap_or_default(),
        };
        self.one
            .entry(owner.to_string())
            .or_default()
            .insert(name.to_string(), relation);
    }

    /// Declares a many-valued relationship on `owner`.
    ///
    /// `name` is the plural accessor name (`"orders"`); the target model
    /// name is derived from its singular form.
    pub fn has_many(&mut self, owner: &str, name: &str, through: Option<Vec<String>>) {
        let target_ref = if is_plural(name) {
            singularize(name)
        } else {
            name.to_string()
        };
        let relation = Relation {
            target_model: table_ref_to_model_name(&target_ref),
            through: through.unwrap_or_default(),
        };
        self.many
            .entry(owner.to_string())
            .or_default()
            .insert(name.to_string(), relation);
    }

    /// Resolves a relationship accessed as `name` on `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownRelation`] if neither map has an entry.
    pub fn resolve(&self, owner: &str, name: &str) -> Result<ResolvedRelation<'_>> {
        if let Some(relation) = self.one.get(owner).and_then(|rels| rels.get(name)) {
            return Ok(ResolvedRelation::BelongsTo(relation));
        }
        if let Some(relation) = self.many.get(owner).and_then(|rels| rels.get(name)) {
            return Ok(ResolvedRelation::HasMany(relation));
        }
        Err(CoreError::UnknownRelation {
            model: owner.to_string(),
            relation: name.to_string(),
        })
    }
}
