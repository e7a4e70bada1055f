//! The relational mapping engine.
//!
//! An [`Engine`] binds the three collaborators a query needs: the schema
//! registry (column types for literal quoting), the relationship registry
//! (declared `belongs_to`/`has_many` links), and a backing store. All three
//! are constructed once and injected; the engine holds no global state.
//!
//! Relationship traversal is bidirectional: fetching `user.drink_orders`
//! returns the order records, each carrying a `user` reference back to the
//! owner, and caches the collection on the owner record.

use std::collections::BTreeMap;

use tracing::debug;
use trellis_core::naming::{foreign_key_column, model_name_to_table_name, model_name_to_table_ref};
use trellis_core::relations::{RelationRegistry, ResolvedRelation};
use trellis_core::schema::{SchemaRegistry, TIMESTAMP_COLUMNS};
use trellis_core::value::Value;
use trellis_store::Store;

use crate::error::{OrmError, Result};
use crate::record::{Attribute, Record};

/// Mapping engine over one backing store.
pub struct Engine {
    schema: SchemaRegistry,
    relations: RelationRegistry,
    store: Box<dyn Store>,
}

impl Engine {
    /// Creates an engine from its injected collaborators.
    ///
    /// The schema registry must already be populated (from the generated
    /// schema artifact) and relationships declared before the first query.
    pub fn new(schema: SchemaRegistry, relations: RelationRegistry, store: Box<dyn Store>) -> Self {
        Self {
            schema,
            relations,
            store,
        }
    }

    /// The schema registry this engine quotes literals against.
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Mutable access to the underlying store, for administrative
    /// operations that bypass the mapping layer.
    pub fn store_mut(&mut self) -> &mut dyn Store {
        &mut *self.store
    }

    /// Fetches every record of a model.
    pub fn find_all(&self, model: &str) -> Result<Vec<Record>> {
        let table = model_name_to_table_name(model);
        let rows = self.store.select_all(&table)?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(model, row))
            .collect())
    }

    /// Fetches the records of a model matching scalar column filters.
    pub fn find_where(&self, model: &str, filters: &[(String, Value)]) -> Result<Vec<Record>> {
        let table = model_name_to_table_name(model);
        let schema = self.schema.get(&table)?;
        let (rows, _) = self.store.select_where(&table, schema, &[], filters)?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(model, row))
            .collect())
    }

    /// Traverses a declared relationship from a persisted record.
    ///
    /// Resolves `name` in the relationship registry, joins along its through
    /// path, and materializes the target rows. Each fetched record gets a
    /// back-reference to the owner under the owner's singular name; the
    /// owner caches the collection (`has_many`) or the single reference
    /// (`belongs_to`), so repeated access does not hit the store again.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::MissingId`] for unsaved owners and propagates
    /// unknown-relation and store errors.
    pub fn related(&self, owner: &mut Record, name: &str) -> Result<Vec<Record>> {
        if let Some(cached) = owner.association(name) {
            return Ok(cached.to_vec());
        }

        let resolved = self.relations.resolve(&owner.model, name)?;
        if matches!(resolved, ResolvedRelation::BelongsTo(_)) {
            if let Some(target) = owner.reference(name) {
                return Ok(vec![target.clone()]);
            }
        }

        let id = owner.id.ok_or_else(|| OrmError::MissingId {
            model: owner.model.clone(),
        })?;

        let (relation, target_model) = match resolved {
            ResolvedRelation::BelongsTo(rel) | ResolvedRelation::HasMany(rel) => {
                (rel, rel.target_model.clone())
            }
        };
        let through = relation.through_path(name);

        let owner_table = model_name_to_table_name(&owner.model);
        let schema = self.schema.get(&owner_table)?;
        let filters = [("id".to_string(), Value::Integer(id))];
        let (rows, target_table) =
            self.store
                .select_where(&owner_table, schema, &through, &filters)?;
        debug!(
            owner = %owner.model,
            relation = name,
            target = %target_table,
            rows = rows.len(),
            "traversed relationship"
        );

        let back_name = model_name_to_table_ref(&owner.model);
        let detached_owner = owner.detached();
        let records: Vec<Record> = rows
            .into_iter()
            .map(|row| {
                let mut record = Record::from_row(&target_model, row);
                record.set_reference(back_name.clone(), detached_owner.clone());
                record
            })
            .collect();

        match resolved {
            ResolvedRelation::BelongsTo(_) => {
                if let Some(target) = records.first() {
                    owner.set_reference(name, target.detached());
                }
            }
            ResolvedRelation::HasMany(_) => {
                owner.associations.insert(name.to_string(), records.clone());
            }
        }

        Ok(records)
    }

    /// Persists a record: inserts when it has no id yet, updates otherwise.
    ///
    /// The emitted column set is bounded by the table's schema: a scalar
    /// attribute maps to its column, a reference attribute `supplier`
    /// contributes `supplier_id` from the referenced record's id, and
    /// anything whose column is not in the schema is skipped. That covers
    /// the back-references planted by relationship fill, which live on the
    /// record but have no column on its own table. When both a reference
    /// and a scalar copy of its foreign-key column are present, the
    /// reference wins. The `id` and timestamp columns are left to the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnsavedReference`] when a reference attribute
    /// backed by a schema column points at a record that has no id yet.
    pub fn save(&mut self, record: &mut Record) -> Result<()> {
        let table = record.table_name();
        let schema = self.schema.get(&table)?;
        let mut columns: BTreeMap<String, Value> = BTreeMap::new();

        for (name, attribute) in &record.attributes {
            if let Attribute::Scalar(value) = attribute {
                if name == "id" || TIMESTAMP_COLUMNS.contains(&name.as_str()) {
                    continue;
                }
                if !schema.columns.contains_key(name) {
                    continue;
                }
                columns.insert(name.clone(), value.clone());
            }
        }
        for (name, attribute) in &record.attributes {
            if let Attribute::Reference(target) = attribute {
                let column = foreign_key_column(name);
                if !schema.columns.contains_key(&column) {
                    continue;
                }
                let target_id = target.id.ok_or_else(|| OrmError::UnsavedReference {
                    model: record.model.clone(),
                    relation: name.clone(),
                })?;
                columns.insert(column, Value::Integer(target_id));
            }
        }
        let values: Vec<(String, Value)> = columns.into_iter().collect();

        match record.id {
            Some(id) => {
                debug!(model = %record.model, id, "updating record");
                self.store.update(&table, schema, id, &values)?;
            }
            None => {
                let id = self.store.insert(&table, schema, &values)?;
                debug!(model = %record.model, id, "inserted record");
                record.id = Some(id);
            }
        }
        Ok(())
    }

    /// Deletes every record of a model.
    pub fn destroy_all(&mut self, model: &str) -> Result<()> {
        let table = model_name_to_table_name(model);
        self.store.destroy_all(&table)?;
        Ok(())
    }
}
