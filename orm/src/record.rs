//! In-memory representation of one database row.
//!
//! A [`Record`] is a bag of named attributes tied to a model name. Each
//! attribute is either a scalar column value or a reference to another
//! record, tagged explicitly by the [`Attribute`] union; there is no runtime
//! type inspection to tell the two apart. Many-valued relationship results
//! are cached separately in the associations map by the engine.

use std::collections::BTreeMap;

use trellis_core::naming::model_name_to_table_name;
use trellis_core::value::Value;
use trellis_store::Row;

/// One attribute of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// A plain column value.
    Scalar(Value),
    /// A single-valued link to another record. Saving the owner writes the
    /// referenced record's id into the `<name>_id` column.
    Reference(Box<Record>),
}

impl Attribute {
    /// Returns the scalar value, if this attribute is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Attribute::Scalar(value) => Some(value),
            Attribute::Reference(_) => None,
        }
    }

    /// Returns the referenced record, if this attribute is a reference.
    pub fn as_reference(&self) -> Option<&Record> {
        match self {
            Attribute::Scalar(_) => None,
            Attribute::Reference(record) => Some(record),
        }
    }
}

/// One row of a model's table, materialized.
///
/// Records start unsaved (`id` is `None`); the engine assigns the id on the
/// first save and updates in place afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Model name (UpperCamelCase).
    pub model: String,
    /// Primary key, once persisted.
    pub id: Option<i64>,
    /// Attribute name → scalar or reference.
    pub attributes: BTreeMap<String, Attribute>,
    /// Cached many-valued relationship results, keyed by relation name.
    pub associations: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// Creates an empty, unsaved record for a model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Materializes a fetched row into a record of the given model.
    ///
    /// The `id` column becomes the record id; every other column becomes a
    /// scalar attribute.
    pub fn from_row(model: &str, row: Row) -> Self {
        let mut record = Self::new(model);
        for (column, value) in row {
            if column == "id" {
                record.id = value.as_integer();
            } else {
                record.attributes.insert(column, Attribute::Scalar(value));
            }
        }
        record
    }

    /// The pluralized table this record maps to.
    pub fn table_name(&self) -> String {
        model_name_to_table_name(&self.model)
    }

    /// True once the record has been persisted.
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Sets a scalar attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes
            .insert(name.into(), Attribute::Scalar(value.into()));
        self
    }

    /// Sets a reference attribute pointing at another record.
    pub fn set_reference(&mut self, name: impl Into<String>, target: Record) -> &mut Self {
        self.attributes
            .insert(name.into(), Attribute::Reference(Box::new(target)));
        self
    }

    /// Looks up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Looks up a scalar attribute's value by name.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Attribute::as_scalar)
    }

    /// Looks up a reference attribute's target by name.
    pub fn reference(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Attribute::as_reference)
    }

    /// Returns the cached result of a many-valued relationship, if it was
    /// fetched before.
    pub fn association(&self, name: &str) -> Option<&[Record]> {
        self.associations.get(name).map(Vec::as_slice)
    }

    /// A copy with the association cache dropped, for embedding as a
    /// back-reference without building cycles.
    pub(crate) fn detached(&self) -> Record {
        Record {
            model: self.model.clone(),
            id: self.id,
            attributes: self.attributes.clone(),
            associations: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_extracts_id() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(7));
        row.insert("name".to_string(), Value::from("ada"));

        let record = Record::from_row("User", row);
        assert_eq!(record.id, Some(7));
        assert!(record.is_saved());
        assert_eq!(record.scalar("name"), Some(&Value::from("ada")));
        assert!(record.get("id").is_none());
    }

    #[test]
    fn test_new_record_is_unsaved() {
        let mut record = Record::new("DrinkOrder");
        record.set("item", "latte");
        assert!(!record.is_saved());
        assert_eq!(record.table_name(), "drink_orders");
    }

    #[test]
    fn test_reference_attribute() {
        let mut user = Record::new("User");
        user.id = Some(3);

        let mut order = Record::new("DrinkOrder");
        order.set_reference("user", user);

        let target = order.reference("user").unwrap();
        assert_eq!(target.model, "User");
        assert_eq!(target.id, Some(3));
        assert!(order.scalar("user").is_none());
    }
}
