//! Property descriptors for entity declarations.

use super::relation::RelationDef;
use super::types::PropertyType;

/// A single entity attribute: names, declared type, and flags.
///
/// `storage_name` defaults to `field_name`; `copy` marks a field duplicated
/// across a supertype boundary, which (like identifiers) is re-emitted at
/// every inheritance level during deconstruction.
#[derive(Debug)]
pub struct PropertyDef {
    /// In-memory field name (unique within the declaring entity).
    field_name: String,
    /// Storage-side column name.
    storage_name: String,
    /// Declared value type.
    value_type: PropertyType,
    /// Whether this property is part of the entity's identifier.
    identifier: bool,
    /// Whether this property is duplicated at every inheritance level.
    copy: bool,
    /// Cross-entity relation carried by this property, if any.
    relation: Option<RelationDef>,
}

impl PropertyDef {
    /// Create a property whose storage name equals its field name.
    pub fn new(field_name: impl Into<String>, value_type: PropertyType) -> Self {
        let field_name = field_name.into();
        Self {
            storage_name: field_name.clone(),
            field_name,
            value_type,
            identifier: false,
            copy: false,
            relation: None,
        }
    }

    /// Override the storage-side name.
    pub fn stored_as(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = storage_name.into();
        self
    }

    /// Mark as (part of) the entity identifier.
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    /// Mark as a copy field, re-emitted at every inheritance level.
    pub fn copied(mut self) -> Self {
        self.copy = true;
        self
    }

    /// Attach a relation descriptor.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relation = Some(relation);
        self
    }

    /// In-memory field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Storage-side column name.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Declared value type.
    pub fn value_type(&self) -> &PropertyType {
        &self.value_type
    }

    /// Whether this property identifies the entity.
    pub fn is_identifier(&self) -> bool {
        self.identifier
    }

    /// Whether this property is duplicated across inheritance levels.
    pub fn is_copy(&self) -> bool {
        self.copy
    }

    /// The relation carried by this property, if any.
    pub fn relation(&self) -> Option<&RelationDef> {
        self.relation.as_ref()
    }

    /// Whether this property carries a relation.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RelationDef, ScalarType};
    use crate::test_fixtures::Author;
    use crate::EntityRef;

    #[test]
    fn test_property_defaults() {
        let prop = PropertyDef::new("first_name", PropertyType::scalar(ScalarType::String));

        assert_eq!(prop.field_name(), "first_name");
        assert_eq!(prop.storage_name(), "first_name");
        assert!(!prop.is_identifier());
        assert!(!prop.is_copy());
        assert!(!prop.is_relation());
    }

    #[test]
    fn test_property_builder_chain() {
        let prop = PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64))
            .stored_as("author_id")
            .identifier()
            .copied();

        assert_eq!(prop.field_name(), "id");
        assert_eq!(prop.storage_name(), "author_id");
        assert!(prop.is_identifier());
        assert!(prop.is_copy());
    }

    #[test]
    fn test_relation_property() {
        let prop = PropertyDef::new("owner", PropertyType::entity("Author"))
            .with_relation(RelationDef::via(EntityRef::of::<Author>(), "owner_id", "id"));

        assert!(prop.is_relation());
        assert_eq!(prop.relation().unwrap().target().name(), "Author");
    }
}
