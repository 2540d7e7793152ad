//! Schema scopes: the whole-codebase view used for subtype discovery and
//! composition-time validation.

use crate::error::Error;
use crate::inference;
use crate::metadata::EntityMetadata;
use crate::schema::{EntityId, EntityRef, EntityType};

/// Resolves the set of entity types visible to a metadata instance.
///
/// Subtype discovery needs a whole-schema scan; this trait is the external
/// collaborator that owns that scan, keeping the metadata core independent
/// of how a deployment assembles its schema.
pub trait ScopeResolver: Send + Sync {
    /// Every entity type in scope.
    fn entities(&self) -> Vec<EntityRef>;
}

/// A composition-time bundle of entity types.
///
/// Built once at startup by registering every entity type, then used to
/// validate the schema as a whole, run relation inference, and answer
/// subtype scans.
#[derive(Debug, Default)]
pub struct SchemaScope {
    entities: Vec<EntityRef>,
}

impl SchemaScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type (idempotent).
    pub fn register<T: EntityType>(&mut self) {
        let entity_ref = EntityRef::of::<T>();
        if !self.entities.contains(&entity_ref) {
            self.entities.push(entity_ref);
        }
    }

    /// Builder-style registration.
    pub fn with_entity<T: EntityType>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// All registered entity references, in registration order.
    pub fn entity_refs(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Whether the given entity identity is registered.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|r| r.id() == id)
    }

    /// Validate the whole schema, collecting every failure.
    ///
    /// Checks, per entity: metadata builds; the entity's [`EntityMetadata::valid`]
    /// invariants hold; every relation target is registered in this scope;
    /// and relation join keys name real properties (by storage name) on
    /// both sides.
    pub fn validate(&self) -> Result<(), Vec<Error>> {
        let mut errors = Vec::new();
        for entity_ref in &self.entities {
            let meta = match entity_ref.metadata() {
                Ok(meta) => meta,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            if !meta.valid() {
                errors.push(Error::Validation {
                    entity: meta.name().to_string(),
                    reason: "identifier or supertype invariants violated".to_string(),
                });
            }
            for (prop, relation) in meta.declared_relations() {
                if !self.contains(relation.target().id()) {
                    errors.push(Error::Validation {
                        entity: meta.name().to_string(),
                        reason: format!(
                            "relation `{}` targets `{}`, which is not in scope",
                            prop.field_name(),
                            relation.target().name()
                        ),
                    });
                    continue;
                }
                for key in relation.self_keys() {
                    if meta.property_by_storage_name(key).is_none() {
                        errors.push(Error::Validation {
                            entity: meta.name().to_string(),
                            reason: format!(
                                "relation `{}` self key `{key}` is not a declared property",
                                prop.field_name()
                            ),
                        });
                    }
                }
                match relation.target().metadata() {
                    Ok(target_meta) => {
                        for key in relation.target_keys() {
                            if target_meta.property_by_storage_name(key).is_none() {
                                errors.push(Error::Validation {
                                    entity: meta.name().to_string(),
                                    reason: format!(
                                        "relation `{}` target key `{key}` is not declared on `{}`",
                                        prop.field_name(),
                                        target_meta.name()
                                    ),
                                });
                            }
                        }
                    }
                    Err(err) => errors.push(err),
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Run relation-type inference over every entity in scope.
    ///
    /// Must run before any relation's cardinality is consumed. Idempotent:
    /// cardinality is only ever assigned from `Unknown` and the circular
    /// flag is only ever raised.
    pub fn infer_all(&self) -> Result<(), Error> {
        for entity_ref in &self.entities {
            inference::infer_relations(entity_ref.metadata()?)?;
        }
        Ok(())
    }

    /// Iterate over resolved metadata for every registered entity.
    pub fn metadata(
        &self,
    ) -> impl Iterator<Item = Result<&'static EntityMetadata, Error>> + '_ {
        self.entities.iter().map(EntityRef::metadata)
    }
}

impl ScopeResolver for SchemaScope {
    fn entities(&self) -> Vec<EntityRef> {
        self.entities.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{Author, Dog, Pet, PetBase};

    #[test]
    fn test_register_idempotent() {
        let mut scope = SchemaScope::new();
        scope.register::<Author>();
        scope.register::<Author>();
        assert_eq!(scope.entity_refs().len(), 1);
    }

    #[test]
    fn test_validate_complete_scope() {
        let scope = SchemaScope::new()
            .with_entity::<Author>()
            .with_entity::<Pet>()
            .with_entity::<PetBase>()
            .with_entity::<Dog>();

        assert!(scope.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_target() {
        // Author's `pets` relation targets Pet, which is absent here.
        let scope = SchemaScope::new().with_entity::<Author>();

        let errors = scope.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("not in scope"));
    }
}
