//! Per-type entity metadata.

use crate::error::Error;
use crate::metadata::registry;
use crate::metadata::scope::ScopeResolver;
use crate::schema::{
    AccessorFn, ConstructorFn, EntityDeclaration, EntityId, EntityKind, EntityRef, EntityType,
    PropertyDef, RelationDef,
};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// The structural description of one entity type.
///
/// Exactly one instance exists per type, built lazily on first lookup and
/// cached for the process lifetime. Everything is immutable after
/// construction except the compute-once derived fields (`super_types`,
/// `sub_types`), which are populated at most once under a first-write-wins
/// race and frozen thereafter.
pub struct EntityMetadata {
    id: EntityId,
    kind: EntityKind,
    properties: Vec<PropertyDef>,
    identifier_positions: Vec<usize>,
    relation_positions: Vec<usize>,
    declared_super_types: Vec<EntityRef>,
    constructor: Option<ConstructorFn>,
    accessors: HashMap<String, AccessorFn>,
    super_types: OnceLock<Result<Vec<&'static EntityMetadata>, Error>>,
    sub_types: OnceLock<Vec<EntityRef>>,
}

impl EntityMetadata {
    /// Look up (building on first use) the metadata for entity type `T`.
    ///
    /// Idempotent. A failed build is fatal for `T`: the failure is cached
    /// and every later call returns the same error without retrying.
    pub fn of<T: EntityType>() -> Result<&'static EntityMetadata, Error> {
        registry::get_or_build(EntityId::of::<T>(), || {
            Self::build(EntityId::of::<T>(), T::declaration())
        })
    }

    fn build(id: EntityId, declaration: EntityDeclaration) -> Result<Self, Error> {
        let name = id.name();
        if declaration.name != name {
            return Err(Error::declaration(
                name,
                format!(
                    "declaration is named `{}`, expected the type's entity name `{name}`",
                    declaration.name
                ),
            ));
        }

        // Class-like kinds are representable but not supported by this
        // engine; fail fast before any property validation.
        if declaration.kind == EntityKind::Class {
            return Err(Error::UnsupportedKind {
                entity: name.to_string(),
                kind: EntityKind::Class,
            });
        }

        match declaration.kind {
            EntityKind::Record if declaration.constructor.is_none() => {
                return Err(Error::declaration(name, "record-like entity without a constructor"));
            }
            EntityKind::Interface if declaration.constructor.is_some() => {
                return Err(Error::declaration(name, "interface-like entity with a constructor"));
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        let mut identifier_positions = Vec::new();
        let mut relation_positions = Vec::new();
        for (idx, prop) in declaration.properties.iter().enumerate() {
            if !seen.insert(prop.field_name().to_string()) {
                return Err(Error::declaration(
                    name,
                    format!("duplicate property `{}`", prop.field_name()),
                ));
            }
            if prop.is_identifier() {
                identifier_positions.push(idx);
            }
            if let Some(relation) = prop.relation() {
                if relation.self_keys().len() != relation.target_keys().len() {
                    return Err(Error::declaration(
                        name,
                        format!(
                            "relation on `{}` has {} self keys but {} target keys",
                            prop.field_name(),
                            relation.self_keys().len(),
                            relation.target_keys().len()
                        ),
                    ));
                }
                relation_positions.push(idx);
            }
        }

        let mut accessors = HashMap::new();
        for (field, accessor) in declaration.accessors {
            if !seen.contains(&field) {
                return Err(Error::declaration(
                    name,
                    format!("accessor for undeclared property `{field}`"),
                ));
            }
            if accessors.insert(field.clone(), accessor).is_some() {
                return Err(Error::declaration(
                    name,
                    format!("duplicate accessor for `{field}`"),
                ));
            }
        }
        if declaration.kind == EntityKind::Record {
            for prop in &declaration.properties {
                if !accessors.contains_key(prop.field_name()) {
                    return Err(Error::declaration(
                        name,
                        format!("record-like entity missing accessor for `{}`", prop.field_name()),
                    ));
                }
            }
        }

        Ok(Self {
            id,
            kind: declaration.kind,
            properties: declaration.properties,
            identifier_positions,
            relation_positions,
            declared_super_types: declaration.super_types,
            constructor: declaration.constructor,
            accessors,
            super_types: OnceLock::new(),
            sub_types: OnceLock::new(),
        })
    }

    /// The entity's unique identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The entity's unique name.
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// The entity's structural kind.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// All declared properties, in declaration order.
    pub fn declared_properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Look up a property by field name.
    pub fn property(&self, field_name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.field_name() == field_name)
    }

    /// Look up a property by storage name.
    pub fn property_by_storage_name(&self, storage_name: &str) -> Option<&PropertyDef> {
        self.properties
            .iter()
            .find(|p| p.storage_name() == storage_name)
    }

    /// The identifier subset of the declared properties, in order.
    pub fn declared_identifiers(&self) -> impl Iterator<Item = &PropertyDef> {
        self.identifier_positions.iter().map(|&i| &self.properties[i])
    }

    /// Relation-carrying properties with their relation descriptors.
    pub fn declared_relations(&self) -> impl Iterator<Item = (&PropertyDef, &RelationDef)> {
        self.relation_positions.iter().filter_map(|&i| {
            let prop = &self.properties[i];
            prop.relation().map(|relation| (prop, relation))
        })
    }

    /// Plain storage columns: non-relation, non-copy properties.
    ///
    /// This is the column list a storage adapter uses for statement and
    /// body synthesis.
    pub fn unique_properties(&self) -> impl Iterator<Item = &PropertyDef> {
        self.properties
            .iter()
            .filter(|p| !p.is_relation() && !p.is_copy())
    }

    /// The directly declared supertypes.
    pub fn declared_super_types(&self) -> &[EntityRef] {
        &self.declared_super_types
    }

    /// The transitive supertype closure, oldest ancestor first.
    ///
    /// Computed once by recursively visiting the declared supertypes and
    /// memoized; resolution failures are memoized too (schema errors are
    /// not transient).
    pub fn super_types(&self) -> Result<&[&'static EntityMetadata], Error> {
        let result = self.super_types.get_or_init(|| {
            let mut out = Vec::new();
            let mut seen = HashSet::from([self.id]);
            Self::collect_super_types(self, &mut out, &mut seen)?;
            Ok(out)
        });
        match result {
            Ok(chain) => Ok(chain.as_slice()),
            Err(err) => Err(err.clone()),
        }
    }

    fn collect_super_types(
        meta: &EntityMetadata,
        out: &mut Vec<&'static EntityMetadata>,
        seen: &mut HashSet<EntityId>,
    ) -> Result<(), Error> {
        for super_ref in meta.declared_super_types() {
            let super_meta = super_ref.metadata()?;
            if seen.insert(super_meta.id()) {
                Self::collect_super_types(super_meta, out, seen)?;
                out.push(super_meta);
            }
        }
        Ok(())
    }

    /// The full inheritance chain: supertypes oldest first, then this type.
    pub(crate) fn inheritance_chain(
        &'static self,
    ) -> Result<Vec<&'static EntityMetadata>, Error> {
        let mut chain = self.super_types()?.to_vec();
        chain.push(self);
        Ok(chain)
    }

    /// Subtypes of this entity within `scope`, memoized on first call.
    ///
    /// The scan is delegated to the scope resolver; calling this again
    /// (even with a different scope) returns the first scan's result.
    /// Entities whose metadata fails to build are skipped.
    pub fn sub_types(&self, scope: &dyn ScopeResolver) -> &[EntityRef] {
        self.sub_types.get_or_init(|| {
            scope
                .entities()
                .into_iter()
                .filter(|entity_ref| {
                    entity_ref.id() != self.id
                        && entity_ref
                            .metadata()
                            .ok()
                            .and_then(|meta| meta.super_types().ok().map(|supers| {
                                supers.iter().any(|s| s.id() == self.id)
                            }))
                            .unwrap_or(false)
                })
                .collect()
        })
    }

    /// Constructible (record-like) subtypes of this entity within `scope`.
    pub fn concrete_sub_types(&self, scope: &dyn ScopeResolver) -> Vec<EntityRef> {
        self.sub_types(scope)
            .iter()
            .copied()
            .filter(|entity_ref| {
                entity_ref
                    .metadata()
                    .map(|meta| meta.kind() == EntityKind::Record)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Pure validation predicate, intended for composition-time assertion.
    ///
    /// True iff (a) at least one identifier is declared, (b) the identifier
    /// set covers every supertype's identifier set, (c) every supertype is
    /// itself valid, and (d) kind/constructor consistency holds. No side
    /// effects beyond resolving supertype metadata.
    pub fn valid(&self) -> bool {
        if (self.kind == EntityKind::Record) != self.constructor.is_some() {
            return false;
        }
        if self.identifier_positions.is_empty() {
            return false;
        }
        let Ok(supers) = self.super_types() else {
            return false;
        };
        let own_identifiers: HashSet<&str> = self
            .declared_identifiers()
            .map(PropertyDef::field_name)
            .collect();
        for super_meta in supers {
            if !super_meta.valid() {
                return false;
            }
            for super_id in super_meta.declared_identifiers() {
                if !own_identifiers.contains(super_id.field_name()) {
                    return false;
                }
            }
        }
        true
    }

    pub(crate) fn constructor(&self) -> Option<&ConstructorFn> {
        self.constructor.as_ref()
    }

    pub(crate) fn accessor(&self, field_name: &str) -> Option<&AccessorFn> {
        self.accessors.get(field_name)
    }
}

impl std::fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::SchemaScope;
    use crate::schema::{PropertyType, ScalarType};
    use crate::test_fixtures::{Author, Dog, Mutable, Pet, PetBase};

    #[test]
    fn test_of_is_idempotent() {
        let first = EntityMetadata::of::<Author>().unwrap();
        let second = EntityMetadata::of::<Author>().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_declared_views() {
        let meta = EntityMetadata::of::<Author>().unwrap();

        let names: Vec<_> = meta
            .declared_properties()
            .iter()
            .map(PropertyDef::field_name)
            .collect();
        assert_eq!(names, vec!["id", "first_name", "pets"]);

        let identifiers: Vec<_> = meta
            .declared_identifiers()
            .map(PropertyDef::field_name)
            .collect();
        assert_eq!(identifiers, vec!["id"]);

        let relations: Vec<_> = meta
            .declared_relations()
            .map(|(p, _)| p.field_name())
            .collect();
        assert_eq!(relations, vec!["pets"]);

        // Relation properties are excluded from the plain column list.
        let unique: Vec<_> = meta
            .unique_properties()
            .map(PropertyDef::field_name)
            .collect();
        assert_eq!(unique, vec!["id", "first_name"]);
    }

    #[test]
    fn test_property_lookup_by_both_names() {
        let meta = EntityMetadata::of::<Pet>().unwrap();
        assert!(meta.property("owner_id").is_some());
        assert!(meta.property_by_storage_name("owner").is_some());
        assert!(meta.property("owner").is_none());
    }

    #[test]
    fn test_super_type_closure_oldest_first() {
        let meta = EntityMetadata::of::<Dog>().unwrap();
        let supers = meta.super_types().unwrap();
        let names: Vec<_> = supers.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["PetBase"]);

        let base = EntityMetadata::of::<PetBase>().unwrap();
        assert!(base.super_types().unwrap().is_empty());
    }

    #[test]
    fn test_sub_types_memoized_scan() {
        let scope = SchemaScope::new()
            .with_entity::<PetBase>()
            .with_entity::<Dog>()
            .with_entity::<Author>();

        let base = EntityMetadata::of::<PetBase>().unwrap();
        let subs = base.sub_types(&scope);
        let names: Vec<_> = subs.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Dog"]);

        // Memoized: an emptier scope on the second call changes nothing.
        let empty = SchemaScope::new();
        assert_eq!(base.sub_types(&empty).len(), 1);

        let concrete = base.concrete_sub_types(&scope);
        assert_eq!(concrete.len(), 1);
        assert_eq!(concrete[0].name(), "Dog");
    }

    #[test]
    fn test_valid_entities() {
        assert!(EntityMetadata::of::<Author>().unwrap().valid());
        assert!(EntityMetadata::of::<Pet>().unwrap().valid());
        assert!(EntityMetadata::of::<Dog>().unwrap().valid());
        assert!(EntityMetadata::of::<PetBase>().unwrap().valid());
    }

    #[test]
    fn test_class_kind_rejected() {
        let err = EntityMetadata::of::<Mutable>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedKind {
                kind: EntityKind::Class,
                ..
            }
        ));

        // The failure is cached: same error, no rebuild.
        let again = EntityMetadata::of::<Mutable>().unwrap_err();
        assert_eq!(err.to_string(), again.to_string());
    }

    #[test]
    fn test_relation_key_arity_mismatch_rejected() {
        struct Lopsided;

        impl EntityType for Lopsided {
            const NAME: &'static str = "Lopsided";

            fn declaration() -> EntityDeclaration {
                EntityDeclaration::interface("Lopsided")
                    .with_property(
                        PropertyDef::new("id", PropertyType::scalar(ScalarType::Int64))
                            .identifier(),
                    )
                    .with_property(
                        PropertyDef::new("owner", PropertyType::entity("Author")).with_relation(
                            // Two self keys joined against one target key.
                            RelationDef::new(
                                EntityRef::of::<Author>(),
                                ["tenant", "owner"],
                                ["id"],
                            ),
                        ),
                    )
            }
        }

        let err = EntityMetadata::of::<Lopsided>().unwrap_err();
        assert!(matches!(err, Error::InvalidEntityDeclaration { .. }));
        assert!(err.to_string().contains("2 self keys but 1 target keys"));
    }
}
