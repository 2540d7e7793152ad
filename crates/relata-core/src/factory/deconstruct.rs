//! Entity instance to flat property maps, one per inheritance level.

use crate::error::Error;
use crate::marshal::MarshallerRegistry;
use crate::metadata::EntityMetadata;
use crate::schema::{EntityKind, EntityType, PropertyDef, PropertyType};
use relata_model::{PropertyMap, Value};
use std::any::Any;
use std::collections::HashMap;
use tracing::warn;

/// Flatten an entity instance into one property map per inheritance level,
/// oldest supertype first, the entity's own level last.
///
/// Each level emits only the properties first declared at that level,
/// except identifiers and copy properties, which are re-emitted at every
/// level that declares them - joined-table inheritance needs the key
/// columns in every row. Values pass through the forward marshal chain;
/// enum values are emitted as lower-cased variant names. Maps are keyed by
/// storage name. Relation-carrying properties emit whatever their accessor
/// returns (for a foreign-key column that is the key value itself).
///
/// An accessor failure is logged and the property omitted rather than
/// aborting: one broken accessor must not block an otherwise valid
/// instance. The gap resurfaces as a missing-property error if the map is
/// later fed back to construction.
pub fn deconstruct<T: EntityType>(entity: &T) -> Result<Vec<PropertyMap>, Error> {
    let meta = EntityMetadata::of::<T>()?;
    if meta.kind() != EntityKind::Record {
        return Err(Error::UnsupportedKind {
            entity: meta.name().to_string(),
            kind: meta.kind(),
        });
    }

    let chain = meta.inheritance_chain()?;

    // A property re-declared at a derived level belongs to its oldest
    // declaring level; identifiers and copies escape this rule.
    let mut first_declared: HashMap<&str, usize> = HashMap::new();
    for (level_idx, level) in chain.iter().enumerate() {
        for prop in level.declared_properties() {
            first_declared.entry(prop.field_name()).or_insert(level_idx);
        }
    }

    let mut maps = Vec::with_capacity(chain.len());
    for (level_idx, level) in chain.iter().enumerate() {
        let mut map = PropertyMap::new();
        for prop in level.declared_properties() {
            let owned_here = first_declared
                .get(prop.field_name())
                .is_some_and(|&idx| idx == level_idx);
            if !(owned_here || prop.is_identifier() || prop.is_copy()) {
                continue;
            }

            let Some(accessor) = meta.accessor(prop.field_name()) else {
                // Declared on an abstract level but never re-declared on
                // the concrete type; nothing to read.
                warn!(
                    entity = meta.name(),
                    property = prop.field_name(),
                    "no accessor on concrete type; omitting property"
                );
                continue;
            };

            match accessor(entity as &dyn Any) {
                Ok(value) => {
                    let value = marshal_property(meta, prop, value)?;
                    map.insert(prop.storage_name(), value);
                }
                Err(reason) => {
                    warn!(
                        entity = meta.name(),
                        property = prop.field_name(),
                        reason,
                        "accessor failed; omitting property"
                    );
                }
            }
        }
        maps.push(map);
    }
    Ok(maps)
}

fn marshal_property(
    meta: &EntityMetadata,
    prop: &PropertyDef,
    value: Value,
) -> Result<Value, Error> {
    match prop.value_type() {
        PropertyType::Enum { .. } | PropertyType::OptionalEnum { .. } => {
            if value.is_null() {
                return Ok(Value::Null);
            }
            let text = value.as_str().ok_or_else(|| {
                Error::marshal(
                    meta.name(),
                    prop.field_name(),
                    format!("enum value must be a string, got {value:?}"),
                )
            })?;
            Ok(Value::String(text.to_lowercase()))
        }
        other => match other.scalar_type() {
            Some(scalar) => MarshallerRegistry::global()
                .marshal(meta.id(), scalar, value)
                .map_err(|reason| Error::marshal(meta.name(), prop.field_name(), reason)),
            None => Ok(value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{Dog, Flaky, Memo, Pet, PetStatus};

    #[test]
    fn test_single_level_deconstruct() {
        let pet = Pet {
            id: 7,
            name: "Rex".into(),
            status: PetStatus::Available,
            owner_id: 3,
        };

        let maps = deconstruct(&pet).unwrap();
        assert_eq!(maps.len(), 1);

        let map = &maps[0];
        assert_eq!(map.get("id"), Some(&Value::Int64(7)));
        assert_eq!(map.get("name"), Some(&Value::String("Rex".into())));
        // Enum values are emitted lower-cased.
        assert_eq!(map.get("status"), Some(&Value::String("available".into())));
        // Keyed by storage name.
        assert_eq!(map.get("owner"), Some(&Value::Int64(3)));
        assert!(map.get("owner_id").is_none());
    }

    #[test]
    fn test_two_level_hierarchy() {
        let dog = Dog {
            id: 9,
            name: "Milou".into(),
            status: PetStatus::Sold,
            owner_id: 4,
            trained: true,
        };

        let maps = deconstruct(&dog).unwrap();
        assert_eq!(maps.len(), 2);

        // Level 1: everything PetBase declares.
        let base_names: Vec<_> = maps[0].names().collect();
        assert_eq!(base_names, vec!["id", "name", "status", "owner_id"]);

        // Level 2: only Dog's own property, plus the identifier.
        let own_names: Vec<_> = maps[1].names().collect();
        assert_eq!(own_names, vec!["id", "trained"]);
        assert_eq!(maps[1].get("id"), Some(&Value::Int64(9)));
        assert_eq!(maps[1].get("trained"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_copy_property_emitted_at_every_level() {
        let memo = Memo {
            id: 3,
            tenant: "acme".into(),
            title: "minutes".into(),
            body: "rescheduled".into(),
        };

        let maps = deconstruct(&memo).unwrap();
        assert_eq!(maps.len(), 2);

        // The copy column rides along at every level, like the identifier.
        for map in &maps {
            assert_eq!(map.get("tenant"), Some(&Value::String("acme".into())));
        }

        // Non-copy properties stay at their oldest declaring level.
        let base_names: Vec<_> = maps[0].names().collect();
        assert_eq!(base_names, vec!["id", "tenant", "title"]);
        let own_names: Vec<_> = maps[1].names().collect();
        assert_eq!(own_names, vec!["id", "tenant", "body"]);
    }

    #[test]
    fn test_broken_accessor_omits_property() {
        let flaky = Flaky { id: 1 };
        let maps = deconstruct(&flaky).unwrap();

        assert_eq!(maps.len(), 1);
        assert_eq!(maps[0].get("id"), Some(&Value::Int64(1)));
        // The broken accessor's property is silently absent.
        assert!(maps[0].get("cursed").is_none());
    }
}
