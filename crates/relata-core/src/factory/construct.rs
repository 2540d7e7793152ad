//! Flat property map to entity instance.

use super::NameMode;
use crate::error::Error;
use crate::marshal::MarshallerRegistry;
use crate::metadata::EntityMetadata;
use crate::schema::{Arguments, EntityKind, EntityType, PropertyDef, PropertyType};
use relata_model::{PropertyMap, Value};

/// Build an entity instance of type `T` from a flat property map.
///
/// `source` must contain a value for every declared property name (keyed
/// per `names`); otherwise the call fails with [`Error::MissingProperties`]
/// carrying the full list of absent names. Only record-like entities are
/// constructible.
///
/// Non-relation values pass through the unmarshal chain: enum strings are
/// matched case-insensitively against the declared variants, registered
/// marshallers convert backend shapes to entity-native ones, and unmapped
/// types pass through unchanged. Relation properties ignore the supplied
/// value and receive a placeholder (empty collection or null); populating
/// them is the storage adapter's job.
pub fn construct<T: EntityType>(source: &PropertyMap, names: NameMode) -> Result<T, Error> {
    let meta = EntityMetadata::of::<T>()?;
    if meta.kind() != EntityKind::Record {
        return Err(Error::UnsupportedKind {
            entity: meta.name().to_string(),
            kind: meta.kind(),
        });
    }

    let missing: Vec<String> = meta
        .declared_properties()
        .iter()
        .filter(|prop| !source.contains(names.name_of(prop)))
        .map(|prop| names.name_of(prop).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingProperties {
            entity: meta.name().to_string(),
            names: missing,
        });
    }

    let mut values = Vec::with_capacity(meta.declared_properties().len());
    for prop in meta.declared_properties() {
        let value = match source.get(names.name_of(prop)) {
            Some(value) => unmarshal_property(meta, prop, value)?,
            // Presence was checked above; a vanished key means the caller
            // mutated the map concurrently.
            None => {
                return Err(Error::MissingProperties {
                    entity: meta.name().to_string(),
                    names: vec![names.name_of(prop).to_string()],
                })
            }
        };
        values.push(value);
    }

    let ctor = meta.constructor().ok_or_else(|| Error::UnsupportedKind {
        entity: meta.name().to_string(),
        kind: meta.kind(),
    })?;
    let boxed = ctor(Arguments::new(meta.name(), values))?;
    boxed
        .downcast::<T>()
        .map(|entity| *entity)
        .map_err(|_| Error::Constructor {
            entity: meta.name().to_string(),
            reason: "constructor produced an instance of a different type".to_string(),
        })
}

fn unmarshal_property(
    meta: &EntityMetadata,
    prop: &PropertyDef,
    raw: &Value,
) -> Result<Value, Error> {
    // Relation properties are never unmarshalled: the engine hands the
    // constructor an unpopulated placeholder and defers traversal to the
    // storage adapter.
    if prop.is_relation() {
        return Ok(if prop.value_type().is_multi_valued() {
            Value::empty_collection()
        } else {
            Value::Null
        });
    }

    match prop.value_type() {
        PropertyType::Enum { variants, .. } => canonicalize_enum(meta, prop, raw, variants, false),
        PropertyType::OptionalEnum { variants, .. } => {
            canonicalize_enum(meta, prop, raw, variants, true)
        }
        other => match other.scalar_type() {
            Some(scalar) => MarshallerRegistry::global()
                .unmarshal(meta.id(), scalar, raw.clone())
                .map_err(|reason| Error::marshal(meta.name(), prop.field_name(), reason)),
            // Entity-valued without a relation descriptor: nothing to do.
            None => Ok(raw.clone()),
        },
    }
}

fn canonicalize_enum(
    meta: &EntityMetadata,
    prop: &PropertyDef,
    raw: &Value,
    variants: &[String],
    nullable: bool,
) -> Result<Value, Error> {
    if raw.is_null() {
        return if nullable {
            Ok(Value::Null)
        } else {
            Err(Error::marshal(
                meta.name(),
                prop.field_name(),
                "enum value required, got null",
            ))
        };
    }
    let text = raw.as_str().ok_or_else(|| {
        Error::marshal(
            meta.name(),
            prop.field_name(),
            format!("enum value must be a string, got {raw:?}"),
        )
    })?;
    variants
        .iter()
        .find(|variant| variant.eq_ignore_ascii_case(text))
        .map(|variant| Value::String(variant.clone()))
        .ok_or_else(|| {
            Error::marshal(
                meta.name(),
                prop.field_name(),
                format!("unknown enum variant `{text}`"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{sample_pet_map, Pet, PetBase, PetStatus};

    #[test]
    fn test_construct_from_storage_names() {
        let pet: Pet = construct(&sample_pet_map(), NameMode::Storage).unwrap();

        assert_eq!(pet.id, 7);
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.status, PetStatus::Available);
        // owner_id carries a relation: the constructor saw a null
        // placeholder, population belongs to the storage adapter.
        assert_eq!(pet.owner_id, 0);
    }

    #[test]
    fn test_construct_from_field_names() {
        // Same map, but keyed by field name: owner_id instead of owner.
        let map = PropertyMap::new()
            .with("id", 7i64)
            .with("name", "Rex")
            .with("status", "available")
            .with("owner_id", 3i64);

        let pet: Pet = construct(&map, NameMode::Field).unwrap();
        assert_eq!(pet.id, 7);
        assert_eq!(pet.owner_id, 0);
    }

    #[test]
    fn test_enum_case_insensitive() {
        let map = sample_pet_map().with("status", "AVAILABLE");
        let pet: Pet = construct(&map, NameMode::Storage).unwrap();
        assert_eq!(pet.status, PetStatus::Available);
    }

    #[test]
    fn test_unknown_enum_variant_rejected() {
        let map = sample_pet_map().with("status", "hibernating");
        let err = construct::<Pet>(&map, NameMode::Storage).unwrap_err();
        assert!(matches!(err, Error::Marshal { .. }));
        assert!(err.to_string().contains("hibernating"));
    }

    #[test]
    fn test_missing_properties_listed_precisely() {
        let mut map = sample_pet_map();
        map.remove("name");
        map.remove("owner");

        let err = construct::<Pet>(&map, NameMode::Storage).unwrap_err();
        match err {
            Error::MissingProperties { entity, names } => {
                assert_eq!(entity, "Pet");
                assert_eq!(names, vec!["name".to_string(), "owner".to_string()]);
            }
            other => panic!("expected MissingProperties, got {other:?}"),
        }
    }

    #[test]
    fn test_interface_not_constructible() {
        let err = construct::<PetBase>(&PropertyMap::new(), NameMode::Storage).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedKind {
                kind: EntityKind::Interface,
                ..
            }
        ));
    }
}
