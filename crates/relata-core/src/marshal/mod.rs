//! Type marshalling between backend-native and entity-native values.
//!
//! The registry is a mapping-of-mappings: an optional owning entity type
//! scopes a table keyed by `(declared scalar type, incoming value kind)`.
//! Per-entity entries shadow global ones; unmapped combinations pass the
//! value through unchanged. The `unmarshal` direction runs during
//! construction (backend to native), the `marshal` direction during
//! deconstruction (native to backend).

mod defaults;

use crate::schema::{EntityId, ScalarType};
use parking_lot::RwLock;
use relata_model::{Value, ValueKind};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A registered conversion function.
///
/// Errors are plain strings; the factory attaches entity and property
/// context when surfacing them.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    owner: Option<EntityId>,
    scalar: ScalarType,
    from: ValueKind,
}

/// Registry of value marshallers, keyed per optional owning entity.
pub struct MarshallerRegistry {
    unmarshal: RwLock<HashMap<Key, ConvertFn>>,
    marshal: RwLock<HashMap<Key, ConvertFn>>,
}

static GLOBAL: OnceLock<MarshallerRegistry> = OnceLock::new();

impl MarshallerRegistry {
    /// An empty registry with no conversions registered.
    pub fn empty() -> Self {
        Self {
            unmarshal: RwLock::new(HashMap::new()),
            marshal: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry, with the default temporal and UUID
    /// marshallers pre-registered.
    pub fn global() -> &'static MarshallerRegistry {
        GLOBAL.get_or_init(|| {
            let registry = MarshallerRegistry::empty();
            defaults::register(&registry);
            registry
        })
    }

    /// Register a backend-to-native conversion (construct direction).
    ///
    /// `owner` scopes the entry to one entity type; `None` registers a
    /// global fallback. `scalar` is the property's declared type and `from`
    /// the incoming value's kind.
    pub fn register_unmarshal(
        &self,
        owner: Option<EntityId>,
        scalar: ScalarType,
        from: ValueKind,
        convert: ConvertFn,
    ) {
        self.unmarshal
            .write()
            .insert(Key { owner, scalar, from }, convert);
    }

    /// Register a native-to-backend conversion (deconstruct direction).
    pub fn register_marshal(
        &self,
        owner: Option<EntityId>,
        scalar: ScalarType,
        from: ValueKind,
        convert: ConvertFn,
    ) {
        self.marshal
            .write()
            .insert(Key { owner, scalar, from }, convert);
    }

    fn lookup(
        table: &RwLock<HashMap<Key, ConvertFn>>,
        owner: EntityId,
        scalar: ScalarType,
        from: ValueKind,
    ) -> Option<ConvertFn> {
        let table = table.read();
        table
            .get(&Key {
                owner: Some(owner),
                scalar,
                from,
            })
            .or_else(|| {
                table.get(&Key {
                    owner: None,
                    scalar,
                    from,
                })
            })
            .cloned()
    }

    /// Convert a backend value to its entity-native shape.
    ///
    /// Null and unmapped kinds pass through unchanged.
    pub fn unmarshal(
        &self,
        owner: EntityId,
        scalar: ScalarType,
        value: Value,
    ) -> Result<Value, String> {
        if value.is_null() {
            return Ok(value);
        }
        match Self::lookup(&self.unmarshal, owner, scalar, value.kind()) {
            Some(convert) => convert(&value),
            None => Ok(value),
        }
    }

    /// Convert an entity-native value to its backend shape.
    ///
    /// Null and unmapped kinds pass through unchanged.
    pub fn marshal(
        &self,
        owner: EntityId,
        scalar: ScalarType,
        value: Value,
    ) -> Result<Value, String> {
        if value.is_null() {
            return Ok(value);
        }
        match Self::lookup(&self.marshal, owner, scalar, value.kind()) {
            Some(convert) => convert(&value),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityId;
    use crate::test_fixtures::{Author, Pet};

    #[test]
    fn test_unmapped_passes_through() {
        let registry = MarshallerRegistry::empty();
        let owner = EntityId::of::<Author>();

        let value = Value::Int64(7);
        let out = registry
            .unmarshal(owner, ScalarType::Int64, value.clone())
            .unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_null_passes_through() {
        let registry = MarshallerRegistry::global();
        let owner = EntityId::of::<Author>();

        let out = registry
            .unmarshal(owner, ScalarType::Timestamp, Value::Null)
            .unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_owner_entry_shadows_global() {
        let registry = MarshallerRegistry::empty();
        let author = EntityId::of::<Author>();
        let pet = EntityId::of::<Pet>();

        registry.register_unmarshal(
            None,
            ScalarType::Int64,
            ValueKind::String,
            Arc::new(|_| Ok(Value::Int64(0))),
        );
        registry.register_unmarshal(
            Some(author),
            ScalarType::Int64,
            ValueKind::String,
            Arc::new(|_| Ok(Value::Int64(1))),
        );

        let via_author = registry
            .unmarshal(author, ScalarType::Int64, Value::String("x".into()))
            .unwrap();
        assert_eq!(via_author, Value::Int64(1));

        let via_pet = registry
            .unmarshal(pet, ScalarType::Int64, Value::String("x".into()))
            .unwrap();
        assert_eq!(via_pet, Value::Int64(0));
    }

    #[test]
    fn test_conversion_error_surfaces() {
        let registry = MarshallerRegistry::empty();
        registry.register_unmarshal(
            None,
            ScalarType::Int64,
            ValueKind::String,
            Arc::new(|v| Err(format!("cannot convert {v:?}"))),
        );

        let err = registry
            .unmarshal(
                EntityId::of::<Author>(),
                ScalarType::Int64,
                Value::String("x".into()),
            )
            .unwrap_err();
        assert!(err.contains("cannot convert"));
    }
}
