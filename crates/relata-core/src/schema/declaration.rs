//! Registration-time entity declarations.
//!
//! Instead of runtime reflection, every entity type implements
//! [`EntityType`] and hands the engine a declarative [`EntityDeclaration`]:
//! its property tuples, supertype references, a constructor closure
//! (record-like only) and one accessor closure per field. Metadata is built
//! from this description exactly once per type.

use super::property::PropertyDef;
use crate::error::Error;
use crate::metadata::EntityMetadata;
use relata_model::Value;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// The structural kind of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Immutable, constructor-built. The only constructible kind.
    Record,
    /// Abstract supertype with no own storage and no constructor.
    Interface,
    /// Mutable class-like type; not supported by this engine, operations
    /// on it fail fast.
    Class,
}

/// Unique identity of an entity type: Rust type identity plus the declared
/// unique name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    type_id: TypeId,
    name: &'static str,
}

impl EntityId {
    /// The identity of entity type `T`.
    pub fn of<T: EntityType>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
        }
    }

    /// The entity's declared unique name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A type that participates in the entity schema.
///
/// Implementations supply a unique name and a declaration; the engine owns
/// caching and validation. Abstract supertypes are plain marker types (no
/// instances are ever built for them).
pub trait EntityType: Any + Send + Sync + 'static {
    /// Unique entity name, also used as the default storage name.
    const NAME: &'static str;

    /// The structural description of this entity type.
    fn declaration() -> EntityDeclaration;
}

/// A lazy, cycle-safe reference to another entity type.
///
/// Carries the target's identity and a resolver fn-pointer instead of the
/// metadata itself, so a relation or supertype may point at an entity whose
/// metadata has not been built yet - including the declaring entity.
#[derive(Clone, Copy)]
pub struct EntityRef {
    id: EntityId,
    resolve: fn() -> Result<&'static EntityMetadata, Error>,
}

impl EntityRef {
    /// A reference to entity type `T`.
    pub fn of<T: EntityType>() -> Self {
        Self {
            id: EntityId::of::<T>(),
            resolve: EntityMetadata::of::<T>,
        }
    }

    /// The referenced entity's identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The referenced entity's name.
    pub fn name(&self) -> &'static str {
        self.id.name
    }

    /// Resolve the referenced entity's metadata, building it on first use.
    pub fn metadata(&self) -> Result<&'static EntityMetadata, Error> {
        (self.resolve)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityRef {}

impl std::fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EntityRef").field(&self.id.name).finish()
    }
}

/// Constructor closure: consumes marshalled values in declared-property
/// order and produces a boxed entity instance.
pub type ConstructorFn = Arc<dyn Fn(Arguments) -> Result<Box<dyn Any + Send>, Error> + Send + Sync>;

/// Accessor closure: reads one property value off a type-erased instance.
///
/// Errors are plain strings; the deconstruction path attaches entity and
/// property names when it logs or reports them.
pub type AccessorFn = Arc<dyn Fn(&dyn Any) -> Result<Value, String> + Send + Sync>;

/// Wrap a typed fallible constructor into a [`ConstructorFn`].
///
/// The closure must consume every argument (arity equals the declared
/// property count); leftover arguments fail the construction.
pub fn constructor<T, F>(f: F) -> ConstructorFn
where
    T: EntityType,
    F: Fn(&mut Arguments) -> Result<T, Error> + Send + Sync + 'static,
{
    Arc::new(move |mut args| {
        let entity = f(&mut args)?;
        args.finish()?;
        Ok(Box::new(entity) as Box<dyn Any + Send>)
    })
}

/// Wrap a typed infallible getter into an [`AccessorFn`].
pub fn getter<T, F>(f: F) -> AccessorFn
where
    T: EntityType,
    F: Fn(&T) -> Value + Send + Sync + 'static,
{
    Arc::new(move |instance| {
        instance
            .downcast_ref::<T>()
            .map(&f)
            .ok_or_else(|| format!("instance is not a `{}`", T::NAME))
    })
}

/// Wrap a typed fallible accessor into an [`AccessorFn`].
pub fn accessor<T, F>(f: F) -> AccessorFn
where
    T: EntityType,
    F: Fn(&T) -> Result<Value, String> + Send + Sync + 'static,
{
    Arc::new(move |instance| {
        instance
            .downcast_ref::<T>()
            .ok_or_else(|| format!("instance is not a `{}`", T::NAME))
            .and_then(&f)
    })
}

/// A positional cursor over constructor arguments.
///
/// Values arrive in `declared_properties()` order; arity therefore equals
/// the declared property count. Typed pulls fail with a constructor error
/// naming the offending position.
pub struct Arguments {
    entity: &'static str,
    values: std::vec::IntoIter<Value>,
    index: usize,
}

impl Arguments {
    pub(crate) fn new(entity: &'static str, values: Vec<Value>) -> Self {
        Self {
            entity,
            values: values.into_iter(),
            index: 0,
        }
    }

    fn mismatch(&self, expected: &str, got: &Value) -> Error {
        Error::Constructor {
            entity: self.entity.to_string(),
            reason: format!(
                "argument {} expected {expected}, got {got:?}",
                self.index.saturating_sub(1)
            ),
        }
    }

    /// Pull the next raw value.
    pub fn next_value(&mut self) -> Result<Value, Error> {
        self.index += 1;
        self.values.next().ok_or_else(|| Error::Constructor {
            entity: self.entity.to_string(),
            reason: format!("argument {} missing: arity mismatch", self.index - 1),
        })
    }

    /// Pull the next value as bool.
    pub fn next_bool(&mut self) -> Result<bool, Error> {
        let v = self.next_value()?;
        v.as_bool().ok_or_else(|| self.mismatch("bool", &v))
    }

    /// Pull the next value as i32.
    pub fn next_i32(&mut self) -> Result<i32, Error> {
        let v = self.next_value()?;
        v.as_i32().ok_or_else(|| self.mismatch("i32", &v))
    }

    /// Pull the next value as i64 (widening from i32).
    pub fn next_i64(&mut self) -> Result<i64, Error> {
        let v = self.next_value()?;
        v.as_i64().ok_or_else(|| self.mismatch("i64", &v))
    }

    /// Pull the next value as f64 (widening from f32).
    pub fn next_f64(&mut self) -> Result<f64, Error> {
        let v = self.next_value()?;
        v.as_f64().ok_or_else(|| self.mismatch("f64", &v))
    }

    /// Pull the next value as an owned string.
    pub fn next_string(&mut self) -> Result<String, Error> {
        let v = self.next_value()?;
        match v {
            Value::String(s) => Ok(s),
            other => Err(self.mismatch("string", &other)),
        }
    }

    /// Pull the next value as an optional i64 (`Null` becomes `None`).
    pub fn next_opt_i64(&mut self) -> Result<Option<i64>, Error> {
        let v = self.next_value()?;
        match v {
            Value::Null => Ok(None),
            other => other
                .as_i64()
                .map(Some)
                .ok_or_else(|| self.mismatch("i64 or null", &other)),
        }
    }

    /// Pull the next value as an optional string.
    pub fn next_opt_string(&mut self) -> Result<Option<String>, Error> {
        let v = self.next_value()?;
        match v {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(self.mismatch("string or null", &other)),
        }
    }

    /// Pull the next value as timestamp micros.
    pub fn next_timestamp(&mut self) -> Result<i64, Error> {
        let v = self.next_value()?;
        v.as_timestamp()
            .ok_or_else(|| self.mismatch("timestamp", &v))
    }

    /// Pull the next value as days since epoch.
    pub fn next_date(&mut self) -> Result<i32, Error> {
        let v = self.next_value()?;
        v.as_date().ok_or_else(|| self.mismatch("date", &v))
    }

    /// Pull the next value as UUID bytes.
    pub fn next_uuid(&mut self) -> Result<[u8; 16], Error> {
        let v = self.next_value()?;
        v.as_uuid()
            .copied()
            .ok_or_else(|| self.mismatch("uuid", &v))
    }

    /// Skip the next value (relation placeholders a constructor ignores).
    pub fn skip(&mut self) -> Result<(), Error> {
        self.next_value().map(|_| ())
    }

    /// Assert that every argument has been consumed.
    pub fn finish(&mut self) -> Result<(), Error> {
        match self.values.next() {
            None => Ok(()),
            Some(_) => Err(Error::Constructor {
                entity: self.entity.to_string(),
                reason: format!("argument {} left unconsumed: arity mismatch", self.index),
            }),
        }
    }
}

/// The declarative structural description of one entity type.
pub struct EntityDeclaration {
    pub(crate) name: &'static str,
    pub(crate) kind: EntityKind,
    pub(crate) super_types: Vec<EntityRef>,
    pub(crate) properties: Vec<PropertyDef>,
    pub(crate) constructor: Option<ConstructorFn>,
    pub(crate) accessors: Vec<(String, AccessorFn)>,
}

impl EntityDeclaration {
    fn new(name: &'static str, kind: EntityKind) -> Self {
        Self {
            name,
            kind,
            super_types: Vec::new(),
            properties: Vec::new(),
            constructor: None,
            accessors: Vec::new(),
        }
    }

    /// Declare a record-like (constructible) entity.
    pub fn record(name: &'static str) -> Self {
        Self::new(name, EntityKind::Record)
    }

    /// Declare an interface-like (abstract) entity.
    pub fn interface(name: &'static str) -> Self {
        Self::new(name, EntityKind::Interface)
    }

    /// Declare a class-like entity. Unsupported: metadata construction
    /// fails fast for this kind.
    pub fn class(name: &'static str) -> Self {
        Self::new(name, EntityKind::Class)
    }

    /// Declare a direct supertype.
    pub fn extends(mut self, super_type: EntityRef) -> Self {
        self.super_types.push(super_type);
        self
    }

    /// Add a property.
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Supply the constructor closure (record-like entities only).
    pub fn constructed_by(mut self, constructor: ConstructorFn) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Supply the accessor for one field.
    pub fn with_accessor(mut self, field_name: impl Into<String>, accessor: AccessorFn) -> Self {
        self.accessors.push((field_name.into(), accessor));
        self
    }
}
