//! Relata Core - Entity metadata, relation inference, and marshalling.
//!
//! This crate is the backend-agnostic heart of Relata: it derives a
//! structural description for each entity type, infers relation
//! cardinality between entity pairs, and converts entity instances to and
//! from flat property maps. It performs no I/O, builds no statements, and
//! owns no connections; storage and REST adapters consume the metadata and
//! the maps.

pub mod error;
pub mod factory;
pub mod inference;
pub mod marshal;
pub mod metadata;
pub mod schema;

#[doc(hidden)]
pub mod test_fixtures;

pub use error::Error;
pub use factory::{construct, deconstruct, NameMode};
pub use inference::infer_relations;
pub use marshal::{ConvertFn, MarshallerRegistry};
pub use metadata::{EntityMetadata, SchemaScope, ScopeResolver};
pub use schema::{
    accessor, constructor, getter, AccessorFn, Arguments, Cardinality, ConstructorFn,
    EntityDeclaration, EntityId, EntityKind, EntityRef, EntityType, PropertyDef, PropertyType,
    RelationDef, ScalarType,
};

/// Re-export the model types adapters exchange with the engine.
pub use relata_model as model;
pub use relata_model::{PropertyMap, Value, ValueKind};
