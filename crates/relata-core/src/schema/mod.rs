//! Declarative entity schema: the structural description each entity type
//! registers with the engine in place of runtime reflection.

mod declaration;
mod property;
mod relation;
mod types;

pub use declaration::{
    accessor, constructor, getter, AccessorFn, Arguments, ConstructorFn, EntityDeclaration,
    EntityId, EntityKind, EntityRef, EntityType,
};
pub use property::PropertyDef;
pub use relation::{Cardinality, RelationDef};
pub use types::{PropertyType, ScalarType};
