//! Entity metadata: per-type structural descriptions, the process-wide
//! registry, and schema scopes.

mod entity;
mod registry;
mod scope;

pub use entity::EntityMetadata;
pub use scope::{SchemaScope, ScopeResolver};
