//! Core error types.

use crate::schema::EntityKind;
use thiserror::Error;

/// Errors raised by the metadata and marshalling engine.
///
/// Schema-level variants (`InvalidEntityDeclaration`, `UnsupportedKind`) are
/// fatal for the offending entity type and are cached by the metadata
/// registry, so a broken type never becomes usable by retrying. They do not
/// affect other entity types.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The entity declaration is structurally broken.
    #[error("invalid entity declaration for `{entity}`: {reason}")]
    InvalidEntityDeclaration { entity: String, reason: String },

    /// A constructible operation was attempted on a non-record entity kind.
    #[error("unsupported entity kind {kind:?} for `{entity}`")]
    UnsupportedKind { entity: String, kind: EntityKind },

    /// A source map did not cover every declared property name.
    #[error("missing properties for `{entity}`: {names:?}")]
    MissingProperties { entity: String, names: Vec<String> },

    /// A property accessor raised while reading an entity instance.
    #[error("accessor failed for `{entity}.{property}`: {reason}")]
    Accessor {
        entity: String,
        property: String,
        reason: String,
    },

    /// A value could not be marshalled between backend and entity shapes.
    #[error("marshalling failed for `{entity}.{property}`: {reason}")]
    Marshal {
        entity: String,
        property: String,
        reason: String,
    },

    /// An entity constructor closure rejected its arguments.
    #[error("constructor failed for `{entity}`: {reason}")]
    Constructor { entity: String, reason: String },

    /// A whole-schema validation check failed.
    #[error("schema validation failed for `{entity}`: {reason}")]
    Validation { entity: String, reason: String },
}

impl Error {
    /// Shorthand for an invalid-declaration error.
    pub(crate) fn declaration(entity: &str, reason: impl Into<String>) -> Self {
        Error::InvalidEntityDeclaration {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a marshalling error.
    pub(crate) fn marshal(entity: &str, property: &str, reason: impl Into<String>) -> Self {
        Error::Marshal {
            entity: entity.to_string(),
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}
