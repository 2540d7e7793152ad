//! Core type definitions for property declarations.

use relata_model::ValueKind;

/// Scalar data types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// Calendar date (days since Unix epoch).
    Date,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Declared value types for entity properties - flat, non-recursive.
///
/// Relation-valued properties use the `Entity*` arms; their payload is the
/// target entity's unique name. Nested optional/array combinations are not
/// supported; use separate properties or entities instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
    /// An enumeration type, carried as a string value.
    Enum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant names, in canonical casing.
        variants: Vec<String>,
    },
    /// An optional enumeration.
    OptionalEnum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant names, in canonical casing.
        variants: Vec<String>,
    },
    /// A singular reference to another entity.
    Entity {
        /// Name of the target entity type.
        entity: &'static str,
    },
    /// An optional singular reference to another entity.
    OptionalEntity {
        /// Name of the target entity type.
        entity: &'static str,
    },
    /// A collection of references to another entity.
    EntityCollection {
        /// Name of the target entity type.
        entity: &'static str,
    },
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float32 | ScalarType::Float64
        )
    }

    /// Check if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ScalarType::Timestamp | ScalarType::Date)
    }

    /// The value kind an entity-native value of this type carries.
    pub fn native_kind(&self) -> ValueKind {
        match self {
            ScalarType::Bool => ValueKind::Bool,
            ScalarType::Int32 => ValueKind::Int32,
            ScalarType::Int64 => ValueKind::Int64,
            ScalarType::Float32 => ValueKind::Float32,
            ScalarType::Float64 => ValueKind::Float64,
            ScalarType::String => ValueKind::String,
            ScalarType::Bytes => ValueKind::Bytes,
            ScalarType::Timestamp => ValueKind::Timestamp,
            ScalarType::Date => ValueKind::Date,
            ScalarType::Uuid => ValueKind::Uuid,
        }
    }
}

impl PropertyType {
    /// Create a scalar property type.
    pub fn scalar(scalar: ScalarType) -> Self {
        PropertyType::Scalar(scalar)
    }

    /// Create an optional scalar property type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        PropertyType::OptionalScalar(scalar)
    }

    /// Create an array-of-scalars property type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        PropertyType::ArrayScalar(scalar)
    }

    /// Create an enum property type.
    pub fn enum_type(name: impl Into<String>, variants: Vec<String>) -> Self {
        PropertyType::Enum {
            name: name.into(),
            variants,
        }
    }

    /// Create a singular entity-reference property type.
    pub fn entity(entity: &'static str) -> Self {
        PropertyType::Entity { entity }
    }

    /// Create an entity-collection property type.
    pub fn entity_collection(entity: &'static str) -> Self {
        PropertyType::EntityCollection { entity }
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            PropertyType::OptionalScalar(_)
                | PropertyType::OptionalEnum { .. }
                | PropertyType::OptionalEntity { .. }
        )
    }

    /// Check if this type is a multi-valued container.
    ///
    /// Container-ness drives relation cardinality inference: a multi-valued
    /// relation property is the "many" side of its relation.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            PropertyType::ArrayScalar(_) | PropertyType::EntityCollection { .. }
        )
    }

    /// Check if this type references another entity.
    pub fn is_entity_valued(&self) -> bool {
        matches!(
            self,
            PropertyType::Entity { .. }
                | PropertyType::OptionalEntity { .. }
                | PropertyType::EntityCollection { .. }
        )
    }

    /// Get the inner scalar type if this is a scalar-based type.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            PropertyType::Scalar(s)
            | PropertyType::OptionalScalar(s)
            | PropertyType::ArrayScalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Get the declared enum variants if this is an enum-based type.
    pub fn enum_variants(&self) -> Option<&[String]> {
        match self {
            PropertyType::Enum { variants, .. } | PropertyType::OptionalEnum { variants, .. } => {
                Some(variants)
            }
            _ => None,
        }
    }

    /// Get the target entity name if this is an entity-valued type.
    pub fn target_entity(&self) -> Option<&'static str> {
        match self {
            PropertyType::Entity { entity }
            | PropertyType::OptionalEntity { entity }
            | PropertyType::EntityCollection { entity } => Some(entity),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_checks() {
        assert!(ScalarType::Int32.is_numeric());
        assert!(ScalarType::Float64.is_numeric());
        assert!(!ScalarType::String.is_numeric());

        assert!(ScalarType::Timestamp.is_temporal());
        assert!(ScalarType::Date.is_temporal());
        assert!(!ScalarType::Uuid.is_temporal());

        assert_eq!(ScalarType::Timestamp.native_kind(), ValueKind::Timestamp);
    }

    #[test]
    fn test_property_type_builders() {
        let int_type = PropertyType::scalar(ScalarType::Int64);
        assert!(!int_type.is_nullable());
        assert!(!int_type.is_multi_valued());
        assert_eq!(int_type.scalar_type(), Some(ScalarType::Int64));

        let optional = PropertyType::optional_scalar(ScalarType::String);
        assert!(optional.is_nullable());

        let array = PropertyType::array_scalar(ScalarType::Int32);
        assert!(array.is_multi_valued());
    }

    #[test]
    fn test_enum_type() {
        let status = PropertyType::enum_type(
            "PetStatus",
            vec!["Available".into(), "Pending".into(), "Sold".into()],
        );
        assert!(!status.is_nullable());
        assert_eq!(status.enum_variants().map(<[String]>::len), Some(3));
        assert!(status.scalar_type().is_none());
    }

    #[test]
    fn test_entity_valued_types() {
        let owner = PropertyType::entity("Author");
        assert!(owner.is_entity_valued());
        assert!(!owner.is_multi_valued());
        assert_eq!(owner.target_entity(), Some("Author"));

        let pets = PropertyType::entity_collection("Pet");
        assert!(pets.is_entity_valued());
        assert!(pets.is_multi_valued());
    }
}
