//! Relation descriptors between entity types.

use super::declaration::EntityRef;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Not yet inferred.
    Unknown,
    /// One-to-one relation.
    OneToOne,
    /// One-to-many relation (this side is the "one" owning a collection).
    OneToMany,
    /// Many-to-many relation (both sides are collections).
    ManyToMany,
}

/// A directed link from one entity's property to another entity type.
///
/// The self-side and target-side key lists have matching arity (checked when
/// the owning declaration is built into metadata), so composite keys join
/// positionally. `cardinality` and `circular` start unset and are assigned
/// exactly once by the relation-inference pass; both are compute-once cells,
/// never rewritten.
#[derive(Debug)]
pub struct RelationDef {
    /// Storage names of the local join-key properties.
    self_keys: Vec<String>,
    /// The target entity type (lazily resolvable, cycle-safe).
    target: EntityRef,
    /// Storage names of the target join-key properties.
    target_keys: Vec<String>,
    /// Inferred cardinality; unset means [`Cardinality::Unknown`].
    cardinality: OnceLock<Cardinality>,
    /// Whether the target declares a relation pointing back here.
    circular: AtomicBool,
}

impl RelationDef {
    /// Create a relation to `target`, joining `self_keys` to `target_keys`.
    pub fn new(
        target: EntityRef,
        self_keys: impl IntoIterator<Item = impl Into<String>>,
        target_keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            self_keys: self_keys.into_iter().map(Into::into).collect(),
            target,
            target_keys: target_keys.into_iter().map(Into::into).collect(),
            cardinality: OnceLock::new(),
            circular: AtomicBool::new(false),
        }
    }

    /// Shorthand for a single-column join.
    pub fn via(target: EntityRef, self_key: impl Into<String>, target_key: impl Into<String>) -> Self {
        Self::new(target, [self_key.into()], [target_key.into()])
    }

    /// Local join-key storage names, in declaration order.
    pub fn self_keys(&self) -> &[String] {
        &self.self_keys
    }

    /// The target entity reference.
    pub fn target(&self) -> EntityRef {
        self.target
    }

    /// Target join-key storage names, positionally matched to `self_keys`.
    pub fn target_keys(&self) -> &[String] {
        &self.target_keys
    }

    /// The inferred cardinality, or `Unknown` before inference has run.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality.get().copied().unwrap_or(Cardinality::Unknown)
    }

    /// Whether this relation participates in a reference cycle.
    pub fn is_circular(&self) -> bool {
        self.circular.load(Ordering::Acquire)
    }

    /// Assign cardinality once; later assignments are no-ops.
    pub(crate) fn set_cardinality(&self, cardinality: Cardinality) {
        let _ = self.cardinality.set(cardinality);
    }

    /// Raise the circular flag; never lowered.
    pub(crate) fn mark_circular(&self) {
        self.circular.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::Author;
    use crate::EntityRef;

    #[test]
    fn test_relation_starts_unknown() {
        let rel = RelationDef::via(EntityRef::of::<Author>(), "owner_id", "id");

        assert_eq!(rel.cardinality(), Cardinality::Unknown);
        assert!(!rel.is_circular());
        assert_eq!(rel.self_keys(), &["owner_id".to_string()]);
        assert_eq!(rel.target_keys(), &["id".to_string()]);
        assert_eq!(rel.target().name(), "Author");
    }

    #[test]
    fn test_cardinality_set_once() {
        let rel = RelationDef::via(EntityRef::of::<Author>(), "owner_id", "id");

        rel.set_cardinality(Cardinality::OneToMany);
        assert_eq!(rel.cardinality(), Cardinality::OneToMany);

        // A second assignment loses: cardinality is only ever set from Unknown.
        rel.set_cardinality(Cardinality::ManyToMany);
        assert_eq!(rel.cardinality(), Cardinality::OneToMany);
    }

    #[test]
    fn test_circular_flag_raise_only() {
        let rel = RelationDef::via(EntityRef::of::<Author>(), "owner_id", "id");
        assert!(!rel.is_circular());

        rel.mark_circular();
        rel.mark_circular();
        assert!(rel.is_circular());
    }

    #[test]
    fn test_composite_keys() {
        let rel = RelationDef::new(
            EntityRef::of::<Author>(),
            ["tenant_id", "owner_id"],
            ["tenant_id", "id"],
        );
        assert_eq!(rel.self_keys().len(), 2);
        assert_eq!(rel.target_keys().len(), 2);
    }
}
