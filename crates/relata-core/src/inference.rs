//! Relation-type inference.
//!
//! A one-time preprocessing pass that assigns cardinality to every relation
//! reachable from a starting entity and flags reference cycles. It must run
//! before any relation is followed, because cardinality determines whether a
//! relation's in-memory value is a single value or a collection.
//!
//! The pass is idempotent: cardinality cells are only ever assigned from
//! `Unknown` and the circular flag is only ever raised, so re-running it is
//! a no-op.

use crate::error::Error;
use crate::metadata::EntityMetadata;
use crate::schema::Cardinality;
use tracing::debug;

/// Infer cardinality and circularity for every relation declared on `meta`.
///
/// For each relation `R` from `A` to `B`, pairing considers only relations
/// declared on `B` whose own target is `A`. Inference is deliberately not
/// transitive: only directly co-declared relations between the same two
/// entity types are examined.
pub fn infer_relations(meta: &'static EntityMetadata) -> Result<(), Error> {
    for (prop, relation) in meta.declared_relations() {
        let target = relation.target().metadata()?;

        // Pair with the most specific reverse relation on the target:
        // the first one declared there that points back at this entity.
        // Every match participates in the cycle, so all get flagged.
        let mut paired = None;
        for (target_prop, reverse) in target.declared_relations() {
            if reverse.target().id() != meta.id() {
                continue;
            }
            relation.mark_circular();
            reverse.mark_circular();
            if paired.is_none() {
                paired = Some((target_prop, reverse));
            }
        }

        let self_multi = prop.value_type().is_multi_valued();
        match paired {
            Some((target_prop, reverse)) => {
                let target_multi = target_prop.value_type().is_multi_valued();
                let (forward_card, reverse_card) = match (self_multi, target_multi) {
                    (true, true) => (Cardinality::ManyToMany, Cardinality::ManyToMany),
                    (true, false) => (Cardinality::OneToMany, Cardinality::OneToOne),
                    (false, true) => (Cardinality::OneToOne, Cardinality::OneToMany),
                    (false, false) => (Cardinality::OneToOne, Cardinality::OneToOne),
                };
                relation.set_cardinality(forward_card);
                reverse.set_cardinality(reverse_card);
            }
            None => {
                // No reverse relation: only the property's own
                // container-ness distinguishes cardinality.
                relation.set_cardinality(if self_multi {
                    Cardinality::OneToMany
                } else {
                    Cardinality::OneToOne
                });
            }
        }

        debug!(
            entity = meta.name(),
            property = prop.field_name(),
            target = target.name(),
            cardinality = ?relation.cardinality(),
            circular = relation.is_circular(),
            "inferred relation type"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{Author, Course, Employee, Note, Pet, Student};
    use crate::EntityMetadata;

    fn relation_on<'a>(
        meta: &'a EntityMetadata,
        field: &str,
    ) -> &'a crate::schema::RelationDef {
        meta.declared_relations()
            .find(|(p, _)| p.field_name() == field)
            .map(|(_, r)| r)
            .unwrap()
    }

    #[test]
    fn test_bidirectional_pair_author_pet() {
        let author = EntityMetadata::of::<Author>().unwrap();
        let pet = EntityMetadata::of::<Pet>().unwrap();

        infer_relations(author).unwrap();
        infer_relations(pet).unwrap();

        let pets = relation_on(author, "pets");
        let owner = relation_on(pet, "owner_id");

        assert_eq!(pets.cardinality(), Cardinality::OneToMany);
        assert_eq!(owner.cardinality(), Cardinality::OneToOne);
        assert!(pets.is_circular());
        assert!(owner.is_circular());
    }

    #[test]
    fn test_bidirectional_collections_are_many_to_many() {
        let course = EntityMetadata::of::<Course>().unwrap();
        let student = EntityMetadata::of::<Student>().unwrap();

        // One pass from either side assigns both descriptors.
        infer_relations(course).unwrap();

        let students = relation_on(course, "students");
        let courses = relation_on(student, "courses");

        assert_eq!(students.cardinality(), Cardinality::ManyToMany);
        assert_eq!(courses.cardinality(), Cardinality::ManyToMany);
        assert!(students.is_circular());
        assert!(courses.is_circular());
    }

    #[test]
    fn test_idempotent() {
        let author = EntityMetadata::of::<Author>().unwrap();
        infer_relations(author).unwrap();
        let first = relation_on(author, "pets").cardinality();

        infer_relations(author).unwrap();
        infer_relations(author).unwrap();
        assert_eq!(relation_on(author, "pets").cardinality(), first);
    }

    #[test]
    fn test_one_directional_is_not_circular() {
        // Note declares a relation to Author; Author declares none back.
        let note = EntityMetadata::of::<Note>().unwrap();
        infer_relations(note).unwrap();

        let author_rel = relation_on(note, "author_id");
        assert!(!author_rel.is_circular());
        assert_eq!(author_rel.cardinality(), Cardinality::OneToOne);
    }

    #[test]
    fn test_self_relation() {
        // Employee.manager_id points back at Employee: trivially circular,
        // singular on both sides.
        let employee = EntityMetadata::of::<Employee>().unwrap();
        infer_relations(employee).unwrap();

        let manager = relation_on(employee, "manager_id");
        assert!(manager.is_circular());
        assert_eq!(manager.cardinality(), Cardinality::OneToOne);
    }
}
