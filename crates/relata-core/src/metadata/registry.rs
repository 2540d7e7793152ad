//! Process-wide metadata cache.
//!
//! One slot per entity type, populated on first lookup. A failed build is
//! cached as failed and never retried: schema errors are configuration
//! errors, not transient conditions. Failures are scoped per type and do
//! not affect other entries.

use crate::error::Error;
use crate::metadata::EntityMetadata;
use crate::schema::EntityId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[derive(Clone)]
enum Slot {
    Built(&'static EntityMetadata),
    Failed(Error),
}

impl Slot {
    fn result(&self) -> Result<&'static EntityMetadata, Error> {
        match self {
            Slot::Built(meta) => Ok(meta),
            Slot::Failed(err) => Err(err.clone()),
        }
    }
}

static REGISTRY: OnceLock<DashMap<EntityId, Slot>> = OnceLock::new();

fn registry() -> &'static DashMap<EntityId, Slot> {
    REGISTRY.get_or_init(DashMap::new)
}

/// Look up the metadata slot for `id`, building it on first access.
///
/// Successful metadata is leaked into the process lifetime; the returned
/// reference stays valid forever. Concurrent first lookups serialize on the
/// slot's shard lock, so each type is built at most once. Builds never
/// resolve other entities' metadata (supertype and relation references are
/// lazy), so holding the slot during the build cannot deadlock.
pub(crate) fn get_or_build(
    id: EntityId,
    build: impl FnOnce() -> Result<EntityMetadata, Error>,
) -> Result<&'static EntityMetadata, Error> {
    let registry = registry();
    if let Some(slot) = registry.get(&id) {
        return slot.result();
    }

    match registry.entry(id) {
        Entry::Occupied(occupied) => occupied.get().result(),
        Entry::Vacant(vacant) => {
            let slot = match build() {
                Ok(meta) => {
                    debug!(entity = id.name(), "built entity metadata");
                    Slot::Built(Box::leak(Box::new(meta)))
                }
                Err(err) => {
                    warn!(entity = id.name(), error = %err, "entity metadata build failed; caching failure");
                    Slot::Failed(err)
                }
            };
            let result = slot.result();
            vacant.insert(slot);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityDeclaration, EntityType};

    struct Broken;

    impl EntityType for Broken {
        const NAME: &'static str = "Broken";

        fn declaration() -> EntityDeclaration {
            EntityDeclaration::class("Broken")
        }
    }

    #[test]
    fn test_failure_cached_never_retried() {
        let mut builds = 0;
        let id = EntityId::of::<Broken>();

        for _ in 0..3 {
            let result = get_or_build(id, || {
                builds += 1;
                Err(Error::declaration("Broken", "boom"))
            });
            assert!(result.is_err());
        }

        // First call caches the failure; later calls never rebuild.
        assert_eq!(builds, 1);
    }
}
