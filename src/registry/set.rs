//! Per-type object sets.

use super::entity::EntityType;
use super::meta::{ManagedObjectSnapshot, MetaObject, ObjectIdentity};
use parking_lot::RwLock;
use std::collections::HashMap;

/// ObjectMetaSet holds the snapshots of one entity type, keyed by identity.
///
/// Additions do not check that an object really is of `entity_type`; the owning
/// registry routes objects to the right set. All accesses are synchronized.
#[derive(Debug)]
pub struct ObjectMetaSet {
    entity_type: EntityType,
    contents: RwLock<HashMap<ObjectIdentity, ManagedObjectSnapshot>>,
}

impl ObjectMetaSet {
    /// Creates a new empty set for `entity_type`.
    pub fn new(entity_type: EntityType) -> Self {
        ObjectMetaSet {
            entity_type,
            contents: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the entity type this set holds.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Adds a snapshot of `object` unless its identity is already present.
    /// Returns true if the snapshot was added.
    pub fn maybe_add<M: MetaObject + ?Sized>(&self, object: &M) -> bool {
        let identity = object.identity();
        let mut contents = self.contents.write();
        if contents.contains_key(&identity) {
            return false;
        }
        contents.insert(identity, ManagedObjectSnapshot::capture(object));
        true
    }

    /// Removes the entry matching `object`'s identity.
    pub fn remove<M: MetaObject + ?Sized>(&self, object: &M) -> bool {
        self.contents.write().remove(&object.identity()).is_some()
    }

    /// Returns true if an entry with `object`'s identity exists.
    pub fn contains<M: MetaObject + ?Sized>(&self, object: &M) -> bool {
        self.contents.read().contains_key(&object.identity())
    }

    /// Returns the stored snapshot for `identity`.
    pub fn get(&self, identity: &ObjectIdentity) -> Option<ManagedObjectSnapshot> {
        self.contents.read().get(identity).cloned()
    }

    /// Visits every snapshot while holding the set's read lock.
    ///
    /// `f` must not call back into this set or its registry.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&ManagedObjectSnapshot),
    {
        let contents = self.contents.read();
        for snapshot in contents.values() {
            f(snapshot);
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.contents.write().clear();
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.contents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
