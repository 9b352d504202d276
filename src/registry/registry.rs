//! The type-partitioned registry of managed objects.

use super::entity::EntityType;
use super::meta::{ManagedObjectSnapshot, MetaObject};
use super::set::ObjectMetaSet;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Registry records the identities of managed objects, partitioned by entity type.
///
/// A default-constructed registry is a valid empty registry. Partitions are created
/// on first use of their entity type and live as long as the registry does, even when
/// they become empty.
///
/// Locking is two-level: the partition map has its own lock, taken for writing only
/// when a partition is created, and each partition has its own lock. Operations that
/// name their entity type therefore never contend on the partition map once the
/// partition exists.
#[derive(Debug, Default)]
pub struct Registry {
    sets: RwLock<HashMap<EntityType, Arc<ObjectMetaSet>>>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a snapshot of `object` under `entity_type`. Registering an identity
    /// that is already present keeps the first snapshot.
    pub fn register<M: MetaObject + ?Sized>(&self, entity_type: EntityType, object: &M) {
        self.ensure_set(entity_type).maybe_add(object);
    }

    /// Returns true if `object`'s identity is registered under `entity_type`.
    pub fn has<M: MetaObject + ?Sized>(&self, entity_type: EntityType, object: &M) -> bool {
        self.ensure_set(entity_type).contains(object)
    }

    /// Removes `object`'s identity from `entity_type`. Returns true if it was present.
    pub fn unregister<M: MetaObject + ?Sized>(
        &self,
        entity_type: EntityType,
        object: &M,
    ) -> bool {
        self.ensure_set(entity_type).remove(object)
    }

    /// With no entity types, returns the number of partitions in the registry.
    /// Otherwise returns the number of objects across the given entity types.
    ///
    /// Must not be called from inside a [`Registry::walk`] visitor.
    pub fn count(&self, what: &[EntityType]) -> usize {
        if what.is_empty() {
            return self.sets.read_recursive().len();
        }
        what.iter()
            .map(|entity_type| self.ensure_set(*entity_type).len())
            .sum()
    }

    /// Visits every registered object. The whole registry stays read-locked for the
    /// duration, so partition creation elsewhere blocks until the walk returns.
    ///
    /// `f` must not call back into this registry.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(EntityType, &ManagedObjectSnapshot),
    {
        let sets = self.sets.read();
        for (entity_type, set) in sets.iter() {
            set.walk(|snapshot| f(*entity_type, snapshot));
        }
    }

    /// Visits every object of one entity type, locking only that partition.
    pub fn walk_type<F>(&self, entity_type: EntityType, f: F)
    where
        F: FnMut(&ManagedObjectSnapshot),
    {
        self.ensure_set(entity_type).walk(f);
    }

    /// Returns owned copies of every snapshot of `entity_type`.
    pub fn snapshots(&self, entity_type: EntityType) -> Vec<ManagedObjectSnapshot> {
        let mut out = Vec::new();
        self.walk_type(entity_type, |snapshot| out.push(snapshot.clone()));
        out
    }

    /// Removes from this registry every object present in `other`, matching on
    /// entity type and identity. Returns `self` for chaining.
    ///
    /// Does nothing if either registry has no partitions.
    pub fn subtract(&self, other: &Registry) -> &Self {
        if other.count(&[]) == 0 {
            return self;
        }
        if self.count(&[]) == 0 {
            return self;
        }

        if std::ptr::eq(self, other) {
            for set in self.sets.read().values() {
                set.clear();
            }
            return self;
        }

        // Collected up front so that no lock of `other` is held while ours are taken.
        let mut doomed = Vec::new();
        other.walk(|entity_type, snapshot| doomed.push((entity_type, snapshot.clone())));

        let mut removed = 0;
        for (entity_type, snapshot) in &doomed {
            if self.unregister(*entity_type, snapshot) {
                removed += 1;
            }
        }
        debug!(candidates = doomed.len(), removed, "subtracted registry");
        self
    }

    /// Renders one `<type>: <namespace>/<name>` line per object. Order is unspecified.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.walk(|entity_type, snapshot| {
            out.push_str(&format!("{}: {}\n", entity_type, snapshot.identity()));
        });
        out
    }

    /// Resolves the partition for `entity_type`, creating it if needed.
    fn ensure_set(&self, entity_type: EntityType) -> Arc<ObjectMetaSet> {
        // Recursive read so lookups of existing partitions are not queued behind a
        // partition creation that is itself waiting for a walk to finish.
        if let Some(existing) = self.sets.read_recursive().get(&entity_type) {
            return Arc::clone(existing);
        }

        // Another thread may create the partition between the two lock acquisitions,
        // so check again under the upgradable lock.
        let sets = self.sets.upgradable_read();
        if let Some(existing) = sets.get(&entity_type) {
            return Arc::clone(existing);
        }
        let mut sets = RwLockUpgradableReadGuard::upgrade(sets);
        let set = Arc::new(ObjectMetaSet::new(entity_type));
        sets.insert(entity_type, Arc::clone(&set));
        set
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

macro_rules! entity_accessors {
    ($($entity:ident => $register:ident, $has:ident, $num:ident, $walk:ident;)*) => {
        impl Registry {
            $(
                #[doc = concat!("Registers a `", stringify!($entity), "`.")]
                pub fn $register<M: MetaObject + ?Sized>(&self, object: &M) {
                    self.register(EntityType::$entity, object)
                }

                #[doc = concat!("Returns true if the `", stringify!($entity), "` is registered.")]
                pub fn $has<M: MetaObject + ?Sized>(&self, object: &M) -> bool {
                    self.has(EntityType::$entity, object)
                }

                #[doc = concat!(
                    "Returns the number of registered `", stringify!($entity), "` objects."
                )]
                pub fn $num(&self) -> usize {
                    self.count(&[EntityType::$entity])
                }

                #[doc = concat!("Visits every registered `", stringify!($entity), "`.")]
                pub fn $walk<F>(&self, f: F)
                where
                    F: FnMut(&ManagedObjectSnapshot),
                {
                    self.walk_type(EntityType::$entity, f)
                }
            )*
        }
    };
}

entity_accessors! {
    StatefulSet => register_stateful_set, has_stateful_set, num_stateful_set, walk_stateful_set;
    ConfigMap => register_config_map, has_config_map, num_config_map, walk_config_map;
    Service => register_service, has_service, num_service, walk_service;
    Secret => register_secret, has_secret, num_secret, walk_secret;
    VolumeClaim => register_pvc, has_pvc, num_pvc, walk_pvc;
    DisruptionBudget => register_pdb, has_pdb, num_pdb, walk_pdb;
}

/// Registry operations on a registry that may be absent. An absent registry
/// behaves exactly like an empty one.
pub trait OptionalRegistry<'a> {
    fn count(self, what: &[EntityType]) -> usize;
    fn has<M: MetaObject + ?Sized>(self, entity_type: EntityType, object: &M) -> bool;
    fn walk<F>(self, f: F)
    where
        F: FnMut(EntityType, &ManagedObjectSnapshot);
    fn render(self) -> String;
    fn subtract(self, other: Option<&Registry>) -> Option<&'a Registry>;
}

impl<'a> OptionalRegistry<'a> for Option<&'a Registry> {
    fn count(self, what: &[EntityType]) -> usize {
        self.map_or(0, |r| r.count(what))
    }

    fn has<M: MetaObject + ?Sized>(self, entity_type: EntityType, object: &M) -> bool {
        self.is_some_and(|r| r.has(entity_type, object))
    }

    fn walk<F>(self, f: F)
    where
        F: FnMut(EntityType, &ManagedObjectSnapshot),
    {
        if let Some(r) = self {
            r.walk(f);
        }
    }

    fn render(self) -> String {
        self.map(Registry::render).unwrap_or_default()
    }

    fn subtract(self, other: Option<&Registry>) -> Option<&'a Registry> {
        match (self, other) {
            (Some(r), Some(other)) => Some(r.subtract(other)),
            (r, _) => r,
        }
    }
}
