//! # Keeper Reconcile
//!
//! Reconciliation support for an operator managing keeper (coordination service)
//! installations on Kubernetes.
//!
//! ## Modules
//!
//! - [`registry`] - Type-partitioned registry of managed objects with set subtraction
//! - [`poll`] - Cancellable convergence polling with a deadline
//! - [`manifest`] - Loading of managed objects from YAML/JSON manifests

pub mod manifest;
pub mod poll;
pub mod registry;

pub use manifest::{load_registry, parse_manifest, ManifestError, ManifestObject};
pub use poll::{
    wait_for_pod_ips, PodAddressing, PollConfig, PollError, PollOutcome, PollReport, PollTarget,
    PollTick, Poller,
};
pub use registry::{
    EntityType, ManagedObjectSnapshot, MetaObject, ObjectIdentity, ObjectMeta, ObjectMetaSet,
    OptionalRegistry, Registry, RegistryError,
};
