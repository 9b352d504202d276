//! Object metadata, identities and snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// MetaObject is the metadata capability every managed Kubernetes object exposes.
pub trait MetaObject {
    fn name(&self) -> &str;
    fn namespace(&self) -> &str;
    fn labels(&self) -> &BTreeMap<String, String>;
    fn annotations(&self) -> &BTreeMap<String, String>;

    /// Returns the identity coordinate of this object.
    fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::new(self.namespace(), self.name())
    }
}

/// ObjectIdentity locates an object within one entity type.
///
/// Two objects of the same entity type are the same entity if and only if their
/// identities are equal. Labels and annotations play no part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity {
    pub namespace: String,
    pub name: String,
}

impl ObjectIdentity {
    /// Creates a new identity.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectIdentity {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// ObjectMeta is a plain metadata holder implementing [`MetaObject`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Creates metadata with no labels or annotations.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ObjectMeta {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

impl MetaObject for ObjectMeta {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }
}

/// ManagedObjectSnapshot is an owned copy of an object's identity and metadata
/// taken at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObjectSnapshot {
    #[serde(flatten)]
    meta: ObjectMeta,
}

impl ManagedObjectSnapshot {
    /// Copies the metadata of `object`.
    pub fn capture<M: MetaObject + ?Sized>(object: &M) -> Self {
        ManagedObjectSnapshot {
            meta: ObjectMeta {
                name: object.name().to_string(),
                namespace: object.namespace().to_string(),
                labels: object.labels().clone(),
                annotations: object.annotations().clone(),
            },
        }
    }

    /// Returns the captured metadata.
    pub fn meta(&self) -> &ObjectMeta {
        &self.meta
    }
}

impl MetaObject for ManagedObjectSnapshot {
    fn name(&self) -> &str {
        &self.meta.name
    }

    fn namespace(&self) -> &str {
        &self.meta.namespace
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.meta.labels
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.meta.annotations
    }
}
