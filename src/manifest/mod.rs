//! Manifest module - Loads managed objects from YAML/JSON manifests into a registry.
//!
//! A manifest is a stream of YAML documents. Each document is a single object, a
//! sequence of objects, or a Kubernetes `List` with `items`. JSON is accepted as the
//! YAML subset it is. Only `kind` and `metadata` are read.

use crate::registry::{EntityType, ObjectMeta, Registry, RegistryError};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

/// ManifestError represents a failure to load a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// ManifestObject is the part of a Kubernetes object a registry cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestObject {
    pub kind: String,
    pub metadata: ObjectMeta,
}

impl ManifestObject {
    /// Resolves the object's kind to an entity type.
    pub fn entity_type(&self) -> Result<EntityType, RegistryError> {
        self.kind.parse()
    }
}

/// Parses every object in a manifest.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestObject>, ManifestError> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        collect_objects(value, &mut objects)?;
    }
    Ok(objects)
}

fn collect_objects(value: Value, out: &mut Vec<ManifestObject>) -> Result<(), ManifestError> {
    match value {
        Value::Null => Ok(()),
        Value::Sequence(items) => items
            .into_iter()
            .try_for_each(|item| collect_objects(item, out)),
        Value::Mapping(mut mapping) if is_list(&mapping) => match mapping.remove("items") {
            Some(items) => collect_objects(items, out),
            None => Ok(()),
        },
        other => {
            out.push(serde_yaml::from_value(other)?);
            Ok(())
        }
    }
}

fn is_list(mapping: &serde_yaml::Mapping) -> bool {
    mapping.get("kind").and_then(Value::as_str) == Some("List")
}

/// Builds a registry holding every object of a manifest.
pub fn load_registry(text: &str) -> Result<Registry, ManifestError> {
    let registry = Registry::new();
    for object in parse_manifest(text)? {
        registry.register(object.entity_type()?, &object.metadata);
    }
    Ok(registry)
}
