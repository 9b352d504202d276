//! Entity types tracked by the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// EntityType is the closed set of managed object kinds the registry partitions by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    StatefulSet,
    ConfigMap,
    Service,
    Secret,
    #[serde(rename = "PVC", alias = "PersistentVolumeClaim")]
    VolumeClaim,
    #[serde(rename = "PDB", alias = "PodDisruptionBudget")]
    DisruptionBudget,
}

impl EntityType {
    /// Every entity type, in declaration order.
    pub const ALL: [EntityType; 6] = [
        EntityType::StatefulSet,
        EntityType::ConfigMap,
        EntityType::Service,
        EntityType::Secret,
        EntityType::VolumeClaim,
        EntityType::DisruptionBudget,
    ];

    /// Returns the canonical short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::StatefulSet => "StatefulSet",
            EntityType::ConfigMap => "ConfigMap",
            EntityType::Service => "Service",
            EntityType::Secret => "Secret",
            EntityType::VolumeClaim => "PVC",
            EntityType::DisruptionBudget => "PDB",
        }
    }

    /// Returns the Kubernetes kind this entity type corresponds to.
    pub fn kind(&self) -> &'static str {
        match self {
            EntityType::VolumeClaim => "PersistentVolumeClaim",
            EntityType::DisruptionBudget => "PodDisruptionBudget",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RegistryError represents a failure at the registry's parsing boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),
}

impl FromStr for EntityType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.kind().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistryError::UnknownEntityType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_kind_names() {
        assert_eq!("StatefulSet".parse::<EntityType>(), Ok(EntityType::StatefulSet));
        assert_eq!("PVC".parse::<EntityType>(), Ok(EntityType::VolumeClaim));
        assert_eq!(
            "PersistentVolumeClaim".parse::<EntityType>(),
            Ok(EntityType::VolumeClaim)
        );
        assert_eq!(
            "poddisruptionbudget".parse::<EntityType>(),
            Ok(EntityType::DisruptionBudget)
        );
        assert_eq!("configmap".parse::<EntityType>(), Ok(EntityType::ConfigMap));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "Deployment".parse::<EntityType>(),
            Err(RegistryError::UnknownEntityType("Deployment".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for t in EntityType::ALL {
            assert_eq!(t.to_string().parse::<EntityType>(), Ok(t));
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&EntityType::DisruptionBudget).unwrap(), "\"PDB\"");
        let t: EntityType = serde_json::from_str("\"PersistentVolumeClaim\"").unwrap();
        assert_eq!(t, EntityType::VolumeClaim);
    }
}
