//! Poll configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default pause between two evaluations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default ceiling on the total wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// PollError represents an invalid poll configuration.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid poll config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse poll config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// PollConfig controls the pace and the deadline of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    #[serde(rename = "intervalMs", with = "millis")]
    pub interval: Duration,
    #[serde(rename = "timeoutMs", with = "millis")]
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PollConfig {
    /// Creates a config with the given interval and timeout.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        PollConfig { interval, timeout }
    }

    /// Parses a YAML (or JSON) document. Missing fields take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, PollError> {
        let config: PollConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the config can drive a poll loop.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.interval.is_zero() {
            return Err(PollError::InvalidConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
