//! Crate-wide configuration.
//!
//! Loaded from JSON. Missing fields fall back to their defaults.

use crate::core::{Error, Result};
use crate::incident::CorrelationConfig;
use crate::monitoring::alerts::AlertConfiguration;
use crate::monitoring::health::{HealthClassifier, HealthThresholds};
use crate::store::InMemoryLogStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Vigil configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VigilConfig {
    /// Health classification tiers
    pub health: HealthThresholds,
    /// Incident correlation windows
    pub correlation: CorrelationConfig,
    /// In-memory log buffer size
    pub log_buffer_capacity: usize,
    /// Cooldown for alerts created without one
    pub default_cooldown_minutes: i64,
    /// Hourly cap for alerts created without one
    pub default_max_triggers_per_hour: u32,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            health: HealthThresholds::default(),
            correlation: CorrelationConfig::default(),
            log_buffer_capacity: crate::store::DEFAULT_LOG_CAPACITY,
            default_cooldown_minutes: 15,
            default_max_triggers_per_hour: 4,
        }
    }
}

impl VigilConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: VigilConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.health.validate()?;
        self.correlation.validate()?;

        if self.log_buffer_capacity == 0 {
            return Err(Error::Config("logBufferCapacity must be positive".to_string()));
        }

        self.alert_defaults()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Alert configuration carrying the default cooldown and cap.
    pub fn alert_defaults(&self) -> AlertConfiguration {
        AlertConfiguration::default()
            .with_cooldown(self.default_cooldown_minutes)
            .with_max_triggers_per_hour(self.default_max_triggers_per_hour)
    }

    /// Classifier using the configured tiers.
    pub fn classifier(&self) -> HealthClassifier {
        HealthClassifier::new(self.health.clone())
    }

    /// Log buffer sized from the configuration.
    pub fn log_store(&self) -> InMemoryLogStore {
        InMemoryLogStore::with_capacity(self.log_buffer_capacity)
    }
}
