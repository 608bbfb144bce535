//! Core configuration
//!
//! Parses the `homeassistant:` section. Only the parts the climate entities
//! consume are modelled: the location name and the unit system, which decides
//! the temperature unit attributes are displayed in.

use ha_climate::TemperatureUnit;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;

use crate::error::ConfigResult;
use crate::loader::{load_yaml, section};

/// Named unit system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    #[serde(alias = "us_customary")]
    Imperial,
}

impl UnitSystem {
    /// Temperature unit of this unit system
    pub fn temperature_unit(self) -> TemperatureUnit {
        match self {
            UnitSystem::Metric => TemperatureUnit::Celsius,
            UnitSystem::Imperial => TemperatureUnit::Fahrenheit,
        }
    }
}

/// Core configuration from the `homeassistant:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Name of the location
    #[serde(default = "default_name")]
    pub name: String,

    /// Unit system (metric or imperial)
    #[serde(default)]
    pub unit_system: UnitSystem,
}

fn default_name() -> String {
    "Home".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            unit_system: UnitSystem::Metric,
        }
    }
}

impl CoreConfig {
    /// Load core configuration from `configuration.yaml` in a config directory
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = load_yaml(config_dir.as_ref().join("configuration.yaml"))?;
        Self::from_yaml(&yaml)
    }

    /// Parse core configuration from a YAML document
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        section(yaml, "homeassistant")
    }

    /// The system temperature unit
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.unit_system.temperature_unit()
    }
}
