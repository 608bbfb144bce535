//! Heater/cooler platform entries
//!
//! ```yaml
//! heater_cooler:
//!   - platform: kumo
//!     name: Den
//!     address: 192.168.1.20
//!     config: "<unit credentials>"
//!     enable_power_switch: true
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::section;

/// One entry of the `heater_cooler:` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Integration providing the entity (e.g. "kumo")
    pub platform: String,

    /// Display name; also the source of the entity ID
    pub name: String,

    /// Network address of the unit
    pub address: String,

    /// Opaque unit configuration handed to the adapter
    pub config: String,

    /// Also expose an on/off switch over the unit's mode
    #[serde(default)]
    pub enable_power_switch: bool,
}

/// Parse all `heater_cooler:` platform entries
pub fn platform_entries(yaml: &Value) -> ConfigResult<Vec<PlatformConfig>> {
    let entries: Vec<PlatformConfig> = section(yaml, "heater_cooler")?;

    for entry in &entries {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "heater_cooler.name".to_string(),
                reason: format!("empty name for {} platform", entry.platform),
            });
        }
    }

    Ok(entries)
}
