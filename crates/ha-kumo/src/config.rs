//! `kumo:` configuration section
//!
//! ```yaml
//! kumo:
//!   enable_power_switch: true
//!   prefer_cache: false
//!   connect_timeout: 1.2
//!   response_timeout: 8.0
//!   scan_interval: 60
//! ```

use ha_config::{platform_entries, section, ConfigError, ConfigResult, PlatformConfig, Value};
use serde::{Deserialize, Serialize};
use crate::unit::ConnectOptions;
use std::time::Duration;

pub const CONF_ENABLE_POWER_SWITCH: &str = "enable_power_switch";
pub const CONF_PREFER_CACHE: &str = "prefer_cache";
pub const CONF_CONNECT_TIMEOUT: &str = "connect_timeout";
pub const CONF_RESPONSE_TIMEOUT: &str = "response_timeout";
pub const CONF_SCAN_INTERVAL: &str = "scan_interval";

const DEFAULT_CONNECT_TIMEOUT: f64 = 1.2;
const DEFAULT_RESPONSE_TIMEOUT: f64 = 8.0;

/// Options shared by all Kumo units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KumoConfig {
    /// Also expose an on/off switch per unit
    pub enable_power_switch: bool,

    /// Start from the cached unit list instead of querying the account
    pub prefer_cache: bool,

    /// Seconds
    pub connect_timeout: f64,

    /// Seconds
    pub response_timeout: f64,

    /// Seconds between refreshes
    pub scan_interval: u64,
}

impl Default for KumoConfig {
    fn default() -> Self {
        Self {
            enable_power_switch: false,
            prefer_cache: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            scan_interval: crate::SCAN_INTERVAL.as_secs(),
        }
    }
}

impl KumoConfig {
    /// Parse and validate the `kumo:` section; a missing section is the default
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        let config: Self = section(yaml, crate::DOMAIN)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (key, value) in [
            (CONF_CONNECT_TIMEOUT, self.connect_timeout),
            (CONF_RESPONSE_TIMEOUT, self.response_timeout),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, format!("must be a positive number, got {}", value)));
            }
        }
        if self.scan_interval == 0 {
            return Err(invalid(CONF_SCAN_INTERVAL, "must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Options for one `heater_cooler:` entry; the entry may turn the power
    /// switch on for its unit
    pub fn for_entry(&self, entry: &PlatformConfig) -> Self {
        Self {
            enable_power_switch: self.enable_power_switch || entry.enable_power_switch,
            ..self.clone()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.response_timeout)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Options handed to the account when discovering units
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            prefer_cache: self.prefer_cache,
            connect_timeout: self.connect_timeout(),
            response_timeout: self.response_timeout(),
        }
    }
}

/// `heater_cooler:` entries served by this integration
pub fn kumo_entries(yaml: &Value) -> ConfigResult<Vec<PlatformConfig>> {
    Ok(platform_entries(yaml)?
        .into_iter()
        .filter(|entry| entry.platform == crate::DOMAIN)
        .collect())
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}.{}", crate::DOMAIN, key),
        reason,
    }
}
