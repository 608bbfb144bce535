//! YAML configuration for heater/cooler entities
//!
//! - [`CoreConfig`] - the `homeassistant:` section (unit system)
//! - [`PlatformConfig`] - entries of the `heater_cooler:` list
//! - [`section`] - typed access to integration sections such as `kumo:`
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_yaml, platform_entries, CoreConfig};
//!
//! let yaml = load_yaml("/config/configuration.yaml")?;
//! let core = CoreConfig::from_yaml(&yaml)?;
//! let platforms = platform_entries(&yaml)?;
//! ```

mod core_config;
mod error;
mod loader;
mod platform;

pub use core_config::{CoreConfig, UnitSystem};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, load_yaml_string, section};
pub use platform::{platform_entries, PlatformConfig};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
