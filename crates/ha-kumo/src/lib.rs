//! Kumo indoor units as heater/cooler entities
//!
//! A Kumo unit only knows a vendor mode string per unit. This crate maps it
//! onto the normalized climate model:
//!
//! - [`ModeTranslator`] - static vendor table, both directions
//! - [`UpdateCoordinator`] - polls one unit and pushes readings to subscribers
//! - [`KumoClimate`] - full climate device for the `heater_cooler` domain
//! - [`KumoPowerSwitch`] - on/off switch synthesized from the mode
//! - [`KumoPlatform`] - wires the above up per unit
//!
//! The network adapter implements [`KumoAccount`] and [`KumoUnit`]. The
//! `test-util` feature adds in-memory implementations of both.

mod climate;
mod config;
mod coordinator;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
mod platform;
mod power;
pub mod translator;
mod unit;

use std::time::Duration;

pub use climate::{subscribe_climate, KumoClimate, KUMO_TEMPERATURE_STEP};
pub use config::{
    kumo_entries, KumoConfig, CONF_CONNECT_TIMEOUT, CONF_ENABLE_POWER_SWITCH, CONF_PREFER_CACHE,
    CONF_RESPONSE_TIMEOUT, CONF_SCAN_INTERVAL,
};
pub use coordinator::{SharedUpdateCoordinator, UpdateCoordinator, UpdateHandler};
pub use error::{KumoError, KumoResult, TranslateError};
pub use platform::{KumoDevice, KumoPlatform, SWITCH_DOMAIN};
pub use power::{KumoPowerSwitch, PowerState, ATTR_LAST_HVAC_MODE};
pub use translator::{ModeTranslator, VendorMode, VendorModeTable, KUMO_MODES};
pub use unit::{ConnectOptions, KumoAccount, KumoReading, KumoUnit};

pub const DOMAIN: &str = "kumo";
pub const DEFAULT_NAME: &str = "Kumo";

/// Consecutive failed refreshes before a unit is reported unavailable
pub const MAX_AVAILABILITY_TRIES: u32 = 3;

/// Default time between refreshes
pub const SCAN_INTERVAL: Duration = Duration::from_secs(60);
