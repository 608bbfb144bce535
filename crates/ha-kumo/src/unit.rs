//! Kumo indoor unit adapter
//!
//! The network protocol lives outside this crate. A [`KumoUnit`] caches the
//! last status it fetched; readers never touch the network and only
//! [`KumoUnit::update_status`] and the setters do.

use crate::error::KumoResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// How the adapter reaches the units of an account
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectOptions {
    /// Start from the cached unit list instead of querying the account
    pub prefer_cache: bool,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
}

/// The indoor units reachable with one Kumo login
#[async_trait]
pub trait KumoAccount: Send + Sync {
    type Unit: KumoUnit + 'static;

    /// Discover the units of the account, connecting to each with `options`
    async fn indoor_units(&self, options: &ConnectOptions) -> KumoResult<Vec<Arc<Self::Unit>>>;
}

/// One Kumo indoor unit
#[async_trait]
pub trait KumoUnit: Send + Sync {
    /// Display name configured on the unit
    fn name(&self) -> &str;

    /// Serial number, unique per unit
    fn serial(&self) -> &str;

    /// Whether the adapter itself considers the unit reachable
    fn available(&self) -> bool {
        true
    }

    /// Fetch fresh status from the unit into the local cache
    async fn update_status(&self) -> KumoResult<()>;

    /// Vendor mode string, e.g. `autoCool`
    fn mode(&self) -> Option<String>;

    /// Command a vendor mode
    ///
    /// # Returns
    /// The raw acknowledgement of the unit
    async fn set_mode(&self, mode: &str) -> KumoResult<String>;

    /// Current room temperature in °C
    fn current_temperature(&self) -> Option<f64>;

    /// Heating setpoint in °C
    fn heat_setpoint(&self) -> Option<f64>;

    /// Cooling setpoint in °C
    fn cool_setpoint(&self) -> Option<f64>;

    /// Relative humidity, for units with a sensor
    fn current_humidity(&self) -> Option<f64> {
        None
    }

    fn fan_speed(&self) -> Option<String>;

    fn fan_speeds(&self) -> Vec<String>;

    fn vane_direction(&self) -> Option<String>;

    fn vane_directions(&self) -> Vec<String>;

    async fn set_heat_setpoint(&self, setpoint: f64) -> KumoResult<String>;

    async fn set_cool_setpoint(&self, setpoint: f64) -> KumoResult<String>;

    async fn set_fan_speed(&self, speed: &str) -> KumoResult<String>;

    async fn set_vane_direction(&self, direction: &str) -> KumoResult<String>;
}

/// Complete cached status of a unit at one refresh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KumoReading {
    pub available: bool,
    pub mode: Option<String>,
    pub current_temperature: Option<f64>,
    pub heat_setpoint: Option<f64>,
    pub cool_setpoint: Option<f64>,
    pub current_humidity: Option<f64>,
    pub fan_speed: Option<String>,
    pub fan_speeds: Vec<String>,
    pub vane_direction: Option<String>,
    pub vane_directions: Vec<String>,
}

impl KumoReading {
    /// Read every cached value of `unit`
    pub fn read<U: KumoUnit + ?Sized>(unit: &U, available: bool) -> Self {
        Self {
            available,
            mode: unit.mode(),
            current_temperature: unit.current_temperature(),
            heat_setpoint: unit.heat_setpoint(),
            cool_setpoint: unit.cool_setpoint(),
            current_humidity: unit.current_humidity(),
            fan_speed: unit.fan_speed(),
            fan_speeds: unit.fan_speeds(),
            vane_direction: unit.vane_direction(),
            vane_directions: unit.vane_directions(),
        }
    }
}
