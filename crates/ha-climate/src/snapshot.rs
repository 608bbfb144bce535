//! Device snapshots
//!
//! A snapshot is the complete set of readings of one device at one refresh.
//! Adapters build a new one every cycle and entities replace the previous
//! snapshot wholesale.

use crate::attributes::{DEFAULT_MAX_HUMIDITY, DEFAULT_MAX_TEMP, DEFAULT_MIN_HUMIDITY, DEFAULT_MIN_TEMP};
use crate::{Active, CurrentState, HvacAction, HvacMode, SupportedFeatures, TargetState, TemperatureUnit};

/// Setpoint of a device: one target, or a low/high pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetTemperature {
    Single(f64),
    Range { low: Option<f64>, high: Option<f64> },
}

impl TargetTemperature {
    pub fn single(&self) -> Option<f64> {
        match self {
            TargetTemperature::Single(value) => Some(*value),
            TargetTemperature::Range { .. } => None,
        }
    }

    pub fn low(&self) -> Option<f64> {
        match self {
            TargetTemperature::Range { low, .. } => *low,
            TargetTemperature::Single(_) => None,
        }
    }

    pub fn high(&self) -> Option<f64> {
        match self {
            TargetTemperature::Range { high, .. } => *high,
            TargetTemperature::Single(_) => None,
        }
    }
}

/// Latest readings of a full climate device
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub current_temperature: Option<f64>,
    pub target: Option<TargetTemperature>,
    pub current_humidity: Option<f64>,
    pub target_humidity: Option<f64>,

    pub hvac_mode: Option<HvacMode>,
    pub hvac_action: Option<HvacAction>,
    pub hvac_modes: Vec<HvacMode>,

    pub fan_mode: Option<String>,
    pub fan_modes: Vec<String>,
    pub swing_mode: Option<String>,
    pub swing_modes: Vec<String>,
    pub preset_mode: Option<String>,
    pub preset_modes: Vec<String>,
    pub aux_heat_on: Option<bool>,

    pub supported_features: SupportedFeatures,

    /// Limits in the device unit; `None` falls back to the defaults
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub target_temperature_step: Option<f64>,
}

impl DeviceSnapshot {
    /// Minimum settable temperature in `unit`
    pub fn min_temp(&self, unit: TemperatureUnit) -> f64 {
        self.min_temp
            .unwrap_or_else(|| TemperatureUnit::Celsius.convert(DEFAULT_MIN_TEMP, unit))
    }

    /// Maximum settable temperature in `unit`
    pub fn max_temp(&self, unit: TemperatureUnit) -> f64 {
        self.max_temp
            .unwrap_or_else(|| TemperatureUnit::Celsius.convert(DEFAULT_MAX_TEMP, unit))
    }

    pub fn min_humidity(&self) -> f64 {
        self.min_humidity.unwrap_or(DEFAULT_MIN_HUMIDITY)
    }

    pub fn max_humidity(&self) -> f64 {
        self.max_humidity.unwrap_or(DEFAULT_MAX_HUMIDITY)
    }

    pub fn supports_mode(&self, mode: HvacMode) -> bool {
        self.hvac_modes.contains(&mode)
    }
}

/// Latest readings of a simplified heater/cooler
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleSnapshot {
    pub active: Active,
    pub target_state: TargetState,
    pub current_state: CurrentState,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub supported_features: SupportedFeatures,
}

impl Default for SimpleSnapshot {
    fn default() -> Self {
        Self {
            active: Active::Inactive,
            target_state: TargetState::Auto,
            current_state: CurrentState::Inactive,
            current_temperature: None,
            target_temperature: None,
            supported_features: SupportedFeatures::empty(),
        }
    }
}
