//! Attribute keys and defaults published by climate entities

pub const ATTR_CURRENT_TEMPERATURE: &str = "current_temperature";
pub const ATTR_TEMPERATURE: &str = "temperature";
pub const ATTR_TARGET_TEMP_LOW: &str = "target_temp_low";
pub const ATTR_TARGET_TEMP_HIGH: &str = "target_temp_high";
pub const ATTR_TARGET_TEMP_STEP: &str = "target_temp_step";
pub const ATTR_MIN_TEMP: &str = "min_temp";
pub const ATTR_MAX_TEMP: &str = "max_temp";

pub const ATTR_CURRENT_HUMIDITY: &str = "current_humidity";
pub const ATTR_HUMIDITY: &str = "humidity";
pub const ATTR_MIN_HUMIDITY: &str = "min_humidity";
pub const ATTR_MAX_HUMIDITY: &str = "max_humidity";

pub const ATTR_HVAC_MODE: &str = "hvac_mode";
pub const ATTR_HVAC_MODES: &str = "hvac_modes";
pub const ATTR_HVAC_ACTION: &str = "hvac_action";
pub const ATTR_FAN_MODE: &str = "fan_mode";
pub const ATTR_FAN_MODES: &str = "fan_modes";
pub const ATTR_SWING_MODE: &str = "swing_mode";
pub const ATTR_SWING_MODES: &str = "swing_modes";
pub const ATTR_PRESET_MODE: &str = "preset_mode";
pub const ATTR_PRESET_MODES: &str = "preset_modes";
pub const ATTR_AUX_HEAT: &str = "aux_heat";
pub const ATTR_SUPPORTED_FEATURES: &str = "supported_features";

// Simplified model
pub const ATTR_ACTIVE: &str = "active";
pub const ATTR_TARGET_STATE: &str = "target_state";
pub const ATTR_CURRENT_STATE: &str = "current_state";

/// Service arguments holding a temperature in the caller's unit
pub const CONVERTIBLE_ATTRIBUTES: [&str; 3] =
    [ATTR_TEMPERATURE, ATTR_TARGET_TEMP_LOW, ATTR_TARGET_TEMP_HIGH];

/// Defaults in °C
pub const DEFAULT_MIN_TEMP: f64 = 7.0;
pub const DEFAULT_MAX_TEMP: f64 = 35.0;

pub const DEFAULT_MIN_HUMIDITY: f64 = 30.0;
pub const DEFAULT_MAX_HUMIDITY: f64 = 99.0;
