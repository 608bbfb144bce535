//! Capability-gated projection of snapshots into published attributes
//!
//! Every attribute tied to a [`SupportedFeatures`] flag appears in the output
//! if and only if the flag is set. Observation-only readings
//! (`current_temperature`, `current_humidity`, `hvac_action`) are published
//! whenever the device reports them.

use crate::attributes::*;
use crate::error::ClimateResult;
use crate::temperature::{default_precision, display_temp, Precision, TemperatureUnit};
use crate::{ClimateEnum, DeviceSnapshot, SimpleSnapshot, SupportedFeatures};
use ha_core::{AttributeMap, STATE_OFF, STATE_ON, STATE_UNKNOWN};
use serde_json::Value;
use tracing::warn;

/// Units and rounding used when rendering temperatures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    /// Unit the device reports in
    pub entity_unit: TemperatureUnit,
    /// Unit of the configured unit system
    pub system_unit: TemperatureUnit,
    /// Per-device precision override
    pub precision: Option<Precision>,
}

impl DisplayOptions {
    pub fn new(entity_unit: TemperatureUnit, system_unit: TemperatureUnit) -> Self {
        Self {
            entity_unit,
            system_unit,
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: Option<Precision>) -> Self {
        self.precision = precision;
        self
    }

    /// Explicit precision, else the default for the system unit
    pub fn precision(&self) -> Precision {
        self.precision
            .unwrap_or_else(|| default_precision(self.system_unit))
    }

    /// Render a device temperature, `null` when absent
    pub fn temperature(&self, value: Option<f64>) -> Value {
        let precision = self.precision();
        display_temp(value, self.entity_unit, self.system_unit, precision)
            .map(|shown| precision.to_value(shown))
            .unwrap_or(Value::Null)
    }
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Attributes describing what the device can do
pub fn capability_attributes(
    snapshot: &DeviceSnapshot,
    features: SupportedFeatures,
    display: &DisplayOptions,
) -> AttributeMap {
    let mut attrs = AttributeMap::new();

    attrs.insert(
        ATTR_HVAC_MODES.to_string(),
        Value::from(snapshot.hvac_modes.iter().map(|m| m.as_str()).collect::<Vec<_>>()),
    );
    attrs.insert(
        ATTR_MIN_TEMP.to_string(),
        display.temperature(Some(snapshot.min_temp(display.entity_unit))),
    );
    attrs.insert(
        ATTR_MAX_TEMP.to_string(),
        display.temperature(Some(snapshot.max_temp(display.entity_unit))),
    );

    if let Some(step) = snapshot.target_temperature_step {
        attrs.insert(ATTR_TARGET_TEMP_STEP.to_string(), number(step));
    }

    if features.contains(SupportedFeatures::TARGET_HUMIDITY) {
        attrs.insert(ATTR_MIN_HUMIDITY.to_string(), number(snapshot.min_humidity()));
        attrs.insert(ATTR_MAX_HUMIDITY.to_string(), number(snapshot.max_humidity()));
    }

    if features.contains(SupportedFeatures::FAN_MODE) {
        attrs.insert(ATTR_FAN_MODES.to_string(), Value::from(snapshot.fan_modes.clone()));
    }

    if features.contains(SupportedFeatures::PRESET_MODE) {
        attrs.insert(
            ATTR_PRESET_MODES.to_string(),
            Value::from(snapshot.preset_modes.clone()),
        );
    }

    if features.contains(SupportedFeatures::SWING_MODE) {
        attrs.insert(
            ATTR_SWING_MODES.to_string(),
            Value::from(snapshot.swing_modes.clone()),
        );
    }

    attrs
}

/// Attributes describing the current readings and setpoints
pub fn state_attributes(
    snapshot: &DeviceSnapshot,
    features: SupportedFeatures,
    display: &DisplayOptions,
) -> AttributeMap {
    let mut attrs = AttributeMap::new();

    attrs.insert(
        ATTR_CURRENT_TEMPERATURE.to_string(),
        display.temperature(snapshot.current_temperature),
    );

    let has_range = features.contains(SupportedFeatures::TARGET_TEMPERATURE_RANGE);
    if features.has_conflicting_targets() {
        warn!(%features, "Device declares both a single target and a target range, using the range");
    }

    let target = snapshot.target.as_ref();
    if has_range {
        attrs.insert(
            ATTR_TARGET_TEMP_HIGH.to_string(),
            display.temperature(target.and_then(|t| t.high())),
        );
        attrs.insert(
            ATTR_TARGET_TEMP_LOW.to_string(),
            display.temperature(target.and_then(|t| t.low())),
        );
    } else if features.contains(SupportedFeatures::TARGET_TEMPERATURE) {
        attrs.insert(
            ATTR_TEMPERATURE.to_string(),
            display.temperature(target.and_then(|t| t.single())),
        );
    }

    if let Some(humidity) = snapshot.current_humidity {
        attrs.insert(ATTR_CURRENT_HUMIDITY.to_string(), number(humidity));
    }

    if features.contains(SupportedFeatures::TARGET_HUMIDITY) {
        attrs.insert(
            ATTR_HUMIDITY.to_string(),
            snapshot.target_humidity.map(number).unwrap_or(Value::Null),
        );
    }

    if features.contains(SupportedFeatures::FAN_MODE) {
        attrs.insert(ATTR_FAN_MODE.to_string(), optional_string(&snapshot.fan_mode));
    }

    if let Some(action) = snapshot.hvac_action {
        attrs.insert(ATTR_HVAC_ACTION.to_string(), Value::from(action.as_str()));
    }

    if features.contains(SupportedFeatures::PRESET_MODE) {
        attrs.insert(
            ATTR_PRESET_MODE.to_string(),
            optional_string(&snapshot.preset_mode),
        );
    }

    if features.contains(SupportedFeatures::SWING_MODE) {
        attrs.insert(
            ATTR_SWING_MODE.to_string(),
            optional_string(&snapshot.swing_mode),
        );
    }

    if features.contains(SupportedFeatures::AUX_HEAT) {
        let aux = if snapshot.aux_heat_on.unwrap_or(false) {
            STATE_ON
        } else {
            STATE_OFF
        };
        attrs.insert(ATTR_AUX_HEAT.to_string(), Value::from(aux));
    }

    attrs
}

/// Full published attribute map: state, capabilities and the feature mask
pub fn project(
    snapshot: &DeviceSnapshot,
    features: SupportedFeatures,
    display: &DisplayOptions,
) -> AttributeMap {
    let mut attrs = capability_attributes(snapshot, features, display);
    attrs.extend(state_attributes(snapshot, features, display));
    attrs.insert(ATTR_SUPPORTED_FEATURES.to_string(), Value::from(features.bits()));
    attrs
}

/// Primary state value of a full climate entity
pub fn derive_state(snapshot: &DeviceSnapshot) -> &'static str {
    snapshot
        .hvac_mode
        .map(|mode| mode.as_str())
        .unwrap_or(STATE_UNKNOWN)
}

/// Coerce a raw value that never went through validation into a state string
pub fn derive_state_from_raw<E: ClimateEnum>(raw: &Value) -> ClimateResult<&'static str> {
    E::coerce(raw).map(|member| member.as_str())
}

/// Published attribute map of a simplified heater/cooler
pub fn project_simple(snapshot: &SimpleSnapshot, display: &DisplayOptions) -> AttributeMap {
    let mut attrs = AttributeMap::new();
    attrs.insert(ATTR_ACTIVE.to_string(), Value::from(snapshot.active.as_str()));
    attrs.insert(
        ATTR_TARGET_STATE.to_string(),
        Value::from(snapshot.target_state.as_str()),
    );
    attrs.insert(
        ATTR_CURRENT_STATE.to_string(),
        Value::from(snapshot.current_state.as_str()),
    );
    attrs.insert(
        ATTR_CURRENT_TEMPERATURE.to_string(),
        display.temperature(snapshot.current_temperature),
    );

    if snapshot
        .supported_features
        .contains(SupportedFeatures::TARGET_TEMPERATURE)
    {
        attrs.insert(
            ATTR_TEMPERATURE.to_string(),
            display.temperature(snapshot.target_temperature),
        );
    }

    attrs.insert(
        ATTR_SUPPORTED_FEATURES.to_string(),
        Value::from(snapshot.supported_features.bits()),
    );
    attrs
}

/// Primary state value of a simplified heater/cooler
pub fn derive_simple_state(snapshot: &SimpleSnapshot) -> &'static str {
    snapshot.current_state.as_str()
}
