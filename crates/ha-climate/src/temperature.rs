//! Temperature units, precision and display rounding

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Unit a temperature is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "°F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Convert `value` expressed in `self` into `to`
    pub fn convert(self, value: f64, to: TemperatureUnit) -> f64 {
        match (self, to) {
            (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 1.8 + 32.0,
            (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) / 1.8,
            _ => value,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Rounding applied to displayed temperatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 0.1
    Tenths,
    /// 0.5
    Halves,
    /// 1.0
    Whole,
}

impl Precision {
    /// Step size as a number
    pub fn step(self) -> f64 {
        match self {
            Precision::Tenths => 0.1,
            Precision::Halves => 0.5,
            Precision::Whole => 1.0,
        }
    }

    /// Precision from a step size, if it is one of the three known ones
    pub fn from_step(step: f64) -> Option<Self> {
        [Precision::Tenths, Precision::Halves, Precision::Whole]
            .into_iter()
            .find(|p| (p.step() - step).abs() < f64::EPSILON)
    }

    /// Round a value to this precision
    pub fn round(self, value: f64) -> f64 {
        match self {
            Precision::Tenths => (value * 10.0).round() / 10.0,
            Precision::Halves => (value * 2.0).round() / 2.0,
            Precision::Whole => value.round(),
        }
    }

    /// Attribute value for an already rounded temperature
    ///
    /// Whole degrees are published as integers.
    pub fn to_value(self, rounded: f64) -> Value {
        match self {
            Precision::Whole => Value::from(rounded as i64),
            _ => Value::from(rounded),
        }
    }
}

/// Default precision for a configured unit system
pub fn default_precision(unit: TemperatureUnit) -> Precision {
    match unit {
        TemperatureUnit::Celsius => Precision::Tenths,
        TemperatureUnit::Fahrenheit => Precision::Whole,
    }
}

/// Convert a device temperature to the system unit and round it for display
pub fn display_temp(
    value: Option<f64>,
    entity_unit: TemperatureUnit,
    system_unit: TemperatureUnit,
    precision: Precision,
) -> Option<f64> {
    let value = value?;
    if !value.is_finite() {
        return None;
    }
    Some(precision.round(entity_unit.convert(value, system_unit)))
}
