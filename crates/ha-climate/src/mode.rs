//! HVAC mode and action vocabularies
//!
//! [`HvacMode`] is what the unit is set to do; [`HvacAction`] is what it is
//! observed doing right now. A unit in `heat_cool` may be idle, heating or
//! cooling, so the two are never merged into one type.

use crate::error::{ClimateError, ClimateResult};
use serde_json::Value;

/// Closed set of string-valued climate enums with one validating constructor
pub trait ClimateEnum: Sized + Copy + 'static {
    /// Name used in error messages
    const KIND: &'static str;

    /// Every member, in declaration order
    const ALL: &'static [Self];

    /// Wire form
    fn as_str(&self) -> &'static str;

    /// Integer code, for enums that carry one
    fn code(&self) -> Option<u8> {
        None
    }

    /// Parse a wire string, or a decimal integer code where the enum has codes
    fn parse(raw: &str) -> ClimateResult<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_str() == raw)
            .or_else(|| raw.parse::<u64>().ok().and_then(Self::from_code))
            .ok_or_else(|| invalid::<Self>(raw))
    }

    /// Coerce an untrusted attribute value
    fn coerce(raw: &Value) -> ClimateResult<Self> {
        match raw {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n
                .as_u64()
                .and_then(Self::from_code)
                .ok_or_else(|| invalid::<Self>(&n.to_string())),
            other => Err(invalid::<Self>(&other.to_string())),
        }
    }

    /// Member with the given integer code
    fn from_code(code: u64) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.code().map(u64::from) == Some(code))
    }

    /// All wire strings, in declaration order
    fn options() -> Vec<&'static str> {
        Self::ALL.iter().map(|member| member.as_str()).collect()
    }
}

fn invalid<E: ClimateEnum>(value: &str) -> ClimateError {
    ClimateError::InvalidEnumValue {
        kind: E::KIND,
        value: value.to_string(),
    }
}

climate_enum! {
    /// Setpoint mode of a climate device
    pub enum HvacMode("hvac_mode") {
        Off => "off",
        Heat => "heat",
        Cool => "cool",
        /// Automatic heating or cooling around a range
        HeatCool => "heat_cool",
        Dry => "dry",
        FanOnly => "fan_only",
    }
}

impl HvacMode {
    pub fn is_off(self) -> bool {
        self == HvacMode::Off
    }
}

climate_enum! {
    /// Activity a climate device is currently observed doing
    pub enum HvacAction("hvac_action") {
        Idle => "idle",
        Heating => "heating",
        Cooling => "cooling",
        Drying => "drying",
        Fan => "fan",
        Off => "off",
    }
}
