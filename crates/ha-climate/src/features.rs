//! Capability flags

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Optional capabilities a climate device declares
    ///
    /// Bit values match the climate entity feature numbers, so the mask can
    /// be published as the integer `supported_features` attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SupportedFeatures: u32 {
        const TARGET_TEMPERATURE = 1;
        const TARGET_TEMPERATURE_RANGE = 1 << 1;
        const TARGET_HUMIDITY = 1 << 2;
        const FAN_MODE = 1 << 3;
        const PRESET_MODE = 1 << 4;
        const SWING_MODE = 1 << 5;
        const AUX_HEAT = 1 << 6;
    }
}

impl SupportedFeatures {
    /// Either kind of temperature target
    pub const TARGETS: Self = Self::TARGET_TEMPERATURE.union(Self::TARGET_TEMPERATURE_RANGE);

    /// Both single-target and range-target declared
    ///
    /// This is a configuration error; projection lets the range win.
    pub fn has_conflicting_targets(self) -> bool {
        self.contains(Self::TARGETS)
    }

    /// Mask from a published `supported_features` value, dropping unknown bits
    pub fn from_attribute(value: &serde_json::Value) -> Self {
        value
            .as_u64()
            .and_then(|bits| u32::try_from(bits).ok())
            .map(Self::from_bits_truncate)
            .unwrap_or_default()
    }
}

impl fmt::Display for SupportedFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter_names().map(|(name, _)| name).collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|").to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bit_values() {
        assert_eq!(SupportedFeatures::TARGET_TEMPERATURE.bits(), 1);
        assert_eq!(SupportedFeatures::AUX_HEAT.bits(), 64);
        assert_eq!(SupportedFeatures::all().bits(), 127);
    }

    #[test]
    fn test_conflicting_targets() {
        let both =
            SupportedFeatures::TARGET_TEMPERATURE | SupportedFeatures::TARGET_TEMPERATURE_RANGE;
        assert!(both.has_conflicting_targets());
        assert!(!SupportedFeatures::TARGET_TEMPERATURE.has_conflicting_targets());
    }

    #[test]
    fn test_from_attribute() {
        assert_eq!(
            SupportedFeatures::from_attribute(&json!(9)),
            SupportedFeatures::TARGET_TEMPERATURE | SupportedFeatures::FAN_MODE
        );
        assert_eq!(
            SupportedFeatures::from_attribute(&json!(1024 + 4)),
            SupportedFeatures::TARGET_HUMIDITY
        );
        assert!(SupportedFeatures::from_attribute(&json!("x")).is_empty());
    }

    #[test]
    fn test_display() {
        let mask = SupportedFeatures::FAN_MODE | SupportedFeatures::SWING_MODE;
        assert_eq!(mask.to_string(), "fan_mode|swing_mode");
        assert_eq!(SupportedFeatures::empty().to_string(), "NONE");
    }
}
