//! Device trigger types
//!
//! A heater/cooler offers four triggers: a change of the active flag, of the
//! current state, of the target state, and a threshold on the current
//! temperature.

use chrono::{DateTime, Utc};
use ha_climate::{Active, CurrentState, TargetState, TemperatureUnit};
use ha_core::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::capabilities::{list_for, Capabilities, DeviceAutomation, ExtraField, FieldKind};
use crate::error::{AutomationError, AutomationResult};

pub const TRIGGER_ACTIVE_CHANGED: &str = "active_changed";
pub const TRIGGER_CURRENT_STATE_CHANGED: &str = "current_state_changed";
pub const TRIGGER_TARGET_STATE_CHANGED: &str = "target_state_changed";
pub const TRIGGER_CURRENT_TEMPERATURE_CHANGED: &str = "current_temperature_changed";

/// Every trigger type, in listing order
pub const TRIGGER_TYPES: [&str; 4] = [
    TRIGGER_ACTIVE_CHANGED,
    TRIGGER_CURRENT_STATE_CHANGED,
    TRIGGER_TARGET_STATE_CHANGED,
    TRIGGER_CURRENT_TEMPERATURE_CHANGED,
];

/// Data provided when a trigger fires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerData {
    /// Optional trigger ID for referencing in conditions/actions
    pub id: Option<String>,

    /// Always "device"
    pub platform: String,

    /// Trigger type, entity and the states involved
    #[serde(flatten)]
    pub variables: HashMap<String, serde_json::Value>,

    /// When the trigger matched
    pub triggered_at: DateTime<Utc>,
}

impl TriggerData {
    pub fn new(triggered_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            platform: "device".to_string(),
            variables: HashMap::new(),
            triggered_at,
        }
    }

    pub fn with_id(mut self, id: Option<&str>) -> Self {
        self.id = id.map(str::to_string);
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    pub fn var(&self, key: &str) -> Option<&serde_json::Value> {
        self.variables.get(key)
    }
}

/// Trigger definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceTrigger {
    /// Active flag became `to`
    ActiveChanged(ValueTrigger<Active>),

    /// Current state became `to`
    CurrentStateChanged(ValueTrigger<CurrentState>),

    /// Target state became `to`
    TargetStateChanged(ValueTrigger<TargetState>),

    /// Current temperature entered the `above`/`below` zone
    CurrentTemperatureChanged(TemperatureTrigger),
}

impl DeviceTrigger {
    /// Parse and validate a trigger configuration
    pub fn from_value(config: serde_json::Value) -> AutomationResult<Self> {
        let kind = config
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AutomationError::InvalidConfig("missing trigger type".into()))?;
        if !TRIGGER_TYPES.contains(&kind) {
            return Err(AutomationError::UnknownType {
                kind: "trigger",
                value: kind.to_string(),
            });
        }

        let trigger: Self = serde_json::from_value(config)?;
        trigger.validate()?;
        Ok(trigger)
    }

    pub fn validate(&self) -> AutomationResult<()> {
        match self {
            DeviceTrigger::CurrentTemperatureChanged(t) => t.validate(),
            _ => Ok(()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            DeviceTrigger::ActiveChanged(t) => t.id.as_deref(),
            DeviceTrigger::CurrentStateChanged(t) => t.id.as_deref(),
            DeviceTrigger::TargetStateChanged(t) => t.id.as_deref(),
            DeviceTrigger::CurrentTemperatureChanged(t) => t.id.as_deref(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        match self {
            DeviceTrigger::ActiveChanged(t) => &t.entity_id,
            DeviceTrigger::CurrentStateChanged(t) => &t.entity_id,
            DeviceTrigger::TargetStateChanged(t) => &t.entity_id,
            DeviceTrigger::CurrentTemperatureChanged(t) => &t.entity_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeviceTrigger::ActiveChanged(_) => TRIGGER_ACTIVE_CHANGED,
            DeviceTrigger::CurrentStateChanged(_) => TRIGGER_CURRENT_STATE_CHANGED,
            DeviceTrigger::TargetStateChanged(_) => TRIGGER_TARGET_STATE_CHANGED,
            DeviceTrigger::CurrentTemperatureChanged(_) => TRIGGER_CURRENT_TEMPERATURE_CHANGED,
        }
    }
}

/// Fires when a watched value changes to `to` from any other value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTrigger<E> {
    /// Optional trigger ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub entity_id: EntityId,

    pub to: E,
}

/// Numeric threshold on the current temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTrigger {
    /// Optional trigger ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub entity_id: EntityId,

    /// Fire when the value goes above this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,

    /// Fire when the value goes below this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,

    /// Time the value must stay in the zone
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "option_duration_serde"
    )]
    pub r#for: Option<Duration>,
}

impl TemperatureTrigger {
    pub fn validate(&self) -> AutomationResult<()> {
        if self.above.is_none() && self.below.is_none() {
            return Err(AutomationError::InvalidConfig(
                "at least one of above or below is required".into(),
            ));
        }
        if self.above.into_iter().chain(self.below).any(|v| !v.is_finite()) {
            return Err(AutomationError::InvalidConfig(
                "thresholds must be finite numbers".into(),
            ));
        }
        Ok(())
    }

    /// Whether `value` lies strictly inside the threshold zone
    pub fn in_zone(&self, value: f64) -> bool {
        match (self.above, self.below) {
            (Some(above), Some(below)) => value > above && value < below,
            (Some(above), None) => value > above,
            (None, Some(below)) => value < below,
            (None, None) => false,
        }
    }

    /// Debounce time; zero when unset
    pub fn hold(&self) -> Duration {
        self.r#for.unwrap_or_default()
    }
}

/// Triggers offered for `entity_id`
pub fn list_triggers(entity_id: &EntityId) -> Vec<DeviceAutomation> {
    list_for(entity_id, &TRIGGER_TYPES)
}

/// Extra fields of a trigger type
///
/// Thresholds carry the system temperature unit as suffix.
pub fn trigger_capabilities(kind: &str, unit: TemperatureUnit) -> AutomationResult<Capabilities> {
    let fields = match kind {
        TRIGGER_ACTIVE_CHANGED => vec![ExtraField::required("to", FieldKind::select::<Active>())],
        TRIGGER_CURRENT_STATE_CHANGED => {
            vec![ExtraField::required("to", FieldKind::select::<CurrentState>())]
        }
        TRIGGER_TARGET_STATE_CHANGED => {
            vec![ExtraField::required("to", FieldKind::select::<TargetState>())]
        }
        TRIGGER_CURRENT_TEMPERATURE_CHANGED => vec![
            ExtraField::optional(
                "above",
                FieldKind::Float {
                    suffix: Some(unit.symbol()),
                },
            ),
            ExtraField::optional(
                "below",
                FieldKind::Float {
                    suffix: Some(unit.symbol()),
                },
            ),
            ExtraField::optional("for", FieldKind::Duration),
        ],
        other => {
            return Err(AutomationError::UnknownType {
                kind: "trigger",
                value: other.to_string(),
            })
        }
    };
    Ok(Capabilities::new(fields))
}

/// `for` as "HH:MM:SS", "MM:SS", seconds, or `{hours, minutes, seconds}`
pub(crate) mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
        Period {
            #[serde(default)]
            hours: u64,
            #[serde(default)]
            minutes: u64,
            #[serde(default)]
            seconds: u64,
        },
    }

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => {
                let secs = d.as_secs();
                let hours = secs / 3600;
                let mins = (secs % 3600) / 60;
                let secs = secs % 60;
                serializer.serialize_str(&format!("{:02}:{:02}:{:02}", hours, mins, secs))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
            Some(Raw::Text(s)) => parse_duration(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(Raw::Period {
                hours,
                minutes,
                seconds,
            }) => Ok(Some(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))),
        }
    }

    fn parse_duration(s: &str) -> Result<Duration, String> {
        let parts = s
            .trim()
            .split(':')
            .map(|p| p.parse::<u64>().map_err(|_| format!("invalid duration: {}", s)))
            .collect::<Result<Vec<_>, _>>()?;
        let secs = match parts.as_slice() {
            [secs] => *secs,
            [mins, secs] => mins * 60 + secs,
            [hours, mins, secs] => hours * 3600 + mins * 60 + secs,
            _ => return Err(format!("invalid duration: {}", s)),
        };
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value_trigger() {
        let trigger = DeviceTrigger::from_value(json!({
            "type": "current_state_changed",
            "entity_id": "heater_cooler.den",
            "to": "heating"
        }))
        .unwrap();

        match &trigger {
            DeviceTrigger::CurrentStateChanged(t) => assert_eq!(t.to, CurrentState::Heating),
            other => panic!("unexpected trigger {:?}", other),
        }
        assert_eq!(trigger.kind(), TRIGGER_CURRENT_STATE_CHANGED);
        assert_eq!(trigger.entity_id().to_string(), "heater_cooler.den");
    }

    #[test]
    fn test_parse_rejects_value_outside_enum() {
        let result = DeviceTrigger::from_value(json!({
            "type": "target_state_changed",
            "entity_id": "heater_cooler.den",
            "to": "dry"
        }));
        assert!(matches!(result, Err(AutomationError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_type() {
        let result = DeviceTrigger::from_value(json!({
            "type": "humidity_changed",
            "entity_id": "heater_cooler.den"
        }));
        assert!(matches!(result, Err(AutomationError::UnknownType { .. })));
    }

    #[test]
    fn test_temperature_trigger_needs_threshold() {
        let result = DeviceTrigger::from_value(json!({
            "type": "current_temperature_changed",
            "entity_id": "heater_cooler.den"
        }));
        assert!(matches!(result, Err(AutomationError::InvalidConfig(_))));
    }

    #[test]
    fn test_for_formats() {
        for (raw, secs) in [
            (json!("00:05:00"), 300),
            (json!("1:30"), 90),
            (json!(45), 45),
            (json!({"minutes": 2, "seconds": 5}), 125),
        ] {
            let trigger = DeviceTrigger::from_value(json!({
                "type": "current_temperature_changed",
                "entity_id": "heater_cooler.den",
                "below": 20,
                "for": raw
            }))
            .unwrap();
            match trigger {
                DeviceTrigger::CurrentTemperatureChanged(t) => {
                    assert_eq!(t.hold(), Duration::from_secs(secs))
                }
                other => panic!("unexpected trigger {:?}", other),
            }
        }
    }

    #[test]
    fn test_zone() {
        let t = |above, below| TemperatureTrigger {
            id: None,
            entity_id: EntityId::new("heater_cooler", "den").unwrap(),
            above,
            below,
            r#for: None,
        };
        assert!(t(None, Some(20.0)).in_zone(19.9));
        assert!(!t(None, Some(20.0)).in_zone(20.0));
        assert!(t(Some(25.0), None).in_zone(25.5));
        assert!(t(Some(18.0), Some(22.0)).in_zone(20.0));
        assert!(!t(Some(18.0), Some(22.0)).in_zone(18.0));
    }

    #[test]
    fn test_list_triggers() {
        let den = EntityId::new("heater_cooler", "den").unwrap();
        let kinds: Vec<_> = list_triggers(&den).iter().map(|t| t.kind).collect();
        assert_eq!(kinds, TRIGGER_TYPES);

        let lamp = EntityId::new("light", "lamp").unwrap();
        assert!(list_triggers(&lamp).is_empty());
    }

    #[test]
    fn test_capabilities_carry_unit() {
        let caps =
            trigger_capabilities(TRIGGER_CURRENT_TEMPERATURE_CHANGED, TemperatureUnit::Fahrenheit)
                .unwrap();
        assert_eq!(
            caps.field("above").unwrap().kind,
            FieldKind::Float { suffix: Some("°F") }
        );
        assert!(caps.field("for").is_some());

        let caps = trigger_capabilities(TRIGGER_ACTIVE_CHANGED, TemperatureUnit::Celsius).unwrap();
        assert_eq!(
            caps.field("to").unwrap().kind,
            FieldKind::Select {
                options: vec!["active", "inactive"]
            }
        );
    }
}
