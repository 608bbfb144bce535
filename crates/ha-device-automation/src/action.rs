//! Device actions
//!
//! Each action is exactly one blocking `heater_cooler` service call.

use ha_climate::attributes::{
    ATTR_ACTIVE, ATTR_HVAC_MODE, ATTR_HVAC_MODES, ATTR_SUPPORTED_FEATURES, ATTR_TARGET_STATE,
    ATTR_TARGET_TEMP_HIGH, ATTR_TARGET_TEMP_LOW, ATTR_TEMPERATURE,
};
use ha_climate::{Active, HvacMode, SupportedFeatures, TargetState, TemperatureUnit};
use ha_core::{Context, EntityId, ATTR_ENTITY_ID};
use ha_heater_cooler::{
    SetTemperature, DOMAIN, SERVICE_SET_ACTIVE, SERVICE_SET_HVAC_MODE, SERVICE_SET_TARGET_STATE,
    SERVICE_SET_TEMPERATURE,
};
use ha_service_registry::ServiceRegistry;
use ha_state_machine::StateMachine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::capabilities::{list_for, Capabilities, DeviceAutomation, ExtraField, FieldKind};
use crate::error::{AutomationError, AutomationResult};

pub const ACTION_TYPES: [&str; 4] = [
    SERVICE_SET_ACTIVE,
    SERVICE_SET_TARGET_STATE,
    SERVICE_SET_HVAC_MODE,
    SERVICE_SET_TEMPERATURE,
];

/// Action definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceAction {
    SetActive {
        entity_id: EntityId,
        active: Active,
    },
    SetTargetState {
        entity_id: EntityId,
        target_state: TargetState,
    },
    SetHvacMode {
        entity_id: EntityId,
        hvac_mode: HvacMode,
    },
    SetTemperature {
        entity_id: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_temp_low: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_temp_high: Option<f64>,
    },
}

impl DeviceAction {
    /// Parse and validate an action configuration
    pub fn from_value(config: Value) -> AutomationResult<Self> {
        let kind = config
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AutomationError::InvalidConfig("missing action type".into()))?;
        if !ACTION_TYPES.contains(&kind) {
            return Err(AutomationError::UnknownType {
                kind: "action",
                value: kind.to_string(),
            });
        }

        let action: Self = serde_json::from_value(config)?;
        if let DeviceAction::SetTemperature {
            temperature,
            target_temp_low,
            target_temp_high,
            ..
        } = &action
        {
            SetTemperature {
                temperature: *temperature,
                target_temp_low: *target_temp_low,
                target_temp_high: *target_temp_high,
                hvac_mode: None,
            }
            .validate()
            .map_err(|e| AutomationError::InvalidConfig(e.to_string()))?;
        }
        Ok(action)
    }

    pub fn entity_id(&self) -> &EntityId {
        match self {
            DeviceAction::SetActive { entity_id, .. }
            | DeviceAction::SetTargetState { entity_id, .. }
            | DeviceAction::SetHvacMode { entity_id, .. }
            | DeviceAction::SetTemperature { entity_id, .. } => entity_id,
        }
    }

    /// Service the action calls; also its type
    pub fn service(&self) -> &'static str {
        match self {
            DeviceAction::SetActive { .. } => SERVICE_SET_ACTIVE,
            DeviceAction::SetTargetState { .. } => SERVICE_SET_TARGET_STATE,
            DeviceAction::SetHvacMode { .. } => SERVICE_SET_HVAC_MODE,
            DeviceAction::SetTemperature { .. } => SERVICE_SET_TEMPERATURE,
        }
    }

    pub fn service_data(&self) -> Value {
        let mut data = Map::new();
        data.insert(ATTR_ENTITY_ID.into(), json!(self.entity_id().to_string()));
        match self {
            DeviceAction::SetActive { active, .. } => {
                data.insert(ATTR_ACTIVE.into(), json!(active));
            }
            DeviceAction::SetTargetState { target_state, .. } => {
                data.insert(ATTR_TARGET_STATE.into(), json!(target_state));
            }
            DeviceAction::SetHvacMode { hvac_mode, .. } => {
                data.insert(ATTR_HVAC_MODE.into(), json!(hvac_mode));
            }
            DeviceAction::SetTemperature {
                temperature,
                target_temp_low,
                target_temp_high,
                ..
            } => {
                for (key, value) in [
                    (ATTR_TEMPERATURE, temperature),
                    (ATTR_TARGET_TEMP_LOW, target_temp_low),
                    (ATTR_TARGET_TEMP_HIGH, target_temp_high),
                ] {
                    if let Some(value) = value {
                        data.insert(key.into(), json!(value));
                    }
                }
            }
        }
        Value::Object(data)
    }

    /// Call the service and wait for the entity to finish
    #[instrument(skip(self, registry, context), fields(entity_id = %self.entity_id(), service = self.service()))]
    pub async fn execute(&self, registry: &ServiceRegistry, context: Context) -> AutomationResult<()> {
        debug!("Running device action");
        registry
            .call(DOMAIN, self.service(), self.service_data(), context)
            .await?;
        Ok(())
    }
}

/// Actions offered for `entity_id`
///
/// `set_active` and `set_target_state` are always offered; mode and
/// temperature actions only when the published state shows the entity
/// supports them.
pub fn list_actions(states: &StateMachine, entity_id: &EntityId) -> Vec<DeviceAutomation> {
    let mut kinds = vec![SERVICE_SET_ACTIVE, SERVICE_SET_TARGET_STATE];
    if let Some(state) = states.get(&entity_id.to_string()) {
        if state.attributes.contains_key(ATTR_HVAC_MODES) {
            kinds.push(SERVICE_SET_HVAC_MODE);
        }
        let features = state
            .attributes
            .get(ATTR_SUPPORTED_FEATURES)
            .map(SupportedFeatures::from_attribute)
            .unwrap_or_default();
        if features.intersects(SupportedFeatures::TARGETS) {
            kinds.push(SERVICE_SET_TEMPERATURE);
        }
    }
    list_for(entity_id, &kinds)
}

/// Extra fields of an action type
pub fn action_capabilities(kind: &str, unit: TemperatureUnit) -> AutomationResult<Capabilities> {
    let temperature = |name| {
        ExtraField::optional(
            name,
            FieldKind::Float {
                suffix: Some(unit.symbol()),
            },
        )
    };
    let fields = match kind {
        SERVICE_SET_ACTIVE => vec![ExtraField::required(ATTR_ACTIVE, FieldKind::select::<Active>())],
        SERVICE_SET_TARGET_STATE => vec![ExtraField::required(
            ATTR_TARGET_STATE,
            FieldKind::select::<TargetState>(),
        )],
        SERVICE_SET_HVAC_MODE => vec![ExtraField::required(
            ATTR_HVAC_MODE,
            FieldKind::select::<HvacMode>(),
        )],
        SERVICE_SET_TEMPERATURE => vec![
            temperature(ATTR_TEMPERATURE),
            temperature(ATTR_TARGET_TEMP_LOW),
            temperature(ATTR_TARGET_TEMP_HIGH),
        ],
        other => {
            return Err(AutomationError::UnknownType {
                kind: "action",
                value: other.to_string(),
            })
        }
    };
    Ok(Capabilities::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::AttributeMap;
    use ha_event_bus::EventBus;
    use ha_service_registry::{ServiceDescription, ServiceError};
    use std::sync::{Arc, Mutex};

    fn action(config: Value) -> DeviceAction {
        DeviceAction::from_value(config).unwrap()
    }

    #[test]
    fn test_service_data() {
        let set_active = action(json!({
            "type": "set_active",
            "entity_id": "heater_cooler.den",
            "active": 0
        }));
        assert_eq!(
            set_active.service_data(),
            json!({"entity_id": "heater_cooler.den", "active": "active"})
        );

        let set_range = action(json!({
            "type": "set_temperature",
            "entity_id": "heater_cooler.den",
            "target_temp_low": 19,
            "target_temp_high": 24
        }));
        assert_eq!(set_range.service(), "set_temperature");
        assert_eq!(
            set_range.service_data(),
            json!({"entity_id": "heater_cooler.den", "target_temp_low": 19.0, "target_temp_high": 24.0})
        );
    }

    #[test]
    fn test_set_temperature_needs_a_value() {
        let result = DeviceAction::from_value(json!({
            "type": "set_temperature",
            "entity_id": "heater_cooler.den"
        }));
        assert!(matches!(result, Err(AutomationError::InvalidConfig(_))));

        let result = DeviceAction::from_value(json!({
            "type": "set_temperature",
            "entity_id": "heater_cooler.den",
            "temperature": 21,
            "target_temp_low": 19
        }));
        assert!(matches!(result, Err(AutomationError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_execute_makes_one_call() {
        let registry = ServiceRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        registry.register(
            ServiceDescription {
                domain: DOMAIN.to_string(),
                service: SERVICE_SET_TARGET_STATE.to_string(),
                required_features: vec![],
            },
            move |call| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(call.service_data.clone());
                    Ok(())
                }
            },
        );

        action(json!({
            "type": "set_target_state",
            "entity_id": "heater_cooler.den",
            "target_state": "cool"
        }))
        .execute(&registry, Context::new())
        .await
        .unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![json!({"entity_id": "heater_cooler.den", "target_state": "cool"})]
        );
    }

    #[tokio::test]
    async fn test_execute_surfaces_service_errors() {
        let registry = ServiceRegistry::new();
        let result = action(json!({
            "type": "set_active",
            "entity_id": "heater_cooler.den",
            "active": "inactive"
        }))
        .execute(&registry, Context::new())
        .await;
        assert!(matches!(
            result,
            Err(AutomationError::Service(ServiceError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_list_actions_follows_published_state() {
        let states = StateMachine::new(Arc::new(EventBus::new()));
        let den = EntityId::new("heater_cooler", "den").unwrap();
        let kinds = |states: &StateMachine| -> Vec<&'static str> {
            list_actions(states, &den).iter().map(|a| a.kind).collect()
        };

        assert_eq!(kinds(&states), vec!["set_active", "set_target_state"]);

        let attrs: AttributeMap = serde_json::from_value(json!({
            ATTR_HVAC_MODES: ["off", "heat"],
            ATTR_SUPPORTED_FEATURES: 1
        }))
        .unwrap();
        states.set(den.clone(), "off", attrs, Context::new());
        assert_eq!(kinds(&states), ACTION_TYPES);
    }

    #[test]
    fn test_capabilities() {
        let caps = action_capabilities(SERVICE_SET_TEMPERATURE, TemperatureUnit::Celsius).unwrap();
        assert_eq!(caps.extra_fields.len(), 3);
        assert!(caps.extra_fields.iter().all(|f| !f.required));

        let caps = action_capabilities(SERVICE_SET_HVAC_MODE, TemperatureUnit::Celsius).unwrap();
        assert_eq!(
            caps.field(ATTR_HVAC_MODE).unwrap().kind,
            FieldKind::select::<HvacMode>()
        );
        assert!(action_capabilities("set_speed", TemperatureUnit::Celsius).is_err());
    }
}
