//! Service calls parsed into entity commands

use crate::device::SetTemperature;
use crate::{
    SERVICE_SET_ACTIVE, SERVICE_SET_AUX_HEAT, SERVICE_SET_FAN_MODE, SERVICE_SET_HUMIDITY,
    SERVICE_SET_HVAC_MODE, SERVICE_SET_PRESET_MODE, SERVICE_SET_SWING_MODE,
    SERVICE_SET_TARGET_STATE, SERVICE_SET_TEMPERATURE, SERVICE_TURN_OFF, SERVICE_TURN_ON,
};
use ha_climate::attributes::*;
use ha_climate::{Active, ClimateEnum, HvacMode, TargetState, TemperatureUnit};
use ha_core::ServiceCall;
use ha_service_registry::ServiceError;
use serde_json::Value;

/// One validated request against a heater/cooler entity
#[derive(Debug, Clone, PartialEq)]
pub enum HeaterCoolerCommand {
    TurnOn,
    TurnOff,
    SetHvacMode(HvacMode),
    SetPresetMode(String),
    SetAuxHeat(bool),
    SetTemperature(SetTemperature),
    SetHumidity(u8),
    SetFanMode(String),
    SetSwingMode(String),
    SetActive(Active),
    SetTargetState(TargetState),
}

fn required<'a>(call: &'a ServiceCall, key: &str) -> Result<&'a Value, ServiceError> {
    call.service_data
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ServiceError::InvalidData(format!("missing required key: {}", key)))
}

fn string_arg(call: &ServiceCall, key: &str) -> Result<String, ServiceError> {
    required(call, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ServiceError::InvalidData(format!("{} must be a string", key)))
}

fn number_arg(call: &ServiceCall, key: &str) -> Result<Option<f64>, ServiceError> {
    match call.service_data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .map(Some)
            .ok_or_else(|| ServiceError::InvalidData(format!("{} must be a number", key))),
    }
}

fn enum_arg<E: ClimateEnum>(value: &Value) -> Result<E, ServiceError> {
    E::coerce(value).map_err(|e| ServiceError::InvalidData(e.to_string()))
}

impl HeaterCoolerCommand {
    /// Parse the arguments of a `heater_cooler` service call
    pub fn from_call(call: &ServiceCall) -> Result<Self, ServiceError> {
        let command = match call.service.as_str() {
            SERVICE_TURN_ON => Self::TurnOn,
            SERVICE_TURN_OFF => Self::TurnOff,
            SERVICE_SET_HVAC_MODE => Self::SetHvacMode(enum_arg(required(call, ATTR_HVAC_MODE)?)?),
            SERVICE_SET_PRESET_MODE => Self::SetPresetMode(string_arg(call, ATTR_PRESET_MODE)?),
            SERVICE_SET_FAN_MODE => Self::SetFanMode(string_arg(call, ATTR_FAN_MODE)?),
            SERVICE_SET_SWING_MODE => Self::SetSwingMode(string_arg(call, ATTR_SWING_MODE)?),
            SERVICE_SET_AUX_HEAT => Self::SetAuxHeat(
                required(call, ATTR_AUX_HEAT)?
                    .as_bool()
                    .ok_or_else(|| ServiceError::InvalidData("aux_heat must be a boolean".into()))?,
            ),
            SERVICE_SET_HUMIDITY => {
                let humidity = number_arg(call, ATTR_HUMIDITY)?
                    .ok_or_else(|| ServiceError::InvalidData("missing required key: humidity".into()))?;
                if !(0.0..=100.0).contains(&humidity) {
                    return Err(ServiceError::InvalidData(format!(
                        "humidity out of range: {}",
                        humidity
                    )));
                }
                Self::SetHumidity(humidity.round() as u8)
            }
            SERVICE_SET_TEMPERATURE => {
                let hvac_mode = match call.service_data.get(ATTR_HVAC_MODE) {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(enum_arg(value)?),
                };
                let args = SetTemperature {
                    temperature: number_arg(call, ATTR_TEMPERATURE)?,
                    target_temp_low: number_arg(call, ATTR_TARGET_TEMP_LOW)?,
                    target_temp_high: number_arg(call, ATTR_TARGET_TEMP_HIGH)?,
                    hvac_mode,
                };
                args.validate()
                    .map_err(|e| ServiceError::InvalidData(e.to_string()))?;
                Self::SetTemperature(args)
            }
            SERVICE_SET_ACTIVE => Self::SetActive(enum_arg(required(call, ATTR_ACTIVE)?)?),
            SERVICE_SET_TARGET_STATE => {
                Self::SetTargetState(enum_arg(required(call, ATTR_TARGET_STATE)?)?)
            }
            other => {
                return Err(ServiceError::NotFound {
                    domain: call.domain.clone(),
                    service: other.to_string(),
                })
            }
        };
        Ok(command)
    }

    /// Service name this command is dispatched under
    pub fn service(&self) -> &'static str {
        match self {
            Self::TurnOn => SERVICE_TURN_ON,
            Self::TurnOff => SERVICE_TURN_OFF,
            Self::SetHvacMode(_) => SERVICE_SET_HVAC_MODE,
            Self::SetPresetMode(_) => SERVICE_SET_PRESET_MODE,
            Self::SetAuxHeat(_) => SERVICE_SET_AUX_HEAT,
            Self::SetTemperature(_) => SERVICE_SET_TEMPERATURE,
            Self::SetHumidity(_) => SERVICE_SET_HUMIDITY,
            Self::SetFanMode(_) => SERVICE_SET_FAN_MODE,
            Self::SetSwingMode(_) => SERVICE_SET_SWING_MODE,
            Self::SetActive(_) => SERVICE_SET_ACTIVE,
            Self::SetTargetState(_) => SERVICE_SET_TARGET_STATE,
        }
    }

    /// Convert temperature arguments from the system unit into the entity unit
    pub fn converted(self, from: TemperatureUnit, to: TemperatureUnit) -> Self {
        match self {
            Self::SetTemperature(args) => Self::SetTemperature(args.converted(from, to)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DOMAIN;
    use ha_core::Context;
    use serde_json::json;

    fn call(service: &str, data: Value) -> ServiceCall {
        ServiceCall::new(DOMAIN, service, data, Context::new())
    }

    #[test]
    fn test_parse_mode_commands() {
        let cmd = HeaterCoolerCommand::from_call(&call("set_hvac_mode", json!({"hvac_mode": "dry"})));
        assert_eq!(cmd.unwrap(), HeaterCoolerCommand::SetHvacMode(HvacMode::Dry));

        let cmd = HeaterCoolerCommand::from_call(&call("set_target_state", json!({"target_state": 1})));
        assert_eq!(cmd.unwrap(), HeaterCoolerCommand::SetTargetState(TargetState::Heat));

        let cmd = HeaterCoolerCommand::from_call(&call("set_active", json!({"active": "inactive"})));
        assert_eq!(cmd.unwrap(), HeaterCoolerCommand::SetActive(Active::Inactive));
    }

    #[test]
    fn test_invalid_enum_rejected() {
        let result = HeaterCoolerCommand::from_call(&call("set_hvac_mode", json!({"hvac_mode": "auto"})));
        assert!(matches!(result, Err(ServiceError::InvalidData(_))));

        let result = HeaterCoolerCommand::from_call(&call("set_hvac_mode", json!({})));
        assert!(matches!(result, Err(ServiceError::InvalidData(_))));
    }

    #[test]
    fn test_parse_set_temperature() {
        let cmd = HeaterCoolerCommand::from_call(&call(
            "set_temperature",
            json!({"target_temp_low": 19, "target_temp_high": 24.5, "hvac_mode": "heat_cool"}),
        ))
        .unwrap();
        assert_eq!(
            cmd,
            HeaterCoolerCommand::SetTemperature(
                SetTemperature::range(19.0, 24.5).with_mode(HvacMode::HeatCool)
            )
        );

        let mixed = HeaterCoolerCommand::from_call(&call(
            "set_temperature",
            json!({"temperature": 21, "target_temp_low": 19, "target_temp_high": 24}),
        ));
        assert!(matches!(mixed, Err(ServiceError::InvalidData(_))));

        let empty = HeaterCoolerCommand::from_call(&call("set_temperature", json!({})));
        assert!(matches!(empty, Err(ServiceError::InvalidData(_))));
    }

    #[test]
    fn test_parse_humidity_and_aux() {
        let cmd = HeaterCoolerCommand::from_call(&call("set_humidity", json!({"humidity": "45"})));
        assert_eq!(cmd.unwrap(), HeaterCoolerCommand::SetHumidity(45));

        let cmd = HeaterCoolerCommand::from_call(&call("set_humidity", json!({"humidity": 140})));
        assert!(cmd.is_err());

        let cmd = HeaterCoolerCommand::from_call(&call("set_aux_heat", json!({"aux_heat": true})));
        assert_eq!(cmd.unwrap(), HeaterCoolerCommand::SetAuxHeat(true));
    }

    #[test]
    fn test_conversion_only_touches_temperatures() {
        let cmd = HeaterCoolerCommand::SetTemperature(SetTemperature::single(212.0))
            .converted(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius);
        match cmd {
            HeaterCoolerCommand::SetTemperature(args) => {
                assert!((args.temperature.unwrap() - 100.0).abs() < 1e-9)
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cmd = HeaterCoolerCommand::SetHumidity(40)
            .converted(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius);
        assert_eq!(cmd, HeaterCoolerCommand::SetHumidity(40));
    }

    #[test]
    fn test_unknown_service() {
        let result = HeaterCoolerCommand::from_call(&call("set_speed", json!({})));
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }
}
