//! End-to-end service dispatch through the registry

use async_trait::async_trait;
use ha_climate::attributes::*;
use ha_climate::{
    ClimateResult, DeviceSnapshot, HvacMode, SupportedFeatures, TargetTemperature,
    TemperatureUnit,
};
use ha_core::{AttributeMap, Context, EntityId, State};
use ha_event_bus::EventBus;
use ha_heater_cooler::{
    register_services, reproduce_states, ClimateDevice, EntityComponent, HeaterCoolerEntity,
    SetTemperature, SnapshotCell, DOMAIN,
};
use ha_service_registry::{ServiceError, ServiceRegistry};
use ha_state_machine::StateMachine;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// In-memory thermostat that applies every request to its snapshot
struct Thermostat {
    snapshot: SnapshotCell<DeviceSnapshot>,
    unit: TemperatureUnit,
    requests: Mutex<Vec<String>>,
}

impl Thermostat {
    fn new(unit: TemperatureUnit) -> Arc<Self> {
        Arc::new(Self {
            snapshot: SnapshotCell::new(DeviceSnapshot {
                current_temperature: Some(20.0),
                target: Some(TargetTemperature::Single(21.0)),
                hvac_mode: Some(HvacMode::Off),
                hvac_modes: vec![HvacMode::Off, HvacMode::Heat, HvacMode::Cool],
                fan_modes: vec!["low".into(), "high".into()],
                fan_mode: Some("low".into()),
                supported_features: SupportedFeatures::TARGET_TEMPERATURE
                    | SupportedFeatures::FAN_MODE,
                ..Default::default()
            }),
            unit,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn update(&self, apply: impl FnOnce(&mut DeviceSnapshot)) {
        let mut next = (*self.snapshot.load()).clone();
        apply(&mut next);
        self.snapshot.store(next);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClimateDevice for Thermostat {
    fn name(&self) -> &str {
        "Hall"
    }

    fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.snapshot.load()
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.unit
    }

    async fn set_hvac_mode(&self, mode: HvacMode) -> ClimateResult<()> {
        self.requests.lock().unwrap().push(format!("mode:{}", mode));
        self.update(|s| s.hvac_mode = Some(mode));
        Ok(())
    }

    async fn set_temperature(&self, args: SetTemperature) -> ClimateResult<()> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("temperature:{:?}", args.temperature));
        if let Some(t) = args.temperature {
            self.update(|s| s.target = Some(TargetTemperature::Single(t)));
        }
        Ok(())
    }

    async fn set_fan_mode(&self, fan_mode: &str) -> ClimateResult<()> {
        self.update(|s| s.fan_mode = Some(fan_mode.to_string()));
        Ok(())
    }
}

struct Setup {
    registry: ServiceRegistry,
    states: Arc<StateMachine>,
    device: Arc<Thermostat>,
}

fn setup(system_unit: TemperatureUnit, device_unit: TemperatureUnit) -> Setup {
    let states = Arc::new(StateMachine::new(Arc::new(EventBus::new())));
    let device = Thermostat::new(device_unit);
    let component = Arc::new(EntityComponent::new(system_unit));
    component.add(Arc::new(HeaterCoolerEntity::new(
        EntityId::new(DOMAIN, "hall").unwrap(),
        device.clone(),
        system_unit,
        states.clone(),
    )));

    let registry = ServiceRegistry::new();
    register_services(&registry, component);

    Setup {
        registry,
        states,
        device,
    }
}

#[tokio::test]
async fn test_all_services_registered() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);
    let services = setup.registry.domain_services(DOMAIN);
    assert_eq!(services.len(), 11);

    let set_temperature = setup.registry.get_service(DOMAIN, "set_temperature").unwrap();
    assert_eq!(set_temperature.required_features, vec![1, 2]);
}

#[tokio::test]
async fn test_set_hvac_mode_publishes_state() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    setup
        .registry
        .call(
            DOMAIN,
            "set_hvac_mode",
            json!({"entity_id": "heater_cooler.hall", "hvac_mode": "cool"}),
            Context::new(),
        )
        .await
        .unwrap();

    assert_eq!(setup.states.get_state("heater_cooler.hall").as_deref(), Some("cool"));
    assert_eq!(setup.device.requests(), vec!["mode:cool"]);
}

#[tokio::test]
async fn test_temperature_converted_to_device_unit() {
    let setup = setup(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius);

    setup
        .registry
        .call(
            DOMAIN,
            "set_temperature",
            json!({"entity_id": "heater_cooler.hall", "temperature": 68}),
            Context::new(),
        )
        .await
        .unwrap();

    let target = setup.device.snapshot().target.unwrap().single().unwrap();
    assert!((target - 20.0).abs() < 1e-9);

    // Published back in the system unit with whole-degree precision
    let state = setup.states.get("heater_cooler.hall").unwrap();
    assert_eq!(state.attributes[ATTR_TEMPERATURE], json!(68));
}

#[tokio::test]
async fn test_unsupported_service_for_entity() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    let result = setup
        .registry
        .call(
            DOMAIN,
            "set_swing_mode",
            json!({"entity_id": "heater_cooler.hall", "swing_mode": "vertical"}),
            Context::new(),
        )
        .await;

    assert_eq!(
        result,
        Err(ServiceError::NotSupported {
            entity_id: "heater_cooler.hall".to_string(),
            service: "set_swing_mode".to_string(),
        })
    );
    assert!(setup.device.requests().is_empty());
}

#[tokio::test]
async fn test_set_temperature_accepted_with_either_target_feature() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    // Only TARGET_TEMPERATURE is declared; the range still reaches the device
    setup
        .registry
        .call(
            DOMAIN,
            "set_temperature",
            json!({
                "entity_id": "heater_cooler.hall",
                "target_temp_low": 19,
                "target_temp_high": 24
            }),
            Context::new(),
        )
        .await
        .unwrap();
    assert_eq!(setup.device.requests(), vec!["temperature:None"]);
}

#[tokio::test]
async fn test_unknown_fan_mode_rejected() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    let result = setup
        .registry
        .call(
            DOMAIN,
            "set_fan_mode",
            json!({"entity_id": "heater_cooler.hall", "fan_mode": "turbo"}),
            Context::new(),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidData(_))));
}

#[tokio::test]
async fn test_unknown_entity() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    let result = setup
        .registry
        .call(
            DOMAIN,
            "turn_on",
            json!({"entity_id": "heater_cooler.attic"}),
            Context::new(),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::CallFailed(_))));
}

#[tokio::test]
async fn test_reproduce_states_restores_mode_and_temperature() {
    let setup = setup(TemperatureUnit::Celsius, TemperatureUnit::Celsius);

    let saved = State::new(
        EntityId::new(DOMAIN, "hall").unwrap(),
        "heat",
        AttributeMap::from([(ATTR_TEMPERATURE.to_string(), json!(23.0))]),
        Context::new(),
    );
    reproduce_states(&setup.registry, &[saved], Context::new())
        .await
        .unwrap();

    assert_eq!(
        setup.device.requests(),
        vec!["mode:heat", "temperature:Some(23.0)"]
    );
    let state = setup.states.get("heater_cooler.hall").unwrap();
    assert_eq!(state.state, "heat");
    assert_eq!(state.attributes[ATTR_TEMPERATURE], json!(23.0));
}
