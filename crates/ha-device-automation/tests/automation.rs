//! Actions through the service registry observed by triggers and conditions

use async_trait::async_trait;
use ha_climate::{Active, ClimateResult, CurrentState, SimpleSnapshot, TargetState, TemperatureUnit};
use ha_core::{Context, EntityId};
use ha_device_automation::{attach, DeviceAction, DeviceCondition, DeviceTrigger};
use ha_event_bus::EventBus;
use ha_heater_cooler::{
    register_services, EntityComponent, SimpleHeaterCooler, SimpleHeaterCoolerEntity,
    SnapshotCell,
};
use ha_service_registry::ServiceRegistry;
use ha_state_machine::{SharedStateMachine, StateMachine};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Fan coil that switches on and off instantly
struct FanCoil {
    snapshot: SnapshotCell<SimpleSnapshot>,
}

impl FanCoil {
    fn update(&self, apply: impl FnOnce(&mut SimpleSnapshot)) {
        let mut next = (*self.snapshot.load()).clone();
        apply(&mut next);
        self.snapshot.store(next);
    }
}

#[async_trait]
impl SimpleHeaterCooler for FanCoil {
    fn name(&self) -> &str {
        "Den"
    }

    fn snapshot(&self) -> Arc<SimpleSnapshot> {
        self.snapshot.load()
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    async fn set_active(&self, active: Active) -> ClimateResult<()> {
        self.update(|s| {
            s.active = active;
            s.current_state = match active {
                Active::Active => CurrentState::Idle,
                Active::Inactive => CurrentState::Inactive,
            };
        });
        Ok(())
    }

    async fn set_target_state(&self, target_state: TargetState) -> ClimateResult<()> {
        self.update(|s| s.target_state = target_state);
        Ok(())
    }
}

struct Setup {
    registry: ServiceRegistry,
    states: SharedStateMachine,
    bus: Arc<EventBus>,
}

fn setup() -> Setup {
    let bus = Arc::new(EventBus::new());
    let states: SharedStateMachine = Arc::new(StateMachine::new(bus.clone()));
    let entity = Arc::new(SimpleHeaterCoolerEntity::new(
        EntityId::new("heater_cooler", "den").unwrap(),
        Arc::new(FanCoil {
            snapshot: SnapshotCell::new(SimpleSnapshot::default()),
        }),
        TemperatureUnit::Celsius,
        states.clone(),
    ));
    entity.write_state(Context::new());

    let component = Arc::new(EntityComponent::new(TemperatureUnit::Celsius));
    component.add(entity);
    let registry = ServiceRegistry::new();
    register_services(&registry, component);

    Setup {
        registry,
        states,
        bus,
    }
}

#[tokio::test]
async fn test_action_fires_trigger_and_satisfies_condition() {
    let setup = setup();

    let is_active = DeviceCondition::from_value(json!({
        "type": "is_active",
        "entity_id": "heater_cooler.den",
        "active": "active"
    }))
    .unwrap();
    assert!(!is_active.check(&setup.states));

    let trigger = DeviceTrigger::from_value(json!({
        "type": "active_changed",
        "entity_id": "heater_cooler.den",
        "to": "active"
    }))
    .unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = attach(trigger, &setup.bus, move |data| {
        let _ = tx.send(data);
    });

    DeviceAction::from_value(json!({
        "type": "set_active",
        "entity_id": "heater_cooler.den",
        "active": "active"
    }))
    .unwrap()
    .execute(&setup.registry, Context::new())
    .await
    .unwrap();

    let fired = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fired.var("entity_id"), Some(&json!("heater_cooler.den")));
    assert!(is_active.check(&setup.states));
    assert_eq!(
        setup.states.get_state("heater_cooler.den").as_deref(),
        Some("idle")
    );

    handle.abort();
}

#[tokio::test]
async fn test_target_state_action_and_condition() {
    let setup = setup();

    DeviceAction::from_value(json!({
        "type": "set_target_state",
        "entity_id": "heater_cooler.den",
        "target_state": 2
    }))
    .unwrap()
    .execute(&setup.registry, Context::new())
    .await
    .unwrap();

    let is_cooling_target = DeviceCondition::from_value(json!({
        "type": "is_target_state",
        "entity_id": "heater_cooler.den",
        "target_state": "cool"
    }))
    .unwrap();
    assert!(is_cooling_target.check(&setup.states));
}

#[tokio::test]
async fn test_hvac_mode_action_not_supported_by_simple_entity() {
    let setup = setup();

    let result = DeviceAction::from_value(json!({
        "type": "set_hvac_mode",
        "entity_id": "heater_cooler.den",
        "hvac_mode": "heat"
    }))
    .unwrap()
    .execute(&setup.registry, Context::new())
    .await;
    assert!(result.is_err());
}
