//! Simplified heater/cooler entity

use crate::command::HeaterCoolerCommand;
use crate::component::HeaterCoolerTarget;
use crate::device::{SetTemperature, SimpleHeaterCooler};
use async_trait::async_trait;
use ha_climate::{
    derive_simple_state, project_simple, Active, ClimateError, ClimateResult, DisplayOptions,
    SupportedFeatures, TargetState, TemperatureUnit,
};
use ha_core::{AttributeMap, Context, EntityId, State, ATTR_FRIENDLY_NAME, STATE_UNAVAILABLE};
use ha_state_machine::SharedStateMachine;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Entity wrapper around a [`SimpleHeaterCooler`]
pub struct SimpleHeaterCoolerEntity<D> {
    entity_id: EntityId,
    device: Arc<D>,
    system_unit: TemperatureUnit,
    states: SharedStateMachine,
    writes: Mutex<()>,
}

impl<D: SimpleHeaterCooler> SimpleHeaterCoolerEntity<D> {
    pub fn new(
        entity_id: EntityId,
        device: Arc<D>,
        system_unit: TemperatureUnit,
        states: SharedStateMachine,
    ) -> Self {
        Self {
            entity_id,
            device,
            system_unit,
            states,
            writes: Mutex::new(()),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// The current state value, `unavailable` when unreachable
    pub fn state(&self) -> String {
        if self.device.available() {
            derive_simple_state(&self.device.snapshot()).to_string()
        } else {
            STATE_UNAVAILABLE.to_string()
        }
    }

    pub fn attributes(&self) -> AttributeMap {
        let mut attrs = if self.device.available() {
            let display = DisplayOptions::new(self.device.temperature_unit(), self.system_unit)
                .with_precision(self.device.precision());
            project_simple(&self.device.snapshot(), &display)
        } else {
            AttributeMap::new()
        };
        attrs.insert(ATTR_FRIENDLY_NAME.to_string(), self.device.name().into());
        attrs
    }

    pub fn write_state(&self, context: Context) -> State {
        self.states
            .set(self.entity_id.clone(), self.state(), self.attributes(), context)
    }

    fn reachable(&self, service: &str) -> bool {
        let available = self.device.available();
        if !available {
            warn!(entity_id = %self.entity_id, service, "Device is not available, ignoring request");
        }
        available
    }

    pub async fn set_active(&self, active: Active) -> ClimateResult<()> {
        if !self.reachable("set_active") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        debug!(entity_id = %self.entity_id, %active, "Setting active");
        self.device.set_active(active).await
    }

    pub async fn set_target_state(&self, target_state: TargetState) -> ClimateResult<()> {
        if !self.reachable("set_target_state") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        debug!(entity_id = %self.entity_id, %target_state, "Setting target state");
        self.device.set_target_state(target_state).await
    }

    pub async fn set_temperature(&self, temperature: f64) -> ClimateResult<()> {
        if !self
            .device
            .snapshot()
            .supported_features
            .contains(SupportedFeatures::TARGET_TEMPERATURE)
        {
            return Err(ClimateError::not_supported(
                self.entity_id.to_string(),
                "set_temperature",
            ));
        }
        if !self.reachable("set_temperature") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.set_temperature(temperature).await
    }
}

#[async_trait]
impl<D: SimpleHeaterCooler + 'static> HeaterCoolerTarget for SimpleHeaterCoolerEntity<D> {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn supported_features(&self) -> SupportedFeatures {
        self.device.snapshot().supported_features
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.device.temperature_unit()
    }

    async fn execute(&self, command: HeaterCoolerCommand) -> ClimateResult<()> {
        match command {
            HeaterCoolerCommand::SetActive(active) => self.set_active(active).await,
            HeaterCoolerCommand::TurnOn => self.set_active(Active::Active).await,
            HeaterCoolerCommand::TurnOff => self.set_active(Active::Inactive).await,
            HeaterCoolerCommand::SetTargetState(target) => self.set_target_state(target).await,
            HeaterCoolerCommand::SetTemperature(SetTemperature {
                temperature: Some(temperature),
                target_temp_low: None,
                target_temp_high: None,
                hvac_mode: None,
            }) => self.set_temperature(temperature).await,
            other => Err(ClimateError::not_supported(
                self.entity_id.to_string(),
                other.service(),
            )),
        }
    }

    fn write_state(&self, context: Context) -> State {
        SimpleHeaterCoolerEntity::write_state(self, context)
    }
}
