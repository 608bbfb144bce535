//! Full heater/cooler entity
//!
//! Wraps a [`ClimateDevice`], gates every setter on the device's feature
//! mask and publishes the projected state into the state machine.

use crate::command::HeaterCoolerCommand;
use crate::component::HeaterCoolerTarget;
use crate::device::{ClimateDevice, SetTemperature};
use async_trait::async_trait;
use ha_climate::{
    derive_state, project, Active, ClimateError, ClimateResult, DisplayOptions, HvacMode,
    SupportedFeatures, TargetState, TemperatureUnit,
};
use ha_core::{AttributeMap, Context, EntityId, State, ATTR_FRIENDLY_NAME, STATE_UNAVAILABLE};
use ha_state_machine::SharedStateMachine;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Entity wrapper around a full climate device
pub struct HeaterCoolerEntity<D> {
    entity_id: EntityId,
    device: Arc<D>,
    system_unit: TemperatureUnit,
    states: SharedStateMachine,
    /// Held for the duration of every device write
    writes: Mutex<()>,
}

impl<D: ClimateDevice> HeaterCoolerEntity<D> {
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

    pub fn supported_features(&self) -> SupportedFeatures {
        self.device.supported_features()
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions::new(self.device.temperature_unit(), self.system_unit)
            .with_precision(self.device.precision())
    }

    /// Primary state value
    pub fn state(&self) -> String {
        if !self.device.available() {
            return STATE_UNAVAILABLE.to_string();
        }
        derive_state(&self.device.snapshot()).to_string()
    }

    /// Projected attributes of the latest snapshot
    pub fn attributes(&self) -> AttributeMap {
        let mut attrs = if self.device.available() {
            project(
                &self.device.snapshot(),
                self.supported_features(),
                &self.display_options(),
            )
        } else {
            AttributeMap::new()
        };
        attrs.insert(ATTR_FRIENDLY_NAME.to_string(), self.device.name().into());
        attrs
    }

    /// Publish state and attributes into the state machine
    pub fn write_state(&self, context: Context) -> State {
        self.states
            .set(self.entity_id.clone(), self.state(), self.attributes(), context)
    }

    fn require(&self, feature: SupportedFeatures, service: &str) -> ClimateResult<()> {
        if self.supported_features().contains(feature) {
            Ok(())
        } else {
            Err(ClimateError::not_supported(self.entity_id.to_string(), service))
        }
    }

    fn require_any(&self, features: SupportedFeatures, service: &str) -> ClimateResult<()> {
        if self.supported_features().intersects(features) {
            Ok(())
        } else {
            Err(ClimateError::not_supported(self.entity_id.to_string(), service))
        }
    }

    /// False, with a warning, when writes should be skipped
    fn reachable(&self, service: &str) -> bool {
        let available = self.device.available();
        if !available {
            warn!(entity_id = %self.entity_id, service, "Device is not available, ignoring request");
        }
        available
    }

    fn check_mode(&self, mode: HvacMode) -> ClimateResult<()> {
        if self.device.snapshot().supports_mode(mode) {
            Ok(())
        } else {
            Err(ClimateError::InvalidArgument(format!(
                "{} does not offer mode {}",
                self.entity_id, mode
            )))
        }
    }

    fn check_option(options: &[String], value: &str, kind: &str) -> ClimateResult<()> {
        if options.is_empty() || options.iter().any(|o| o == value) {
            Ok(())
        } else {
            Err(ClimateError::InvalidArgument(format!(
                "{} {} is not one of {:?}",
                kind, value, options
            )))
        }
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> ClimateResult<()> {
        self.check_mode(mode)?;
        if !self.reachable("set_hvac_mode") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        debug!(entity_id = %self.entity_id, %mode, "Setting hvac mode");
        self.device.set_hvac_mode(mode).await
    }

    pub async fn set_temperature(&self, args: SetTemperature) -> ClimateResult<()> {
        args.validate()?;
        // Either target kind admits the call; the device routes single vs range,
        // possibly for the mode this request switches to.
        self.require_any(SupportedFeatures::TARGETS, "set_temperature")?;
        if let Some(mode) = args.hvac_mode {
            self.check_mode(mode)?;
        }
        if !self.reachable("set_temperature") {
            return Ok(());
        }

        let _guard = self.writes.lock().await;
        if let Some(mode) = args.hvac_mode {
            debug!(entity_id = %self.entity_id, %mode, "Setting hvac mode before temperature");
            self.device.set_hvac_mode(mode).await?;
        }
        debug!(entity_id = %self.entity_id, ?args, "Setting temperature");
        self.device.set_temperature(args).await
    }

    pub async fn set_humidity(&self, humidity: u8) -> ClimateResult<()> {
        self.require(SupportedFeatures::TARGET_HUMIDITY, "set_humidity")?;
        if !self.reachable("set_humidity") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.set_humidity(humidity).await
    }

    pub async fn set_fan_mode(&self, fan_mode: &str) -> ClimateResult<()> {
        self.require(SupportedFeatures::FAN_MODE, "set_fan_mode")?;
        Self::check_option(&self.device.snapshot().fan_modes, fan_mode, "fan mode")?;
        if !self.reachable("set_fan_mode") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.set_fan_mode(fan_mode).await
    }

    pub async fn set_swing_mode(&self, swing_mode: &str) -> ClimateResult<()> {
        self.require(SupportedFeatures::SWING_MODE, "set_swing_mode")?;
        Self::check_option(&self.device.snapshot().swing_modes, swing_mode, "swing mode")?;
        if !self.reachable("set_swing_mode") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.set_swing_mode(swing_mode).await
    }

    pub async fn set_preset_mode(&self, preset_mode: &str) -> ClimateResult<()> {
        self.require(SupportedFeatures::PRESET_MODE, "set_preset_mode")?;
        Self::check_option(&self.device.snapshot().preset_modes, preset_mode, "preset mode")?;
        if !self.reachable("set_preset_mode") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.set_preset_mode(preset_mode).await
    }

    pub async fn set_aux_heat(&self, on: bool) -> ClimateResult<()> {
        self.require(SupportedFeatures::AUX_HEAT, "set_aux_heat")?;
        if !self.reachable("set_aux_heat") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        if on {
            self.device.turn_aux_heat_on().await
        } else {
            self.device.turn_aux_heat_off().await
        }
    }

    pub async fn turn_on(&self) -> ClimateResult<()> {
        if !self.reachable("turn_on") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.turn_on().await
    }

    pub async fn turn_off(&self) -> ClimateResult<()> {
        if !self.reachable("turn_off") {
            return Ok(());
        }
        let _guard = self.writes.lock().await;
        self.device.turn_off().await
    }
}

#[async_trait]
impl<D: ClimateDevice + 'static> HeaterCoolerTarget for HeaterCoolerEntity<D> {
    fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    fn supported_features(&self) -> SupportedFeatures {
        HeaterCoolerEntity::supported_features(self)
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.device.temperature_unit()
    }

    async fn execute(&self, command: HeaterCoolerCommand) -> ClimateResult<()> {
        match command {
            HeaterCoolerCommand::TurnOn => self.turn_on().await,
            HeaterCoolerCommand::TurnOff => self.turn_off().await,
            HeaterCoolerCommand::SetHvacMode(mode) => self.set_hvac_mode(mode).await,
            HeaterCoolerCommand::SetPresetMode(preset) => self.set_preset_mode(&preset).await,
            HeaterCoolerCommand::SetAuxHeat(on) => self.set_aux_heat(on).await,
            HeaterCoolerCommand::SetTemperature(args) => self.set_temperature(args).await,
            HeaterCoolerCommand::SetHumidity(humidity) => self.set_humidity(humidity).await,
            HeaterCoolerCommand::SetFanMode(fan) => self.set_fan_mode(&fan).await,
            HeaterCoolerCommand::SetSwingMode(swing) => self.set_swing_mode(&swing).await,
            HeaterCoolerCommand::SetActive(Active::Active) => self.turn_on().await,
            HeaterCoolerCommand::SetActive(Active::Inactive) => self.turn_off().await,
            HeaterCoolerCommand::SetTargetState(target) => {
                let mode = match target {
                    TargetState::Auto => HvacMode::HeatCool,
                    TargetState::Heat => HvacMode::Heat,
                    TargetState::Cool => HvacMode::Cool,
                };
                self.set_hvac_mode(mode).await
            }
        }
    }

    fn write_state(&self, context: Context) -> State {
        HeaterCoolerEntity::write_state(self, context)
    }
}
