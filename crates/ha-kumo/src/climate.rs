//! Kumo unit as a full climate device

use crate::coordinator::UpdateCoordinator;
use crate::translator::ModeTranslator;
use crate::unit::{KumoReading, KumoUnit};
use async_trait::async_trait;
use ha_climate::{
    ClimateError, ClimateResult, DeviceSnapshot, HvacMode, SupportedFeatures, TargetTemperature,
    TemperatureUnit,
};
use ha_core::Context;
use ha_heater_cooler::{ClimateDevice, HeaterCoolerEntity, SetTemperature, SnapshotCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Setpoint step of Kumo units, in °C
pub const KUMO_TEMPERATURE_STEP: f64 = 0.5;

/// [`ClimateDevice`] backed by a [`KumoUnit`]
pub struct KumoClimate<U> {
    unit: Arc<U>,
    translator: ModeTranslator,
    snapshot: SnapshotCell<DeviceSnapshot>,
    /// Mode commanded since the last reading
    commanded: SnapshotCell<Option<HvacMode>>,
    available: AtomicBool,
}

impl<U: KumoUnit> KumoClimate<U> {
    pub fn new(unit: Arc<U>, translator: ModeTranslator) -> Self {
        let snapshot = DeviceSnapshot {
            hvac_modes: translator.supported_modes(),
            target_temperature_step: Some(KUMO_TEMPERATURE_STEP),
            ..Default::default()
        };
        Self {
            unit,
            translator,
            snapshot: SnapshotCell::new(snapshot),
            commanded: SnapshotCell::new(None),
            available: AtomicBool::new(false),
        }
    }

    pub fn unit(&self) -> &Arc<U> {
        &self.unit
    }

    /// Build the snapshot of one reading
    ///
    /// An unknown vendor mode leaves mode and action unset rather than
    /// guessing `off`.
    pub fn snapshot_of(&self, reading: &KumoReading) -> DeviceSnapshot {
        let (hvac_mode, hvac_action) = match reading.mode.as_deref() {
            Some(raw) => match (
                self.translator.to_normalized_mode(raw),
                self.translator.to_normalized_action(raw),
            ) {
                (Ok(mode), Ok(action)) => (Some(mode), Some(action)),
                (Err(err), _) | (_, Err(err)) => {
                    warn!(unit = self.unit.name(), %err, "Unit reported an unknown mode");
                    (None, None)
                }
            },
            None => (None, None),
        };

        let target = match hvac_mode {
            Some(HvacMode::Heat) => reading.heat_setpoint.map(TargetTemperature::Single),
            Some(HvacMode::Cool) | Some(HvacMode::Dry) => {
                reading.cool_setpoint.map(TargetTemperature::Single)
            }
            Some(HvacMode::HeatCool) => Some(TargetTemperature::Range {
                low: reading.heat_setpoint,
                high: reading.cool_setpoint,
            }),
            _ => None,
        };

        let mut features = if hvac_mode == Some(HvacMode::HeatCool) {
            SupportedFeatures::TARGET_TEMPERATURE_RANGE
        } else {
            SupportedFeatures::TARGET_TEMPERATURE
        };
        if !reading.fan_speeds.is_empty() {
            features |= SupportedFeatures::FAN_MODE;
        }
        if !reading.vane_directions.is_empty() {
            features |= SupportedFeatures::SWING_MODE;
        }

        DeviceSnapshot {
            current_temperature: reading.current_temperature,
            target,
            current_humidity: reading.current_humidity,
            hvac_mode,
            hvac_action,
            hvac_modes: self.translator.supported_modes(),
            fan_mode: reading.fan_speed.clone(),
            fan_modes: reading.fan_speeds.clone(),
            swing_mode: reading.vane_direction.clone(),
            swing_modes: reading.vane_directions.clone(),
            supported_features: features,
            target_temperature_step: Some(KUMO_TEMPERATURE_STEP),
            ..Default::default()
        }
    }

    /// Replace the snapshot with one built from `reading`
    pub fn apply(&self, reading: &KumoReading) {
        self.available.store(reading.available, Ordering::SeqCst);
        if reading.available {
            self.snapshot.store(self.snapshot_of(reading));
            self.commanded.store(None);
        }
    }

    /// Mode setpoints are routed by: the commanded one until the unit reports
    /// again, then the reported one
    fn setpoint_mode(&self, requested: Option<HvacMode>) -> Option<HvacMode> {
        requested
            .or(*self.commanded.load())
            .or(self.snapshot().hvac_mode)
    }
}

/// Subscribe a Kumo climate entity so every refresh updates and publishes it
pub fn subscribe_climate<U: KumoUnit + 'static>(
    coordinator: &UpdateCoordinator<U>,
    entity: Arc<HeaterCoolerEntity<KumoClimate<U>>>,
) {
    let entity_id = entity.entity_id().to_string();
    coordinator.subscribe(entity_id, move |reading| {
        entity.device().apply(&reading);
        entity.write_state(Context::new());
    });
}

#[async_trait]
impl<U: KumoUnit> ClimateDevice for KumoClimate<U> {
    fn name(&self) -> &str {
        self.unit.name()
    }

    fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.snapshot.load()
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    async fn set_hvac_mode(&self, mode: HvacMode) -> ClimateResult<()> {
        let vendor = self.translator.to_vendor_mode(mode)?;
        let response = self.unit.set_mode(vendor).await?;
        self.commanded.store(Some(mode));
        debug!(unit = self.unit.name(), %mode, %response, "Set mode");
        Ok(())
    }

    async fn set_temperature(&self, args: SetTemperature) -> ClimateResult<()> {
        if let (Some(low), Some(high)) = (args.target_temp_low, args.target_temp_high) {
            self.unit.set_heat_setpoint(low).await?;
            self.unit.set_cool_setpoint(high).await?;
            return Ok(());
        }

        let Some(temperature) = args.temperature else {
            return Err(ClimateError::InvalidArgument("no temperature given".into()));
        };
        let response = match self.setpoint_mode(args.hvac_mode) {
            Some(HvacMode::Heat) => self.unit.set_heat_setpoint(temperature).await?,
            Some(HvacMode::Cool) | Some(HvacMode::Dry) => {
                self.unit.set_cool_setpoint(temperature).await?
            }
            other => {
                return Err(ClimateError::InvalidArgument(format!(
                    "no single setpoint in mode {:?}",
                    other
                )))
            }
        };
        debug!(unit = self.unit.name(), temperature, %response, "Set setpoint");
        Ok(())
    }

    async fn set_fan_mode(&self, fan_mode: &str) -> ClimateResult<()> {
        let response = self.unit.set_fan_speed(fan_mode).await?;
        debug!(unit = self.unit.name(), fan_mode, %response, "Set fan speed");
        Ok(())
    }

    async fn set_swing_mode(&self, swing_mode: &str) -> ClimateResult<()> {
        let response = self.unit.set_vane_direction(swing_mode).await?;
        debug!(unit = self.unit.name(), swing_mode, %response, "Set vane direction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUnit;
    use ha_climate::HvacAction;

    fn climate() -> (Arc<MemoryUnit>, KumoClimate<MemoryUnit>) {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        (unit.clone(), KumoClimate::new(unit, ModeTranslator::kumo()))
    }

    fn reading(mode: &str) -> KumoReading {
        KumoReading {
            available: true,
            mode: Some(mode.to_string()),
            current_temperature: Some(22.0),
            heat_setpoint: Some(20.0),
            cool_setpoint: Some(25.0),
            fan_speeds: vec!["low".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_heat_uses_heat_setpoint() {
        let (_, climate) = climate();
        let snapshot = climate.snapshot_of(&reading("heat"));
        assert_eq!(snapshot.hvac_mode, Some(HvacMode::Heat));
        assert_eq!(snapshot.hvac_action, Some(HvacAction::Heating));
        assert_eq!(snapshot.target, Some(TargetTemperature::Single(20.0)));
        assert_eq!(
            snapshot.supported_features,
            SupportedFeatures::TARGET_TEMPERATURE | SupportedFeatures::FAN_MODE
        );
    }

    #[test]
    fn test_dry_uses_cool_setpoint() {
        let (_, climate) = climate();
        let snapshot = climate.snapshot_of(&reading("dry"));
        assert_eq!(snapshot.target, Some(TargetTemperature::Single(25.0)));
    }

    #[test]
    fn test_auto_variants_use_range() {
        let (_, climate) = climate();
        let snapshot = climate.snapshot_of(&reading("autoHeat"));
        assert_eq!(snapshot.hvac_mode, Some(HvacMode::HeatCool));
        assert_eq!(snapshot.hvac_action, Some(HvacAction::Heating));
        assert_eq!(
            snapshot.target,
            Some(TargetTemperature::Range {
                low: Some(20.0),
                high: Some(25.0)
            })
        );
        assert!(snapshot
            .supported_features
            .contains(SupportedFeatures::TARGET_TEMPERATURE_RANGE));
        assert!(!snapshot.supported_features.has_conflicting_targets());
    }

    #[test]
    fn test_unknown_mode_is_unset() {
        let (_, climate) = climate();
        let snapshot = climate.snapshot_of(&reading("eco"));
        assert_eq!(snapshot.hvac_mode, None);
        assert_eq!(snapshot.hvac_action, None);
        assert_eq!(snapshot.target, None);
    }

    #[test]
    fn test_unavailable_reading_keeps_snapshot() {
        let (_, climate) = climate();
        climate.apply(&reading("cool"));
        climate.apply(&KumoReading::default());
        assert!(!climate.available());
        assert_eq!(climate.snapshot().hvac_mode, Some(HvacMode::Cool));
    }

    #[tokio::test]
    async fn test_set_temperature_picks_setpoint_by_mode() {
        let (unit, climate) = climate();
        climate.apply(&reading("cool"));
        climate
            .set_temperature(SetTemperature::single(23.5))
            .await
            .unwrap();

        climate.apply(&reading("auto"));
        climate
            .set_temperature(SetTemperature::range(19.0, 26.0))
            .await
            .unwrap();

        assert_eq!(
            unit.requests(),
            vec!["cool_setpoint:23.5", "heat_setpoint:19", "cool_setpoint:26"]
        );
    }

    #[tokio::test]
    async fn test_setpoint_follows_commanded_mode_until_next_reading() {
        let (unit, climate) = climate();
        climate.apply(&reading("auto"));

        climate.set_hvac_mode(HvacMode::Heat).await.unwrap();
        climate
            .set_temperature(SetTemperature::single(22.0))
            .await
            .unwrap();

        climate.apply(&reading("cool"));
        climate
            .set_temperature(SetTemperature::single(23.0))
            .await
            .unwrap();

        climate
            .set_temperature(SetTemperature::single(18.0).with_mode(HvacMode::Heat))
            .await
            .unwrap();

        assert_eq!(
            unit.requests(),
            vec![
                "mode:heat",
                "heat_setpoint:22",
                "cool_setpoint:23",
                "heat_setpoint:18"
            ]
        );
    }

    #[tokio::test]
    async fn test_set_hvac_mode_sends_canonical_vendor_string() {
        let (unit, climate) = climate();
        climate.set_hvac_mode(HvacMode::HeatCool).await.unwrap();
        climate.set_hvac_mode(HvacMode::FanOnly).await.unwrap();
        assert_eq!(unit.requests(), vec!["mode:auto", "mode:vent"]);
    }
}
