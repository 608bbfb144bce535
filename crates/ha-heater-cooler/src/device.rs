//! Device capability traits
//!
//! A device implementation only overrides the setters its feature mask
//! declares. Everything else falls back to [`ClimateError::FeatureNotSupported`].

use async_trait::async_trait;
use ha_climate::{
    Active, ClimateError, ClimateResult, DeviceSnapshot, HvacMode, Precision, SimpleSnapshot,
    SupportedFeatures, TargetState, TemperatureUnit,
};
use std::sync::{Arc, RwLock};

/// Arguments of a `set_temperature` request
///
/// Either a single `temperature` or a `target_temp_low`/`target_temp_high`
/// pair, optionally switching the mode first.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetTemperature {
    pub temperature: Option<f64>,
    pub target_temp_low: Option<f64>,
    pub target_temp_high: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
}

impl SetTemperature {
    pub fn single(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }

    pub fn range(low: f64, high: f64) -> Self {
        Self {
            target_temp_low: Some(low),
            target_temp_high: Some(high),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: HvacMode) -> Self {
        self.hvac_mode = Some(mode);
        self
    }

    pub fn is_range(&self) -> bool {
        self.target_temp_low.is_some() || self.target_temp_high.is_some()
    }

    /// Check the argument combination
    pub fn validate(&self) -> ClimateResult<()> {
        let has_low = self.target_temp_low.is_some();
        let has_high = self.target_temp_high.is_some();

        if self.temperature.is_none() && !has_low && !has_high {
            return Err(ClimateError::InvalidArgument(
                "one of temperature, target_temp_low or target_temp_high is required".into(),
            ));
        }
        if self.temperature.is_some() && (has_low || has_high) {
            return Err(ClimateError::InvalidArgument(
                "temperature cannot be combined with target_temp_low/target_temp_high".into(),
            ));
        }
        if has_low != has_high {
            return Err(ClimateError::InvalidArgument(
                "target_temp_low and target_temp_high must be given together".into(),
            ));
        }
        Ok(())
    }

    /// Convert every temperature from `from` into `to`
    pub fn converted(self, from: TemperatureUnit, to: TemperatureUnit) -> Self {
        let convert = |v: Option<f64>| v.map(|v| from.convert(v, to));
        Self {
            temperature: convert(self.temperature),
            target_temp_low: convert(self.target_temp_low),
            target_temp_high: convert(self.target_temp_high),
            hvac_mode: self.hvac_mode,
        }
    }
}

/// Mode a device without its own `turn_on` switches to
///
/// With exactly two modes where one is `off`, the other one; otherwise the
/// first of `heat_cool`, `heat`, `cool` the device offers.
pub fn fallback_on_mode(hvac_modes: &[HvacMode]) -> Option<HvacMode> {
    if hvac_modes.len() == 2 && hvac_modes.contains(&HvacMode::Off) {
        return hvac_modes.iter().copied().find(|m| !m.is_off());
    }
    [HvacMode::HeatCool, HvacMode::Heat, HvacMode::Cool]
        .into_iter()
        .find(|mode| hvac_modes.contains(mode))
}

/// A full climate device
#[async_trait]
pub trait ClimateDevice: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Whether the device can currently be reached
    fn available(&self) -> bool {
        true
    }

    /// Latest complete readings
    fn snapshot(&self) -> Arc<DeviceSnapshot>;

    /// Capability mask, taken from the latest snapshot by default
    fn supported_features(&self) -> SupportedFeatures {
        self.snapshot().supported_features
    }

    /// Unit the device reports and accepts temperatures in
    fn temperature_unit(&self) -> TemperatureUnit;

    /// Display precision override
    fn precision(&self) -> Option<Precision> {
        None
    }

    /// Set the target temperature
    ///
    /// A set `args.hvac_mode` has already been applied through
    /// [`ClimateDevice::set_hvac_mode`]; devices that pick a setpoint by mode
    /// go by it rather than the snapshot.
    async fn set_temperature(&self, _args: SetTemperature) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_temperature"))
    }

    async fn set_humidity(&self, _humidity: u8) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_humidity"))
    }

    async fn set_fan_mode(&self, _fan_mode: &str) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_fan_mode"))
    }

    async fn set_swing_mode(&self, _swing_mode: &str) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_swing_mode"))
    }

    async fn set_preset_mode(&self, _preset_mode: &str) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_preset_mode"))
    }

    async fn set_hvac_mode(&self, _mode: HvacMode) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_hvac_mode"))
    }

    async fn turn_aux_heat_on(&self) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "turn_aux_heat_on"))
    }

    async fn turn_aux_heat_off(&self) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "turn_aux_heat_off"))
    }

    /// Switch on, by default into [`fallback_on_mode`]
    async fn turn_on(&self) -> ClimateResult<()> {
        match fallback_on_mode(&self.snapshot().hvac_modes) {
            Some(mode) => self.set_hvac_mode(mode).await,
            None => Err(ClimateError::not_supported(self.name(), "turn_on")),
        }
    }

    /// Switch off, by default through the `off` mode
    async fn turn_off(&self) -> ClimateResult<()> {
        if self.snapshot().supports_mode(HvacMode::Off) {
            self.set_hvac_mode(HvacMode::Off).await
        } else {
            Err(ClimateError::not_supported(self.name(), "turn_off"))
        }
    }
}

/// A simplified heater/cooler
#[async_trait]
pub trait SimpleHeaterCooler: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool {
        true
    }

    fn snapshot(&self) -> Arc<SimpleSnapshot>;

    fn temperature_unit(&self) -> TemperatureUnit;

    fn precision(&self) -> Option<Precision> {
        None
    }

    async fn set_active(&self, active: Active) -> ClimateResult<()>;

    async fn set_target_state(&self, target_state: TargetState) -> ClimateResult<()>;

    async fn set_temperature(&self, _temperature: f64) -> ClimateResult<()> {
        Err(ClimateError::not_supported(self.name(), "set_temperature"))
    }
}

/// Latest snapshot of a device, replaced wholesale
///
/// Readers clone the `Arc` and keep a consistent view even while a refresh
/// stores the next snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current snapshot
    pub fn load(&self) -> Arc<T> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the snapshot, returning the previous one
    pub fn store(&self, next: T) -> Arc<T> {
        let next = Arc::new(next);
        match self.current.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }
}
