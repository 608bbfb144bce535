//! On/off switch synthesized over a mode-only unit
//!
//! A Kumo unit has no power switch, only a mode. The switch is on whenever the
//! mode is anything but `off`, and turning it back on restores a remembered
//! non-off mode.

use crate::coordinator::UpdateCoordinator;
use crate::translator::ModeTranslator;
use crate::unit::{KumoReading, KumoUnit};
use ha_climate::{ClimateEnum, ClimateResult, HvacMode};
use ha_core::{
    AttributeMap, Context, EntityId, State, ATTR_FRIENDLY_NAME, STATE_OFF, STATE_ON,
    STATE_UNAVAILABLE, STATE_UNKNOWN,
};
use ha_state_machine::SharedStateMachine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Attribute with the mode `turn_on` would restore
pub const ATTR_LAST_HVAC_MODE: &str = "last_hvac_mode";

/// Observed mode plus the mode to return to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerState {
    pub current_mode: Option<HvacMode>,
    pub last_nonoff_mode: Option<HvacMode>,
}

impl PowerState {
    /// Record a newly observed mode
    ///
    /// The remembered mode is the previous observation, and only when both
    /// the previous and the new mode are non-off. It therefore trails the
    /// current mode by one observation.
    pub fn observe(&mut self, mode: HvacMode) {
        if let Some(previous) = self.current_mode {
            if !mode.is_off() && !previous.is_off() {
                self.last_nonoff_mode = Some(previous);
            }
        }
        self.current_mode = Some(mode);
    }

    pub fn is_on(&self) -> bool {
        self.current_mode.is_some_and(|mode| !mode.is_off())
    }

    /// Mode `turn_on` restores, if any
    pub fn restore_mode(&self) -> Option<HvacMode> {
        self.last_nonoff_mode.filter(|mode| !mode.is_off())
    }
}

/// Switch entity over one unit's mode
pub struct KumoPowerSwitch<U> {
    entity_id: EntityId,
    unit: Arc<U>,
    translator: ModeTranslator,
    power: Mutex<PowerState>,
    available: AtomicBool,
    states: SharedStateMachine,
    writes: tokio::sync::Mutex<()>,
}

impl<U: KumoUnit + 'static> KumoPowerSwitch<U> {
    pub fn new(
        entity_id: EntityId,
        unit: Arc<U>,
        translator: ModeTranslator,
        states: SharedStateMachine,
    ) -> Self {
        Self {
            entity_id,
            unit,
            translator,
            power: Mutex::new(PowerState::default()),
            available: AtomicBool::new(false),
            states,
            writes: tokio::sync::Mutex::new(()),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn power_state(&self) -> PowerState {
        *self.power.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_on(&self) -> bool {
        self.power_state().is_on()
    }

    /// Take in a fresh reading of the unit
    ///
    /// Modes missing from the vendor table leave the power state untouched.
    pub fn apply(&self, reading: &KumoReading) {
        self.available.store(reading.available, Ordering::SeqCst);
        if !reading.available {
            return;
        }

        let Some(raw) = reading.mode.as_deref() else {
            return;
        };
        match self.translator.to_normalized_mode(raw) {
            Ok(mode) => {
                let mut power = self.power.lock().unwrap_or_else(|p| p.into_inner());
                power.observe(mode);
                debug!(
                    entity_id = %self.entity_id,
                    mode = %mode,
                    last = ?power.last_nonoff_mode,
                    "Observed mode"
                );
            }
            Err(err) => {
                debug!(entity_id = %self.entity_id, %err, "Ignoring mode update");
            }
        }
    }

    /// Register with the coordinator so each refresh updates and publishes
    pub fn subscribe(self: &Arc<Self>, coordinator: &UpdateCoordinator<U>) {
        let switch = Arc::clone(self);
        coordinator.subscribe(self.entity_id.to_string(), move |reading| {
            switch.apply(&reading);
            switch.write_state(Context::new());
        });
    }

    pub fn state(&self) -> &'static str {
        if !self.available() {
            return STATE_UNAVAILABLE;
        }
        let power = self.power_state();
        match power.current_mode {
            None => STATE_UNKNOWN,
            Some(_) if power.is_on() => STATE_ON,
            Some(_) => STATE_OFF,
        }
    }

    pub fn write_state(&self, context: Context) -> State {
        let power = self.power_state();
        let mut attrs = AttributeMap::new();
        attrs.insert(ATTR_FRIENDLY_NAME.to_string(), self.unit.name().into());
        if let Some(mode) = power.restore_mode() {
            attrs.insert(ATTR_LAST_HVAC_MODE.to_string(), mode.as_str().into());
        }
        self.states
            .set(self.entity_id.clone(), self.state(), attrs, context)
    }

    /// Restore the remembered mode; a no-op when there is none
    pub async fn turn_on(&self) -> ClimateResult<()> {
        let power = self.power_state();
        match power.restore_mode() {
            Some(mode) => {
                debug!(entity_id = %self.entity_id, current = ?power.current_mode, %mode, "Turning on");
                self.send_mode(mode).await
            }
            None => {
                debug!(entity_id = %self.entity_id, current = ?power.current_mode, "No mode to restore, ignoring turn_on");
                Ok(())
            }
        }
    }

    /// Command `off`, whatever the current mode
    pub async fn turn_off(&self) -> ClimateResult<()> {
        debug!(entity_id = %self.entity_id, "Turning off");
        self.send_mode(HvacMode::Off).await
    }

    async fn send_mode(&self, mode: HvacMode) -> ClimateResult<()> {
        let vendor = self.translator.to_vendor_mode(mode)?;
        if !self.available() {
            warn!(entity_id = %self.entity_id, "Kumo {} is not available", self.unit.name());
            return Ok(());
        }

        let _guard = self.writes.lock().await;
        let response = self.unit.set_mode(vendor).await?;
        debug!(entity_id = %self.entity_id, %mode, %response, "Set mode");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUnit;
    use ha_event_bus::EventBus;
    use ha_state_machine::StateMachine;

    #[test]
    fn test_observe_lags_by_one() {
        let mut power = PowerState::default();

        power.observe(HvacMode::Heat);
        assert_eq!(power.last_nonoff_mode, None);

        power.observe(HvacMode::Cool);
        assert_eq!(power.last_nonoff_mode, Some(HvacMode::Heat));

        power.observe(HvacMode::Off);
        assert_eq!(power.last_nonoff_mode, Some(HvacMode::Heat));
        assert!(!power.is_on());

        power.observe(HvacMode::Dry);
        assert_eq!(power.last_nonoff_mode, Some(HvacMode::Heat));
        assert!(power.is_on());

        power.observe(HvacMode::FanOnly);
        assert_eq!(power.last_nonoff_mode, Some(HvacMode::Dry));
    }

    #[test]
    fn test_is_on_needs_a_mode() {
        assert!(!PowerState::default().is_on());
    }

    fn switch(unit: Arc<MemoryUnit>) -> KumoPowerSwitch<MemoryUnit> {
        let states = Arc::new(StateMachine::new(Arc::new(EventBus::new())));
        KumoPowerSwitch::new(
            EntityId::new("switch", "den").unwrap(),
            unit,
            ModeTranslator::kumo(),
            states,
        )
    }

    fn reading(mode: &str) -> KumoReading {
        KumoReading {
            available: true,
            mode: Some(mode.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_heat_cool_off_then_turn_on_restores_heat() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit.clone());

        for mode in ["heat", "cool", "off"] {
            switch.apply(&reading(mode));
        }
        assert!(!switch.is_on());

        switch.turn_on().await.unwrap();
        assert_eq!(unit.requests(), vec!["mode:heat"]);
    }

    #[tokio::test]
    async fn test_turn_on_without_history_is_noop() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit.clone());

        switch.apply(&reading("off"));
        switch.turn_on().await.unwrap();
        assert!(unit.requests().is_empty());

        // A single non-off observation is not enough either
        switch.apply(&reading("heat"));
        switch.apply(&reading("off"));
        switch.turn_on().await.unwrap();
        assert!(unit.requests().is_empty());
    }

    #[tokio::test]
    async fn test_turn_off_always_issues_off() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit.clone());

        switch.apply(&reading("off"));
        switch.turn_off().await.unwrap();
        switch.turn_off().await.unwrap();
        assert_eq!(unit.requests(), vec!["mode:off", "mode:off"]);
    }

    #[tokio::test]
    async fn test_unavailable_is_noop() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit.clone());

        switch.apply(&reading("heat"));
        switch.apply(&reading("cool"));
        switch.apply(&KumoReading::default());

        switch.turn_on().await.unwrap();
        switch.turn_off().await.unwrap();
        assert!(unit.requests().is_empty());
        assert_eq!(switch.state(), STATE_UNAVAILABLE);
    }

    #[test]
    fn test_unknown_vendor_mode_ignored() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit);

        switch.apply(&reading("cool"));
        switch.apply(&reading("turbo"));
        assert_eq!(switch.power_state().current_mode, Some(HvacMode::Cool));
        assert_eq!(switch.state(), STATE_ON);
    }

    #[test]
    fn test_published_state() {
        let unit = Arc::new(MemoryUnit::new("Den", "1234"));
        let switch = switch(unit);
        assert_eq!(switch.write_state(Context::new()).state, STATE_UNAVAILABLE);

        switch.apply(&reading("autoHeat"));
        switch.apply(&reading("autoCool"));
        let state = switch.write_state(Context::new());
        assert_eq!(state.state, STATE_ON);
        assert_eq!(state.attributes[ATTR_LAST_HVAC_MODE], "heat_cool");
    }
}
