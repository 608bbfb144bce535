//! Simplified heater/cooler vocabulary
//!
//! The lighter model describes a device with three independent axes. The
//! integer codes match the values automations have historically stored, so
//! both `"heating"` and `2` are accepted for [`CurrentState::Heating`].

use crate::ClimateEnum;

climate_enum! {
    /// Whether the device is switched on
    pub enum Active("active") {
        Active => "active" = 0,
        Inactive => "inactive" = 1,
    }
}

climate_enum! {
    /// What the device is set to do
    pub enum TargetState("target_state") {
        Auto => "auto" = 0,
        Heat => "heat" = 1,
        Cool => "cool" = 2,
    }
}

climate_enum! {
    /// What the device is observed doing
    pub enum CurrentState("current_state") {
        Inactive => "inactive" = 0,
        Idle => "idle" = 1,
        Heating => "heating" = 2,
        Cooling => "cooling" = 3,
    }
}

impl CurrentState {
    /// Every state except `inactive` counts as on
    pub fn is_on(self) -> bool {
        self != CurrentState::Inactive
    }

    /// States that count as on, in declaration order
    pub fn on_states() -> Vec<CurrentState> {
        Self::ALL.iter().copied().filter(|s| s.is_on()).collect()
    }
}
