//! Device automations for heater/cooler entities
//!
//! - [`DeviceTrigger`] / [`TriggerEvaluator`] - fire on `state_changed` events
//! - [`DeviceCondition`] - predicates over the latest published state
//! - [`DeviceAction`] - one `heater_cooler` service call each
//!
//! Every type also has a listing (`list_*`) and a capabilities function
//! describing the extra fields an editor should ask for.

mod action;
mod capabilities;
mod condition;
mod error;
mod trigger;
mod trigger_eval;

pub use action::{action_capabilities, list_actions, DeviceAction, ACTION_TYPES};
pub use capabilities::{Capabilities, DeviceAutomation, ExtraField, FieldKind};
pub use condition::{
    condition_capabilities, list_conditions, DeviceCondition, CONDITION_IS_ACTIVE,
    CONDITION_IS_CURRENT_STATE, CONDITION_IS_TARGET_STATE, CONDITION_TYPES,
};
pub use error::{AutomationError, AutomationResult};
pub use trigger::{
    list_triggers, trigger_capabilities, DeviceTrigger, TemperatureTrigger, TriggerData,
    ValueTrigger, TRIGGER_ACTIVE_CHANGED, TRIGGER_CURRENT_STATE_CHANGED,
    TRIGGER_CURRENT_TEMPERATURE_CHANGED, TRIGGER_TARGET_STATE_CHANGED, TRIGGER_TYPES,
};
pub use trigger_eval::{attach, TriggerEvaluator};
