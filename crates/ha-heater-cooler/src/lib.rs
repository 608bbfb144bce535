//! Heater/cooler entities
//!
//! Bridges climate devices into the host: the [`ClimateDevice`] and
//! [`SimpleHeaterCooler`] capability traits, entity wrappers that gate
//! setters and publish projected state, the `heater_cooler` services, state
//! reproduction and group on/off membership.

mod command;
mod component;
mod device;
mod entity;
pub mod group;
mod reproduce;
mod services;
mod simple;

pub use command::HeaterCoolerCommand;
pub use component::{EntityComponent, HeaterCoolerTarget, SharedEntityComponent};
pub use device::{fallback_on_mode, ClimateDevice, SetTemperature, SimpleHeaterCooler, SnapshotCell};
pub use entity::HeaterCoolerEntity;
pub use reproduce::{reproduce_calls, reproduce_states};
pub use services::{register_services, service_error, SERVICES};
pub use simple::SimpleHeaterCoolerEntity;

/// Entity domain
pub const DOMAIN: &str = "heater_cooler";

pub const SERVICE_TURN_ON: &str = "turn_on";
pub const SERVICE_TURN_OFF: &str = "turn_off";
pub const SERVICE_SET_HVAC_MODE: &str = "set_hvac_mode";
pub const SERVICE_SET_PRESET_MODE: &str = "set_preset_mode";
pub const SERVICE_SET_AUX_HEAT: &str = "set_aux_heat";
pub const SERVICE_SET_TEMPERATURE: &str = "set_temperature";
pub const SERVICE_SET_HUMIDITY: &str = "set_humidity";
pub const SERVICE_SET_FAN_MODE: &str = "set_fan_mode";
pub const SERVICE_SET_SWING_MODE: &str = "set_swing_mode";
pub const SERVICE_SET_ACTIVE: &str = "set_active";
pub const SERVICE_SET_TARGET_STATE: &str = "set_target_state";
