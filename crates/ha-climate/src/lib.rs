//! Climate capability model
//!
//! Types shared by every heater/cooler implementation:
//!
//! - [`SupportedFeatures`]: the capability mask a device declares
//! - [`HvacMode`] / [`HvacAction`]: setpoint and observed activity
//! - [`Active`], [`TargetState`], [`CurrentState`]: the simplified model
//! - [`DeviceSnapshot`]: the latest complete readings of one device
//! - [`project`]: capability-gated projection into published attributes

#[macro_use]
mod macros;

pub mod attributes;
mod error;
mod features;
mod mode;
pub mod projection;
mod simple;
mod snapshot;
pub mod temperature;

pub use error::{ClimateError, ClimateResult};
pub use features::SupportedFeatures;
pub use mode::{ClimateEnum, HvacAction, HvacMode};
pub use projection::{
    capability_attributes, derive_simple_state, derive_state, derive_state_from_raw, project,
    project_simple, state_attributes, DisplayOptions,
};
pub use simple::{Active, CurrentState, TargetState};
pub use snapshot::{DeviceSnapshot, SimpleSnapshot, TargetTemperature};
pub use temperature::{default_precision, display_temp, Precision, TemperatureUnit};
