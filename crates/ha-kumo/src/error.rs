//! Kumo error types

use ha_climate::{ClimateError, HvacMode};
use thiserror::Error;

/// Result type for Kumo adapter operations
pub type KumoResult<T> = Result<T, KumoError>;

/// Lookup failures of a vendor mode table
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslateError {
    /// The unit reported a mode missing from the forward table
    #[error("unknown vendor mode: {0}")]
    UnknownVendorMode(String),

    /// The table has no vendor string for this mode
    #[error("mode {0} is not supported by this vendor")]
    UnsupportedModeForVendor(HvacMode),
}

impl From<TranslateError> for ClimateError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::UnknownVendorMode(raw) => ClimateError::UnknownVendorMode(raw),
            TranslateError::UnsupportedModeForVendor(mode) => {
                ClimateError::UnsupportedModeForVendor(mode.to_string())
            }
        }
    }
}

/// Errors reported by a Kumo unit or raised while wiring entities
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KumoError {
    /// The unit could not be reached or did not answer in time
    #[error("unit {serial} did not respond: {reason}")]
    Unreachable { serial: String, reason: String },

    /// The unit answered but refused the request
    #[error("unit {serial} rejected request: {reason}")]
    Rejected { serial: String, reason: String },

    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// Nothing to set up
    #[error("no indoor units found")]
    NoIndoorUnits,

    #[error("invalid entity name: {0}")]
    InvalidName(String),
}

impl From<KumoError> for ClimateError {
    fn from(err: KumoError) -> Self {
        match err {
            KumoError::Translate(inner) => inner.into(),
            other => ClimateError::Device(other.to_string()),
        }
    }
}
