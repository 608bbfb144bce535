//! Error types for the climate model

use thiserror::Error;

/// Result type for climate operations
pub type ClimateResult<T> = Result<T, ClimateError>;

/// Errors raised by projection, translation and entity setters
///
/// Device unavailability is deliberately absent: an unreachable device turns
/// setters into logged no-ops instead of failing the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClimateError {
    /// A raw value could not be coerced into one of the closed enums
    #[error("invalid {kind} value: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },

    /// The vendor reported a mode string missing from its forward table
    #[error("unknown vendor mode: {0}")]
    UnknownVendorMode(String),

    /// The vendor table has no representative for a normalized mode
    #[error("mode {0} is not supported by this vendor")]
    UnsupportedModeForVendor(String),

    /// A setter was invoked for a capability missing from the feature mask
    #[error("{entity}: feature not supported: {feature}")]
    FeatureNotSupported { entity: String, feature: String },

    /// Setter arguments were rejected before reaching the device
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device adapter rejected or failed a request
    #[error("device error: {0}")]
    Device(String),
}

impl ClimateError {
    /// Shorthand for [`ClimateError::FeatureNotSupported`]
    pub fn not_supported(entity: impl Into<String>, feature: impl Into<String>) -> Self {
        ClimateError::FeatureNotSupported {
            entity: entity.into(),
            feature: feature.into(),
        }
    }
}
