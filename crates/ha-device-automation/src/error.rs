//! Device automation errors

use ha_service_registry::ServiceError;
use thiserror::Error;

/// Errors from parsing or running device automations
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Invalid automation configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown {kind} type: {value}")]
    UnknownType { kind: &'static str, value: String },

    #[error("Invalid state change data: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type for device automations
pub type AutomationResult<T> = Result<T, AutomationError>;

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        AutomationError::InvalidConfig(err.to_string())
    }
}
