//! Service call type for invoking entity services

use crate::{Context, ATTR_ENTITY_ID};
use serde::{Deserialize, Serialize};

/// A call to a `domain.service`, e.g. `heater_cooler.set_hvac_mode`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to
    pub domain: String,

    /// The service name
    pub service: String,

    /// Data passed to the service (entity_id plus arguments)
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether service_data carries `key`
    pub fn has(&self, key: &str) -> bool {
        self.service_data.get(key).is_some()
    }

    /// Entity IDs targeted by this call, single string or list
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get(ATTR_ENTITY_ID) {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}
