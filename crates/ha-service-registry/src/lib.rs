//! Service registry with async handlers
//!
//! Entity services such as `heater_cooler.set_hvac_mode` are registered here
//! and dispatched by device actions and state reproduction. A call awaits its
//! handler, so the caller is blocked until the entity acknowledges it.

use dashmap::DashMap;
use ha_core::{Context, ServiceCall};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Result type for service calls
pub type ServiceResult = Result<(), ServiceError>;

/// Future type for async service handlers
pub type ServiceFuture = Pin<Box<dyn Future<Output = ServiceResult> + Send>>;

/// Service handler function type
pub type ServiceHandler = Arc<dyn Fn(ServiceCall) -> ServiceFuture + Send + Sync>;

/// Errors that can occur when calling services
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("service call failed: {0}")]
    CallFailed(String),

    #[error("invalid service data: {0}")]
    InvalidData(String),

    #[error("entity {entity_id} does not support {service}")]
    NotSupported { entity_id: String, service: String },
}

/// Information about a registered service
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    pub domain: String,
    pub service: String,
    /// Feature bits an entity must declare for this service to apply
    pub required_features: Vec<u32>,
}

impl ServiceDescription {
    /// Whether an entity declaring `supported_features` can take this service
    ///
    /// One of the listed bits is enough; an empty list accepts every entity.
    pub fn accepts(&self, supported_features: u32) -> bool {
        self.required_features.is_empty()
            || self
                .required_features
                .iter()
                .any(|bits| supported_features & bits != 0)
    }
}

struct RegisteredService {
    handler: ServiceHandler,
    description: ServiceDescription,
}

/// Registry of `domain.service` handlers
pub struct ServiceRegistry {
    services: DashMap<String, RegisteredService>,
}

impl ServiceRegistry {
    /// Create a new empty service registry
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service handler
    #[instrument(skip(self, handler), fields(domain = %description.domain, service = %description.service))]
    pub fn register<F, Fut>(&self, description: ServiceDescription, handler: F)
    where
        F: Fn(ServiceCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult> + Send + 'static,
    {
        let key = format!("{}.{}", description.domain, description.service);
        debug!("Registering service");

        let handler: ServiceHandler =
            Arc::new(move |call| Box::pin(handler(call)) as ServiceFuture);

        self.services.insert(
            key,
            RegisteredService {
                handler,
                description,
            },
        );
    }

    /// Call a service and wait for its handler to finish
    #[instrument(skip(self, service_data, context))]
    pub async fn call(
        &self,
        domain: &str,
        service: &str,
        service_data: serde_json::Value,
        context: Context,
    ) -> ServiceResult {
        let key = format!("{}.{}", domain, service);

        let handler = match self.services.get(&key) {
            Some(registered) => registered.handler.clone(),
            None => {
                warn!("Service not found");
                return Err(ServiceError::NotFound {
                    domain: domain.to_string(),
                    service: service.to_string(),
                });
            }
        };

        debug!("Calling service");
        handler(ServiceCall::new(domain, service, service_data, context)).await
    }

    /// Check if a service exists
    pub fn has_service(&self, domain: &str, service: &str) -> bool {
        self.services.contains_key(&format!("{}.{}", domain, service))
    }

    /// Get service description
    pub fn get_service(&self, domain: &str, service: &str) -> Option<ServiceDescription> {
        self.services
            .get(&format!("{}.{}", domain, service))
            .map(|s| s.description.clone())
    }

    /// All services registered for a domain, sorted by name
    pub fn domain_services(&self, domain: &str) -> Vec<ServiceDescription> {
        let mut services: Vec<_> = self
            .services
            .iter()
            .filter(|s| s.description.domain == domain)
            .map(|s| s.description.clone())
            .collect();
        services.sort_by(|a, b| a.service.cmp(&b.service));
        services
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn description(domain: &str, service: &str) -> ServiceDescription {
        ServiceDescription {
            domain: domain.to_string(),
            service: service.to_string(),
            required_features: vec![],
        }
    }

    #[tokio::test]
    async fn test_call_reaches_handler() {
        let registry = ServiceRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        registry.register(description("heater_cooler", "set_hvac_mode"), move |call| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(call.get::<String>("hvac_mode"));
                Ok(())
            }
        });

        registry
            .call(
                "heater_cooler",
                "set_hvac_mode",
                json!({"entity_id": "heater_cooler.den", "hvac_mode": "cool"}),
                Context::new(),
            )
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some("cool".to_string())]);
    }

    #[test]
    fn test_required_features_any_of() {
        let mut set_temperature = description("heater_cooler", "set_temperature");
        set_temperature.required_features = vec![1, 2];
        assert!(set_temperature.accepts(1));
        assert!(set_temperature.accepts(2 | 8));
        assert!(!set_temperature.accepts(8));
        assert!(description("heater_cooler", "turn_on").accepts(0));
    }

    #[tokio::test]
    async fn test_service_not_found() {
        let registry = ServiceRegistry::new();
        let result = registry
            .call("heater_cooler", "set_active", json!({}), Context::new())
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let registry = ServiceRegistry::new();
        registry.register(description("heater_cooler", "set_humidity"), |_| async {
            Err(ServiceError::InvalidData("humidity must be an integer".to_string()))
        });

        let result = registry
            .call("heater_cooler", "set_humidity", json!({}), Context::new())
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidData(_))));
    }

    #[test]
    fn test_domain_services_and_unregister() {
        let registry = ServiceRegistry::new();
        registry.register(description("heater_cooler", "turn_on"), |_| async { Ok(()) });
        registry.register(description("heater_cooler", "turn_off"), |_| async { Ok(()) });
        registry.register(description("switch", "turn_on"), |_| async { Ok(()) });

        let names: Vec<_> = registry
            .domain_services("heater_cooler")
            .into_iter()
            .map(|d| d.service)
            .collect();
        assert_eq!(names, vec!["turn_off", "turn_on"]);
        assert!(registry.has_service("switch", "turn_on"));
    }
}
