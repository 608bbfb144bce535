//! `heater_cooler` service registration

use crate::command::HeaterCoolerCommand;
use crate::component::{EntityComponent, SharedEntityComponent};
use crate::*;
use ha_climate::{ClimateError, SupportedFeatures};
use ha_core::ServiceCall;
use ha_service_registry::{ServiceDescription, ServiceError, ServiceRegistry, ServiceResult};
use tracing::{debug, instrument};

/// Services of the domain with the feature bits each one needs
pub const SERVICES: [(&str, &[SupportedFeatures]); 11] = [
    (SERVICE_TURN_ON, &[]),
    (SERVICE_TURN_OFF, &[]),
    (SERVICE_SET_HVAC_MODE, &[]),
    (SERVICE_SET_PRESET_MODE, &[SupportedFeatures::PRESET_MODE]),
    (SERVICE_SET_AUX_HEAT, &[SupportedFeatures::AUX_HEAT]),
    (
        SERVICE_SET_TEMPERATURE,
        &[
            SupportedFeatures::TARGET_TEMPERATURE,
            SupportedFeatures::TARGET_TEMPERATURE_RANGE,
        ],
    ),
    (SERVICE_SET_HUMIDITY, &[SupportedFeatures::TARGET_HUMIDITY]),
    (SERVICE_SET_FAN_MODE, &[SupportedFeatures::FAN_MODE]),
    (SERVICE_SET_SWING_MODE, &[SupportedFeatures::SWING_MODE]),
    (SERVICE_SET_ACTIVE, &[]),
    (SERVICE_SET_TARGET_STATE, &[]),
];

/// Map an entity error onto the service error surfaced to the caller
pub fn service_error(err: ClimateError, entity_id: &str, service: &str) -> ServiceError {
    match err {
        ClimateError::FeatureNotSupported { .. } => ServiceError::NotSupported {
            entity_id: entity_id.to_string(),
            service: service.to_string(),
        },
        ClimateError::InvalidArgument(_) | ClimateError::InvalidEnumValue { .. } => {
            ServiceError::InvalidData(err.to_string())
        }
        other => ServiceError::CallFailed(format!("{}: {}", entity_id, other)),
    }
}

/// Register every `heater_cooler` service, dispatching to `component`
#[instrument(skip_all)]
pub fn register_services(registry: &ServiceRegistry, component: SharedEntityComponent) {
    for (service, features) in SERVICES {
        let description = ServiceDescription {
            domain: DOMAIN.to_string(),
            service: service.to_string(),
            required_features: features.iter().map(|f| f.bits()).collect(),
        };

        let component = component.clone();
        let accepted = description.clone();
        registry.register(description, move |call| {
            let component = component.clone();
            let accepted = accepted.clone();
            async move { handle_call(&component, &accepted, call).await }
        });
    }
    debug!(count = SERVICES.len(), "Registered heater_cooler services");
}

#[instrument(skip(component, description, call), fields(service = %call.service))]
async fn handle_call(
    component: &EntityComponent,
    description: &ServiceDescription,
    call: ServiceCall,
) -> ServiceResult {
    let command = HeaterCoolerCommand::from_call(&call)?;

    let entity_ids = call.entity_ids();
    if entity_ids.is_empty() {
        return Err(ServiceError::InvalidData("entity_id is required".to_string()));
    }

    for entity_id in entity_ids {
        let entity = component
            .get(&entity_id)
            .ok_or_else(|| ServiceError::CallFailed(format!("unknown entity: {}", entity_id)))?;
        if !description.accepts(entity.supported_features().bits()) {
            return Err(ServiceError::NotSupported {
                entity_id,
                service: call.service.clone(),
            });
        }

        let command = command
            .clone()
            .converted(component.system_unit(), entity.temperature_unit());
        debug!(service = %call.service_id(), entity_id = %entity_id, ?command, "Dispatching command");

        entity
            .execute(command)
            .await
            .map_err(|err| service_error(err, &entity_id, &call.service))?;
        entity.write_state(call.context.clone());
    }

    Ok(())
}
