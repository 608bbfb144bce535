//! Reproduce saved heater/cooler states

use crate::*;
use futures::future::join_all;
use ha_climate::attributes::*;
use ha_climate::{ClimateEnum, HvacMode};
use ha_core::{Context, State, ATTR_ENTITY_ID};
use ha_service_registry::{ServiceRegistry, ServiceResult};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Calls needed to bring an entity back to `state`, in order
pub fn reproduce_calls(state: &State) -> Vec<(&'static str, Value)> {
    let data = |keys: &[&str]| {
        let mut data = Map::new();
        data.insert(ATTR_ENTITY_ID.to_string(), Value::from(state.entity_id.to_string()));
        for key in keys {
            if let Some(value) = state.attributes.get(*key).filter(|v| !v.is_null()) {
                data.insert(key.to_string(), value.clone());
            }
        }
        data
    };
    let has = |key: &str| state.attributes.get(key).is_some_and(|v| !v.is_null());

    let mut calls = Vec::new();

    if has(ATTR_ACTIVE) {
        calls.push((SERVICE_SET_ACTIVE, Value::Object(data(&[ATTR_ACTIVE]))));
    }

    if has(ATTR_TARGET_STATE) {
        calls.push((SERVICE_SET_TARGET_STATE, Value::Object(data(&[ATTR_TARGET_STATE]))));
    }

    if let Ok(mode) = state.state.parse::<HvacMode>() {
        let mut mode_data = data(&[]);
        mode_data.insert(ATTR_HVAC_MODE.to_string(), Value::from(mode.as_str()));
        calls.push((SERVICE_SET_HVAC_MODE, Value::Object(mode_data)));
    }

    if has(ATTR_TEMPERATURE) {
        calls.push((SERVICE_SET_TEMPERATURE, Value::Object(data(&[ATTR_TEMPERATURE]))));
    } else if has(ATTR_TARGET_TEMP_LOW) && has(ATTR_TARGET_TEMP_HIGH) {
        calls.push((
            SERVICE_SET_TEMPERATURE,
            Value::Object(data(&[ATTR_TARGET_TEMP_LOW, ATTR_TARGET_TEMP_HIGH])),
        ));
    }

    calls
}

async fn reproduce_state(registry: &ServiceRegistry, state: &State, context: Context) -> ServiceResult {
    if state.is_unavailable() || state.is_unknown() {
        warn!(entity_id = %state.entity_id, state = %state.state, "Cannot reproduce state");
        return Ok(());
    }

    for (service, data) in reproduce_calls(state) {
        debug!(entity_id = %state.entity_id, service, "Reproducing state");
        registry.call(DOMAIN, service, data, context.clone()).await?;
    }
    Ok(())
}

/// Reproduce every state concurrently, returning the first failure
pub async fn reproduce_states(
    registry: &ServiceRegistry,
    states: &[State],
    context: Context,
) -> ServiceResult {
    let results = join_all(
        states
            .iter()
            .map(|state| reproduce_state(registry, state, context.child())),
    )
    .await;

    results.into_iter().collect()
}
