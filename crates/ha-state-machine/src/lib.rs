//! State machine with domain indexing
//!
//! Holds the latest published [`State`] of every entity. Entities write their
//! projected state here after each snapshot refresh; conditions read it and
//! triggers observe the `state_changed` events it fires.

use dashmap::DashMap;
use ha_core::events::StateChangedData;
use ha_core::{AttributeMap, Context, EntityId, State};
use ha_event_bus::EventBus;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// The latest state of every entity
pub struct StateMachine {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    /// Entity ids by domain
    domain_index: DashMap<String, Vec<String>>,
    event_bus: Arc<EventBus>,
}

impl StateMachine {
    /// Create a new state machine with the given event bus
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            states: DashMap::new(),
            domain_index: DashMap::new(),
            event_bus,
        }
    }

    /// The event bus state changes are fired on
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Set the state of an entity and fire STATE_CHANGED
    ///
    /// `last_changed` only moves when the state value itself changes.
    #[instrument(skip(self, state, attributes, context), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: AttributeMap,
        context: Context,
    ) -> State {
        let key = entity_id.to_string();
        let old_state = self.states.get(&key).map(|s| s.clone());

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes, context.clone()),
            None => State::new(entity_id.clone(), state, attributes, context.clone()),
        };

        debug!(
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(key.clone(), new_state.clone());

        if old_state.is_none() {
            self.domain_index
                .entry(entity_id.domain().to_string())
                .or_default()
                .push(key);
        }

        self.event_bus.fire_typed(
            StateChangedData {
                entity_id,
                old_state,
                new_state: Some(new_state.clone()),
            },
            context,
        );

        new_state
    }

    /// Get the current state of an entity
    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// Get the state value, or None if the entity doesn't exist
    pub fn get_state(&self, entity_id: &str) -> Option<String> {
        self.states.get(entity_id).map(|s| s.state.clone())
    }

    /// All entity IDs of a domain
    pub fn entity_ids(&self, domain: &str) -> Vec<String> {
        self.domain_index
            .get(domain)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Remove an entity's state, firing STATE_CHANGED with no new state
    #[instrument(skip(self, context), fields(entity_id = %entity_id))]
    pub fn remove(&self, entity_id: &EntityId, context: Context) -> Option<State> {
        let key = entity_id.to_string();
        let old_state = self.states.remove(&key).map(|(_, s)| s);

        if let Some(state) = &old_state {
            trace!("Removing entity state");

            if let Some(mut ids) = self.domain_index.get_mut(entity_id.domain()) {
                ids.retain(|id| id != &key);
            }

            self.event_bus.fire_typed(
                StateChangedData {
                    entity_id: entity_id.clone(),
                    old_state: Some(state.clone()),
                    new_state: None,
                },
                context,
            );
        }

        old_state
    }
}

/// Thread-safe wrapper for StateMachine
pub type SharedStateMachine = Arc<StateMachine>;
