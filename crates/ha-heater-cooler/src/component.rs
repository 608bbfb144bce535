//! Registry of heater/cooler entities addressed by services

use crate::command::HeaterCoolerCommand;
use async_trait::async_trait;
use dashmap::DashMap;
use ha_climate::{ClimateResult, SupportedFeatures, TemperatureUnit};
use ha_core::{Context, EntityId, State};
use std::sync::Arc;
use tracing::{debug, warn};

/// An entity that can execute heater/cooler commands
#[async_trait]
pub trait HeaterCoolerTarget: Send + Sync {
    fn entity_id(&self) -> &EntityId;

    /// Features the entity currently declares
    fn supported_features(&self) -> SupportedFeatures;

    /// Unit service temperatures are converted into before dispatch
    fn temperature_unit(&self) -> TemperatureUnit;

    /// Run one command to completion
    async fn execute(&self, command: HeaterCoolerCommand) -> ClimateResult<()>;

    /// Publish the current projected state
    fn write_state(&self, context: Context) -> State;
}

/// Heater/cooler entities of one host, keyed by entity id
pub struct EntityComponent {
    entities: DashMap<String, Arc<dyn HeaterCoolerTarget>>,
    system_unit: TemperatureUnit,
}

impl EntityComponent {
    pub fn new(system_unit: TemperatureUnit) -> Self {
        Self {
            entities: DashMap::new(),
            system_unit,
        }
    }

    /// Unit of the configured unit system
    pub fn system_unit(&self) -> TemperatureUnit {
        self.system_unit
    }

    /// Add an entity
    ///
    /// # Returns
    /// The entity previously registered under the same id, which is replaced
    pub fn add(
        &self,
        entity: Arc<dyn HeaterCoolerTarget>,
    ) -> Option<Arc<dyn HeaterCoolerTarget>> {
        let key = entity.entity_id().to_string();
        debug!(entity_id = %key, "Adding heater/cooler entity");
        let replaced = self.entities.insert(key.clone(), entity);
        if replaced.is_some() {
            warn!(entity_id = %key, "Replaced an existing heater/cooler entity");
        }
        replaced
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<dyn HeaterCoolerTarget>> {
        self.entities.get(entity_id).map(|e| e.clone())
    }

    pub fn remove(&self, entity_id: &str) -> Option<Arc<dyn HeaterCoolerTarget>> {
        self.entities.remove(entity_id).map(|(_, e)| e)
    }

    /// All entity ids, sorted
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entities.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Publish the state of every entity
    pub fn write_all(&self, context: Context) -> Vec<State> {
        self.entities
            .iter()
            .map(|e| e.write_state(context.clone()))
            .collect()
    }
}

/// Thread-safe wrapper for EntityComponent
pub type SharedEntityComponent = Arc<EntityComponent>;
