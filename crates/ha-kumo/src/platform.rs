//! Platform setup: one coordinator and one climate entity per indoor unit

use crate::climate::{subscribe_climate, KumoClimate};
use crate::config::KumoConfig;
use crate::coordinator::{SharedUpdateCoordinator, UpdateCoordinator};
use crate::error::{KumoError, KumoResult};
use crate::power::KumoPowerSwitch;
use crate::translator::ModeTranslator;
use crate::unit::{KumoAccount, KumoUnit};
use ha_core::EntityId;
use ha_heater_cooler::{EntityComponent, HeaterCoolerEntity};
use ha_state_machine::SharedStateMachine;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Domain of the synthesized power switches
pub const SWITCH_DOMAIN: &str = "switch";

/// Entities created for one indoor unit
pub struct KumoDevice<U> {
    pub coordinator: SharedUpdateCoordinator<U>,
    pub climate: Arc<HeaterCoolerEntity<KumoClimate<U>>>,
    pub power_switch: Option<Arc<KumoPowerSwitch<U>>>,
}

/// Everything set up for a Kumo account
pub struct KumoPlatform<U> {
    devices: Vec<KumoDevice<U>>,
}

/// Id for `name` in `domain`, suffixed `_2`, `_3`, ... while `taken`
fn unique_entity_id(
    domain: &str,
    name: &str,
    taken: impl Fn(&str) -> bool,
) -> KumoResult<EntityId> {
    let invalid = |e: ha_core::EntityIdError| KumoError::InvalidName(format!("{}: {}", name, e));
    let base = EntityId::from_name(domain, name).map_err(invalid)?;

    let mut candidate = base.clone();
    let mut suffix = 2;
    while taken(&candidate.to_string()) {
        candidate = EntityId::new(domain, format!("{}_{}", base.object_id(), suffix))
            .map_err(invalid)?;
        suffix += 1;
    }
    if candidate != base {
        warn!(%base, entity_id = %candidate, "Entity id already in use");
    }
    Ok(candidate)
}

impl<U: KumoUnit + 'static> KumoPlatform<U> {
    /// Discover the units of `account` and set them up
    pub async fn connect<A>(
        account: &A,
        config: &KumoConfig,
        component: &EntityComponent,
        states: SharedStateMachine,
    ) -> KumoResult<Self>
    where
        A: KumoAccount<Unit = U>,
    {
        let options = config.connect_options();
        let units = account.indoor_units(&options).await?;
        info!(units = units.len(), prefer_cache = options.prefer_cache, "Discovered Kumo units");
        Self::setup(units, config, component, states)
    }

    /// Create and register the entities of `units`
    ///
    /// Climate entities are added to `component` so the heater/cooler services
    /// reach them. Power switches are only created when enabled in `config`.
    /// Units sharing a name get suffixed entity ids.
    pub fn setup(
        units: Vec<Arc<U>>,
        config: &KumoConfig,
        component: &EntityComponent,
        states: SharedStateMachine,
    ) -> KumoResult<Self> {
        if units.is_empty() {
            return Err(KumoError::NoIndoorUnits);
        }

        let translator = ModeTranslator::kumo();
        let mut devices = Vec::with_capacity(units.len());
        let mut assigned: HashSet<String> = HashSet::new();
        for unit in units {
            let name = match unit.name().trim() {
                "" => crate::DEFAULT_NAME.to_string(),
                name => name.to_string(),
            };
            let taken = |id: &str| {
                assigned.contains(id) || component.contains(id) || states.get(id).is_some()
            };
            let climate_id = unique_entity_id(ha_heater_cooler::DOMAIN, &name, taken)?;
            let switch_id = if config.enable_power_switch {
                Some(unique_entity_id(SWITCH_DOMAIN, &name, taken)?)
            } else {
                None
            };
            assigned.insert(climate_id.to_string());
            assigned.extend(switch_id.iter().map(ToString::to_string));

            let coordinator = Arc::new(UpdateCoordinator::new(
                unit.clone(),
                config.scan_interval(),
            ));

            let climate = Arc::new(HeaterCoolerEntity::new(
                climate_id,
                Arc::new(KumoClimate::new(unit.clone(), translator)),
                component.system_unit(),
                states.clone(),
            ));
            subscribe_climate(&coordinator, climate.clone());
            component.add(climate.clone());

            let power_switch = switch_id.map(|switch_id| {
                let switch = Arc::new(KumoPowerSwitch::new(
                    switch_id,
                    unit.clone(),
                    translator,
                    states.clone(),
                ));
                switch.subscribe(&coordinator);
                switch
            });

            info!(
                unit = %name,
                serial = unit.serial(),
                power_switch = power_switch.is_some(),
                "Set up Kumo unit"
            );
            devices.push(KumoDevice {
                coordinator,
                climate,
                power_switch,
            });
        }

        Ok(Self { devices })
    }

    pub fn devices(&self) -> &[KumoDevice<U>] {
        &self.devices
    }

    pub fn power_switch(&self, entity_id: &str) -> Option<&Arc<KumoPowerSwitch<U>>> {
        self.devices
            .iter()
            .filter_map(|device| device.power_switch.as_ref())
            .find(|switch| switch.entity_id().to_string() == entity_id)
    }

    /// Refresh every unit once; failures are counted by each coordinator
    pub async fn refresh_all(&self) {
        let refreshes = self
            .devices
            .iter()
            .map(|device| device.coordinator.refresh());
        futures::future::join_all(refreshes).await;
    }

    /// Spawn the polling loop of every coordinator
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.devices
            .iter()
            .map(|device| tokio::spawn(device.coordinator.clone().run()))
            .collect()
    }
}
