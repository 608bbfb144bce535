//! Polling coordinator for one unit
//!
//! Each refresh fetches the unit status once and hands every subscribed
//! entity the complete [`KumoReading`]. Entities register exactly one handler
//! each; registering again replaces the previous handler.

use crate::error::KumoResult;
use crate::unit::{KumoReading, KumoUnit};
use crate::MAX_AVAILABILITY_TRIES;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Callback receiving every refreshed reading
pub type UpdateHandler = Arc<dyn Fn(Arc<KumoReading>) + Send + Sync>;

/// Polls one unit and fans the reading out to its entities
pub struct UpdateCoordinator<U> {
    unit: Arc<U>,
    handlers: DashMap<String, UpdateHandler>,
    failures: AtomicU32,
    available: AtomicBool,
    interval: Duration,
}

impl<U: KumoUnit + 'static> UpdateCoordinator<U> {
    pub fn new(unit: Arc<U>, interval: Duration) -> Self {
        Self {
            unit,
            handlers: DashMap::new(),
            failures: AtomicU32::new(0),
            available: AtomicBool::new(true),
            interval,
        }
    }

    pub fn unit(&self) -> &Arc<U> {
        &self.unit
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the unit answered within the last few attempts
    pub fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Register the update handler of `entity_id`
    pub fn subscribe<F>(&self, entity_id: impl Into<String>, handler: F)
    where
        F: Fn(Arc<KumoReading>) + Send + Sync + 'static,
    {
        let entity_id = entity_id.into();
        if self
            .handlers
            .insert(entity_id.clone(), Arc::new(handler))
            .is_some()
        {
            debug!(%entity_id, "Replaced update handler");
        }
    }

    pub fn unsubscribe(&self, entity_id: &str) -> bool {
        self.handlers.remove(entity_id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    fn notify(&self, reading: Arc<KumoReading>) {
        // Collect first so handlers may subscribe without deadlocking the map
        let handlers: Vec<UpdateHandler> = self.handlers.iter().map(|h| h.value().clone()).collect();
        for handler in handlers {
            handler(reading.clone());
        }
    }

    /// Fetch the unit status once and push the reading to every handler
    ///
    /// After [`MAX_AVAILABILITY_TRIES`] consecutive failures the unit is
    /// marked unavailable and handlers receive a reading flagged as such.
    #[instrument(skip(self), fields(serial = %self.unit.serial()))]
    pub async fn refresh(&self) -> KumoResult<Arc<KumoReading>> {
        match self.unit.update_status().await {
            Ok(()) => {
                if self.failures.swap(0, Ordering::SeqCst) >= MAX_AVAILABILITY_TRIES {
                    debug!("Unit is reachable again");
                }
                let available = self.unit.available();
                self.available.store(available, Ordering::SeqCst);

                let reading = Arc::new(KumoReading::read(self.unit.as_ref(), available));
                self.notify(reading.clone());
                Ok(reading)
            }
            Err(err) => {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= MAX_AVAILABILITY_TRIES {
                    if self.available.swap(false, Ordering::SeqCst) {
                        warn!(failures, %err, "Marking unit unavailable");
                    }
                    self.notify(Arc::new(KumoReading::read(self.unit.as_ref(), false)));
                } else {
                    debug!(failures, %err, "Status update failed");
                }
                Err(err)
            }
        }
    }

    /// Refresh on every tick of the scan interval, forever
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // Failures are logged by refresh and counted toward availability
            let _ = self.refresh().await;
        }
    }
}

/// Thread-safe wrapper for UpdateCoordinator
pub type SharedUpdateCoordinator<U> = Arc<UpdateCoordinator<U>>;
