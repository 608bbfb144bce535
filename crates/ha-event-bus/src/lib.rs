//! Event bus with typed pub/sub
//!
//! The state machine fires `state_changed` here; device triggers subscribe
//! to it. Delivery is fire-and-forget over tokio broadcast channels.

use dashmap::DashMap;
use ha_core::{Context, Event, EventData, EventType};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Default channel capacity for event subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus keyed by event type
pub struct EventBus {
    listeners: DashMap<EventType, broadcast::Sender<Event<serde_json::Value>>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe(
        &self,
        event_type: impl Into<EventType>,
    ) -> broadcast::Receiver<Event<serde_json::Value>> {
        let event_type = event_type.into();
        trace!(event_type = %event_type, "Subscribing to event type");

        self.listeners
            .entry(event_type)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Subscribe to a typed event, receiving parsed data
    pub fn subscribe_typed<T: EventData + serde::de::DeserializeOwned>(
        &self,
    ) -> TypedEventReceiver<T> {
        TypedEventReceiver {
            rx: self.subscribe(T::event_type()),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Fire an event to all subscribers of its type
    pub fn fire(&self, event: Event<serde_json::Value>) {
        debug!(event_type = %event.event_type, "Firing event");

        if let Some(sender) = self.listeners.get(&event.event_type) {
            // A send error only means nobody is listening right now
            let _ = sender.send(event);
        }
    }

    /// Fire a typed event
    pub fn fire_typed<T: EventData + serde::Serialize>(&self, data: T, context: Context) {
        let data = match serde_json::to_value(&data) {
            Ok(value) => value,
            Err(e) => {
                warn!(event_type = T::event_type(), error = %e, "Dropping unserializable event");
                return;
            }
        };
        self.fire(Event::new(T::event_type(), data, context));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiver for typed events
pub struct TypedEventReceiver<T> {
    rx: broadcast::Receiver<Event<serde_json::Value>>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: EventData + serde::de::DeserializeOwned> TypedEventReceiver<T> {
    /// Receive the next event whose data parses as `T`
    pub async fn recv(&mut self) -> Result<Event<T>, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if let Ok(data) = serde_json::from_value::<T>(event.data) {
                return Ok(Event {
                    event_type: event.event_type,
                    data,
                    time_fired: event.time_fired,
                    context: event.context,
                });
            }
        }
    }

    /// Non-blocking receive; `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<Event<T>> {
        loop {
            let event = self.rx.try_recv().ok()?;
            if let Ok(data) = serde_json::from_value::<T>(event.data) {
                return Some(Event {
                    event_type: event.event_type,
                    data,
                    time_fired: event.time_fired,
                    context: event.context,
                });
            }
        }
    }
}

/// Thread-safe wrapper for EventBus
pub type SharedEventBus = Arc<EventBus>;
