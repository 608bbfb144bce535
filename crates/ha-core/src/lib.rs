//! Core entity types
//!
//! The fundamental types shared by the heater/cooler crates: [`EntityId`],
//! [`State`], [`Event`], [`Context`] and [`ServiceCall`].

mod context;
mod entity_id;
mod event;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use event::{Event, EventData, EventType};
pub use service_call::ServiceCall;
pub use state::{AttributeMap, State};

/// State value for an entity whose value has never been reported
pub const STATE_UNKNOWN: &str = "unknown";

/// State value for an entity whose device cannot be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Generic "on" state value
pub const STATE_ON: &str = "on";

/// Generic "off" state value
pub const STATE_OFF: &str = "off";

/// Service data key naming the target entity
pub const ATTR_ENTITY_ID: &str = "entity_id";

/// Attribute holding the display name of an entity
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";

/// Standard event types
pub mod events {
    use super::*;

    /// Event type for state changes
    pub const STATE_CHANGED: &str = "state_changed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }

    impl EventData for StateChangedData {
        fn event_type() -> &'static str {
            STATE_CHANGED
        }
    }
}
