//! State type representing an entity's published state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Context, EntityId, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// Attribute map published alongside a state value
pub type AttributeMap = HashMap<String, serde_json::Value>;

/// The published state of an entity at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// The entity this state belongs to
    pub entity_id: EntityId,

    /// The state value (e.g. "heat_cool", "idle", "unavailable")
    pub state: String,

    /// Projected attributes
    #[serde(default)]
    pub attributes: AttributeMap,

    /// When the state value last changed
    pub last_changed: DateTime<Utc>,

    /// When the state was last written, even if unchanged
    pub last_updated: DateTime<Utc>,

    /// Context of the write that produced this state
    pub context: Context,
}

impl State {
    /// Create a new state with current timestamp
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: AttributeMap,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
            context,
        }
    }

    /// Create an updated state, preserving last_changed if the value is the same
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: AttributeMap,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let last_changed = if self.state == new_state {
            self.last_changed
        } else {
            now
        };

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed,
            last_updated: now,
            context,
        }
    }

    /// The state value is `unavailable`
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// The state value is `unknown`
    pub fn is_unknown(&self) -> bool {
        self.state == STATE_UNKNOWN
    }

    /// Get an attribute value by key, deserialized into `T`
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps and context are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}
