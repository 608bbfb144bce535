//! Device conditions
//!
//! Conditions are pure predicates over the latest published state. An entity
//! that is missing, unknown or unavailable satisfies none of them.

use ha_climate::attributes::{ATTR_ACTIVE, ATTR_CURRENT_STATE, ATTR_TARGET_STATE};
use ha_climate::{Active, ClimateEnum, CurrentState, TargetState};
use ha_core::EntityId;
use ha_state_machine::StateMachine;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::capabilities::{list_for, Capabilities, DeviceAutomation, ExtraField, FieldKind};
use crate::error::{AutomationError, AutomationResult};
use crate::trigger_eval::watched;

pub const CONDITION_IS_ACTIVE: &str = "is_active";
pub const CONDITION_IS_CURRENT_STATE: &str = "is_current_state";
pub const CONDITION_IS_TARGET_STATE: &str = "is_target_state";

pub const CONDITION_TYPES: [&str; 3] = [
    CONDITION_IS_ACTIVE,
    CONDITION_IS_CURRENT_STATE,
    CONDITION_IS_TARGET_STATE,
];

/// Condition definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceCondition {
    IsActive {
        entity_id: EntityId,
        active: Active,
    },
    IsCurrentState {
        entity_id: EntityId,
        current_state: CurrentState,
    },
    IsTargetState {
        entity_id: EntityId,
        target_state: TargetState,
    },
}

impl DeviceCondition {
    /// Parse a condition configuration
    pub fn from_value(config: serde_json::Value) -> AutomationResult<Self> {
        let kind = config
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AutomationError::InvalidConfig("missing condition type".into()))?;
        if !CONDITION_TYPES.contains(&kind) {
            return Err(AutomationError::UnknownType {
                kind: "condition",
                value: kind.to_string(),
            });
        }
        Ok(serde_json::from_value(config)?)
    }

    pub fn entity_id(&self) -> &EntityId {
        match self {
            DeviceCondition::IsActive { entity_id, .. }
            | DeviceCondition::IsCurrentState { entity_id, .. }
            | DeviceCondition::IsTargetState { entity_id, .. } => entity_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeviceCondition::IsActive { .. } => CONDITION_IS_ACTIVE,
            DeviceCondition::IsCurrentState { .. } => CONDITION_IS_CURRENT_STATE,
            DeviceCondition::IsTargetState { .. } => CONDITION_IS_TARGET_STATE,
        }
    }

    /// Test the condition against the current state of its entity
    pub fn check(&self, states: &StateMachine) -> bool {
        let state = states.get(&self.entity_id().to_string());
        let result = match self {
            DeviceCondition::IsActive { active, .. } => {
                watched::<Active>(state.as_ref(), ATTR_ACTIVE, false) == Some(*active)
            }
            DeviceCondition::IsCurrentState { current_state, .. } => {
                watched::<CurrentState>(state.as_ref(), ATTR_CURRENT_STATE, true)
                    == Some(*current_state)
            }
            DeviceCondition::IsTargetState { target_state, .. } => {
                watched::<TargetState>(state.as_ref(), ATTR_TARGET_STATE, false)
                    == Some(*target_state)
            }
        };
        trace!(entity_id = %self.entity_id(), kind = self.kind(), result, "Checked condition");
        result
    }
}

/// Conditions offered for `entity_id`
pub fn list_conditions(entity_id: &EntityId) -> Vec<DeviceAutomation> {
    list_for(entity_id, &CONDITION_TYPES)
}

/// Extra fields of a condition type
pub fn condition_capabilities(kind: &str) -> AutomationResult<Capabilities> {
    let field = match kind {
        CONDITION_IS_ACTIVE => ExtraField::required(ATTR_ACTIVE, FieldKind::select::<Active>()),
        CONDITION_IS_CURRENT_STATE => {
            ExtraField::required(ATTR_CURRENT_STATE, FieldKind::select::<CurrentState>())
        }
        CONDITION_IS_TARGET_STATE => {
            ExtraField::required(ATTR_TARGET_STATE, FieldKind::select::<TargetState>())
        }
        other => {
            return Err(AutomationError::UnknownType {
                kind: "condition",
                value: other.to_string(),
            })
        }
    };
    Ok(Capabilities::new(vec![field]))
}
