//! Listings and capability descriptions shown to automation editors

use ha_climate::ClimateEnum;
use ha_core::EntityId;
use serde::Serialize;

/// One automation offered for an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceAutomation {
    pub domain: &'static str,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl DeviceAutomation {
    pub(crate) fn for_entity(entity_id: &EntityId, kind: &'static str) -> Self {
        Self {
            domain: ha_heater_cooler::DOMAIN,
            entity_id: entity_id.to_string(),
            kind,
        }
    }
}

/// Entries for each of `kinds`, or nothing when `entity_id` is not a
/// heater/cooler
pub(crate) fn list_for(entity_id: &EntityId, kinds: &[&'static str]) -> Vec<DeviceAutomation> {
    if entity_id.domain() != ha_heater_cooler::DOMAIN {
        return Vec::new();
    }
    kinds
        .iter()
        .map(|kind| DeviceAutomation::for_entity(entity_id, kind))
        .collect()
}

/// Value accepted by an extra field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// One of a fixed list
    Select { options: Vec<&'static str> },
    /// A number, optionally shown with a unit
    Float {
        #[serde(skip_serializing_if = "Option::is_none")]
        suffix: Option<&'static str>,
    },
    /// A positive time period
    Duration,
}

impl FieldKind {
    pub fn select<E: ClimateEnum>() -> Self {
        FieldKind::Select {
            options: E::options(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraField {
    pub name: &'static str,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl ExtraField {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: true,
            kind,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }
}

/// Fields an automation of some type takes beyond `type` and `entity_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capabilities {
    pub extra_fields: Vec<ExtraField>,
}

impl Capabilities {
    pub fn new(extra_fields: Vec<ExtraField>) -> Self {
        Self { extra_fields }
    }

    pub fn field(&self, name: &str) -> Option<&ExtraField> {
        self.extra_fields.iter().find(|field| field.name == name)
    }
}
