//! Entity: a named value on the state bus, plus its directory record.
//!
//! An [`EntitySnapshot`] is what the state bus delivers: the current value and
//! attributes of one entity. An [`EntityRecord`] is what the device directory
//! knows about the same entity: which device and location it belongs to and
//! what kind of sensor it is.

mod attribute_value;
mod state;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use crate::id::{DeviceId, EntityId, LocationId};
use crate::time::{Timestamp, now};

/// Attribute carrying the sensor kind (`door`, `occupancy`, …).
pub const DEVICE_CLASS: &str = "device_class";

/// Current value and attributes of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub state: EntityState,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
}

impl EntitySnapshot {
    /// Snapshot with no attributes, stamped now.
    #[must_use]
    pub fn new(entity_id: impl Into<EntityId>, state: impl Into<EntityState>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: HashMap::new(),
            last_changed: now(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// The live `device_class` attribute, if the entity reports one.
    #[must_use]
    pub fn device_class(&self) -> Option<&str> {
        self.get_attribute(DEVICE_CLASS).and_then(AttributeValue::as_str)
    }
}

/// Directory entry for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: EntityId,
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    /// Location assigned to the entity itself; `None` inherits the device's.
    #[serde(default)]
    pub location: Option<LocationId>,
    #[serde(default)]
    pub device_class: Option<String>,
}

impl EntityRecord {
    #[must_use]
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            device_id: None,
            location: None,
            device_class: None,
        }
    }

    #[must_use]
    pub fn device(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<LocationId>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn device_class(mut self, class: impl Into<String>) -> Self {
        self.device_class = Some(class.into());
        self
    }
}

/// Resolve an entity's sensor kind, preferring the live attribute over the
/// directory record.
#[must_use]
pub fn effective_device_class<'a>(
    snapshot: Option<&'a EntitySnapshot>,
    record: Option<&'a EntityRecord>,
) -> Option<&'a str> {
    snapshot
        .and_then(EntitySnapshot::device_class)
        .or_else(|| record.and_then(|r| r.device_class.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_device_class_from_attributes() {
        let snap = EntitySnapshot::new("binary_sensor.hall_door", EntityState::Off)
            .with_attribute(DEVICE_CLASS, "door");
        assert_eq!(snap.device_class(), Some("door"));
    }

    #[test]
    fn should_prefer_live_device_class_over_record() {
        let snap = EntitySnapshot::new("binary_sensor.x", EntityState::Off)
            .with_attribute(DEVICE_CLASS, "occupancy");
        let record = EntityRecord::new("binary_sensor.x").device_class("door");
        assert_eq!(
            effective_device_class(Some(&snap), Some(&record)),
            Some("occupancy")
        );
    }

    #[test]
    fn should_fall_back_to_record_device_class() {
        let snap = EntitySnapshot::new("binary_sensor.x", EntityState::Off);
        let record = EntityRecord::new("binary_sensor.x").device_class("door");
        assert_eq!(effective_device_class(Some(&snap), Some(&record)), Some("door"));
        assert_eq!(effective_device_class(None, None), None);
    }

    #[test]
    fn should_deserialize_snapshot_attributes() {
        let json = r#"{
            "entity_id": "vacuum.robot",
            "state": "cleaning",
            "attributes": {"current_segment": 4},
            "last_changed": "2024-01-01T00:00:00Z"
        }"#;
        let snap: EntitySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.state.as_str(), "cleaning");
        assert_eq!(
            snap.get_attribute("current_segment"),
            Some(&AttributeValue::Int(4))
        );
    }
}
