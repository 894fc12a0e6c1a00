//! Declarative description of a virtual home.
//!
//! The daemon reads it from the `[home]` section of its configuration; tests
//! build it in code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSpec {
    pub locations: Vec<LocationSpec>,
    pub devices: Vec<DeviceSpec>,
    pub entities: Vec<EntitySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub entity_id: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device_class: Option<String>,
    #[serde(default = "EntitySpec::default_state")]
    pub state: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl EntitySpec {
    fn default_state() -> String {
        "unknown".to_string()
    }

    #[must_use]
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            device: None,
            location: None,
            device_class: None,
            state: state.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn in_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn of_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    #[must_use]
    pub fn class(mut self, device_class: impl Into<String>) -> Self {
        self.device_class = Some(device_class.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl HomeSpec {
    #[must_use]
    pub fn location(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.locations.push(LocationSpec {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    #[must_use]
    pub fn device(mut self, device: DeviceSpec) -> Self {
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: EntitySpec) -> Self {
        self.entities.push(entity);
        self
    }

    /// A small flat with one robot, used when no home is configured.
    #[must_use]
    pub fn demo() -> Self {
        Self::default()
            .location("kitchen", "Kitchen")
            .location("hallway", "Hallway")
            .location("living_room", "Living Room")
            .device(DeviceSpec {
                id: "robot".to_string(),
                name: "Robot".to_string(),
                manufacturer: Some("Roborock".to_string()),
                model: Some("S7".to_string()),
                location: Some("hallway".to_string()),
            })
            .entity(
                EntitySpec::new("vacuum.robot", "docked")
                    .of_device("robot")
                    .attribute(
                        "rooms",
                        serde_json::json!({"16": "Kitchen", "17": "Hallway", "18": "Living Room"}),
                    ),
            )
            .entity(
                EntitySpec::new("binary_sensor.kitchen_motion", "off")
                    .in_location("kitchen")
                    .class("occupancy"),
            )
            .entity(
                EntitySpec::new("binary_sensor.living_room_door", "on")
                    .in_location("living_room")
                    .class("door"),
            )
    }
}
