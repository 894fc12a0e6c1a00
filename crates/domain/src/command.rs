//! Commands: `(domain, action, payload)` requests for the command surface.
//!
//! [`CleaningStrategy`] picks the cleaning command for a device from a small
//! manufacturer table; anything unknown falls back to a full clean.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ValidationError;
use crate::id::{EntityId, SegmentId};

/// One invocation of the command surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub domain: String,
    pub action: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Command {
    #[must_use]
    pub fn new(domain: impl Into<String>, action: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            domain: domain.into(),
            action: action.into(),
            data,
        }
    }

    /// Turn a toggle on, addressed through its own domain
    /// (`input_boolean.turn_on` for an `input_boolean`).
    #[must_use]
    pub fn turn_on(entity_id: &EntityId) -> Self {
        Self::new(toggle_domain(entity_id), "turn_on", json!({ "entity_id": entity_id }))
    }

    #[must_use]
    pub fn turn_off(entity_id: &EntityId) -> Self {
        Self::new(toggle_domain(entity_id), "turn_off", json!({ "entity_id": entity_id }))
    }

    /// Full clean, for devices without segment support.
    #[must_use]
    pub fn start(device: &EntityId) -> Self {
        Self::new("vacuum", "start", json!({ "entity_id": device }))
    }

    #[must_use]
    pub fn return_to_base(device: &EntityId) -> Self {
        Self::new("vacuum", "return_to_base", json!({ "entity_id": device }))
    }

    /// `domain.action`, e.g. `vacuum.start`.
    #[must_use]
    pub fn service(&self) -> String {
        format!("{}.{}", self.domain, self.action)
    }

    /// The `entity_id` the command is aimed at, if any.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.data
            .get("entity_id")
            .and_then(serde_json::Value::as_str)
            .map(EntityId::from)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.service(), self.data)
    }
}

/// Ids without a domain prefix are treated as switches.
fn toggle_domain(entity_id: &EntityId) -> &str {
    if entity_id.as_str().contains('.') {
        entity_id.domain()
    } else {
        "switch"
    }
}

/// How a device is told to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStrategy {
    /// Generic `send_command` carrying an `app_segment_clean` request.
    AppSegmentClean,
    /// Vendor service taking the segment list directly.
    CleanSegmentService,
    /// No segment support: start a full clean.
    Start,
}

#[derive(Debug, Clone, Copy)]
enum ManufacturerMatch {
    Exact(&'static str),
    Contains(&'static str),
}

impl ManufacturerMatch {
    fn matches(self, manufacturer: &str) -> bool {
        match self {
            Self::Exact(name) => manufacturer == name,
            Self::Contains(fragment) => manufacturer.contains(fragment),
        }
    }
}

const STRATEGY_TABLE: &[(ManufacturerMatch, CleaningStrategy)] = &[
    (
        ManufacturerMatch::Exact("Roborock"),
        CleaningStrategy::AppSegmentClean,
    ),
    (
        ManufacturerMatch::Contains("Dreame"),
        CleaningStrategy::CleanSegmentService,
    ),
];

impl CleaningStrategy {
    /// Look the manufacturer up in the strategy table.
    #[must_use]
    pub fn for_manufacturer(manufacturer: Option<&str>) -> Self {
        manufacturer
            .and_then(|m| {
                STRATEGY_TABLE
                    .iter()
                    .find(|(pattern, _)| pattern.matches(m))
                    .map(|(_, strategy)| *strategy)
            })
            .unwrap_or(Self::Start)
    }

    /// Whether the command carries the segment list.
    #[must_use]
    pub fn targets_segments(self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Build the command for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoSegments`] when `segments` is empty.
    pub fn command(self, device: &EntityId, segments: &[SegmentId]) -> Result<Command, ValidationError> {
        if segments.is_empty() {
            return Err(ValidationError::NoSegments(device.to_string()));
        }
        let command = match self {
            Self::AppSegmentClean => Command::new(
                "vacuum",
                "send_command",
                json!({
                    "entity_id": device,
                    "command": "app_segment_clean",
                    "params": [{ "segments": segments, "repeat": 1 }],
                }),
            ),
            Self::CleanSegmentService => Command::new(
                "dreame_vacuum",
                "vacuum_clean_segment",
                json!({ "entity_id": device, "segments": segments }),
            ),
            Self::Start => Command::start(device),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<SegmentId> {
        vec![SegmentId::new(1), SegmentId::new(4)]
    }

    #[test]
    fn should_pick_strategy_from_manufacturer_table() {
        assert_eq!(
            CleaningStrategy::for_manufacturer(Some("Roborock")),
            CleaningStrategy::AppSegmentClean
        );
        assert_eq!(
            CleaningStrategy::for_manufacturer(Some("Dreame Technology")),
            CleaningStrategy::CleanSegmentService
        );
        assert_eq!(
            CleaningStrategy::for_manufacturer(Some("iRobot")),
            CleaningStrategy::Start
        );
        assert_eq!(CleaningStrategy::for_manufacturer(None), CleaningStrategy::Start);
    }

    #[test]
    fn should_build_app_segment_clean_command() {
        let device = EntityId::new("vacuum.robot");
        let cmd = CleaningStrategy::AppSegmentClean
            .command(&device, &segments())
            .unwrap();
        assert_eq!(cmd.service(), "vacuum.send_command");
        assert_eq!(cmd.data["command"], "app_segment_clean");
        assert_eq!(cmd.data["params"][0]["segments"], json!([1, 4]));
        assert_eq!(cmd.data["params"][0]["repeat"], 1);
        assert_eq!(cmd.target(), Some(device));
    }

    #[test]
    fn should_build_vendor_segment_service_command() {
        let device = EntityId::new("vacuum.dreame");
        let cmd = CleaningStrategy::CleanSegmentService
            .command(&device, &segments())
            .unwrap();
        assert_eq!(cmd.service(), "dreame_vacuum.vacuum_clean_segment");
        assert_eq!(cmd.data["segments"], json!([1, 4]));
    }

    #[test]
    fn should_fall_back_to_start_without_segments_in_payload() {
        let device = EntityId::new("vacuum.generic");
        let cmd = CleaningStrategy::Start.command(&device, &segments()).unwrap();
        assert_eq!(cmd.service(), "vacuum.start");
        assert!(cmd.data.get("segments").is_none());
    }

    #[test]
    fn should_reject_empty_segment_list() {
        let device = EntityId::new("vacuum.robot");
        let result = CleaningStrategy::AppSegmentClean.command(&device, &[]);
        assert_eq!(
            result,
            Err(ValidationError::NoSegments("vacuum.robot".to_string()))
        );
    }

    #[test]
    fn should_build_switch_and_return_commands() {
        let switch = EntityId::new("switch.tidyhub_clean_kitchen");
        assert_eq!(Command::turn_off(&switch).service(), "switch.turn_off");
        assert_eq!(Command::turn_on(&switch).target(), Some(switch));
        assert_eq!(
            Command::return_to_base(&EntityId::new("vacuum.robot")).service(),
            "vacuum.return_to_base"
        );
    }

    #[test]
    fn should_address_toggle_through_its_own_domain() {
        let helper = EntityId::new("input_boolean.kitchen_wants_cleaning");
        assert_eq!(Command::turn_off(&helper).service(), "input_boolean.turn_off");
        assert_eq!(Command::turn_on(&helper).service(), "input_boolean.turn_on");
        assert_eq!(
            Command::turn_off(&EntityId::new("bare_toggle")).service(),
            "switch.turn_off"
        );
    }
}
