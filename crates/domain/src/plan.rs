//! Cleaning plan: which rooms each device will clean, and why the others won't.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::id::{EntityId, LocationId, SegmentId};

pub const NOT_SCHEDULED: &str = "Not Scheduled";
pub const DISABLED_BY_OVERRIDE: &str = "Disabled by Override";
pub const SCHEDULED: &str = "Scheduled";
/// Readiness reason when the signal carries none.
pub const UNKNOWN_REASON: &str = "Unknown";
/// Readiness reason when the signal itself is missing.
pub const SIGNAL_UNAVAILABLE: &str = "Sensor Unavailable";

/// Which rooms a plan considers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "locations", rename_all = "snake_case")]
pub enum Selection {
    /// Enabled, ready, not overridden.
    #[default]
    Scheduled,
    /// Operator-named locations; toggles and readiness are ignored.
    Locations(Vec<LocationId>),
}

/// The three external signals a room is judged on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSignals {
    pub enabled: bool,
    pub overridden: bool,
    pub ready: bool,
    pub readiness_reason: String,
}

/// Outcome for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub will_clean: bool,
    pub reasons: Vec<String>,
}

impl Decision {
    /// Comma-joined reasons, or [`SCHEDULED`] when there are none.
    #[must_use]
    pub fn display_reason(&self) -> String {
        if self.reasons.is_empty() {
            return SCHEDULED.to_string();
        }
        self.reasons.join(", ")
    }
}

/// Decide whether a room is cleaned.
#[must_use]
pub fn decide(signals: &ControlSignals, location: &LocationId, selection: &Selection) -> Decision {
    let will_clean = match selection {
        Selection::Locations(locations) => locations.contains(location),
        Selection::Scheduled => signals.enabled && signals.ready && !signals.overridden,
    };

    let mut reasons = Vec::new();
    if !signals.enabled {
        reasons.push(NOT_SCHEDULED.to_string());
    }
    if signals.overridden {
        reasons.push(DISABLED_BY_OVERRIDE.to_string());
    }
    if !signals.ready {
        reasons.push(signals.readiness_reason.clone());
    }

    Decision {
        will_clean,
        reasons,
    }
}

/// One room's line in the plan readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub slug: String,
    pub location: LocationId,
    pub will_clean: bool,
    pub enabled: bool,
    pub overridden: bool,
    pub ready: bool,
    pub reason: String,
    pub reasons: Vec<String>,
    pub readiness_reason: String,
    pub enable_control: EntityId,
    pub override_control: EntityId,
}

/// Everything one device will be asked to do.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DevicePlan {
    pub rooms: Vec<RoomSummary>,
    /// Deduplicated union of the segments of every room that will be cleaned.
    pub segments: BTreeSet<SegmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_command: Option<Command>,
}

impl DevicePlan {
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.rooms.iter().filter(|r| r.will_clean).count()
    }

    #[must_use]
    pub fn segment_list(&self) -> Vec<SegmentId> {
        self.segments.iter().copied().collect()
    }
}

/// Per-device cleaning jobs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CleaningPlan {
    pub devices: BTreeMap<EntityId, DevicePlan>,
}

impl CleaningPlan {
    /// Record a room; its segments join the device job only if it will be cleaned.
    pub fn add_room(&mut self, device: &EntityId, summary: RoomSummary, segments: &[SegmentId]) {
        let entry = self.devices.entry(device.clone()).or_default();
        if summary.will_clean {
            entry.segments.extend(segments.iter().copied());
        }
        entry.rooms.push(summary);
    }

    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.devices.values().map(DevicePlan::scheduled_count).sum()
    }

    /// One-line readout, e.g. `3 Rooms Scheduled`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} Rooms Scheduled", self.scheduled_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(enabled: bool, overridden: bool, ready: bool) -> ControlSignals {
        ControlSignals {
            enabled,
            overridden,
            ready,
            readiness_reason: "Occupied".to_string(),
        }
    }

    fn summary(location: &str, will_clean: bool) -> RoomSummary {
        RoomSummary {
            name: location.to_string(),
            slug: location.to_string(),
            location: LocationId::new(location),
            will_clean,
            enabled: true,
            overridden: false,
            ready: true,
            reason: SCHEDULED.to_string(),
            reasons: Vec::new(),
            readiness_reason: "Ready".to_string(),
            enable_control: EntityId::new(format!("switch.tidyhub_clean_{location}")),
            override_control: EntityId::new(format!("switch.tidyhub_disable_{location}")),
        }
    }

    #[test]
    fn should_schedule_enabled_ready_room() {
        let d = decide(&signals(true, false, true), &LocationId::new("k"), &Selection::Scheduled);
        assert!(d.will_clean);
        assert!(d.reasons.is_empty());
        assert_eq!(d.display_reason(), "Scheduled");
    }

    #[test]
    fn should_not_clean_when_overridden_even_if_enabled_and_ready() {
        let d = decide(&signals(true, true, true), &LocationId::new("k"), &Selection::Scheduled);
        assert!(!d.will_clean);
        assert_eq!(d.reasons, vec!["Disabled by Override".to_string()]);
    }

    #[test]
    fn should_collect_every_reason_in_order() {
        let d = decide(&signals(false, true, false), &LocationId::new("k"), &Selection::Scheduled);
        assert_eq!(
            d.reasons,
            vec![
                "Not Scheduled".to_string(),
                "Disabled by Override".to_string(),
                "Occupied".to_string()
            ]
        );
        assert_eq!(d.display_reason(), "Not Scheduled, Disabled by Override, Occupied");
    }

    #[test]
    fn should_clean_named_location_even_when_disabled() {
        let selection = Selection::Locations(vec![LocationId::new("k")]);
        let d = decide(&signals(false, true, false), &LocationId::new("k"), &selection);
        assert!(d.will_clean);
        assert!(!d.reasons.is_empty());
    }

    #[test]
    fn should_skip_unnamed_location_in_manual_selection() {
        let selection = Selection::Locations(vec![LocationId::new("other")]);
        let d = decide(&signals(true, false, true), &LocationId::new("k"), &selection);
        assert!(!d.will_clean);
    }

    #[test]
    fn should_dedupe_segments_across_rooms_on_one_device() {
        let device = EntityId::new("vacuum.robot");
        let mut plan = CleaningPlan::default();
        plan.add_room(&device, summary("a", true), &[SegmentId::new(1), SegmentId::new(2)]);
        plan.add_room(&device, summary("b", true), &[SegmentId::new(2), SegmentId::new(3)]);
        plan.add_room(&device, summary("c", false), &[SegmentId::new(9)]);

        let job = &plan.devices[&device];
        assert_eq!(
            job.segment_list(),
            vec![SegmentId::new(1), SegmentId::new(2), SegmentId::new(3)]
        );
        assert_eq!(job.rooms.len(), 3);
        assert_eq!(plan.summary(), "2 Rooms Scheduled");
    }

    #[test]
    fn should_serialize_selection_with_mode_tag() {
        let json = serde_json::to_value(Selection::Locations(vec![LocationId::new("k")])).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "locations", "locations": ["k"]}));
    }
}
