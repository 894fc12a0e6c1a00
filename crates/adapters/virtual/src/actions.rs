//! How virtual entities respond to commands.
//!
//! Toggles understand `turn_on`, `turn_off` and `toggle`. The robot starts
//! cleaning on any of the cleaning commands, heading for the first requested
//! segment, and heads home on `return_to_base`.

use tidyhub_domain::command::Command;
use tidyhub_domain::entity::{EntitySnapshot, EntityState};
use tidyhub_domain::error::ActuationError;

/// Attribute the simulated robot reports its segment in.
pub const SEGMENT_ATTRIBUTE: &str = "current_segment";

pub(crate) const CLEANING: &str = "cleaning";
pub(crate) const RETURNING: &str = "returning";
pub(crate) const IDLE: &str = "idle";

/// Apply `command` to the target's current snapshot.
///
/// # Errors
///
/// Returns [`ActuationError::UnknownAction`] for a service the entity does
/// not support.
pub(crate) fn apply(command: &Command, snapshot: &mut EntitySnapshot) -> Result<(), ActuationError> {
    match (command.domain.as_str(), command.action.as_str()) {
        ("switch" | "input_boolean", "turn_on") => snapshot.state = EntityState::On,
        ("switch" | "input_boolean", "turn_off") => snapshot.state = EntityState::Off,
        ("switch" | "input_boolean", "toggle") => {
            snapshot.state = EntityState::from(!snapshot.state.is_on());
        }
        ("vacuum", "start") => snapshot.state = EntityState::from(CLEANING),
        ("vacuum", "send_command") | ("dreame_vacuum", "vacuum_clean_segment") => {
            snapshot.state = EntityState::from(CLEANING);
            if let Some(first) = first_segment(command) {
                snapshot.attributes.insert(SEGMENT_ATTRIBUTE.to_string(), first.into());
            }
        }
        ("vacuum", "return_to_base") => {
            snapshot.state = EntityState::from(RETURNING);
            snapshot.attributes.remove(SEGMENT_ATTRIBUTE);
        }
        ("vacuum", "stop") => snapshot.state = EntityState::from(IDLE),
        _ => return Err(ActuationError::UnknownAction(command.service())),
    }
    Ok(())
}

/// First segment of a segment-clean request, in either payload shape.
fn first_segment(command: &Command) -> Option<i64> {
    command
        .data
        .get("segments")
        .or_else(|| command.data.pointer("/params/0/segments"))
        .and_then(|segments| segments.get(0))
        .and_then(serde_json::Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tidyhub_domain::entity::AttributeValue;
    use tidyhub_domain::id::{EntityId, SegmentId};
    use tidyhub_domain::command::CleaningStrategy;

    fn robot() -> EntitySnapshot {
        EntitySnapshot::new("vacuum.robot", "docked")
    }

    #[test]
    fn should_toggle_switch_from_off_to_on() {
        let mut snapshot = EntitySnapshot::new("switch.tidyhub_clean_kitchen", EntityState::Off);
        let command = Command::new("switch", "toggle", json!({"entity_id": "switch.tidyhub_clean_kitchen"}));

        apply(&command, &mut snapshot).unwrap();

        assert_eq!(snapshot.state, EntityState::On);
    }

    #[test]
    fn should_start_at_first_segment_for_both_payload_shapes() {
        let device = EntityId::new("vacuum.robot");
        let segments = [SegmentId::new(17), SegmentId::new(16)];
        for strategy in [
            CleaningStrategy::AppSegmentClean,
            CleaningStrategy::CleanSegmentService,
        ] {
            let mut snapshot = robot();
            let command = strategy.command(&device, &segments).unwrap();

            apply(&command, &mut snapshot).unwrap();

            assert_eq!(snapshot.state.as_str(), "cleaning");
            assert_eq!(
                snapshot.get_attribute(SEGMENT_ATTRIBUTE),
                Some(&AttributeValue::Int(17))
            );
        }
    }

    #[test]
    fn should_clear_segment_when_returning_home() {
        let mut snapshot = robot().with_attribute(SEGMENT_ATTRIBUTE, 3i64);

        apply(&Command::return_to_base(&EntityId::new("vacuum.robot")), &mut snapshot).unwrap();

        assert_eq!(snapshot.state.as_str(), "returning");
        assert!(snapshot.get_attribute(SEGMENT_ATTRIBUTE).is_none());
    }

    #[test]
    fn should_reject_unknown_action() {
        let mut snapshot = robot();
        let command = Command::new("vacuum", "fly", json!({"entity_id": "vacuum.robot"}));

        assert_eq!(
            apply(&command, &mut snapshot),
            Err(ActuationError::UnknownAction("vacuum.fly".to_string()))
        );
        assert_eq!(snapshot.state.as_str(), "docked");
    }
}
