//! Readiness: whether a room is safe to clean right now, and why.
//!
//! [`assess`] is a pure function of the current readings. It is re-run in
//! full whenever any input changes; nothing is patched incrementally.
//!
//! Priority, first match wins:
//! 1. any occupancy sensor on → [`Reason::Occupied`]
//! 2. occupancy ended less than the cooldown ago → [`Reason::CooldownHold`]
//! 3. a closed barrier in the room while the device is elsewhere →
//!    [`Reason::DoorClosed`]; a closed barrier where the device is, away from
//!    the room → [`Reason::Trapped`] (barriers checked in sensor-id order)
//! 4. otherwise → [`Reason::Ready`]

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::EntityState;
use crate::id::{EntityId, LocationId};
use crate::time::{Timestamp, secs};

/// Device class of presence sensors counted as occupancy.
pub const OCCUPANCY_CLASS: &str = "occupancy";

/// Device class of sensors counted as barriers.
pub const BARRIER_CLASS: &str = "door";

/// Why a room is or is not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    #[default]
    Initializing,
    Occupied,
    CooldownHold,
    DoorClosed,
    Trapped,
    Ready,
}

impl Reason {
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Human-readable label published with the readiness signal.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Occupied => "Occupied",
            Self::CooldownHold => "Cooldown",
            Self::DoorClosed => "Door Closed",
            Self::Trapped => "Trapped",
            Self::Ready => "Ready",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Current reading of one barrier sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierReading {
    pub sensor: EntityId,
    pub location: Option<LocationId>,
    pub state: EntityState,
}

impl BarrierReading {
    /// Barrier sensors report `off` when closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == EntityState::Off
    }
}

/// Everything [`assess`] looks at.
#[derive(Debug, Clone)]
pub struct ReadinessInputs<'a> {
    pub target: &'a LocationId,
    /// Where the cleaning device currently is, if known.
    pub device_location: Option<&'a LocationId>,
    pub occupancy: &'a [EntityState],
    pub barriers: &'a [BarrierReading],
    pub last_occupied: Option<Timestamp>,
    pub cooldown_secs: u64,
    pub now: Timestamp,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub reason: Reason,
    /// Updated last-occupied mark to carry into the next evaluation.
    pub last_occupied: Option<Timestamp>,
    /// Time left in the cooldown window when holding.
    pub cooldown_remaining: Option<Duration>,
}

/// What to do with the room's cooldown timer after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDirective {
    /// Drop any pending timer.
    Cancel,
    /// Keep the pending timer, or schedule one firing after this delay.
    Ensure(Duration),
}

impl Assessment {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.reason.is_ready()
    }

    /// Timer action implied by this outcome. A hold re-evaluates one second
    /// after the window closes.
    #[must_use]
    pub fn timer(&self) -> TimerDirective {
        match self.cooldown_remaining {
            Some(remaining) => TimerDirective::Ensure(remaining + Duration::from_secs(1)),
            None => TimerDirective::Cancel,
        }
    }
}

/// Evaluate a room's readiness from its current readings.
#[must_use]
pub fn assess(inputs: &ReadinessInputs<'_>) -> Assessment {
    if inputs.occupancy.iter().any(EntityState::is_on) {
        return Assessment {
            reason: Reason::Occupied,
            last_occupied: Some(inputs.now),
            cooldown_remaining: None,
        };
    }

    if let Some(remaining) = cooldown_remaining(inputs) {
        return Assessment {
            reason: Reason::CooldownHold,
            last_occupied: inputs.last_occupied,
            cooldown_remaining: Some(remaining),
        };
    }

    let reason = barrier_reason(inputs).unwrap_or(Reason::Ready);
    Assessment {
        reason,
        last_occupied: inputs.last_occupied,
        cooldown_remaining: None,
    }
}

fn cooldown_remaining(inputs: &ReadinessInputs<'_>) -> Option<Duration> {
    let last = inputs.last_occupied?;
    if inputs.cooldown_secs == 0 {
        return None;
    }
    let window = secs(inputs.cooldown_secs);
    let elapsed = inputs.now - last;
    if elapsed >= window {
        return None;
    }
    let remaining = (window - elapsed).min(window);
    Some(remaining.to_std().unwrap_or_default())
}

fn barrier_reason(inputs: &ReadinessInputs<'_>) -> Option<Reason> {
    let target = inputs.target;
    let device_at = inputs.device_location;

    let mut closed: Vec<&BarrierReading> =
        inputs.barriers.iter().filter(|b| b.is_closed()).collect();
    closed.sort_by(|a, b| a.sensor.cmp(&b.sensor));

    closed.into_iter().find_map(|barrier| {
        let at = barrier.location.as_ref()?;
        if at == target && device_at != Some(target) {
            return Some(Reason::DoorClosed);
        }
        if device_at == Some(at) && at != target {
            return Some(Reason::Trapped);
        }
        None
    })
}
