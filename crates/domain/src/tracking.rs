//! Segment tracking: edge detection over a cleaning device's state stream.
//!
//! The stream may repeat the same segment many times and may skip states.
//! Only two edges matter: the reported segment changes while the device is
//! active, or the device stops being active while a segment is tracked.

use serde::Serialize;

use crate::entity::EntityState;
use crate::id::{EntityId, SegmentId};
use crate::time::{Timestamp, elapsed_secs};

/// Device states during which a segment is considered in progress.
pub const ACTIVE_STATES: [&str; 2] = ["cleaning", "returning"];

/// Default attribute a device reports its current segment in.
pub const DEFAULT_SEGMENT_ATTRIBUTE: &str = "current_segment";

/// Whether the device is working through a segment.
#[must_use]
pub fn is_active(state: &EntityState) -> bool {
    ACTIVE_STATES.contains(&state.as_str())
}

/// A segment pass that ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCompletion {
    pub device: EntityId,
    pub segment: SegmentId,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl SegmentCompletion {
    #[must_use]
    pub fn duration_secs(&self) -> u64 {
        elapsed_secs(self.started_at, self.finished_at)
    }
}

/// Per-device tracking state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTracker {
    current: Option<SegmentId>,
    started_at: Option<Timestamp>,
}

impl SegmentTracker {
    #[must_use]
    pub fn current(&self) -> Option<SegmentId> {
        self.current
    }

    #[must_use]
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Feed one observation; returns the completion it closes, if any.
    pub fn observe(
        &mut self,
        device: &EntityId,
        state: &EntityState,
        reported: Option<SegmentId>,
        now: Timestamp,
    ) -> Option<SegmentCompletion> {
        if !is_active(state) {
            return self.finish(device, now);
        }

        if reported == self.current {
            return None;
        }

        let completed = self.finish(device, now);
        self.current = reported;
        self.started_at = reported.map(|_| now);
        completed
    }

    fn finish(&mut self, device: &EntityId, now: Timestamp) -> Option<SegmentCompletion> {
        let segment = self.current.take()?;
        let started_at = self.started_at.take().unwrap_or(now);
        Some(SegmentCompletion {
            device: device.clone(),
            segment,
            started_at,
            finished_at: now,
        })
    }
}
