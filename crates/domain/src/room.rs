//! Room: one configured (location, device, segments) cleaning target.
//!
//! A location may host several rooms when one device splits it into
//! multiple segments, so rooms are keyed by [`RoomKey`] rather than by
//! location alone.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{EntityId, LocationId, SegmentId};

/// Immutable per-room configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub location: LocationId,
    /// Cleaning device entity serving this room.
    pub device: EntityId,
    /// Map segments covering the room, in configured order.
    #[serde(default)]
    pub segments: Vec<SegmentId>,
    /// Overrides the global cooldown window.
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
    /// Overrides the attribute the device reports its current segment in.
    #[serde(default)]
    pub segment_attribute: Option<String>,
}

impl RoomConfig {
    #[must_use]
    pub fn new(location: impl Into<LocationId>, device: impl Into<EntityId>) -> Self {
        Self {
            location: location.into(),
            device: device.into(),
            segments: Vec::new(),
            cooldown_secs: None,
            segment_attribute: None,
        }
    }

    #[must_use]
    pub fn with_segments(mut self, segments: impl IntoIterator<Item = u32>) -> Self {
        self.segments = segments.into_iter().map(SegmentId::new).collect();
        self
    }

    #[must_use]
    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_segment_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.segment_attribute = Some(attribute.into());
        self
    }

    /// Check the room's own invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty location, device, or
    /// segment-attribute override.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.location.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        if self.device.is_empty() {
            return Err(ValidationError::EmptyDevice);
        }
        if self
            .segment_attribute
            .as_deref()
            .is_some_and(|attr| attr.trim().is_empty())
        {
            return Err(ValidationError::EmptySegmentAttribute);
        }
        Ok(())
    }

    /// Cache key for this room.
    #[must_use]
    pub fn key(&self) -> RoomKey {
        RoomKey::new(self.location.clone(), self.device.clone(), &self.segments)
    }

    /// Cooldown window in seconds, falling back to `default`.
    #[must_use]
    pub fn effective_cooldown(&self, default: u64) -> u64 {
        self.cooldown_secs.unwrap_or(default)
    }
}

/// Validate every room and reject duplicate keys.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_rooms(rooms: &[RoomConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(rooms.len());
    for room in rooms {
        room.validate()?;
        let key = room.key();
        if !seen.insert(key.clone()) {
            return Err(ValidationError::DuplicateRoom(key.to_string()));
        }
    }
    Ok(())
}

/// Unique cache key: location, device, and the sorted segment set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomKey {
    pub location: LocationId,
    pub device: EntityId,
    pub segments: Vec<SegmentId>,
}

impl RoomKey {
    #[must_use]
    pub fn new(location: LocationId, device: EntityId, segments: &[SegmentId]) -> Self {
        let mut segments = segments.to_vec();
        segments.sort_unstable();
        segments.dedup();
        Self {
            location,
            device,
            segments,
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}[", self.location, self.device)?;
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{seg}")?;
        }
        f.write_str("]")
    }
}

/// Stable slug and display name of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomIdentity {
    pub slug: String,
    pub name: String,
}

/// The three externally visible entities a room owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// "Wants cleaning" toggle, reset after a genuine pass.
    Enable,
    /// Manual "skip this room" toggle.
    Override,
    /// Readiness signal written by the evaluator.
    Readiness,
}

impl ControlKind {
    /// Default entity id for a room slug.
    #[must_use]
    pub fn default_entity(self, slug: &str) -> EntityId {
        match self {
            Self::Enable => EntityId::new(format!("switch.tidyhub_clean_{slug}")),
            Self::Override => EntityId::new(format!("switch.tidyhub_disable_{slug}")),
            Self::Readiness => EntityId::new(format!("binary_sensor.tidyhub_status_{slug}")),
        }
    }
}

/// Resolved control ids of a room. A `None` id means the control never
/// registered and has no usable default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomControls {
    pub enable: Option<EntityId>,
    pub override_toggle: Option<EntityId>,
    pub readiness: Option<EntityId>,
}

impl RoomControls {
    /// Controls named after the room slug.
    #[must_use]
    pub fn derived(slug: &str) -> Self {
        Self {
            enable: Some(ControlKind::Enable.default_entity(slug)),
            override_toggle: Some(ControlKind::Override.default_entity(slug)),
            readiness: Some(ControlKind::Readiness.default_entity(slug)),
        }
    }

    #[must_use]
    pub fn get(&self, kind: ControlKind) -> Option<&EntityId> {
        match kind {
            ControlKind::Enable => self.enable.as_ref(),
            ControlKind::Override => self.override_toggle.as_ref(),
            ControlKind::Readiness => self.readiness.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ControlKind, entity_id: EntityId) {
        let slot = match kind {
            ControlKind::Enable => &mut self.enable,
            ControlKind::Override => &mut self.override_toggle,
            ControlKind::Readiness => &mut self.readiness,
        };
        *slot = Some(entity_id);
    }

    /// Whether `entity_id` is one of these controls.
    #[must_use]
    pub fn contains(&self, entity_id: &EntityId) -> bool {
        [&self.enable, &self.override_toggle, &self.readiness]
            .into_iter()
            .any(|slot| slot.as_ref() == Some(entity_id))
    }
}
