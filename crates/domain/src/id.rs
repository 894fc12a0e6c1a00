//! Typed identifier newtypes.
//!
//! Entity, location and device identifiers are opaque strings handed out by
//! the host platform (`vacuum.downstairs`, `kitchen`, …). Segment ids are the
//! small integers a cleaning device uses for the regions of its map.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::AttributeValue;
use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is blank.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a state-bus entity (e.g. `binary_sensor.hall_door`).
    EntityId
);

define_id!(
    /// Identifier of a location in the location directory.
    LocationId
);

define_id!(
    /// Identifier of a device record in the device directory.
    DeviceId
);

impl EntityId {
    /// The platform domain prefix (`switch` for `switch.kitchen`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(domain, _)| domain)
    }
}

/// An independently cleanable region of a device's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(u32);

impl SegmentId {
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Read a segment id out of a device attribute.
    ///
    /// Devices report the current segment either as a number or as a
    /// numeric string; anything else is treated as "no segment".
    #[must_use]
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Int(n) => u32::try_from(*n).ok().map(Self),
            AttributeValue::Float(f) if f.fract() == 0.0 && *f >= 0.0 => {
                format!("{f:.0}").parse().ok().map(Self)
            }
            AttributeValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SegmentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| ValidationError::InvalidSegment(s.to_string()))
    }
}

impl From<u32> for SegmentId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_extract_domain_prefix_from_entity_id() {
        assert_eq!(EntityId::new("switch.tidyhub_clean_kitchen").domain(), "switch");
        assert_eq!(EntityId::new("bare").domain(), "bare");
    }

    #[test]
    fn should_roundtrip_string_ids_through_serde_json() {
        let id = LocationId::new("living_room");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"living_room\"");
        let parsed: LocationId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_report_blank_id_as_empty() {
        assert!(DeviceId::new("  ").is_empty());
        assert!(!DeviceId::new("abc").is_empty());
    }

    #[test]
    fn should_parse_segment_from_numeric_string() {
        assert_eq!(" 16 ".parse::<SegmentId>().unwrap(), SegmentId::new(16));
        assert!("kitchen".parse::<SegmentId>().is_err());
    }

    #[test]
    fn should_read_segment_from_int_and_string_attributes() {
        assert_eq!(
            SegmentId::from_attribute(&AttributeValue::Int(3)),
            Some(SegmentId::new(3))
        );
        assert_eq!(
            SegmentId::from_attribute(&AttributeValue::String("7".to_string())),
            Some(SegmentId::new(7))
        );
        assert_eq!(
            SegmentId::from_attribute(&AttributeValue::Float(4.0)),
            Some(SegmentId::new(4))
        );
    }

    #[test]
    fn should_ignore_non_numeric_segment_attributes() {
        assert_eq!(SegmentId::from_attribute(&AttributeValue::Int(-1)), None);
        assert_eq!(SegmentId::from_attribute(&AttributeValue::Bool(true)), None);
        assert_eq!(
            SegmentId::from_attribute(&AttributeValue::String("none".to_string())),
            None
        );
    }
}
