//! Room identity: stable slug and display name for a configured room.
//!
//! A location used by a single room is named after the location. When
//! several rooms share a location, the device's segment-name map tells them
//! apart; without a match the sorted segment ids are used. Slugs that still
//! collide get a numeric suffix.

use std::collections::HashSet;

use serde_json::Value;

use crate::entity::AttributeValue;
use crate::id::{LocationId, SegmentId};
use crate::room::{RoomConfig, RoomIdentity};
use crate::slug::slugify;

/// Attributes a device may publish its segment-name map under, in lookup order.
pub const SEGMENT_NAME_ATTRIBUTES: [&str; 3] = ["rooms", "room_list", "segments"];

/// Find the name of `segment` in a device's segment-name map.
///
/// Accepts both the object form `{"1": "Kitchen"}` and the list form
/// `[{"id": 1, "name": "Kitchen"}]`.
#[must_use]
pub fn segment_name(map: &AttributeValue, segment: SegmentId) -> Option<String> {
    match map.to_json() {
        Value::Object(entries) => entries
            .get(&segment.to_string())
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("id").is_some_and(|id| id_matches(id, segment)))
            .and_then(|item| item.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn id_matches(id: &Value, segment: SegmentId) -> bool {
    match id {
        Value::Number(n) => n.as_u64() == Some(u64::from(segment.get())),
        Value::String(s) => s.parse::<SegmentId>().is_ok_and(|parsed| parsed == segment),
        _ => false,
    }
}

/// Identity of the only room in a location.
#[must_use]
pub fn unique_identity(location: &LocationId, location_name: &str) -> RoomIdentity {
    RoomIdentity {
        slug: slugify(location.as_str()),
        name: location_name.to_string(),
    }
}

/// Identity of one of several rooms sharing a location.
///
/// `matched` is the device's name for the room's first configured segment.
#[must_use]
pub fn shared_identity(
    room: &RoomConfig,
    location_name: &str,
    matched: Option<&str>,
) -> RoomIdentity {
    if let Some(name) = matched.map(str::trim).filter(|n| !n.is_empty()) {
        return RoomIdentity {
            slug: slugify(&format!("{}_{name}", room.location)),
            name: format!("{location_name} {name}"),
        };
    }

    let suffix = segment_suffix(room);
    RoomIdentity {
        slug: slugify(&format!("{}_{suffix}", room.location)),
        name: format!("{location_name} {suffix}"),
    }
}

fn segment_suffix(room: &RoomConfig) -> String {
    let key = room.key();
    if key.segments.is_empty() {
        return "unknown".to_string();
    }
    key.segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("_")
}

/// Make every slug unique, in order.
///
/// The first room holding a slug keeps it; later ones get `_2`, `_3`, ...
/// (skipping slugs already in use) and the same number appended to their
/// name. Returns the indices that were renamed.
#[must_use]
pub fn disambiguate(identities: &mut [RoomIdentity]) -> Vec<usize> {
    let mut taken: HashSet<String> = identities.iter().map(|i| i.slug.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut renamed = Vec::new();

    for (index, identity) in identities.iter_mut().enumerate() {
        if seen.insert(identity.slug.clone()) {
            continue;
        }
        let mut n = 2;
        let slug = loop {
            let candidate = format!("{}_{n}", identity.slug);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(slug.clone());
        seen.insert(slug.clone());
        identity.slug = slug;
        identity.name = format!("{} {n}", identity.name);
        renamed.push(index);
    }
    renamed
}
