//! Room identity resolver: stable slug and display name per configured room.
//!
//! Resolution happens once at startup; the result lives in the
//! [`EntityCache`](super::EntityCache) for the lifetime of the process.

use std::collections::HashMap;

use tidyhub_domain::id::{EntityId, LocationId, SegmentId};
use tidyhub_domain::identity::{
    SEGMENT_NAME_ATTRIBUTES, disambiguate, segment_name, shared_identity, unique_identity,
};
use tidyhub_domain::room::{RoomConfig, RoomIdentity};

use crate::ports::{DeviceDirectory, LocationDirectory, StateStore};

pub struct RoomIdentityResolver<'a, S, L, D> {
    store: &'a S,
    locations: &'a L,
    devices: &'a D,
}

impl<'a, S, L, D> RoomIdentityResolver<'a, S, L, D>
where
    S: StateStore,
    L: LocationDirectory,
    D: DeviceDirectory,
{
    pub fn new(store: &'a S, locations: &'a L, devices: &'a D) -> Self {
        Self {
            store,
            locations,
            devices,
        }
    }

    /// Resolve every room, in configuration order. Slugs are unique in the
    /// result.
    pub fn resolve_all(&self, rooms: &[RoomConfig]) -> Vec<RoomIdentity> {
        let mut per_location: HashMap<&LocationId, usize> = HashMap::new();
        for room in rooms {
            *per_location.entry(&room.location).or_default() += 1;
        }
        let mut identities: Vec<RoomIdentity> = rooms
            .iter()
            .map(|room| {
                let shared = per_location.get(&room.location).copied().unwrap_or(0) > 1;
                self.resolve(room, shared)
            })
            .collect();
        for index in disambiguate(&mut identities) {
            tracing::warn!(
                location = %rooms[index].location,
                device = %rooms[index].device,
                slug = %identities[index].slug,
                "room identity collides with an earlier room, numbered"
            );
        }
        identities
    }

    /// Resolve one room; `shared` when other rooms use the same location.
    pub fn resolve(&self, room: &RoomConfig, shared: bool) -> RoomIdentity {
        let location_name = self.location_name(&room.location);
        if !shared {
            return unique_identity(&room.location, &location_name);
        }
        let matched = room
            .segments
            .first()
            .and_then(|segment| self.segment_name(&room.device, *segment));
        let identity = shared_identity(room, &location_name, matched.as_deref());
        tracing::debug!(
            location = %room.location,
            slug = %identity.slug,
            matched = matched.is_some(),
            "resolved shared room identity"
        );
        identity
    }

    fn location_name(&self, id: &LocationId) -> String {
        match self.locations.location(id) {
            Some(location) => location.name,
            None => {
                tracing::warn!(location = %id, "location not in directory, using its id as name");
                id.to_string()
            }
        }
    }

    /// Look the segment up on the device entity, then on its siblings.
    fn segment_name(&self, device: &EntityId, segment: SegmentId) -> Option<String> {
        let mut candidates = vec![device.clone()];
        if let Some(device_id) = self.devices.entity(device).and_then(|r| r.device_id) {
            candidates.extend(
                self.devices
                    .entities_of(&device_id)
                    .into_iter()
                    .filter(|id| id != device),
            );
        }

        candidates.iter().find_map(|entity| {
            let snapshot = self.store.get(entity)?;
            SEGMENT_NAME_ATTRIBUTES.iter().find_map(|attribute| {
                snapshot
                    .get_attribute(attribute)
                    .and_then(|map| segment_name(map, segment))
            })
        })
    }
}
