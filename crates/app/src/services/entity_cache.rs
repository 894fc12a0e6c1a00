//! Entity cache: room records keyed by [`RoomKey`], built once at startup.
//!
//! Configuration and identity never change after load. Control ids do: a
//! control may register its real entity id after the engine started.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tidyhub_domain::id::{EntityId, LocationId, SegmentId};
use tidyhub_domain::room::{ControlKind, RoomConfig, RoomControls, RoomIdentity, RoomKey};

/// Immutable part of a cached room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub key: RoomKey,
    pub config: RoomConfig,
    pub identity: RoomIdentity,
}

#[derive(Debug, Default)]
pub struct EntityCache {
    records: Vec<RoomRecord>,
    controls: RwLock<HashMap<RoomKey, RoomControls>>,
    served: HashMap<EntityId, Vec<LocationId>>,
    segment_attributes: HashMap<EntityId, String>,
}

impl EntityCache {
    /// Build the cache from validated rooms and their resolved identities.
    pub fn new(rooms: impl IntoIterator<Item = (RoomConfig, RoomIdentity)>) -> Self {
        let mut records = Vec::new();
        let mut served: HashMap<EntityId, Vec<LocationId>> = HashMap::new();
        let mut segment_attributes = HashMap::new();

        for (config, identity) in rooms {
            let locations = served.entry(config.device.clone()).or_default();
            if !locations.contains(&config.location) {
                locations.push(config.location.clone());
            }
            if let Some(attribute) = &config.segment_attribute {
                segment_attributes
                    .entry(config.device.clone())
                    .or_insert_with(|| attribute.clone());
            }
            records.push(RoomRecord {
                key: config.key(),
                config,
                identity,
            });
        }

        let controls = records
            .iter()
            .map(|r| (r.key.clone(), RoomControls::default()))
            .collect();

        Self {
            records,
            controls: RwLock::new(controls),
            served,
            segment_attributes,
        }
    }

    /// Every room, in configuration order.
    #[must_use]
    pub fn records(&self) -> &[RoomRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, key: &RoomKey) -> Option<&RoomRecord> {
        self.records.iter().find(|r| &r.key == key)
    }

    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&RoomRecord> {
        self.records.iter().find(|r| r.identity.slug == slug)
    }

    /// Control ids currently known for a room.
    #[must_use]
    pub fn controls(&self, key: &RoomKey) -> RoomControls {
        self.controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the entity id a room's control registered under.
    ///
    /// Returns `false` when no room has that slug.
    pub fn register_control(&self, slug: &str, kind: ControlKind, entity_id: EntityId) -> bool {
        let Some(record) = self.by_slug(slug) else {
            tracing::warn!(room = slug, ?kind, entity = %entity_id, "control registered for unknown room");
            return false;
        };
        let mut controls = self.controls.write().unwrap_or_else(PoisonError::into_inner);
        controls
            .entry(record.key.clone())
            .or_default()
            .set(kind, entity_id);
        true
    }

    /// The room and control kind an entity id belongs to, if any.
    #[must_use]
    pub fn control_owner(&self, entity_id: &EntityId) -> Option<(RoomKey, ControlKind)> {
        let controls = self.controls.read().unwrap_or_else(PoisonError::into_inner);
        controls.iter().find_map(|(key, room)| {
            [ControlKind::Enable, ControlKind::Override, ControlKind::Readiness]
                .into_iter()
                .find(|kind| room.get(*kind) == Some(entity_id))
                .map(|kind| (key.clone(), kind))
        })
    }

    /// Rooms on `device` whose segment set contains `segment`.
    #[must_use]
    pub fn rooms_for_segment(&self, device: &EntityId, segment: SegmentId) -> Vec<&RoomRecord> {
        self.records
            .iter()
            .filter(|r| &r.config.device == device && r.key.segments.contains(&segment))
            .collect()
    }

    pub fn rooms_on_device<'a>(&'a self, device: &'a EntityId) -> impl Iterator<Item = &'a RoomRecord> {
        self.records.iter().filter(move |r| &r.config.device == device)
    }

    #[must_use]
    pub fn rooms_in_location(&self, location: &LocationId) -> Vec<&RoomRecord> {
        self.records
            .iter()
            .filter(|r| &r.config.location == location)
            .collect()
    }

    /// Locations of every room assigned to `device`.
    #[must_use]
    pub fn served_locations(&self, device: &EntityId) -> &[LocationId] {
        self.served
            .get(device)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct configured devices, sorted.
    #[must_use]
    pub fn devices(&self) -> Vec<&EntityId> {
        let mut devices: Vec<_> = self.served.keys().collect();
        devices.sort();
        devices
    }

    #[must_use]
    pub fn is_device(&self, entity_id: &EntityId) -> bool {
        self.served.contains_key(entity_id)
    }

    /// Attribute `device` reports its current segment in.
    #[must_use]
    pub fn segment_attribute<'a>(&'a self, device: &EntityId, default: &'a str) -> &'a str {
        self.segment_attributes
            .get(device)
            .map_or(default, String::as_str)
    }
}
