//! Directory lookups shared by several services.
//!
//! A missing directory entry is a lookup failure: it is logged and the value
//! is treated as absent, never returned as an error.

use tidyhub_domain::entity::effective_device_class;
use tidyhub_domain::id::{EntityId, LocationId};

use crate::ports::{DeviceDirectory, LocationDirectory, StateStore};

/// Where an entity currently is: its own location, else its device's.
pub fn entity_location<D: DeviceDirectory>(devices: &D, entity: &EntityId) -> Option<LocationId> {
    let Some(record) = devices.entity(entity) else {
        tracing::debug!(entity = %entity, "entity not in device directory, location unknown");
        return None;
    };
    if let Some(location) = record.location {
        return Some(location);
    }
    let device_id = record.device_id?;
    match devices.device(&device_id) {
        Some(device) => device.location,
        None => {
            tracing::warn!(entity = %entity, device = %device_id, "device record missing");
            None
        }
    }
}

/// Manufacturer of the device behind an entity.
pub fn manufacturer<D: DeviceDirectory>(devices: &D, entity: &EntityId) -> Option<String> {
    let Some(device_id) = devices.entity(entity).and_then(|r| r.device_id) else {
        tracing::warn!(entity = %entity, "no device record, manufacturer unknown");
        return None;
    };
    let Some(device) = devices.device(&device_id) else {
        tracing::warn!(entity = %entity, device = %device_id, "device record missing");
        return None;
    };
    device.manufacturer
}

/// Entities in `location` whose device class is `class`, sorted by id.
pub fn sensors_in<S, L, D>(
    store: &S,
    locations: &L,
    devices: &D,
    location: &LocationId,
    class: &str,
) -> Vec<EntityId>
where
    S: StateStore,
    L: LocationDirectory,
    D: DeviceDirectory,
{
    let mut found: Vec<EntityId> = locations
        .entities_in(location)
        .into_iter()
        .filter(|id| {
            let snapshot = store.get(id);
            let record = devices.entity(id);
            effective_device_class(snapshot.as_ref(), record.as_ref()) == Some(class)
        })
        .collect();
    found.sort();
    found.dedup();
    found
}
