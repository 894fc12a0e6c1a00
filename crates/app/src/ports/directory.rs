//! Directory ports: location membership and device metadata lookups.

use std::sync::Arc;

use tidyhub_domain::device::Device;
use tidyhub_domain::entity::EntityRecord;
use tidyhub_domain::id::{DeviceId, EntityId, LocationId};
use tidyhub_domain::location::Location;

/// Resolves locations and the entities that belong to them.
pub trait LocationDirectory: Send + Sync {
    fn location(&self, id: &LocationId) -> Option<Location>;

    /// Entities in a location, including those of devices placed there whose
    /// own location is unset.
    fn entities_in(&self, id: &LocationId) -> Vec<EntityId>;
}

/// Resolves entity records and device metadata.
pub trait DeviceDirectory: Send + Sync {
    fn entity(&self, entity_id: &EntityId) -> Option<EntityRecord>;

    fn device(&self, device_id: &DeviceId) -> Option<Device>;

    /// Every entity exposed by a device.
    fn entities_of(&self, device_id: &DeviceId) -> Vec<EntityId>;
}

impl<T: LocationDirectory + ?Sized> LocationDirectory for Arc<T> {
    fn location(&self, id: &LocationId) -> Option<Location> {
        (**self).location(id)
    }

    fn entities_in(&self, id: &LocationId) -> Vec<EntityId> {
        (**self).entities_in(id)
    }
}

impl<T: DeviceDirectory + ?Sized> DeviceDirectory for Arc<T> {
    fn entity(&self, entity_id: &EntityId) -> Option<EntityRecord> {
        (**self).entity(entity_id)
    }

    fn device(&self, device_id: &DeviceId) -> Option<Device> {
        (**self).device(device_id)
    }

    fn entities_of(&self, device_id: &DeviceId) -> Vec<EntityId> {
        (**self).entities_of(device_id)
    }
}
