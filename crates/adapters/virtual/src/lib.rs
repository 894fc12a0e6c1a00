//! # tidyhub-adapter-virtual
//!
//! In-memory home used by the daemon demo and by tests.
//!
//! [`VirtualHome`] implements every port of `tidyhub-app`:
//!
//! | Port | Behaviour |
//! |------|-----------|
//! | `StateStore` | Snapshots kept in memory, every write published on the state bus |
//! | `LocationDirectory` / `DeviceDirectory` | Fixed at construction from a [`HomeSpec`] |
//! | `ControlStore` | Controls live as long as the process; restore falls back to the default |
//! | `CommandInvoker` | Toggles and a simulated cleaning robot, see [`actions`] |
//!
//! ## Dependency rule
//!
//! Depends on `tidyhub-app` (port traits) and `tidyhub-domain` only.

pub mod actions;
mod spec;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tidyhub_app::event_bus::InProcessEventBus;
use tidyhub_app::ports::{
    CommandInvoker, ControlStore, DeviceDirectory, LocationDirectory, StateStore,
};
use tidyhub_domain::command::Command;
use tidyhub_domain::device::Device;
use tidyhub_domain::entity::{AttributeValue, EntityRecord, EntitySnapshot, EntityState};
use tidyhub_domain::error::{ActuationError, TidyHubError};
use tidyhub_domain::event::StateChange;
use tidyhub_domain::id::{DeviceId, EntityId, LocationId};
use tidyhub_domain::location::Location;
use tidyhub_domain::time::now;

pub use spec::{DeviceSpec, EntitySpec, HomeSpec, LocationSpec};

pub struct VirtualHome {
    states: Mutex<HashMap<EntityId, EntitySnapshot>>,
    locations: HashMap<LocationId, Location>,
    records: HashMap<EntityId, EntityRecord>,
    devices: HashMap<DeviceId, Device>,
    bus: InProcessEventBus,
}

impl VirtualHome {
    /// Build the home described by `spec`, publishing on `bus`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a location or device has an empty id or name.
    pub fn from_spec(spec: &HomeSpec, bus: InProcessEventBus) -> Result<Self, TidyHubError> {
        let mut locations = HashMap::new();
        for location in &spec.locations {
            let location = Location::builder()
                .id(location.id.as_str())
                .name(location.name.as_str())
                .build()?;
            locations.insert(location.id.clone(), location);
        }

        let mut devices = HashMap::new();
        for device in &spec.devices {
            let mut builder = Device::builder()
                .id(device.id.as_str())
                .name(device.name.as_str());
            if let Some(manufacturer) = &device.manufacturer {
                builder = builder.manufacturer(manufacturer.as_str());
            }
            if let Some(model) = &device.model {
                builder = builder.model(model.as_str());
            }
            if let Some(location) = &device.location {
                builder = builder.location(location.as_str());
            }
            let device = builder.build()?;
            devices.insert(device.id.clone(), device);
        }

        let mut records = HashMap::new();
        let mut states = HashMap::new();
        for entity in &spec.entities {
            let mut record = EntityRecord::new(entity.entity_id.as_str());
            record.device_id = entity.device.as_deref().map(DeviceId::from);
            record.location = entity.location.as_deref().map(LocationId::from);
            record.device_class = entity.device_class.clone();

            let mut snapshot = EntitySnapshot::new(record.entity_id.clone(), entity.state.as_str());
            for (key, value) in &entity.attributes {
                snapshot = snapshot.with_attribute(key.as_str(), AttributeValue::from(value.clone()));
            }
            states.insert(record.entity_id.clone(), snapshot);
            records.insert(record.entity_id.clone(), record);
        }

        tracing::info!(
            locations = locations.len(),
            devices = devices.len(),
            entities = records.len(),
            "virtual home ready"
        );

        Ok(Self {
            states: Mutex::new(states),
            locations,
            records,
            devices,
            bus,
        })
    }

    #[must_use]
    pub fn bus(&self) -> &InProcessEventBus {
        &self.bus
    }

    /// Change an entity's state, keeping its attributes.
    pub fn set_state(&self, entity_id: &EntityId, state: impl Into<EntityState>) {
        let state = state.into();
        self.update(entity_id, |snapshot| snapshot.state = state);
    }

    /// Set one attribute of an entity, keeping its state.
    pub fn set_attribute(&self, entity_id: &EntityId, key: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        self.update(entity_id, |snapshot| {
            snapshot.attributes.insert(key.to_string(), value);
        });
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<EntityId, EntitySnapshot>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to an entity's snapshot, creating it when missing, and
    /// publish the result.
    fn update(&self, entity_id: &EntityId, change: impl FnOnce(&mut EntitySnapshot)) {
        let published = {
            let mut states = self.lock_states();
            let snapshot = states
                .entry(entity_id.clone())
                .or_insert_with(|| EntitySnapshot::new(entity_id.clone(), EntityState::Unknown));
            let old = snapshot.clone();
            change(snapshot);
            snapshot.last_changed = now();
            StateChange::new(Some(old), snapshot.clone())
        };
        self.bus.publish(published);
    }

    fn handle(&self, command: &Command) -> Result<(), ActuationError> {
        let target = command
            .target()
            .ok_or_else(|| ActuationError::Fault(format!("{} has no target", command.service())))?;

        let published = {
            let mut states = self.lock_states();
            let Some(snapshot) = states.get_mut(&target) else {
                return Err(ActuationError::Fault(format!("unknown entity {target}")));
            };
            let old = snapshot.clone();
            actions::apply(command, snapshot)?;
            snapshot.last_changed = now();
            StateChange::new(Some(old), snapshot.clone())
        };
        tracing::debug!(entity = %target, service = %command.service(), "handled command");
        self.bus.publish(published);
        Ok(())
    }
}

impl StateStore for VirtualHome {
    fn get(&self, entity_id: &EntityId) -> Option<EntitySnapshot> {
        self.lock_states().get(entity_id).cloned()
    }

    fn publish(&self, snapshot: EntitySnapshot) {
        let old = self
            .lock_states()
            .insert(snapshot.entity_id.clone(), snapshot.clone());
        self.bus.publish(StateChange::new(old, snapshot));
    }
}

impl LocationDirectory for VirtualHome {
    fn location(&self, id: &LocationId) -> Option<Location> {
        self.locations.get(id).cloned()
    }

    fn entities_in(&self, id: &LocationId) -> Vec<EntityId> {
        let mut members: Vec<EntityId> = self
            .records
            .values()
            .filter(|record| match &record.location {
                Some(location) => location == id,
                None => record
                    .device_id
                    .as_ref()
                    .and_then(|device| self.devices.get(device))
                    .and_then(|device| device.location.as_ref())
                    == Some(id),
            })
            .map(|record| record.entity_id.clone())
            .collect();
        members.sort();
        members
    }
}

impl DeviceDirectory for VirtualHome {
    fn entity(&self, entity_id: &EntityId) -> Option<EntityRecord> {
        self.records.get(entity_id).cloned()
    }

    fn device(&self, device_id: &DeviceId) -> Option<Device> {
        self.devices.get(device_id).cloned()
    }

    fn entities_of(&self, device_id: &DeviceId) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .records
            .values()
            .filter(|record| record.device_id.as_ref() == Some(device_id))
            .map(|record| record.entity_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl ControlStore for VirtualHome {
    fn restore(&self, entity_id: &EntityId, default: bool) -> bool {
        if let Some(existing) = self.get(entity_id) {
            return existing.state.is_on();
        }
        self.publish(EntitySnapshot::new(entity_id.clone(), EntityState::from(default)));
        default
    }
}

impl CommandInvoker for VirtualHome {
    async fn invoke(&self, command: Command) -> Result<(), ActuationError> {
        self.handle(&command)
    }
}
