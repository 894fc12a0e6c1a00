//! In-memory fakes of every port, shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;

use tidyhub_domain::command::Command;
use tidyhub_domain::device::Device;
use tidyhub_domain::entity::{DEVICE_CLASS, EntityRecord, EntitySnapshot, EntityState};
use tidyhub_domain::error::ActuationError;
use tidyhub_domain::event::StateChange;
use tidyhub_domain::id::{DeviceId, EntityId, LocationId};
use tidyhub_domain::location::Location;

use crate::event_bus::InProcessEventBus;
use crate::ports::{CommandInvoker, ControlStore, DeviceDirectory, LocationDirectory, StateStore};

// ── Fake home ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeHome {
    states: Mutex<HashMap<EntityId, EntitySnapshot>>,
    locations: Mutex<HashMap<LocationId, Location>>,
    members: Mutex<HashMap<LocationId, Vec<EntityId>>>,
    records: Mutex<HashMap<EntityId, EntityRecord>>,
    devices: Mutex<HashMap<DeviceId, Device>>,
    bus: Option<InProcessEventBus>,
}

impl FakeHome {
    pub fn with_bus(bus: InProcessEventBus) -> Self {
        Self {
            bus: Some(bus),
            ..Self::default()
        }
    }

    pub fn add_location(&self, id: &str, name: &str) {
        let location = Location::builder().id(id).name(name).build().unwrap();
        self.locations
            .lock()
            .unwrap()
            .insert(location.id.clone(), location);
    }

    /// Add an entity with a directory record, placed in `location`.
    pub fn add_entity(&self, record: EntityRecord, location: Option<&str>) {
        if let Some(location) = location {
            self.members
                .lock()
                .unwrap()
                .entry(LocationId::new(location))
                .or_default()
                .push(record.entity_id.clone());
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.entity_id.clone(), record);
    }

    /// Add a sensor of the given class in `location` with an initial state.
    pub fn add_sensor(&self, entity: &str, location: &str, class: &str, state: EntityState) {
        self.add_entity(
            EntityRecord::new(entity).location(location).device_class(class),
            Some(location),
        );
        self.set(entity, state);
    }

    pub fn add_device(&self, device: Device) {
        self.devices
            .lock()
            .unwrap()
            .insert(device.id.clone(), device);
    }

    /// Set an entity's state, keeping its attributes.
    pub fn set(&self, entity: &str, state: impl Into<EntityState>) {
        let id = EntityId::new(entity);
        let mut snapshot = self
            .get(&id)
            .unwrap_or_else(|| EntitySnapshot::new(id.clone(), EntityState::Unknown));
        snapshot.state = state.into();
        self.publish(snapshot);
    }

    pub fn set_snapshot(&self, snapshot: EntitySnapshot) {
        self.publish(snapshot);
    }

    /// Attach a `device_class` attribute to an entity's live snapshot.
    pub fn set_live_class(&self, entity: &str, class: &str) {
        let id = EntityId::new(entity);
        let snapshot = self
            .get(&id)
            .unwrap_or_else(|| EntitySnapshot::new(id.clone(), EntityState::Unknown))
            .with_attribute(DEVICE_CLASS, class);
        self.publish(snapshot);
    }

    pub fn state(&self, entity: &str) -> Option<EntityState> {
        self.get(&EntityId::new(entity)).map(|s| s.state)
    }
}

impl StateStore for FakeHome {
    fn get(&self, entity_id: &EntityId) -> Option<EntitySnapshot> {
        self.states.lock().unwrap().get(entity_id).cloned()
    }

    fn publish(&self, snapshot: EntitySnapshot) {
        let old = self
            .states
            .lock()
            .unwrap()
            .insert(snapshot.entity_id.clone(), snapshot.clone());
        if let Some(bus) = &self.bus {
            bus.publish(StateChange::new(old, snapshot));
        }
    }
}

impl LocationDirectory for FakeHome {
    fn location(&self, id: &LocationId) -> Option<Location> {
        self.locations.lock().unwrap().get(id).cloned()
    }

    fn entities_in(&self, id: &LocationId) -> Vec<EntityId> {
        self.members
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

impl DeviceDirectory for FakeHome {
    fn entity(&self, entity_id: &EntityId) -> Option<EntityRecord> {
        self.records.lock().unwrap().get(entity_id).cloned()
    }

    fn device(&self, device_id: &DeviceId) -> Option<Device> {
        self.devices.lock().unwrap().get(device_id).cloned()
    }

    fn entities_of(&self, device_id: &DeviceId) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.device_id.as_ref() == Some(device_id))
            .map(|r| r.entity_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl ControlStore for FakeHome {
    fn restore(&self, entity_id: &EntityId, default: bool) -> bool {
        if let Some(existing) = self.get(entity_id) {
            return existing.state.is_on();
        }
        self.publish(EntitySnapshot::new(entity_id.clone(), EntityState::from(default)));
        default
    }
}

// ── Spy invoker ────────────────────────────────────────────────────

/// Records every command; fails according to a script, then per target.
#[derive(Default)]
pub struct SpyInvoker {
    script: Mutex<VecDeque<ActuationError>>,
    failing_targets: Mutex<HashMap<String, ActuationError>>,
    calls: Mutex<Vec<(Command, bool)>>,
}

impl SpyInvoker {
    /// Fail the next calls with these errors, in order.
    pub fn failing_with(errors: impl IntoIterator<Item = ActuationError>) -> Self {
        Self {
            script: Mutex::new(errors.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Always fail commands aimed at `target`.
    pub fn fail_target(&self, target: &str, error: ActuationError) {
        self.failing_targets
            .lock()
            .unwrap()
            .insert(target.to_string(), error);
    }

    pub fn attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn successes(&self) -> Vec<Command> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(c, _)| c.clone())
            .collect()
    }
}

impl CommandInvoker for SpyInvoker {
    fn invoke(&self, command: Command) -> impl Future<Output = Result<(), ActuationError>> + Send {
        let scripted = self.script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(err) => Err(err),
            None => {
                let target = command.target().map(|t| t.to_string()).unwrap_or_default();
                match self.failing_targets.lock().unwrap().get(&target) {
                    Some(err) => Err(err.clone()),
                    None => Ok(()),
                }
            }
        };
        self.calls
            .lock()
            .unwrap()
            .push((command, result.is_ok()));
        async move { result }
    }
}
