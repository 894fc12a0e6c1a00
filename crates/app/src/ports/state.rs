//! State store port: current entity snapshots on the state bus.

use std::sync::Arc;

use tidyhub_domain::entity::EntitySnapshot;
use tidyhub_domain::id::EntityId;

/// Read side of the state bus, plus publishing of the engine's own signals
/// (readiness, plan readout).
pub trait StateStore: Send + Sync {
    /// Current snapshot of an entity, `None` when it has never reported.
    fn get(&self, entity_id: &EntityId) -> Option<EntitySnapshot>;

    /// Replace an entity's snapshot and notify subscribers.
    fn publish(&self, snapshot: EntitySnapshot);
}

impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn get(&self, entity_id: &EntityId) -> Option<EntitySnapshot> {
        (**self).get(entity_id)
    }

    fn publish(&self, snapshot: EntitySnapshot) {
        (**self).publish(snapshot);
    }
}
