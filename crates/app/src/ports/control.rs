//! Control port: boolean toggles whose value survives restarts.

use std::sync::Arc;

use tidyhub_domain::id::EntityId;

/// Creates restorable boolean controls.
pub trait ControlStore: Send + Sync {
    /// Make sure the control exists and return its value, restoring the
    /// last known one or falling back to `default`.
    fn restore(&self, entity_id: &EntityId, default: bool) -> bool;
}

impl<T: ControlStore + ?Sized> ControlStore for Arc<T> {
    fn restore(&self, entity_id: &EntityId, default: bool) -> bool {
        (**self).restore(entity_id, default)
    }
}
