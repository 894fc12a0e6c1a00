//! Event: a state-bus notification that an entity's value or attributes changed.

use serde::{Deserialize, Serialize};

use crate::entity::EntitySnapshot;
use crate::id::EntityId;

/// One entity changed. `new_state` is `None` when the entity was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub entity_id: EntityId,
    pub old_state: Option<EntitySnapshot>,
    pub new_state: Option<EntitySnapshot>,
}

impl StateChange {
    #[must_use]
    pub fn new(old_state: Option<EntitySnapshot>, new_state: EntitySnapshot) -> Self {
        Self {
            entity_id: new_state.entity_id.clone(),
            old_state,
            new_state: Some(new_state),
        }
    }
}
