//! Room readiness handler.

use axum::Json;
use axum::extract::State;

use tidyhub_app::engine::RoomReadiness;
use tidyhub_app::ports::{CommandInvoker, DeviceDirectory, LocationDirectory, StateStore};

use crate::state::AppState;

/// `GET /api/rooms`
pub async fn list<S, L, D, C>(
    State(state): State<AppState<S, L, D, C>>,
) -> Json<Vec<RoomReadiness>>
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    Json(state.engine.readiness())
}
