//! Plan readout handler.

use axum::Json;
use axum::extract::State;

use tidyhub_app::ports::{CommandInvoker, DeviceDirectory, LocationDirectory, StateStore};
use tidyhub_app::services::PlanReadout;

use crate::state::AppState;

/// `GET /api/plan`
pub async fn get<S, L, D, C>(State(state): State<AppState<S, L, D, C>>) -> Json<PlanReadout>
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    Json(state.engine.readout())
}
