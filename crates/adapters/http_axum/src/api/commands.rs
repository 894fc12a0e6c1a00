//! Operator command handlers.
//!
//! Every command answers `202 Accepted` with the batch report, including
//! when some targets failed.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use tidyhub_app::ports::{CommandInvoker, DeviceDirectory, LocationDirectory, StateStore};
use tidyhub_app::retry::BatchReport;
use tidyhub_domain::id::LocationId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `clean_specific_room`.
#[derive(Debug, Deserialize)]
pub struct CleanRoomRequest {
    pub location: String,
}

/// Possible responses from a command endpoint.
pub enum CommandResponse {
    Accepted(Json<BatchReport>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `POST /api/commands/reset_all_toggles`
pub async fn reset_all_toggles<S, L, D, C>(
    State(state): State<AppState<S, L, D, C>>,
) -> CommandResponse
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    CommandResponse::Accepted(Json(state.engine.reset_all_controls().await))
}

/// `POST /api/commands/clean_all_enabled`
pub async fn clean_all_enabled<S, L, D, C>(
    State(state): State<AppState<S, L, D, C>>,
) -> CommandResponse
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    CommandResponse::Accepted(Json(state.engine.clean_all().await))
}

/// `POST /api/commands/clean_specific_room`
///
/// # Errors
///
/// `400` for an empty location, `404` when no room is configured there.
pub async fn clean_specific_room<S, L, D, C>(
    State(state): State<AppState<S, L, D, C>>,
    Json(req): Json<CleanRoomRequest>,
) -> Result<CommandResponse, ApiError>
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    let location = LocationId::new(req.location.trim());
    let report = state.engine.clean_location(&location).await?;
    Ok(CommandResponse::Accepted(Json(report)))
}

/// `POST /api/commands/stop_cleaning`
pub async fn stop_cleaning<S, L, D, C>(
    State(state): State<AppState<S, L, D, C>>,
) -> CommandResponse
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    CommandResponse::Accepted(Json(state.engine.stop_cleaning().await))
}
