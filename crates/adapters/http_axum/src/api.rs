//! JSON API handler modules.

pub mod commands;
pub mod plan;
pub mod rooms;

use axum::Router;
use axum::routing::{get, post};

use tidyhub_app::ports::{CommandInvoker, DeviceDirectory, LocationDirectory, StateStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, L, D, C>() -> Router<AppState<S, L, D, C>>
where
    S: StateStore + Clone + 'static,
    L: LocationDirectory + Clone + 'static,
    D: DeviceDirectory + Clone + 'static,
    C: CommandInvoker + Clone + 'static,
{
    Router::new()
        .route("/plan", get(plan::get::<S, L, D, C>))
        .route("/rooms", get(rooms::list::<S, L, D, C>))
        .route(
            "/commands/reset_all_toggles",
            post(commands::reset_all_toggles::<S, L, D, C>),
        )
        .route(
            "/commands/clean_all_enabled",
            post(commands::clean_all_enabled::<S, L, D, C>),
        )
        .route(
            "/commands/clean_specific_room",
            post(commands::clean_specific_room::<S, L, D, C>),
        )
        .route(
            "/commands/stop_cleaning",
            post(commands::stop_cleaning::<S, L, D, C>),
        )
}
