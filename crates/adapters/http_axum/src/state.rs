//! Shared application state for axum handlers.

use std::sync::Arc;

use tidyhub_app::engine::Engine;

/// Application state shared across all axum handlers.
///
/// Generic over the engine's ports to avoid dynamic dispatch. `Clone` is
/// implemented manually so the ports themselves do not need to be `Clone`
/// here; only the `Arc` is cloned.
pub struct AppState<S, L, D, C> {
    pub engine: Arc<Engine<S, L, D, C>>,
}

impl<S, L, D, C> Clone for AppState<S, L, D, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S, L, D, C> AppState<S, L, D, C> {
    /// Wrap an engine that is also driven by a background loop.
    pub fn new(engine: Arc<Engine<S, L, D, C>>) -> Self {
        Self { engine }
    }
}
