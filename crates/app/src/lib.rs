//! # tidyhub-app
//!
//! Application layer: services and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StateStore`: read entity snapshots, publish the engine's own signals
//!   - `LocationDirectory` / `DeviceDirectory`: membership and device metadata
//!   - `CommandInvoker`: `(domain, action, payload)` actuation
//!   - `ControlStore`: restorable boolean controls
//! - Provide the **services** the engine is built from:
//!   - `RoomIdentityResolver` + `EntityCache`: room records built at startup
//!   - `ReadinessEvaluator`: per-room readiness with cooldown timers
//!   - `SegmentMonitor` + `ToggleResetController`: completion detection and resets
//!   - `PlanAggregator` + `CleaningDispatcher`: plans and device commands
//! - Provide **in-process infrastructure** (state bus, clock, task handles, retry)
//! - Run the **engine** control loop and its four operator commands
//!
//! ## Dependency rule
//! Depends on `tidyhub-domain` only (plus `tokio` for channels, timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod clock;
pub mod engine;
pub mod event_bus;
pub mod ports;
pub mod retry;
pub mod services;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;
