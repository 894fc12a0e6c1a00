//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the service layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod command;
pub mod control;
pub mod directory;
pub mod state;

pub use command::CommandInvoker;
pub use control::ControlStore;
pub use directory::{DeviceDirectory, LocationDirectory};
pub use state::StateStore;
