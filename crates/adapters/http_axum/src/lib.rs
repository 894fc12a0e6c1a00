//! # tidyhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **plan readout** and the **readiness** of every room as JSON
//! - Expose the four operator commands (`reset_all_toggles`,
//!   `clean_all_enabled`, `clean_specific_room`, `stop_cleaning`)
//! - Map engine errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `tidyhub-app` (engine and port traits) and `tidyhub-domain`
//! (types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
