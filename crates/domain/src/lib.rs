//! # tidyhub-domain
//!
//! Pure domain model for the tidyhub cleaning orchestrator.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Describe **entities** as the state bus reports them (value + attributes)
//! - Describe **locations** and **devices** as the directories report them
//! - Define **rooms**: configuration, identity, cache keys, control ids
//! - Decide **readiness** from occupancy, cooldown and barrier readings
//! - Track **segments** from a device state stream and emit completions
//! - Decide **cleaning plans** from controls and readiness
//! - Pick the **cleaning command** for a device manufacturer
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod entity;
pub mod event;
pub mod identity;
pub mod location;
pub mod plan;
pub mod readiness;
pub mod room;
pub mod slug;
pub mod tracking;
