#![forbid(unsafe_code)]
//! skilltree-core library.
//!
//! The engine takes a snapshot of one user's skills and derives results from
//! it: whether the prerequisite relation is acyclic, a learning order, and
//! which incomplete skills are ready to unlock. Nothing in [`graph`] holds
//! state between calls.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at the library boundary, mapped onto
//!   [`error::ErrorCode`] for machine-readable reporting.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod snapshot;
pub mod store;

pub use error::{ErrorCode, GraphError};
pub use graph::{
    SkillGraph, UnlockStatus, check_new_prerequisite, classify_unlock_status, has_cycle,
    topological_order, would_create_cycle,
};
pub use model::{Level, Skill, SkillId, SkillRecord, UserId};
