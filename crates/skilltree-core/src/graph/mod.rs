//! The skill dependency graph engine.
//!
//! # Overview
//!
//! Every function here is a pure computation over a snapshot of one user's
//! skills. Nothing is cached or retained between calls; callers load the
//! snapshot, call in, and persist whatever they decide to commit.
//!
//! ## Components
//!
//! ```text
//! [Skill] snapshot
//!        ↓  build::SkillGraph::build()
//! SkillGraph (dependents, in-degrees, dangling references)
//!   ├─ cycles::has_cycle / would_create_cycle / check_new_prerequisite
//!   └─ topo::topological_order (Kahn, FIFO)
//!
//! [Skill] snapshot
//!        ↓  unlock::classify_unlock_status()   (one hop, no traversal)
//! UnlockStatus { unlockable, locked, total }
//! ```
//!
//! ## Mutations
//!
//! Adding an edge must go through [`check_new_prerequisite`] against the
//! snapshot read immediately before the commit, with writers for the same
//! user serialized. [`crate::store::SkillStore`] and the CLI's
//! [`crate::lock::MutationLock`] both follow this discipline.

pub mod build;
pub mod cycles;
pub mod topo;
pub mod unlock;

pub use build::{DanglingPrerequisite, SkillGraph};
pub use cycles::{
    CycleReport, check_new_prerequisite, find_all_cycles, find_cycle_path, has_cycle,
    would_create_cycle,
};
pub use topo::topological_order;
pub use unlock::{UnlockStatus, classify_unlock_status, dangling_prerequisites};
