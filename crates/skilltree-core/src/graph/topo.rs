//! Learning order via Kahn's algorithm.
//!
//! The queue is seeded with zero in-degree skills in input order and
//! processed first-in first-out, so ties are broken by when a skill's last
//! outstanding prerequisite was scheduled. The output is deterministic for a
//! given input order.

use std::collections::VecDeque;

use tracing::{debug, instrument, warn};

use super::build::SkillGraph;
use crate::error::GraphError;
use crate::model::{Skill, SkillId};

/// Compute a learning order in which every prerequisite precedes the skills
/// that require it.
///
/// Prerequisite ids that resolve to no skill impose no constraint. An empty
/// snapshot yields an empty order.
///
/// # Errors
///
/// Returns [`GraphError::CycleDetected`] listing the skills that could not be
/// scheduled (in input order) when the relation is cyclic. A partial order is
/// never returned.
///
/// # Complexity
///
/// O(V + E).
#[instrument(skip_all, fields(skills = skills.len()))]
pub fn topological_order(skills: &[Skill]) -> Result<Vec<SkillId>, GraphError> {
    order_graph(&SkillGraph::build(skills))
}

/// Run Kahn's algorithm over an already-built graph.
///
/// # Errors
///
/// See [`topological_order`].
pub fn order_graph(graph: &SkillGraph) -> Result<Vec<SkillId>, GraphError> {
    if graph.is_empty() {
        return Ok(Vec::new());
    }

    let mut in_degree = graph.in_degrees().clone();
    let mut queue: VecDeque<SkillId> = graph
        .nodes()
        .iter()
        .copied()
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &dependent in graph.dependents_of(current) {
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() < graph.len() {
        let remaining: Vec<SkillId> = graph
            .nodes()
            .iter()
            .copied()
            .filter(|id| in_degree.get(id).is_some_and(|d| *d > 0))
            .collect();
        warn!(
            scheduled = order.len(),
            unscheduled = remaining.len(),
            "skill graph contains a cycle"
        );
        return Err(GraphError::CycleDetected { skills: remaining });
    }

    debug!(skills = order.len(), "learning order computed");
    Ok(order)
}
