//! Adjacency construction from a flat skill snapshot.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A is a prerequisite of B": A must be completed
//! before B unlocks. Each [`Skill`] lists its prerequisites, so a record
//! `B { prerequisites: [A] }` contributes the edge `A → B`.
//!
//! ## Absent prerequisites
//!
//! A prerequisite id that does not resolve to a skill in the snapshot gets no
//! node and adds nothing to any in-degree. It is kept in
//! [`SkillGraph::dangling`] so callers can report it. The scheduler therefore
//! treats it as no constraint, while the unlock classifier (which works off
//! the records directly) treats it as unmet.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use crate::model::{Skill, SkillId};

/// A prerequisite reference that points at no skill in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct DanglingPrerequisite {
    /// The skill that lists the missing prerequisite.
    pub skill: SkillId,
    /// The unresolved prerequisite id.
    pub missing: SkillId,
}

impl std::fmt::Display for DanglingPrerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: prerequisite {} does not resolve to a skill",
            self.skill, self.missing
        )
    }
}

/// Adjacency view of one user's skills.
///
/// Built fresh from each snapshot and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SkillGraph {
    /// Skill ids in input order (first occurrence wins on duplicates).
    nodes: Vec<SkillId>,
    /// prereq → skills that list it.
    dependents: HashMap<SkillId, Vec<SkillId>>,
    /// skill → resolved, de-duplicated prerequisites.
    prerequisites: HashMap<SkillId, Vec<SkillId>>,
    /// skill → number of resolved prerequisites.
    in_degree: HashMap<SkillId, usize>,
    dangling: Vec<DanglingPrerequisite>,
}

impl SkillGraph {
    /// Build the adjacency representation of `skills`.
    ///
    /// # Complexity
    ///
    /// O(V + E).
    #[must_use]
    #[instrument(skip_all, fields(skills = skills.len()))]
    pub fn build(skills: &[Skill]) -> Self {
        let mut nodes = Vec::with_capacity(skills.len());
        let mut seen: HashSet<SkillId> = HashSet::with_capacity(skills.len());
        for skill in skills {
            if seen.insert(skill.id) {
                nodes.push(skill.id);
            } else {
                debug!(skill = %skill.id, "duplicate skill record ignored");
            }
        }

        let mut dependents: HashMap<SkillId, Vec<SkillId>> =
            nodes.iter().map(|id| (*id, Vec::new())).collect();
        let mut prerequisites: HashMap<SkillId, Vec<SkillId>> =
            HashMap::with_capacity(nodes.len());
        let mut in_degree: HashMap<SkillId, usize> = nodes.iter().map(|id| (*id, 0)).collect();
        let mut dangling = Vec::new();

        let mut recorded: HashSet<SkillId> = HashSet::with_capacity(nodes.len());
        for skill in skills {
            if !recorded.insert(skill.id) {
                continue;
            }

            let mut resolved: Vec<SkillId> = Vec::with_capacity(skill.prerequisites.len());
            for &prereq in &skill.prerequisites {
                if resolved.contains(&prereq) {
                    continue;
                }
                let Some(out) = dependents.get_mut(&prereq) else {
                    let entry = DanglingPrerequisite {
                        skill: skill.id,
                        missing: prereq,
                    };
                    if !dangling.contains(&entry) {
                        dangling.push(entry);
                    }
                    continue;
                };
                out.push(skill.id);
                resolved.push(prereq);
            }

            in_degree.insert(skill.id, resolved.len());
            prerequisites.insert(skill.id, resolved);
        }

        let graph = Self {
            nodes,
            dependents,
            prerequisites,
            in_degree,
            dangling,
        };
        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            dangling = graph.dangling.len(),
            "skill graph built"
        );
        graph
    }

    /// Number of skills (nodes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of resolved prerequisite edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.in_degree.values().sum()
    }

    #[must_use]
    pub fn contains(&self, id: SkillId) -> bool {
        self.in_degree.contains_key(&id)
    }

    /// Skill ids in input order.
    #[must_use]
    pub fn nodes(&self) -> &[SkillId] {
        &self.nodes
    }

    /// Skills that list `id` as a prerequisite, in input order.
    ///
    /// Empty for unknown ids.
    #[must_use]
    pub fn dependents_of(&self, id: SkillId) -> &[SkillId] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolved prerequisites of `id`. Empty for unknown ids.
    #[must_use]
    pub fn prerequisites_of(&self, id: SkillId) -> &[SkillId] {
        self.prerequisites.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Count of resolved prerequisites of `id`, or `None` if `id` has no node.
    #[must_use]
    pub fn in_degree_of(&self, id: SkillId) -> Option<usize> {
        self.in_degree.get(&id).copied()
    }

    /// Every in-degree, keyed by skill id.
    #[must_use]
    pub fn in_degrees(&self) -> &HashMap<SkillId, usize> {
        &self.in_degree
    }

    /// Prerequisite references that resolve to no skill.
    #[must_use]
    pub fn dangling(&self) -> &[DanglingPrerequisite] {
        &self.dangling
    }

    /// Convert to a petgraph `DiGraph` (edge `prereq → skill`) for SCC
    /// diagnostics.
    ///
    /// Node indices follow input order.
    #[must_use]
    pub fn to_petgraph(&self) -> DiGraph<SkillId, ()> {
        let mut graph = DiGraph::<SkillId, ()>::with_capacity(self.len(), self.edge_count());
        let index: HashMap<SkillId, NodeIndex> = self
            .nodes
            .iter()
            .map(|id| (*id, graph.add_node(*id)))
            .collect();

        for id in &self.nodes {
            for dependent in self.dependents_of(*id) {
                if let (Some(&from), Some(&to)) = (index.get(id), index.get(dependent)) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        graph
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
