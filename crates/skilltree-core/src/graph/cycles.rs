//! Cycle guard for the prerequisite graph.
//!
//! # Overview
//!
//! A cycle in the prerequisite relation means no skill in the loop can ever
//! unlock. Callers must run [`check_new_prerequisite`] (or
//! [`would_create_cycle`]) before committing an edge, so a stored graph is
//! never observed in a cyclic state.
//!
//! # Design
//!
//! - **Three-colour DFS**: white (unvisited), gray (on the stack), black
//!   (fully processed). Reaching a gray node closes a cycle.
//! - **Explicit stack**: traversal depth is bounded by heap memory, not by
//!   the thread stack, so long prerequisite chains are fine.
//! - **Hypothetical check**: an insertion is checked by running the full
//!   detector over the snapshot with the candidate edge included.
//! - **O(V+E)**: every node and edge is visited at most once.
//!
//! # Usage
//!
//! ```rust,ignore
//! use skilltree_core::graph::cycles::check_new_prerequisite;
//!
//! // `prereq` becomes a prerequisite of `skill`.
//! check_new_prerequisite(&skills, prereq, skill)?;
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::algo::tarjan_scc;
use serde::Serialize;
use tracing::{instrument, warn};

use super::build::SkillGraph;
use crate::error::{GraphError, display_ids};
use crate::model::{Skill, SkillId};

// ---------------------------------------------------------------------------
// CycleReport
// ---------------------------------------------------------------------------

/// One strongly connected group of skills that prevents any of them from
/// being scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Sorted ids of the skills in the cycle.
    pub members: Vec<SkillId>,
}

impl CycleReport {
    /// Returns `true` if this is a skill listing itself as a prerequisite.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.members.len() == 1
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "self-loop on {}", display_ids(&self.members))
        } else {
            write!(
                f,
                "cycle ({} skills): {}",
                self.members.len(),
                self.members
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Core detection
// ---------------------------------------------------------------------------

/// Check whether the prerequisite relation in `skills` contains a cycle.
///
/// Prerequisite ids that resolve to no skill are skipped.
#[must_use]
#[instrument(skip_all, fields(skills = skills.len()))]
pub fn has_cycle(skills: &[Skill]) -> bool {
    graph_has_cycle(&SkillGraph::build(skills))
}

/// Check whether an already-built graph contains a cycle.
///
/// Short-circuits on the first back edge.
#[must_use]
pub fn graph_has_cycle(graph: &SkillGraph) -> bool {
    let mut color: HashMap<SkillId, Color> =
        graph.nodes().iter().map(|id| (*id, Color::White)).collect();

    for &start in graph.nodes() {
        if color.get(&start) != Some(&Color::White) {
            continue;
        }

        // Each frame is (node, index of the next prerequisite to explore).
        let mut stack: Vec<(SkillId, usize)> = vec![(start, 0)];
        color.insert(start, Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            if let Some(&prereq) = graph.prerequisites_of(node).get(next) {
                frame.1 += 1;
                match color.get(&prereq) {
                    Some(Color::White) => {
                        color.insert(prereq, Color::Gray);
                        stack.push((prereq, 0));
                    }
                    Some(Color::Gray) => return true,
                    _ => {}
                }
            } else {
                color.insert(node, Color::Black);
                stack.pop();
            }
        }
    }

    false
}

/// Would making `from` a prerequisite of `to` create a cycle?
///
/// `from == to` is always a cycle. Otherwise the candidate edge is added to
/// a copy of the snapshot and the full detector is run over it. If `to` is
/// not in the snapshot the edge cannot close a loop.
#[must_use]
#[instrument(skip_all, fields(skills = skills.len(), from = %from, to = %to))]
pub fn would_create_cycle(skills: &[Skill], from: SkillId, to: SkillId) -> bool {
    if from == to {
        return true;
    }

    let hypothetical: Vec<Skill> = skills
        .iter()
        .map(|skill| {
            let mut skill = skill.clone();
            if skill.id == to && !skill.prerequisites.contains(&from) {
                skill.prerequisites.push(from);
            }
            skill
        })
        .collect();

    has_cycle(&hypothetical)
}

/// Validate a prerequisite insertion: `from` becomes a prerequisite of `to`.
///
/// # Errors
///
/// - [`GraphError::SelfLoopRejected`] when `from == to`, before any traversal.
/// - [`GraphError::CycleDetected`] when the resulting graph would be cyclic.
///   `skills` holds the closing path `from → to → … → from` when one exists.
pub fn check_new_prerequisite(
    skills: &[Skill],
    from: SkillId,
    to: SkillId,
) -> Result<(), GraphError> {
    if from == to {
        warn!(skill = %to, "rejected self-prerequisite");
        return Err(GraphError::SelfLoopRejected { skill: to });
    }

    if !would_create_cycle(skills, from, to) {
        return Ok(());
    }

    let path = find_cycle_path(skills, from, to)
        .or_else(|| find_all_cycles(skills).into_iter().next().map(|c| c.members))
        .unwrap_or_else(|| vec![from, to, from]);
    warn!(%from, %to, cycle = %display_ids(&path), "rejected prerequisite that closes a cycle");
    Err(GraphError::CycleDetected { skills: path })
}

/// Find the cycle closed by the candidate edge `from → to`, if any.
///
/// The result reads `from → to → … → from` following prerequisite edges in
/// the unlock direction. Breadth-first, so the path is a shortest one.
#[must_use]
pub fn find_cycle_path(skills: &[Skill], from: SkillId, to: SkillId) -> Option<Vec<SkillId>> {
    if from == to {
        return Some(vec![from, from]);
    }

    let graph = SkillGraph::build(skills);
    if !graph.contains(from) || !graph.contains(to) {
        return None;
    }

    // BFS from `to` along unlock edges looking for `from`.
    let mut queue: VecDeque<SkillId> = VecDeque::from([to]);
    let mut visited: HashSet<SkillId> = HashSet::from([to]);
    let mut parent: HashMap<SkillId, SkillId> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == from {
            return Some(reconstruct_cycle_path(from, to, &parent));
        }
        for &next in graph.dependents_of(current) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Report every cycle already present in `skills`.
///
/// Each entry is one strongly connected component with more than one
/// member, or a single skill that lists itself. Reports are sorted.
#[must_use]
pub fn find_all_cycles(skills: &[Skill]) -> Vec<CycleReport> {
    let graph = SkillGraph::build(skills);
    let pg = graph.to_petgraph();

    let mut reports: Vec<CycleReport> = tarjan_scc(&pg)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| pg.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut members: Vec<SkillId> = component.into_iter().map(|idx| pg[idx]).collect();
            members.sort_unstable();
            CycleReport { members }
        })
        .collect();

    reports.sort_unstable_by(|a, b| a.members.cmp(&b.members));
    reports
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn reconstruct_cycle_path(
    from: SkillId,
    to: SkillId,
    parent: &HashMap<SkillId, SkillId>,
) -> Vec<SkillId> {
    // Parent links describe to → … → from; walk them backwards from `from`.
    let mut to_to_from = vec![from];
    let mut cursor = from;
    while cursor != to {
        match parent.get(&cursor) {
            Some(prev) => {
                cursor = *prev;
                to_to_from.push(cursor);
            }
            None => break,
        }
    }
    to_to_from.reverse();

    let mut cycle = Vec::with_capacity(to_to_from.len() + 1);
    cycle.push(from);
    cycle.extend(to_to_from);
    cycle
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> SkillId {
        SkillId::new(n)
    }

    fn skill(n: u64, prereqs: &[u64]) -> Skill {
        Skill::new(id(n)).with_prerequisites(prereqs.iter().copied().map(id))
    }

    /// A → B → C: B requires A, C requires B.
    fn chain() -> Vec<Skill> {
        vec![skill(1, &[]), skill(2, &[1]), skill(3, &[2])]
    }

    fn long_chain(n: u64) -> Vec<Skill> {
        (0..n)
            .map(|i| if i == 0 { skill(0, &[]) } else { skill(i, &[i - 1]) })
            .collect()
    }

    // -----------------------------------------------------------------------
    // has_cycle
    // -----------------------------------------------------------------------

    #[test]
    fn empty_snapshot_has_no_cycle() {
        assert!(!has_cycle(&[]));
    }

    #[test]
    fn chain_has_no_cycle() {
        assert!(!has_cycle(&chain()));
    }

    #[test]
    fn diamond_has_no_cycle() {
        let skills = vec![
            skill(1, &[]),
            skill(2, &[1]),
            skill(3, &[1]),
            skill(4, &[2, 3]),
        ];
        assert!(!has_cycle(&skills));
    }

    #[test]
    fn stored_self_loop_is_a_cycle() {
        assert!(has_cycle(&[skill(1, &[1])]));
    }

    #[test]
    fn mutual_prerequisites_are_a_cycle() {
        assert!(has_cycle(&[skill(1, &[2]), skill(2, &[1])]));
    }

    #[test]
    fn cycle_in_disconnected_component_detected() {
        let skills = vec![
            skill(1, &[]),
            skill(2, &[1]),
            skill(10, &[12]),
            skill(11, &[10]),
            skill(12, &[11]),
        ];
        assert!(has_cycle(&skills));
    }

    #[test]
    fn dangling_prerequisites_are_skipped() {
        assert!(!has_cycle(&[skill(1, &[99]), skill(2, &[1, 98])]));
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let skills = long_chain(50_000);
        assert!(!has_cycle(&skills));
    }

    // -----------------------------------------------------------------------
    // would_create_cycle
    // -----------------------------------------------------------------------

    #[test]
    fn closing_edge_on_chain_is_rejected() {
        // Making C a prerequisite of A closes A → B → C → A.
        assert!(would_create_cycle(&chain(), id(3), id(1)));
    }

    #[test]
    fn forward_edge_on_chain_is_accepted() {
        // A as a direct prerequisite of C is redundant but acyclic.
        assert!(!would_create_cycle(&chain(), id(1), id(3)));
    }

    #[test]
    fn self_edge_always_creates_cycle() {
        assert!(would_create_cycle(&[], id(1), id(1)));
        assert!(would_create_cycle(&chain(), id(2), id(2)));
    }

    #[test]
    fn edge_to_absent_skill_creates_no_cycle() {
        assert!(!would_create_cycle(&chain(), id(3), id(42)));
    }

    #[test]
    fn existing_edge_creates_no_new_cycle() {
        assert!(!would_create_cycle(&chain(), id(1), id(2)));
    }

    #[test]
    fn does_not_mutate_input() {
        let skills = chain();
        let before = skills.clone();
        let _ = would_create_cycle(&skills, id(3), id(1));
        assert_eq!(skills, before);
    }

    // -----------------------------------------------------------------------
    // check_new_prerequisite
    // -----------------------------------------------------------------------

    #[test]
    fn self_loop_rejected_with_precise_kind() {
        let err = check_new_prerequisite(&chain(), id(2), id(2)).expect_err("self loop");
        assert_eq!(err, GraphError::SelfLoopRejected { skill: id(2) });
    }

    #[test]
    fn cycle_rejected_with_path() {
        let err = check_new_prerequisite(&chain(), id(3), id(1)).expect_err("cycle");
        assert_eq!(
            err,
            GraphError::CycleDetected {
                skills: vec![id(3), id(1), id(2), id(3)]
            }
        );
    }

    #[test]
    fn acyclic_edge_accepted() {
        assert!(check_new_prerequisite(&chain(), id(1), id(3)).is_ok());
    }

    #[test]
    fn mutual_prerequisite_rejected() {
        let skills = vec![skill(1, &[]), skill(2, &[1])];
        let err = check_new_prerequisite(&skills, id(2), id(1)).expect_err("cycle");
        assert_eq!(
            err,
            GraphError::CycleDetected {
                skills: vec![id(2), id(1), id(2)]
            }
        );
    }

    #[test]
    fn long_cycle_path_is_complete() {
        let skills = long_chain(1000);
        let err = check_new_prerequisite(&skills, id(999), id(0)).expect_err("cycle");
        let path = match err {
            GraphError::CycleDetected { skills } => skills,
            other => panic!("expected cycle, got {other:?}"),
        };
        assert_eq!(path.len(), 1001);
        assert_eq!(path.first(), Some(&id(999)));
        assert_eq!(path.last(), Some(&id(999)));
    }

    // -----------------------------------------------------------------------
    // find_all_cycles
    // -----------------------------------------------------------------------

    #[test]
    fn find_all_cycles_on_dag_is_empty() {
        assert!(find_all_cycles(&chain()).is_empty());
    }

    #[test]
    fn find_all_cycles_reports_self_loop() {
        let cycles = find_all_cycles(&[skill(1, &[1]), skill(2, &[])]);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_self_loop());
        assert_eq!(cycles[0].members, vec![id(1)]);
        assert!(cycles[0].to_string().contains("self-loop"));
    }

    #[test]
    fn find_all_cycles_reports_each_component() {
        let skills = vec![
            skill(1, &[2]),
            skill(2, &[1]),
            skill(3, &[5]),
            skill(4, &[3]),
            skill(5, &[4]),
            skill(6, &[1]),
        ];
        let cycles = find_all_cycles(&skills);
        assert_eq!(
            cycles,
            vec![
                CycleReport {
                    members: vec![id(1), id(2)]
                },
                CycleReport {
                    members: vec![id(3), id(4), id(5)]
                },
            ]
        );
        assert_eq!(cycles[1].to_string(), "cycle (3 skills): sk-3, sk-4, sk-5");
    }
}
