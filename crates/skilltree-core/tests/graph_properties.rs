use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use skilltree_core::graph::find_all_cycles;
use skilltree_core::{
    GraphError, Skill, SkillId, check_new_prerequisite, classify_unlock_status, has_cycle,
    topological_order, would_create_cycle,
};

use generators::*;

fn with_edge(skills: &[Skill], from: SkillId, to: SkillId) -> Vec<Skill> {
    skills
        .iter()
        .cloned()
        .map(|mut skill| {
            if skill.id == to {
                skill.prerequisites.push(from);
            }
            skill
        })
        .collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    // Cycle guard
    #[test]
    fn would_create_cycle_matches_has_cycle_after_insert(
        skills in arb_dag(),
        (from, to) in arb_edge(),
    ) {
        prop_assume!(!has_cycle(&skills));
        prop_assert_eq!(
            would_create_cycle(&skills, from, to),
            from == to || has_cycle(&with_edge(&skills, from, to))
        );
    }

    #[test]
    fn accepted_edges_keep_graph_acyclic(
        skills in arb_dag(),
        (from, to) in arb_edge(),
    ) {
        if check_new_prerequisite(&skills, from, to).is_ok() {
            prop_assert!(!has_cycle(&with_edge(&skills, from, to)));
        }
    }

    #[test]
    fn self_loop_always_rejected(skills in arb_skills(), n in 1..=MAX_SKILLS) {
        let id = SkillId::new(n);
        prop_assert!(would_create_cycle(&skills, id, id));
        prop_assert_eq!(
            check_new_prerequisite(&skills, id, id),
            Err(GraphError::SelfLoopRejected { skill: id })
        );
    }

    #[test]
    fn rejected_edge_reports_closing_path(
        skills in arb_dag(),
        (from, to) in arb_edge(),
    ) {
        prop_assume!(from != to);
        if let Err(GraphError::CycleDetected { skills: path }) =
            check_new_prerequisite(&skills, from, to)
        {
            prop_assert!(path.len() >= 3);
            prop_assert_eq!(path.first(), Some(&from));
            prop_assert_eq!(path.get(1), Some(&to));
            prop_assert_eq!(path.last(), Some(&from));
        }
    }

    // Scheduler
    #[test]
    fn order_respects_every_edge(skills in arb_dag()) {
        let order = topological_order(&skills).expect("dag must schedule");
        let position: HashMap<SkillId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for skill in &skills {
            for prereq in &skill.prerequisites {
                prop_assert!(position[prereq] < position[&skill.id]);
            }
        }
    }

    #[test]
    fn order_contains_every_skill_once(skills in arb_dag()) {
        let order = topological_order(&skills).expect("dag must schedule");
        prop_assert_eq!(order.len(), skills.len());
        let unique: HashSet<SkillId> = order.iter().copied().collect();
        let expected: HashSet<SkillId> = skills.iter().map(|s| s.id).collect();
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn order_fails_exactly_when_cyclic(skills in arb_skills()) {
        let cyclic = has_cycle(&skills);
        match topological_order(&skills) {
            Ok(order) => {
                prop_assert!(!cyclic);
                prop_assert_eq!(order.len(), skills.len());
            }
            Err(GraphError::CycleDetected { skills: remaining }) => {
                prop_assert!(cyclic);
                prop_assert!(!remaining.is_empty());
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn scc_diagnostics_agree_with_detector(skills in arb_skills()) {
        prop_assert_eq!(find_all_cycles(&skills).is_empty(), !has_cycle(&skills));
    }

    // Unlock classifier
    #[test]
    fn unlock_partition_covers_incomplete_skills(skills in arb_skills()) {
        let status = classify_unlock_status(&skills);
        let unlockable: HashSet<SkillId> = status.unlockable.iter().copied().collect();
        let locked: HashSet<SkillId> = status.locked.iter().copied().collect();
        let incomplete: HashSet<SkillId> =
            skills.iter().filter(|s| !s.completed).map(|s| s.id).collect();

        prop_assert!(unlockable.is_disjoint(&locked));
        prop_assert_eq!(&unlockable | &locked, incomplete);
        prop_assert_eq!(status.total, skills.len());
    }

    #[test]
    fn unlockable_means_direct_prereqs_completed(skills in arb_skills()) {
        let completed: HashSet<SkillId> =
            skills.iter().filter(|s| s.completed).map(|s| s.id).collect();
        let status = classify_unlock_status(&skills);
        for skill in skills.iter().filter(|s| !s.completed) {
            let ready = skill.prerequisites.iter().all(|p| completed.contains(p));
            prop_assert_eq!(status.is_unlockable(skill.id), ready);
        }
    }
}
