//! Unlock classification of incomplete skills.
//!
//! A skill is **unlockable** when every direct prerequisite resolves to a
//! completed skill, and **locked** otherwise. This is a one-hop property:
//! an incomplete grand-prerequisite does not lock a skill whose direct
//! prerequisites are all complete. Completed skills appear in neither list.
//!
//! Unlike the scheduler, a prerequisite id that resolves to no skill counts
//! as unmet here.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{instrument, warn};

use super::build::DanglingPrerequisite;
use crate::model::{Skill, SkillId};

/// Partition of a user's incomplete skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnlockStatus {
    /// Incomplete skills whose direct prerequisites are all complete.
    pub unlockable: Vec<SkillId>,
    /// Incomplete skills with at least one unmet or unresolved prerequisite.
    pub locked: Vec<SkillId>,
    /// Number of skills in the snapshot, completed ones included.
    pub total: usize,
}

impl UnlockStatus {
    /// Whether `id` is an incomplete skill ready to start.
    #[must_use]
    pub fn is_unlockable(&self, id: SkillId) -> bool {
        self.unlockable.contains(&id)
    }

    #[must_use]
    pub fn is_locked(&self, id: SkillId) -> bool {
        self.locked.contains(&id)
    }

    /// Number of completed skills.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.total
            .saturating_sub(self.unlockable.len() + self.locked.len())
    }
}

/// Classify every incomplete skill in `skills` as unlockable or locked.
///
/// Both lists follow input order. `total` counts every record.
///
/// # Complexity
///
/// O(V + E): one map lookup per prerequisite reference.
#[must_use]
#[instrument(skip_all, fields(skills = skills.len()))]
pub fn classify_unlock_status(skills: &[Skill]) -> UnlockStatus {
    let completed: HashMap<SkillId, bool> = skills
        .iter()
        .rev()
        .map(|skill| (skill.id, skill.completed))
        .collect();

    let mut status = UnlockStatus {
        total: skills.len(),
        ..UnlockStatus::default()
    };

    for skill in skills.iter().filter(|skill| !skill.completed) {
        let ready = skill
            .prerequisites
            .iter()
            .all(|prereq| completed.get(prereq).copied().unwrap_or(false));
        if ready {
            status.unlockable.push(skill.id);
        } else {
            status.locked.push(skill.id);
        }
    }

    status
}

/// List every prerequisite reference that resolves to no skill.
///
/// Each one is reported once per referencing skill, in input order.
#[must_use]
pub fn dangling_prerequisites(skills: &[Skill]) -> Vec<DanglingPrerequisite> {
    let known: std::collections::HashSet<SkillId> = skills.iter().map(|s| s.id).collect();
    let mut dangling: Vec<DanglingPrerequisite> = Vec::new();

    for skill in skills {
        for &missing in &skill.prerequisites {
            if known.contains(&missing) {
                continue;
            }
            let entry = DanglingPrerequisite {
                skill: skill.id,
                missing,
            };
            if !dangling.contains(&entry) {
                warn!(skill = %skill.id, %missing, "prerequisite does not resolve to a skill");
                dangling.push(entry);
            }
        }
    }

    dangling
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> SkillId {
        SkillId::new(n)
    }

    fn skill(n: u64, prereqs: &[u64]) -> Skill {
        Skill::new(id(n)).with_prerequisites(prereqs.iter().copied().map(id))
    }

    #[test]
    fn empty_snapshot() {
        assert_eq!(
            classify_unlock_status(&[]),
            UnlockStatus {
                unlockable: vec![],
                locked: vec![],
                total: 0
            }
        );
    }

    #[test]
    fn completed_prereq_unlocks_dependent() {
        let skills = vec![skill(1, &[]).completed(), skill(2, &[1])];
        let status = classify_unlock_status(&skills);
        assert_eq!(status.unlockable, vec![id(2)]);
        assert!(status.locked.is_empty());
        assert_eq!(status.total, 2);
        assert_eq!(status.completed(), 1);
    }

    #[test]
    fn incomplete_prereq_locks_dependent() {
        let skills = vec![skill(1, &[]), skill(2, &[1])];
        let status = classify_unlock_status(&skills);
        assert_eq!(status.unlockable, vec![id(1)]);
        assert_eq!(status.locked, vec![id(2)]);
        assert_eq!(status.total, 2);
    }

    #[test]
    fn no_prereqs_is_vacuously_unlockable() {
        let status = classify_unlock_status(&[skill(1, &[])]);
        assert!(status.is_unlockable(id(1)));
        assert!(!status.is_locked(id(1)));
    }

    #[test]
    fn missing_prereq_locks() {
        let status = classify_unlock_status(&[skill(26, &[23])]);
        assert_eq!(status.locked, vec![id(26)]);
        assert!(status.unlockable.is_empty());
    }

    #[test]
    fn completed_skills_are_excluded() {
        let skills = vec![skill(1, &[]).completed(), skill(2, &[99]).completed()];
        let status = classify_unlock_status(&skills);
        assert!(status.unlockable.is_empty());
        assert!(status.locked.is_empty());
        assert_eq!(status.total, 2);
        assert_eq!(status.completed(), 2);
    }

    #[test]
    fn classification_is_one_hop() {
        // 1 incomplete, 2 completed (requires 1), 3 requires 2.
        let skills = vec![skill(1, &[]), skill(2, &[1]).completed(), skill(3, &[2])];
        let status = classify_unlock_status(&skills);
        assert_eq!(status.unlockable, vec![id(1), id(3)]);
        assert!(status.locked.is_empty());
    }

    #[test]
    fn one_unmet_prereq_of_many_locks() {
        let skills = vec![
            skill(1, &[]).completed(),
            skill(2, &[]).completed(),
            skill(3, &[]),
            skill(4, &[1, 2, 3]),
        ];
        let status = classify_unlock_status(&skills);
        assert_eq!(status.unlockable, vec![id(3)]);
        assert_eq!(status.locked, vec![id(4)]);
    }

    #[test]
    fn output_follows_input_order() {
        let skills = vec![skill(9, &[]), skill(3, &[7]), skill(5, &[]), skill(1, &[8])];
        let status = classify_unlock_status(&skills);
        assert_eq!(status.unlockable, vec![id(9), id(5)]);
        assert_eq!(status.locked, vec![id(3), id(1)]);
    }

    #[test]
    fn dangling_prerequisites_listed_once() {
        let skills = vec![skill(1, &[]), skill(2, &[1, 40, 40]), skill(3, &[41])];
        assert_eq!(
            dangling_prerequisites(&skills),
            vec![
                DanglingPrerequisite {
                    skill: id(2),
                    missing: id(40)
                },
                DanglingPrerequisite {
                    skill: id(3),
                    missing: id(41)
                },
            ]
        );
    }

    #[test]
    fn status_serializes_with_expected_keys() {
        let status = classify_unlock_status(&[skill(1, &[]).completed(), skill(2, &[1])]);
        let json = serde_json::to_value(&status).expect("serialize");
        assert_eq!(json["unlockable"], serde_json::json!(["sk-2"]));
        assert_eq!(json["locked"], serde_json::json!([]));
        assert_eq!(json["total"], 2);
    }
}
