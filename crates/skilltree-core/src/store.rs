//! In-memory skill store with per-user serialized mutations.
//!
//! # Overview
//!
//! The graph engine is pure; this module is the caller that owns state. Each
//! user's records sit behind their own [`Mutex`], and every mutation holds it
//! for the whole read → check → commit sequence. Two concurrent
//! "add prerequisite" calls for the same user can therefore never both pass
//! the cycle guard against the same stale snapshot.
//!
//! Reads clone the user's records under the lock and compute outside it, so
//! order and status queries never block each other for long.
//!
//! # Ids
//!
//! Skill ids come from one store-wide counter, so an id never names skills
//! of two different users. A prerequisite that belongs to another user is
//! simply not found in this user's records.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::error::{ErrorCode, GraphError};
use crate::graph::{
    self, CycleReport, DanglingPrerequisite, UnlockStatus, check_new_prerequisite,
};
use crate::model::{Level, SkillId, SkillRecord, UserId, as_skills};
use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejections from store mutations and lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("skill not found: {0}")]
    SkillNotFound(SkillId),

    #[error("prerequisite skill not found: {0}")]
    PrerequisiteNotFound(SkillId),

    #[error("{prereq} is already a prerequisite of {skill}")]
    DuplicatePrerequisite { skill: SkillId, prereq: SkillId },

    #[error("a skill named '{0}' already exists")]
    DuplicateName(String),

    #[error("skill name must not be empty")]
    EmptyName,

    #[error("no skill ids left to allocate after {}", SkillId::new(u64::MAX))]
    IdSpaceExhausted,
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Graph(err) => err.code(),
            Self::SkillNotFound(_) | Self::PrerequisiteNotFound(_) => ErrorCode::SkillNotFound,
            Self::DuplicatePrerequisite { .. } => ErrorCode::DuplicatePrerequisite,
            Self::DuplicateName(_) | Self::EmptyName => ErrorCode::DuplicateName,
            Self::IdSpaceExhausted => ErrorCode::IdSpaceExhausted,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyName => Some("Provide a non-empty skill name."),
            _ => self.code().hint(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Fields for a new skill. Prerequisites are always added afterwards.
#[derive(Debug, Clone, Default)]
pub struct NewSkill {
    pub name: String,
    pub description: String,
    pub level: Level,
}

impl NewSkill {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a skill's attributes. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SkillUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<Level>,
    pub completed: Option<bool>,
}

impl SkillUpdate {
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// SkillStore
// ---------------------------------------------------------------------------

type UserSlot = Arc<Mutex<Vec<SkillRecord>>>;

/// Skill records for many users, with single-writer mutation per user.
#[derive(Debug)]
pub struct SkillStore {
    /// Highest id handed out so far; 0 before the first allocation.
    last_id: AtomicU64,
    users: RwLock<HashMap<UserId, UserSlot>>,
}

impl Default for SkillStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_id: AtomicU64::new(0),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild a store from a persisted snapshot.
    ///
    /// The id counter resumes after the larger of the stored counter and the
    /// highest id in use. A snapshot that already uses the largest id loads
    /// fine; only the next allocation fails.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let highest = snapshot
            .users
            .values()
            .flatten()
            .map(|record| record.id.get())
            .max()
            .unwrap_or(0);
        let last_id = snapshot.next_id.saturating_sub(1).max(highest);

        let users = snapshot
            .users
            .into_iter()
            .map(|(user, records)| (user, Arc::new(Mutex::new(records))))
            .collect();

        Self {
            last_id: AtomicU64::new(last_id),
            users: RwLock::new(users),
        }
    }

    /// Capture every user's records for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let users: BTreeMap<UserId, Vec<SkillRecord>> = read_guard(&self.users)
            .iter()
            .map(|(user, slot)| (user.clone(), lock_slot(slot).clone()))
            .collect();
        Snapshot {
            next_id: self.last_id.load(Ordering::SeqCst).saturating_add(1),
            users,
            ..Snapshot::default()
        }
    }

    /// Create a skill with no prerequisites.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyName`], [`StoreError::DuplicateName`], or
    /// [`StoreError::IdSpaceExhausted`].
    #[instrument(skip(self, new), fields(user = %user))]
    pub fn create_skill(&self, user: &UserId, new: NewSkill) -> Result<SkillRecord, StoreError> {
        let name = normalize_name(&new.name)?;
        let slot = self.slot(user);
        let mut records = lock_slot(&slot);

        if records.iter().any(|r| r.name == name) {
            return Err(StoreError::DuplicateName(name));
        }

        let id = self.allocate_id()?;
        let now = Utc::now();
        let record = SkillRecord {
            id,
            name,
            description: new.description.trim().to_string(),
            level: new.level,
            completed: false,
            prerequisites: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        info!(skill = %record.id, name = %record.name, "skill created");
        Ok(record)
    }

    /// Update a skill's attributes.
    ///
    /// # Errors
    ///
    /// [`StoreError::SkillNotFound`], or a name error when renaming.
    #[instrument(skip(self, update), fields(user = %user, skill = %id))]
    pub fn update_skill(
        &self,
        user: &UserId,
        id: SkillId,
        update: SkillUpdate,
    ) -> Result<SkillRecord, StoreError> {
        let slot = self.slot(user);
        let mut records = lock_slot(&slot);
        let index = position(&records, id).ok_or(StoreError::SkillNotFound(id))?;

        let name = match update.name {
            Some(raw) => {
                let name = normalize_name(&raw)?;
                if records.iter().any(|r| r.id != id && r.name == name) {
                    return Err(StoreError::DuplicateName(name));
                }
                Some(name)
            }
            None => None,
        };

        let record = &mut records[index];
        if let Some(name) = name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = description.trim().to_string();
        }
        if let Some(level) = update.level {
            record.level = level;
        }
        if let Some(completed) = update.completed {
            record.completed = completed;
        }
        record.updated_at = Utc::now();

        info!(completed = record.completed, "skill updated");
        Ok(record.clone())
    }

    /// Delete a skill, first removing it from every other skill's
    /// prerequisites so no reference dangles.
    ///
    /// # Errors
    ///
    /// [`StoreError::SkillNotFound`].
    #[instrument(skip(self), fields(user = %user, skill = %id))]
    pub fn delete_skill(&self, user: &UserId, id: SkillId) -> Result<SkillRecord, StoreError> {
        let slot = self.slot(user);
        let mut records = lock_slot(&slot);
        let index = position(&records, id).ok_or(StoreError::SkillNotFound(id))?;

        let now = Utc::now();
        let mut detached = 0usize;
        for record in records.iter_mut() {
            let before = record.prerequisites.len();
            record.prerequisites.retain(|p| *p != id);
            if record.prerequisites.len() != before {
                record.updated_at = now;
                detached += 1;
            }
        }

        let removed = records.remove(index);
        info!(detached, "skill deleted");
        Ok(removed)
    }

    /// Make `prereq` a prerequisite of `skill`.
    ///
    /// The cycle guard runs against the user's records while the user's lock
    /// is held, and the edge is committed before the lock is released.
    ///
    /// # Errors
    ///
    /// - [`GraphError::SelfLoopRejected`] when `skill == prereq`.
    /// - [`StoreError::SkillNotFound`] / [`StoreError::PrerequisiteNotFound`]
    ///   when either id is not one of this user's skills.
    /// - [`StoreError::DuplicatePrerequisite`] when the edge already exists.
    /// - [`GraphError::CycleDetected`] when the edge would close a cycle.
    #[instrument(skip(self), fields(user = %user, skill = %skill, prereq = %prereq))]
    pub fn add_prerequisite(
        &self,
        user: &UserId,
        skill: SkillId,
        prereq: SkillId,
    ) -> Result<SkillRecord, StoreError> {
        if skill == prereq {
            return Err(GraphError::SelfLoopRejected { skill }.into());
        }

        let slot = self.slot(user);
        let mut records = lock_slot(&slot);

        let index = position(&records, skill).ok_or(StoreError::SkillNotFound(skill))?;
        if position(&records, prereq).is_none() {
            return Err(StoreError::PrerequisiteNotFound(prereq));
        }
        if records[index].requires(prereq) {
            return Err(StoreError::DuplicatePrerequisite { skill, prereq });
        }

        check_new_prerequisite(&as_skills(&records), prereq, skill)?;

        let record = &mut records[index];
        record.prerequisites.push(prereq);
        record.updated_at = Utc::now();
        info!("prerequisite added");
        Ok(record.clone())
    }

    /// Remove `prereq` from `skill`'s prerequisites. Removing an edge that
    /// does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// [`StoreError::SkillNotFound`].
    #[instrument(skip(self), fields(user = %user, skill = %skill, prereq = %prereq))]
    pub fn remove_prerequisite(
        &self,
        user: &UserId,
        skill: SkillId,
        prereq: SkillId,
    ) -> Result<SkillRecord, StoreError> {
        let slot = self.slot(user);
        let mut records = lock_slot(&slot);
        let index = position(&records, skill).ok_or(StoreError::SkillNotFound(skill))?;

        let record = &mut records[index];
        let before = record.prerequisites.len();
        record.prerequisites.retain(|p| *p != prereq);
        if record.prerequisites.len() == before {
            debug!("prerequisite was not present");
        } else {
            record.updated_at = Utc::now();
            info!("prerequisite removed");
        }
        Ok(record.clone())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All of a user's records in creation order.
    #[must_use]
    pub fn skills(&self, user: &UserId) -> Vec<SkillRecord> {
        read_guard(&self.users)
            .get(user)
            .map(|slot| lock_slot(slot).clone())
            .unwrap_or_default()
    }

    /// One of a user's records.
    ///
    /// # Errors
    ///
    /// [`StoreError::SkillNotFound`].
    pub fn get(&self, user: &UserId, id: SkillId) -> Result<SkillRecord, StoreError> {
        self.skills(user)
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::SkillNotFound(id))
    }

    /// Learning order for a user.
    ///
    /// # Errors
    ///
    /// [`GraphError::CycleDetected`] if the stored graph is cyclic.
    pub fn topological_order(&self, user: &UserId) -> Result<Vec<SkillId>, GraphError> {
        graph::topological_order(&as_skills(&self.skills(user)))
    }

    /// Unlock classification for a user.
    #[must_use]
    pub fn unlock_status(&self, user: &UserId) -> UnlockStatus {
        graph::classify_unlock_status(&as_skills(&self.skills(user)))
    }

    /// Cycles present in a user's stored graph.
    #[must_use]
    pub fn cycles(&self, user: &UserId) -> Vec<CycleReport> {
        graph::find_all_cycles(&as_skills(&self.skills(user)))
    }

    /// Prerequisite references that resolve to none of the user's skills.
    #[must_use]
    pub fn dangling(&self, user: &UserId) -> Vec<DanglingPrerequisite> {
        graph::dangling_prerequisites(&as_skills(&self.skills(user)))
    }

    fn allocate_id(&self) -> Result<SkillId, StoreError> {
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map_err(|_| StoreError::IdSpaceExhausted)?;
        Ok(SkillId::new(previous + 1))
    }

    fn slot(&self, user: &UserId) -> UserSlot {
        if let Some(slot) = read_guard(&self.users).get(user) {
            return Arc::clone(slot);
        }
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(users.entry(user.clone()).or_default())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

// Records are only written after every check passes, so a panic while the
// lock is held cannot leave them half-updated.
fn lock_slot(slot: &Mutex<Vec<SkillRecord>>) -> MutexGuard<'_, Vec<SkillRecord>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_guard(
    users: &RwLock<HashMap<UserId, UserSlot>>,
) -> std::sync::RwLockReadGuard<'_, HashMap<UserId, UserSlot>> {
    users.read().unwrap_or_else(PoisonError::into_inner)
}

fn position(records: &[SkillRecord], id: SkillId) -> Option<usize> {
    records.iter().position(|r| r.id == id)
}

fn normalize_name(raw: &str) -> Result<String, StoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(name.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn user(name: &str) -> UserId {
        UserId::new(name).expect("valid user")
    }

    fn create(store: &SkillStore, owner: &UserId, name: &str) -> SkillId {
        store
            .create_skill(owner, NewSkill::named(name))
            .expect("create skill")
            .id
    }

    #[test]
    fn create_assigns_fresh_ids_and_defaults() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = store
            .create_skill(&alice, NewSkill::named("  Algebra "))
            .expect("create");
        let b = create(&store, &alice, "Calculus");

        assert_ne!(a.id, b);
        assert_eq!(a.name, "Algebra");
        assert_eq!(a.level, Level::Beginner);
        assert!(!a.completed);
        assert!(a.prerequisites.is_empty());
    }

    #[test]
    fn duplicate_and_empty_names_rejected() {
        let store = SkillStore::new();
        let alice = user("alice");
        create(&store, &alice, "Algebra");

        assert_eq!(
            store.create_skill(&alice, NewSkill::named("Algebra")),
            Err(StoreError::DuplicateName("Algebra".to_string()))
        );
        assert_eq!(
            store.create_skill(&alice, NewSkill::named("   ")),
            Err(StoreError::EmptyName)
        );

        // Names are scoped per user.
        assert!(store.create_skill(&user("bob"), NewSkill::named("Algebra")).is_ok());
    }

    #[test]
    fn add_prerequisite_happy_path() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");

        let updated = store.add_prerequisite(&alice, b, a).expect("add");
        assert_eq!(updated.prerequisites, vec![a]);
        assert_eq!(store.topological_order(&alice), Ok(vec![a, b]));
    }

    #[test]
    fn add_prerequisite_rejections() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");
        let c = create(&store, &alice, "C");
        store.add_prerequisite(&alice, b, a).expect("b requires a");
        store.add_prerequisite(&alice, c, b).expect("c requires b");

        assert_eq!(
            store.add_prerequisite(&alice, a, a),
            Err(StoreError::Graph(GraphError::SelfLoopRejected { skill: a }))
        );
        assert_eq!(
            store.add_prerequisite(&alice, b, a),
            Err(StoreError::DuplicatePrerequisite { skill: b, prereq: a })
        );
        assert_eq!(
            store.add_prerequisite(&alice, SkillId::new(999), a),
            Err(StoreError::SkillNotFound(SkillId::new(999)))
        );
        assert_eq!(
            store.add_prerequisite(&alice, a, SkillId::new(999)),
            Err(StoreError::PrerequisiteNotFound(SkillId::new(999)))
        );
        assert_eq!(
            store.add_prerequisite(&alice, a, c),
            Err(StoreError::Graph(GraphError::CycleDetected {
                skills: vec![c, a, b, c]
            }))
        );

        // Rejected edges are never committed.
        assert!(store.get(&alice, a).expect("a").prerequisites.is_empty());
        assert!(store.cycles(&alice).is_empty());
    }

    #[test]
    fn other_users_skills_are_not_found() {
        let store = SkillStore::new();
        let alice = user("alice");
        let bob = user("bob");
        let a = create(&store, &alice, "A");
        let x = create(&store, &bob, "X");

        assert_eq!(
            store.add_prerequisite(&alice, a, x),
            Err(StoreError::PrerequisiteNotFound(x))
        );
        assert_eq!(
            store.delete_skill(&alice, x),
            Err(StoreError::SkillNotFound(x))
        );
        assert_eq!(store.skills(&bob).len(), 1);
    }

    #[test]
    fn remove_prerequisite_is_idempotent() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");
        store.add_prerequisite(&alice, b, a).expect("add");

        let once = store.remove_prerequisite(&alice, b, a).expect("remove");
        assert!(once.prerequisites.is_empty());
        let twice = store.remove_prerequisite(&alice, b, a).expect("remove again");
        assert!(twice.prerequisites.is_empty());
        assert_eq!(
            store.remove_prerequisite(&alice, SkillId::new(77), a),
            Err(StoreError::SkillNotFound(SkillId::new(77)))
        );
    }

    #[test]
    fn delete_detaches_references() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");
        let c = create(&store, &alice, "C");
        store.add_prerequisite(&alice, b, a).expect("add");
        store.add_prerequisite(&alice, c, a).expect("add");

        let removed = store.delete_skill(&alice, a).expect("delete");
        assert_eq!(removed.id, a);
        assert!(store.dangling(&alice).is_empty());
        assert_eq!(store.unlock_status(&alice).unlockable, vec![b, c]);
    }

    #[test]
    fn update_toggles_completion_and_renames() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");
        store.add_prerequisite(&alice, b, a).expect("add");
        assert_eq!(store.unlock_status(&alice).locked, vec![b]);

        store
            .update_skill(&alice, a, SkillUpdate::completed(true))
            .expect("complete");
        let status = store.unlock_status(&alice);
        assert_eq!(status.unlockable, vec![b]);
        assert_eq!(status.total, 2);

        let renamed = store
            .update_skill(
                &alice,
                b,
                SkillUpdate {
                    name: Some("B2".to_string()),
                    level: Some(Level::Advanced),
                    ..SkillUpdate::default()
                },
            )
            .expect("rename");
        assert_eq!(renamed.name, "B2");
        assert_eq!(renamed.level, Level::Advanced);
        assert!(renamed.updated_at >= renamed.created_at);

        assert_eq!(
            store.update_skill(
                &alice,
                b,
                SkillUpdate {
                    name: Some("A".to_string()),
                    ..SkillUpdate::default()
                }
            ),
            Err(StoreError::DuplicateName("A".to_string()))
        );
    }

    #[test]
    fn concurrent_opposing_edges_never_both_commit() {
        for _ in 0..50 {
            let store = SkillStore::new();
            let alice = user("alice");
            let a = create(&store, &alice, "A");
            let b = create(&store, &alice, "B");

            let (left, right) = thread::scope(|scope| {
                let left = scope.spawn(|| store.add_prerequisite(&alice, a, b));
                let right = scope.spawn(|| store.add_prerequisite(&alice, b, a));
                (
                    left.join().expect("left thread"),
                    right.join().expect("right thread"),
                )
            });

            assert!(left.is_ok() != right.is_ok(), "exactly one edge commits");
            assert!(store.topological_order(&alice).is_ok());
        }
    }

    #[test]
    fn snapshot_round_trip_preserves_records_and_counter() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");
        let b = create(&store, &alice, "B");
        store.add_prerequisite(&alice, b, a).expect("add");

        let restored = SkillStore::from_snapshot(store.snapshot());
        assert_eq!(restored.skills(&alice), store.skills(&alice));

        let c = create(&restored, &user("carol"), "C");
        assert!(c > b, "ids keep increasing after restore");
    }

    #[test]
    fn from_snapshot_repairs_stale_counter() {
        let store = SkillStore::new();
        let alice = user("alice");
        let a = create(&store, &alice, "A");

        let mut snapshot = store.snapshot();
        snapshot.next_id = 0;
        let restored = SkillStore::from_snapshot(snapshot);
        let b = create(&restored, &alice, "B");
        assert!(b > a);
    }

    #[test]
    fn snapshot_using_largest_id_loads_but_refuses_new_ids() {
        let raw = r#"{
            "version": 1,
            "next_id": 1,
            "users": {
                "alice": [{
                    "id": "sk-18446744073709551615",
                    "name": "Edge",
                    "created_at": "2025-01-01T00:00:00Z",
                    "updated_at": "2025-01-01T00:00:00Z"
                }]
            }
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).expect("valid snapshot");
        let alice = user("alice");

        let store = SkillStore::from_snapshot(snapshot);
        assert_eq!(store.skills(&alice).len(), 1);
        assert_eq!(store.snapshot().next_id, u64::MAX);

        let err = store
            .create_skill(&alice, NewSkill::named("Next"))
            .expect_err("id space is exhausted");
        assert_eq!(err, StoreError::IdSpaceExhausted);
        assert_eq!(err.code(), ErrorCode::IdSpaceExhausted);
        assert_eq!(store.skills(&alice).len(), 1, "nothing was inserted");
    }

    #[test]
    fn allocation_stops_at_last_id_instead_of_wrapping() {
        let snapshot = Snapshot {
            next_id: u64::MAX,
            ..Snapshot::default()
        };
        let store = SkillStore::from_snapshot(snapshot);
        let alice = user("alice");

        let last = create(&store, &alice, "Last");
        assert_eq!(last, SkillId::new(u64::MAX));
        assert!(matches!(
            store.create_skill(&alice, NewSkill::named("Wrapped")),
            Err(StoreError::IdSpaceExhausted)
        ));
    }

    #[test]
    fn reads_for_unknown_user_are_empty() {
        let store = SkillStore::new();
        let nobody = user("nobody");
        assert!(store.skills(&nobody).is_empty());
        assert_eq!(store.topological_order(&nobody), Ok(vec![]));
        assert_eq!(store.unlock_status(&nobody), UnlockStatus::default());
    }
}
