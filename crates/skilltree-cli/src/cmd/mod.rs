//! Command handlers for `sk`.
//!
//! Every handler follows the same shape: resolve the project and active user,
//! take the advisory lock, load the snapshot, drive the store, and render.
//! Mutations hold a [`MutationLock`] from load until the new snapshot has
//! been saved, so concurrent `sk` processes never validate against a stale
//! graph.

pub mod add;
pub mod completions;
pub mod cycles;
pub mod done;
pub mod edit;
pub mod init;
pub mod list;
pub mod order;
pub mod prereq;
pub mod rm;
pub mod show;
pub mod status;

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use skilltree_core::config::{self, ProjectConfig, ProjectPaths, UserConfig};
use skilltree_core::lock::{MutationLock, ReadLock};
use skilltree_core::snapshot::Snapshot;
use skilltree_core::store::{SkillStore, StoreError};
use skilltree_core::{ErrorCode, SkillId, SkillRecord, UnlockStatus, UserId};
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// Resolved invocation context shared by all handlers.
#[derive(Debug)]
pub struct Context<'a> {
    pub output: OutputMode,
    pub project_root: &'a Path,
    pub user_flag: Option<&'a str>,
    pub user_config: &'a UserConfig,
}

impl Context<'_> {
    /// Render `error` and return it as an `anyhow` error for propagation.
    pub fn fail(&self, error: &CliError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, error) {
            tracing::error!("failed to render error: {render_err}");
        }
        anyhow::anyhow!("{}", error.message)
    }

    /// The user whose skills this invocation operates on.
    ///
    /// # Errors
    ///
    /// Fails when no user is configured or the configured name is blank.
    pub fn require_user(&self) -> anyhow::Result<UserId> {
        let env_user = std::env::var("SKILLTREE_USER").ok();
        let resolved = config::resolve_user(
            self.user_flag,
            env_user.as_deref(),
            self.user_config.user.as_deref(),
        );
        let Some(raw) = resolved else {
            return Err(self.fail(&CliError::coded(
                "no user selected",
                ErrorCode::InvalidUser,
            )));
        };
        UserId::new(&raw)
            .map_err(|err| self.fail(&CliError::coded(err.to_string(), ErrorCode::InvalidUser)))
    }

    /// Parse a skill id argument (`sk-3` or `3`).
    ///
    /// # Errors
    ///
    /// Fails with `E2006` on malformed input.
    pub fn parse_id(&self, raw: &str) -> anyhow::Result<SkillId> {
        SkillId::from_str(raw).map_err(|err| {
            self.fail(&CliError::coded(err.to_string(), ErrorCode::InvalidSkillId))
        })
    }

    /// Locate `.skilltree/` and load its config.
    ///
    /// # Errors
    ///
    /// Fails with `E1001` when no project directory is found above the
    /// working directory, or `E1002` when its config does not parse.
    pub fn project(&self) -> anyhow::Result<Project> {
        let Some(paths) = ProjectPaths::discover(self.project_root) else {
            return Err(self.fail(&CliError::coded(
                "not a skilltree project: .skilltree directory not found",
                ErrorCode::NotInitialized,
            )));
        };
        let config = config::load_project_config(&paths).map_err(|err| {
            self.fail(&CliError::coded(
                format!("{err:#}"),
                ErrorCode::ConfigParseError,
            ))
        })?;
        debug!(dir = %paths.dir().display(), "project located");
        Ok(Project { paths, config })
    }

    /// Load a read-only view of the store under a shared lock.
    ///
    /// # Errors
    ///
    /// Fails on lock timeout or an unreadable snapshot.
    pub fn read_store(&self, project: &Project) -> anyhow::Result<SkillStore> {
        let _lock = ReadLock::acquire(&project.paths.lock(), project.config.lock.timeout())
            .map_err(|err| self.fail(&CliError::from(&err)))?;
        let snapshot = Snapshot::load(&project.paths.snapshot())
            .map_err(|err| self.fail(&CliError::from(&err)))?;
        Ok(SkillStore::from_snapshot(snapshot))
    }

    /// Run `mutate` against the store under the exclusive lock and persist
    /// the result if it succeeds. Nothing is written when it fails.
    ///
    /// # Errors
    ///
    /// Fails on lock timeout, snapshot I/O, or the mutation's own rejection,
    /// each rendered with its machine code.
    pub fn mutate<T>(
        &self,
        project: &Project,
        mutate: impl FnOnce(&SkillStore) -> Result<T, StoreError>,
    ) -> anyhow::Result<T> {
        let lock = MutationLock::acquire(&project.paths.lock(), project.config.lock.timeout())
            .map_err(|err| self.fail(&CliError::from(&err)))?;

        let snapshot_path = project.paths.snapshot();
        let snapshot =
            Snapshot::load(&snapshot_path).map_err(|err| self.fail(&CliError::from(&err)))?;
        let store = SkillStore::from_snapshot(snapshot);

        let value = mutate(&store).map_err(|err| self.fail(&CliError::from(&err)))?;

        store
            .snapshot()
            .save(&snapshot_path)
            .map_err(|err| self.fail(&CliError::from(&err)))?;
        lock.release();
        Ok(value)
    }
}

/// Where an individual skill stands for its user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SkillState {
    Completed,
    Unlockable,
    Locked,
}

impl SkillState {
    pub fn of(status: &UnlockStatus, record: &SkillRecord) -> Self {
        if record.completed {
            Self::Completed
        } else if status.is_unlockable(record.id) {
            Self::Unlockable
        } else {
            Self::Locked
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Unlockable => "unlockable",
            Self::Locked => "locked",
        }
    }

    pub const fn marker(self) -> &'static str {
        match self {
            Self::Completed => "✓",
            Self::Unlockable => "○",
            Self::Locked => "⊘",
        }
    }
}

/// A located project directory and its configuration.
#[derive(Debug)]
pub struct Project {
    pub paths: ProjectPaths,
    pub config: ProjectConfig,
}

/// `name (sk-3)` for human output, or just the id if the record is gone.
pub fn label(records: &[SkillRecord], id: SkillId) -> String {
    records
        .iter()
        .find(|r| r.id == id)
        .map_or_else(|| id.to_string(), |r| format!("{} ({id})", r.name))
}
