//! On-disk snapshot of every user's skills.
//!
//! ```json
//! { "version": 1, "next_id": 4, "users": { "alice": [ { "id": "sk-1", ... } ] } }
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a reader never sees a half-written snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ErrorCode;
use crate::model::{SkillRecord, UserId};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "{} has snapshot version {found}; this build understands version {}",
        .path.display(),
        SNAPSHOT_VERSION
    )]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Corrupt { .. } => ErrorCode::SnapshotCorrupt,
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedSnapshotVersion,
            Self::Write { .. } => ErrorCode::SnapshotWriteFailed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Next skill id to hand out, shared by all users.
    pub next_id: u64,
    #[serde(default)]
    pub users: BTreeMap<UserId, Vec<SkillRecord>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_id: 1,
            users: BTreeMap::new(),
        }
    }
}

impl Snapshot {
    /// Read a snapshot, or an empty one if `path` does not exist.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Read`], [`SnapshotError::Corrupt`], or
    /// [`SnapshotError::UnsupportedVersion`].
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot yet; starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let snapshot: Self =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: snapshot.version,
            });
        }

        debug!(
            path = %path.display(),
            users = snapshot.users.len(),
            skills = snapshot.skill_count(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot atomically.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Write`] if the temp file cannot be written or renamed.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let write_err = |source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut json = serde_json::to_vec_pretty(self)
            .map_err(|err| write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        json.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp).map_err(write_err)?;
            file.write_all(&json).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp, path).map_err(write_err)?;

        info!(path = %path.display(), skills = self.skill_count(), "snapshot saved");
        Ok(())
    }

    /// Total records across all users.
    #[must_use]
    pub fn skill_count(&self) -> usize {
        self.users.values().map(Vec::len).sum()
    }
}
