//! Advisory locking of `.skilltree/lock`.
//!
//! Every `sk` invocation that rewrites the skill snapshot holds a
//! [`MutationLock`] from loading the snapshot until the new one has been
//! renamed into place. Readers take a [`ReadLock`] so they never observe a
//! snapshot mid-replace.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failure to take the project lock guarding the skill snapshot.
#[derive(Debug)]
pub enum LockError {
    /// Another `sk` process kept the snapshot locked for longer than the
    /// configured `[lock] timeout_ms`.
    Contended { path: PathBuf, waited: Duration },
    /// The lock file under `.skilltree/` could not be created or opened.
    LockFile(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::LockFile(err)
    }
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Contended { .. } => ErrorCode::LockContention,
            Self::LockFile(_) => ErrorCode::SnapshotWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contended { path, waited } => write!(
                f,
                "{}: skill snapshot still locked by another sk process after {waited:?} ({})",
                self.code().code(),
                path.display()
            ),
            Self::LockFile(err) => {
                write!(f, "{}: cannot open snapshot lock file: {err}", self.code().code())
            }
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Contended { .. } => None,
            Self::LockFile(err) => Some(err),
        }
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

/// An open handle on the lock file holding either a shared or an exclusive
/// `flock`. Unlocked on drop.
#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            let attempt = match kind {
                LockKind::Shared => FileExt::try_lock_shared(&file),
                LockKind::Exclusive => FileExt::try_lock_exclusive(&file),
            };

            if attempt.is_ok() {
                tracing::trace!(path = %path.display(), waited = ?start.elapsed(), "snapshot lock acquired");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                tracing::warn!(path = %path.display(), ?timeout, "snapshot lock still held elsewhere");
                return Err(LockError::Contended {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// RAII guard held by a writer across load → check → save.
///
/// At most one process holds this for a project at a time, so two concurrent
/// `sk prereq add` invocations cannot both validate against the same stale
/// snapshot.
#[derive(Debug)]
pub struct MutationLock {
    guard: FileGuard,
}

impl MutationLock {
    /// Acquire an exclusive advisory lock on the lock path.
    ///
    /// # Errors
    ///
    /// [`LockError::Contended`] if another process keeps the snapshot locked
    /// past `timeout`, or [`LockError::LockFile`] if the file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Exclusive)?,
        })
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        drop(self);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.guard.path()
    }
}

/// RAII guard for readers. Any number may be held at once; none while a
/// [`MutationLock`] is held.
#[derive(Debug)]
pub struct ReadLock {
    guard: FileGuard,
}

impl ReadLock {
    /// Acquire a shared advisory lock on the lock path.
    ///
    /// # Errors
    ///
    /// See [`MutationLock::acquire`].
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Shared)?,
        })
    }

    pub fn release(self) {
        drop(self);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.guard.path()
    }
}
