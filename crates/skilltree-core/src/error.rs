use std::fmt;

use crate::model::SkillId;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    SkillNotFound,
    SelfLoopRejected,
    CycleDetected,
    DuplicatePrerequisite,
    DuplicateName,
    InvalidSkillId,
    InvalidUser,
    DanglingPrerequisite,
    IdSpaceExhausted,
    SnapshotCorrupt,
    UnsupportedSnapshotVersion,
    SnapshotWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::SkillNotFound => "E2001",
            Self::SelfLoopRejected => "E2002",
            Self::CycleDetected => "E2003",
            Self::DuplicatePrerequisite => "E2004",
            Self::DuplicateName => "E2005",
            Self::InvalidSkillId => "E2006",
            Self::InvalidUser => "E2007",
            Self::DanglingPrerequisite => "E2008",
            Self::IdSpaceExhausted => "E2009",
            Self::SnapshotCorrupt => "E3001",
            Self::UnsupportedSnapshotVersion => "E3002",
            Self::SnapshotWriteFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::SkillNotFound => "Skill not found",
            Self::SelfLoopRejected => "A skill cannot be its own prerequisite",
            Self::CycleDetected => "Cycle would be created",
            Self::DuplicatePrerequisite => "Prerequisite already exists",
            Self::DuplicateName => "Skill name already in use",
            Self::InvalidSkillId => "Invalid skill ID",
            Self::InvalidUser => "Invalid user",
            Self::DanglingPrerequisite => "Prerequisite does not resolve to a skill",
            Self::IdSpaceExhausted => "No skill ids left to allocate",
            Self::SnapshotCorrupt => "Skill snapshot is corrupt",
            Self::UnsupportedSnapshotVersion => "Unsupported snapshot version",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `sk init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .skilltree/config.toml and retry."),
            Self::SkillNotFound | Self::InvalidSkillId => {
                Some("Use `sk list` to see the skill IDs for this user.")
            }
            Self::SelfLoopRejected | Self::DuplicatePrerequisite => None,
            Self::CycleDetected => {
                Some("Remove/adjust prerequisite links to keep the skill graph acyclic.")
            }
            Self::DuplicateName => Some("Pick a different name or edit the existing skill."),
            Self::InvalidUser => Some("Set --user, SKILLTREE_USER, or `user` in the user config."),
            Self::DanglingPrerequisite => {
                Some("Remove the stale prerequisite with `sk prereq rm`.")
            }
            Self::IdSpaceExhausted => {
                Some("Renumber skills with oversized ids in .skilltree/skills.json.")
            }
            Self::SnapshotCorrupt => Some("Restore .skilltree/skills.json from version control."),
            Self::UnsupportedSnapshotVersion => {
                Some("Upgrade `sk` to a version that understands this snapshot.")
            }
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `sk` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation outcomes of the graph engine.
///
/// These are expected results of checking a mutation or a stored graph, not
/// defects, so they are returned as values and never panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A mutation proposed a skill as its own prerequisite.
    #[error("skill {skill} cannot be its own prerequisite")]
    SelfLoopRejected { skill: SkillId },

    /// A proposed edge or a stored graph contains a directed cycle.
    ///
    /// For a rejected edge, `skills` is the closing path
    /// `prereq → skill → … → prereq`. For a failed schedule it holds every
    /// skill that could not be ordered, in input order.
    #[error("cycle detected: {}", display_ids(.skills))]
    CycleDetected { skills: Vec<SkillId> },
}

impl GraphError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SelfLoopRejected { .. } => ErrorCode::SelfLoopRejected,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

pub(crate) fn display_ids(ids: &[SkillId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}
