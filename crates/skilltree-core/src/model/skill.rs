use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::id::SkillId;

/// The engine's view of a skill: identity, completion, and direct
/// prerequisites. Every other attribute stays in [`SkillRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub prerequisites: Vec<SkillId>,
}

impl Skill {
    /// An incomplete skill with no prerequisites.
    #[must_use]
    pub const fn new(id: SkillId) -> Self {
        Self {
            id,
            completed: false,
            prerequisites: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_prerequisites(mut self, prerequisites: impl IntoIterator<Item = SkillId>) -> Self {
        self.prerequisites = prerequisites.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// Proficiency tier attached to a skill. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid level '{0}': expected Beginner, Intermediate or Advanced")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A persisted skill: the engine fields plus descriptive payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub prerequisites: Vec<SkillId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillRecord {
    /// Project onto the engine input.
    #[must_use]
    pub fn as_skill(&self) -> Skill {
        Skill {
            id: self.id,
            completed: self.completed,
            prerequisites: self.prerequisites.clone(),
        }
    }

    /// Whether `prereq` is listed as a direct prerequisite.
    #[must_use]
    pub fn requires(&self, prereq: SkillId) -> bool {
        self.prerequisites.contains(&prereq)
    }
}

/// Project a slice of records onto engine inputs, preserving order.
#[must_use]
pub fn as_skills(records: &[SkillRecord]) -> Vec<Skill> {
    records.iter().map(SkillRecord::as_skill).collect()
}
