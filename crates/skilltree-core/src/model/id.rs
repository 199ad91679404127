//! Identifier newtypes shared by every engine component.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Display prefix for skill identifiers.
pub const SKILL_ID_PREFIX: &str = "sk-";

/// Opaque identifier of a skill, unique within one store.
///
/// Displays and serializes as `sk-<n>`. Parsing also accepts the bare
/// number so `sk done 4` and `sk done sk-4` mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkillId(u64);

impl SkillId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SKILL_ID_PREFIX}{}", self.0)
    }
}

/// Error returned when a string is not a valid [`SkillId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid skill ID '{input}': expected sk-<number> or <number>")]
pub struct ParseSkillIdError {
    pub input: String,
}

impl FromStr for SkillId {
    type Err = ParseSkillIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(SKILL_ID_PREFIX).unwrap_or(trimmed);
        digits.parse::<u64>().map(Self).map_err(|_| ParseSkillIdError {
            input: s.to_string(),
        })
    }
}

impl Serialize for SkillId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SkillId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Owner of a skill graph. Graphs never reference skills across users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Error returned for an empty or whitespace-only user name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user name must not be empty")]
pub struct InvalidUserId;

impl UserId {
    /// Build a user id from a non-empty, trimmed name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUserId`] when `raw` is empty after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidUserId> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InvalidUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidUserId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}
