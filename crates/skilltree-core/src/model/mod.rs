//! Skill identifiers and records.

pub mod id;
pub mod skill;

pub use id::{InvalidUserId, ParseSkillIdError, SkillId, UserId};
pub use skill::{Level, ParseLevelError, Skill, SkillRecord, as_skills};
