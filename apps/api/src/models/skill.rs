use serde::Serialize;
use sqlx::FromRow;

pub const SKILL_LEVEL_MIN: i64 = 1;
pub const SKILL_LEVEL_MAX: i64 = 5;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Skill {
    pub id: i64,
    pub resume: i64,
    pub name: String,
    /// 1 (novice) to 5 (expert).
    pub level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillDraft {
    pub resume: i64,
    pub name: String,
    pub level: Option<i32>,
}
