use serde::Serialize;
use sqlx::FromRow;

use crate::models::skill::Skill;

/// Top-level aggregate: one candidate profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Resume {
    pub id: i64,
    /// Opaque user identifier issued by the identity provider.
    pub owner: i64,
    pub success_summary: String,
    /// Loaded alongside the resume on every read.
    pub skills: Vec<Skill>,
}

impl Resume {
    pub fn from_row(row: ResumeRow, skills: Vec<Skill>) -> Self {
        Resume {
            id: row.id,
            owner: row.owner,
            success_summary: row.success_summary,
            skills,
        }
    }

    /// Mean of the rated skill levels, rounded to two decimals.
    /// `None` when no skill carries a level.
    pub fn avg_rating(&self) -> Option<f64> {
        let levels: Vec<f64> = self
            .skills
            .iter()
            .filter_map(|s| s.level)
            .map(f64::from)
            .collect();
        if levels.is_empty() {
            return None;
        }
        let mean = levels.iter().sum::<f64>() / levels.len() as f64;
        Some((mean * 100.0).round() / 100.0)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: i64,
    pub owner: i64,
    pub success_summary: String,
}

/// Writable fields of a resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeDraft {
    pub owner: i64,
    pub success_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(level: Option<i32>) -> Skill {
        Skill {
            id: 1,
            resume: 1,
            name: "Rust".to_string(),
            level,
        }
    }

    fn resume_with(skills: Vec<Skill>) -> Resume {
        Resume {
            id: 1,
            owner: 7,
            success_summary: "Shipped things".to_string(),
            skills,
        }
    }

    #[test]
    fn test_avg_rating_none_without_skills() {
        assert_eq!(resume_with(vec![]).avg_rating(), None);
    }

    #[test]
    fn test_avg_rating_none_when_no_levels() {
        assert_eq!(resume_with(vec![skill(None), skill(None)]).avg_rating(), None);
    }

    #[test]
    fn test_avg_rating_ignores_unrated_skills() {
        let r = resume_with(vec![skill(Some(4)), skill(None), skill(Some(5))]);
        assert_eq!(r.avg_rating(), Some(4.5));
    }

    #[test]
    fn test_avg_rating_rounds_to_two_decimals() {
        let r = resume_with(vec![skill(Some(1)), skill(Some(2)), skill(Some(2))]);
        assert_eq!(r.avg_rating(), Some(1.67));
    }
}
