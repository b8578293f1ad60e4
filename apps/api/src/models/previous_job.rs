use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A position held at a company, attached to one resume.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PreviousJob {
    pub id: i64,
    pub resume: i64,
    pub company: i64,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousJobDraft {
    pub resume: i64,
    pub company: i64,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}
