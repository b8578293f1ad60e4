use serde::Serialize;
use sqlx::FromRow;

/// Employer shared by any number of previous jobs.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDraft {
    pub name: String,
    pub location: String,
    pub description: String,
}
