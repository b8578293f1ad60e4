use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::models::resume::ResumeRow;
use crate::models::{
    Company, CompanyDraft, Education, EducationDraft, PreviousJob, PreviousJobDraft, Project,
    ProjectDraft, Resume, ResumeDraft, Skill, SkillDraft,
};
use crate::store::{Page, Repository, StoreError};

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed entity store. Referential integrity is enforced by the
/// schema (see `migrations/`); constraint violations are translated here.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn skills_for(&self, resume_ids: &[i64]) -> Result<HashMap<i64, Vec<Skill>>, StoreError> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT id, resume_id AS resume, name, level FROM skills WHERE resume_id = ANY($1) ORDER BY id",
        )
        .bind(resume_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_resume: HashMap<i64, Vec<Skill>> = HashMap::new();
        for skill in skills {
            by_resume.entry(skill.resume).or_default().push(skill);
        }
        Ok(by_resume)
    }

    async fn attach_skills(&self, rows: Vec<ResumeRow>) -> Result<Vec<Resume>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut skills = self.skills_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let owned = skills.remove(&row.id).unwrap_or_default();
                Resume::from_row(row, owned)
            })
            .collect())
    }

    async fn attach_one(&self, row: Option<ResumeRow>) -> Result<Option<Resume>, StoreError> {
        match row {
            Some(row) => Ok(self.attach_skills(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn window(page: Option<Page>) -> (Option<i64>, i64) {
    (page.map(|p| p.limit), page.map_or(0, |p| p.offset))
}

/// Maps a foreign key violation on insert/update to the offending draft field.
/// `refs` pairs each referencing field with the id the draft supplied.
fn reference_error(err: sqlx::Error, refs: &[(&'static str, i64)]) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            let constraint = db.constraint().unwrap_or_default();
            let hit = refs
                .iter()
                .find(|(field, _)| constraint.contains(&format!("{field}_id")))
                .or_else(|| refs.first());
            if let Some(&(field, id)) = hit {
                return StoreError::InvalidReference { field, id };
            }
        }
    }
    StoreError::Database(err)
}

/// Maps a foreign key violation on delete to a protected-record error.
fn protected_error(
    err: sqlx::Error,
    entity: &'static str,
    id: i64,
    referenced_by: &'static str,
) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return StoreError::Protected {
                entity,
                id,
                referenced_by,
            };
        }
    }
    StoreError::Database(err)
}

async fn count_table(pool: &PgPool, sql: &str) -> Result<i64, StoreError> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Resume> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Resume>, StoreError> {
        let (limit, offset) = window(page);
        let rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT id, owner_id AS owner, success_summary FROM resumes ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        self.attach_skills(rows).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM resumes").await
    }

    async fn get(&self, id: i64) -> Result<Option<Resume>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            "SELECT id, owner_id AS owner, success_summary FROM resumes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.attach_one(row).await
    }

    async fn create(&self, draft: ResumeDraft) -> Result<Resume, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (owner_id, success_summary)
            VALUES ($1, $2)
            RETURNING id, owner_id AS owner, success_summary
            "#,
        )
        .bind(draft.owner)
        .bind(&draft.success_summary)
        .fetch_one(&self.pool)
        .await?;
        debug!("Inserted resume {} for owner {}", row.id, row.owner);
        Ok(Resume::from_row(row, Vec::new()))
    }

    async fn update(&self, id: i64, draft: ResumeDraft) -> Result<Option<Resume>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes SET owner_id = $2, success_summary = $3
            WHERE id = $1
            RETURNING id, owner_id AS owner, success_summary
            "#,
        )
        .bind(id)
        .bind(draft.owner)
        .bind(&draft.success_summary)
        .fetch_optional(&self.pool)
        .await?;
        self.attach_one(row).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        // skills, educations, projects and previous jobs go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skill
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Skill> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Skill>, StoreError> {
        let (limit, offset) = window(page);
        Ok(sqlx::query_as::<_, Skill>(
            "SELECT id, resume_id AS resume, name, level FROM skills ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM skills").await
    }

    async fn get(&self, id: i64) -> Result<Option<Skill>, StoreError> {
        Ok(sqlx::query_as::<_, Skill>(
            "SELECT id, resume_id AS resume, name, level FROM skills WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, draft: SkillDraft) -> Result<Skill, StoreError> {
        sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (resume_id, name, level)
            VALUES ($1, $2, $3)
            RETURNING id, resume_id AS resume, name, level
            "#,
        )
        .bind(draft.resume)
        .bind(&draft.name)
        .bind(draft.level)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn update(&self, id: i64, draft: SkillDraft) -> Result<Option<Skill>, StoreError> {
        sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills SET resume_id = $2, name = $3, level = $4
            WHERE id = $1
            RETURNING id, resume_id AS resume, name, level
            "#,
        )
        .bind(id)
        .bind(draft.resume)
        .bind(&draft.name)
        .bind(draft.level)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Education> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Education>, StoreError> {
        let (limit, offset) = window(page);
        Ok(sqlx::query_as::<_, Education>(
            r#"
            SELECT id, resume_id AS resume, institution, degree, field_of_study, start_date, end_date
            FROM educations ORDER BY id LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM educations").await
    }

    async fn get(&self, id: i64) -> Result<Option<Education>, StoreError> {
        Ok(sqlx::query_as::<_, Education>(
            r#"
            SELECT id, resume_id AS resume, institution, degree, field_of_study, start_date, end_date
            FROM educations WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, draft: EducationDraft) -> Result<Education, StoreError> {
        sqlx::query_as::<_, Education>(
            r#"
            INSERT INTO educations (resume_id, institution, degree, field_of_study, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, resume_id AS resume, institution, degree, field_of_study, start_date, end_date
            "#,
        )
        .bind(draft.resume)
        .bind(&draft.institution)
        .bind(&draft.degree)
        .bind(&draft.field_of_study)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn update(&self, id: i64, draft: EducationDraft) -> Result<Option<Education>, StoreError> {
        sqlx::query_as::<_, Education>(
            r#"
            UPDATE educations
            SET resume_id = $2, institution = $3, degree = $4, field_of_study = $5,
                start_date = $6, end_date = $7
            WHERE id = $1
            RETURNING id, resume_id AS resume, institution, degree, field_of_study, start_date, end_date
            "#,
        )
        .bind(id)
        .bind(draft.resume)
        .bind(&draft.institution)
        .bind(&draft.degree)
        .bind(&draft.field_of_study)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM educations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Project
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Project> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Project>, StoreError> {
        let (limit, offset) = window(page);
        Ok(sqlx::query_as::<_, Project>(
            r#"
            SELECT id, resume_id AS resume, name, description, url, start_date, end_date
            FROM projects ORDER BY id LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM projects").await
    }

    async fn get(&self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(sqlx::query_as::<_, Project>(
            r#"
            SELECT id, resume_id AS resume, name, description, url, start_date, end_date
            FROM projects WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (resume_id, name, description, url, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, resume_id AS resume, name, description, url, start_date, end_date
            "#,
        )
        .bind(draft.resume)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.url)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn update(&self, id: i64, draft: ProjectDraft) -> Result<Option<Project>, StoreError> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET resume_id = $2, name = $3, description = $4, url = $5,
                start_date = $6, end_date = $7
            WHERE id = $1
            RETURNING id, resume_id AS resume, name, description, url, start_date, end_date
            "#,
        )
        .bind(id)
        .bind(draft.resume)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.url)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| reference_error(e, &[("resume", draft.resume)]))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PreviousJob
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<PreviousJob> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<PreviousJob>, StoreError> {
        let (limit, offset) = window(page);
        Ok(sqlx::query_as::<_, PreviousJob>(
            r#"
            SELECT id, resume_id AS resume, company_id AS company, position, start_date, end_date, description
            FROM previous_jobs ORDER BY id LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM previous_jobs").await
    }

    async fn get(&self, id: i64) -> Result<Option<PreviousJob>, StoreError> {
        Ok(sqlx::query_as::<_, PreviousJob>(
            r#"
            SELECT id, resume_id AS resume, company_id AS company, position, start_date, end_date, description
            FROM previous_jobs WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, draft: PreviousJobDraft) -> Result<PreviousJob, StoreError> {
        sqlx::query_as::<_, PreviousJob>(
            r#"
            INSERT INTO previous_jobs (resume_id, company_id, position, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, resume_id AS resume, company_id AS company, position, start_date, end_date, description
            "#,
        )
        .bind(draft.resume)
        .bind(draft.company)
        .bind(&draft.position)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            reference_error(e, &[("resume", draft.resume), ("company", draft.company)])
        })
    }

    async fn update(
        &self,
        id: i64,
        draft: PreviousJobDraft,
    ) -> Result<Option<PreviousJob>, StoreError> {
        sqlx::query_as::<_, PreviousJob>(
            r#"
            UPDATE previous_jobs
            SET resume_id = $2, company_id = $3, position = $4, start_date = $5,
                end_date = $6, description = $7
            WHERE id = $1
            RETURNING id, resume_id AS resume, company_id AS company, position, start_date, end_date, description
            "#,
        )
        .bind(id)
        .bind(draft.resume)
        .bind(draft.company)
        .bind(&draft.position)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            reference_error(e, &[("resume", draft.resume), ("company", draft.company)])
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM previous_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Company
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Company> for PgStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Company>, StoreError> {
        let (limit, offset) = window(page);
        Ok(sqlx::query_as::<_, Company>(
            "SELECT id, name, location, description FROM companies ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        count_table(&self.pool, "SELECT COUNT(*) FROM companies").await
    }

    async fn get(&self, id: i64) -> Result<Option<Company>, StoreError> {
        Ok(sqlx::query_as::<_, Company>(
            "SELECT id, name, location, description FROM companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, draft: CompanyDraft) -> Result<Company, StoreError> {
        Ok(sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, location, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, location, description
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.location)
        .bind(&draft.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: i64, draft: CompanyDraft) -> Result<Option<Company>, StoreError> {
        Ok(sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET name = $2, location = $3, description = $4
            WHERE id = $1
            RETURNING id, name, location, description
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.location)
        .bind(&draft.description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        // previous_jobs.company_id is ON DELETE RESTRICT
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| protected_error(e, "company", id, "previous jobs"))?;
        Ok(result.rows_affected() > 0)
    }
}
