use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::resume::ResumeRow;
use crate::models::{
    Company, CompanyDraft, Education, EducationDraft, PreviousJob, PreviousJobDraft, Project,
    ProjectDraft, Resume, ResumeDraft, Skill, SkillDraft,
};
use crate::store::{Page, Repository, StoreError};

/// One table: rows keyed by id plus its own id sequence.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Table {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    fn page(&self, page: Option<Page>) -> Vec<T> {
        let rows = self.rows.values().cloned();
        match page {
            Some(Page { limit, offset }) => rows
                .skip(usize::try_from(offset).unwrap_or(0))
                .take(usize::try_from(limit).unwrap_or(0))
                .collect(),
            None => rows.collect(),
        }
    }

    fn count(&self) -> i64 {
        self.rows.len() as i64
    }

    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        self.last_id += 1;
        let row = build(self.last_id);
        self.rows.insert(self.last_id, row.clone());
        row
    }

    fn replace_with(&mut self, id: i64, build: impl FnOnce(i64) -> T) -> Option<T> {
        let slot = self.rows.get_mut(&id)?;
        *slot = build(id);
        Some(slot.clone())
    }
}

struct Tables {
    resumes: Table<ResumeRow>,
    skills: Table<Skill>,
    educations: Table<Education>,
    projects: Table<Project>,
    previous_jobs: Table<PreviousJob>,
    companies: Table<Company>,
}

impl Tables {
    fn resume(&self, row: &ResumeRow) -> Resume {
        let skills = self
            .skills
            .rows
            .values()
            .filter(|s| s.resume == row.id)
            .cloned()
            .collect();
        Resume::from_row(row.clone(), skills)
    }

    fn require_resume(&self, id: i64) -> Result<(), StoreError> {
        if self.resumes.contains(id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference { field: "resume", id })
        }
    }

    fn require_company(&self, id: i64) -> Result<(), StoreError> {
        if self.companies.contains(id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference { field: "company", id })
        }
    }
}

/// In-process entity store with the same integrity rules as the Postgres
/// schema: resume deletes cascade, referenced companies cannot be deleted.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tables: RwLock::new(Tables {
                resumes: Table::new(),
                skills: Table::new(),
                educations: Table::new(),
                projects: Table::new(),
                previous_jobs: Table::new(),
                companies: Table::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository<Resume> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Resume>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.resumes.page(page).iter().map(|row| t.resume(row)).collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.resumes.count())
    }

    async fn get(&self, id: i64) -> Result<Option<Resume>, StoreError> {
        let t = self.tables.read().await;
        Ok(t.resumes.rows.get(&id).map(|row| t.resume(row)))
    }

    async fn create(&self, draft: ResumeDraft) -> Result<Resume, StoreError> {
        let mut t = self.tables.write().await;
        let row = t.resumes.insert_with(|id| ResumeRow {
            id,
            owner: draft.owner,
            success_summary: draft.success_summary,
        });
        Ok(Resume::from_row(row, Vec::new()))
    }

    async fn update(&self, id: i64, draft: ResumeDraft) -> Result<Option<Resume>, StoreError> {
        let mut t = self.tables.write().await;
        let row = t.resumes.replace_with(id, |id| ResumeRow {
            id,
            owner: draft.owner,
            success_summary: draft.success_summary,
        });
        Ok(row.map(|row| t.resume(&row)))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if t.resumes.rows.remove(&id).is_none() {
            return Ok(false);
        }
        t.skills.rows.retain(|_, s| s.resume != id);
        t.educations.rows.retain(|_, e| e.resume != id);
        t.projects.rows.retain(|_, p| p.resume != id);
        t.previous_jobs.rows.retain(|_, j| j.resume != id);
        Ok(true)
    }
}

#[async_trait]
impl Repository<Skill> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Skill>, StoreError> {
        Ok(self.tables.read().await.skills.page(page))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.skills.count())
    }

    async fn get(&self, id: i64) -> Result<Option<Skill>, StoreError> {
        Ok(self.tables.read().await.skills.rows.get(&id).cloned())
    }

    async fn create(&self, draft: SkillDraft) -> Result<Skill, StoreError> {
        let mut t = self.tables.write().await;
        t.require_resume(draft.resume)?;
        Ok(t.skills.insert_with(|id| Skill {
            id,
            resume: draft.resume,
            name: draft.name,
            level: draft.level,
        }))
    }

    async fn update(&self, id: i64, draft: SkillDraft) -> Result<Option<Skill>, StoreError> {
        let mut t = self.tables.write().await;
        if !t.skills.contains(id) {
            return Ok(None);
        }
        t.require_resume(draft.resume)?;
        Ok(t.skills.replace_with(id, |id| Skill {
            id,
            resume: draft.resume,
            name: draft.name,
            level: draft.level,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.skills.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<Education> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Education>, StoreError> {
        Ok(self.tables.read().await.educations.page(page))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.educations.count())
    }

    async fn get(&self, id: i64) -> Result<Option<Education>, StoreError> {
        Ok(self.tables.read().await.educations.rows.get(&id).cloned())
    }

    async fn create(&self, draft: EducationDraft) -> Result<Education, StoreError> {
        let mut t = self.tables.write().await;
        t.require_resume(draft.resume)?;
        Ok(t.educations.insert_with(|id| Education {
            id,
            resume: draft.resume,
            institution: draft.institution,
            degree: draft.degree,
            field_of_study: draft.field_of_study,
            start_date: draft.start_date,
            end_date: draft.end_date,
        }))
    }

    async fn update(&self, id: i64, draft: EducationDraft) -> Result<Option<Education>, StoreError> {
        let mut t = self.tables.write().await;
        if !t.educations.contains(id) {
            return Ok(None);
        }
        t.require_resume(draft.resume)?;
        Ok(t.educations.replace_with(id, |id| Education {
            id,
            resume: draft.resume,
            institution: draft.institution,
            degree: draft.degree,
            field_of_study: draft.field_of_study,
            start_date: draft.start_date,
            end_date: draft.end_date,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.educations.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<Project> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Project>, StoreError> {
        Ok(self.tables.read().await.projects.page(page))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.projects.count())
    }

    async fn get(&self, id: i64) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.read().await.projects.rows.get(&id).cloned())
    }

    async fn create(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        let mut t = self.tables.write().await;
        t.require_resume(draft.resume)?;
        Ok(t.projects.insert_with(|id| Project {
            id,
            resume: draft.resume,
            name: draft.name,
            description: draft.description,
            url: draft.url,
            start_date: draft.start_date,
            end_date: draft.end_date,
        }))
    }

    async fn update(&self, id: i64, draft: ProjectDraft) -> Result<Option<Project>, StoreError> {
        let mut t = self.tables.write().await;
        if !t.projects.contains(id) {
            return Ok(None);
        }
        t.require_resume(draft.resume)?;
        Ok(t.projects.replace_with(id, |id| Project {
            id,
            resume: draft.resume,
            name: draft.name,
            description: draft.description,
            url: draft.url,
            start_date: draft.start_date,
            end_date: draft.end_date,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.projects.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<PreviousJob> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<PreviousJob>, StoreError> {
        Ok(self.tables.read().await.previous_jobs.page(page))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.previous_jobs.count())
    }

    async fn get(&self, id: i64) -> Result<Option<PreviousJob>, StoreError> {
        Ok(self.tables.read().await.previous_jobs.rows.get(&id).cloned())
    }

    async fn create(&self, draft: PreviousJobDraft) -> Result<PreviousJob, StoreError> {
        let mut t = self.tables.write().await;
        t.require_resume(draft.resume)?;
        t.require_company(draft.company)?;
        Ok(t.previous_jobs.insert_with(|id| PreviousJob {
            id,
            resume: draft.resume,
            company: draft.company,
            position: draft.position,
            start_date: draft.start_date,
            end_date: draft.end_date,
            description: draft.description,
        }))
    }

    async fn update(
        &self,
        id: i64,
        draft: PreviousJobDraft,
    ) -> Result<Option<PreviousJob>, StoreError> {
        let mut t = self.tables.write().await;
        if !t.previous_jobs.contains(id) {
            return Ok(None);
        }
        t.require_resume(draft.resume)?;
        t.require_company(draft.company)?;
        Ok(t.previous_jobs.replace_with(id, |id| PreviousJob {
            id,
            resume: draft.resume,
            company: draft.company,
            position: draft.position,
            start_date: draft.start_date,
            end_date: draft.end_date,
            description: draft.description,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.previous_jobs.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<Company> for MemoryStore {
    async fn list(&self, page: Option<Page>) -> Result<Vec<Company>, StoreError> {
        Ok(self.tables.read().await.companies.page(page))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.companies.count())
    }

    async fn get(&self, id: i64) -> Result<Option<Company>, StoreError> {
        Ok(self.tables.read().await.companies.rows.get(&id).cloned())
    }

    async fn create(&self, draft: CompanyDraft) -> Result<Company, StoreError> {
        let mut t = self.tables.write().await;
        Ok(t.companies.insert_with(|id| Company {
            id,
            name: draft.name,
            location: draft.location,
            description: draft.description,
        }))
    }

    async fn update(&self, id: i64, draft: CompanyDraft) -> Result<Option<Company>, StoreError> {
        let mut t = self.tables.write().await;
        Ok(t.companies.replace_with(id, |id| Company {
            id,
            name: draft.name,
            location: draft.location,
            description: draft.description,
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write().await;
        if !t.companies.contains(id) {
            return Ok(false);
        }
        if t.previous_jobs.rows.values().any(|j| j.company == id) {
            return Err(StoreError::Protected {
                entity: "company",
                id,
                referenced_by: "previous jobs",
            });
        }
        t.companies.rows.remove(&id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn seeded() -> (MemoryStore, Resume, Company) {
        let store = MemoryStore::new();
        let resume = Repository::<Resume>::create(
            &store,
            ResumeDraft {
                owner: 1,
                success_summary: "Survived the amazon jungle".to_string(),
            },
        )
        .await
        .unwrap();
        let company = Repository::<Company>::create(
            &store,
            CompanyDraft {
                name: "ACME Corp".to_string(),
                location: "Remote".to_string(),
                description: "Testing".to_string(),
            },
        )
        .await
        .unwrap();
        (store, resume, company)
    }

    fn job(resume: i64, company: i64) -> PreviousJobDraft {
        PreviousJobDraft {
            resume,
            company,
            position: "Developer".to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: None,
            description: "Working hard".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let (store, resume, company) = seeded().await;
        assert_eq!(resume.id, 1);
        assert_eq!(company.id, 1);
        let second = Repository::<Resume>::create(
            &store,
            ResumeDraft { owner: 2, success_summary: "Again".to_string() },
        )
        .await
        .unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_skill_requires_existing_resume() {
        let (store, _, _) = seeded().await;
        let err = Repository::<Skill>::create(
            &store,
            SkillDraft { resume: 42, name: "Rust".to_string(), level: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference { field: "resume", id: 42 }));
    }

    #[tokio::test]
    async fn test_previous_job_requires_existing_company() {
        let (store, resume, _) = seeded().await;
        let err = Repository::<PreviousJob>::create(&store, job(resume.id, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference { field: "company", id: 9 }));
    }

    #[tokio::test]
    async fn test_resume_delete_cascades() {
        let (store, resume, company) = seeded().await;
        Repository::<Skill>::create(
            &store,
            SkillDraft { resume: resume.id, name: "Python".to_string(), level: Some(3) },
        )
        .await
        .unwrap();
        Repository::<PreviousJob>::create(&store, job(resume.id, company.id))
            .await
            .unwrap();

        assert!(Repository::<Resume>::delete(&store, resume.id).await.unwrap());
        assert_eq!(Repository::<Skill>::count(&store).await.unwrap(), 0);
        assert_eq!(Repository::<PreviousJob>::count(&store).await.unwrap(), 0);
        // the company survives the resume
        assert_eq!(Repository::<Company>::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_referenced_company_is_protected() {
        let (store, resume, company) = seeded().await;
        let created = Repository::<PreviousJob>::create(&store, job(resume.id, company.id))
            .await
            .unwrap();

        let err = Repository::<Company>::delete(&store, company.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Protected { entity: "company", .. }));

        Repository::<PreviousJob>::delete(&store, created.id).await.unwrap();
        assert!(Repository::<Company>::delete(&store, company.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_resume_reads_include_current_skills() {
        let (store, resume, _) = seeded().await;
        for (name, level) in [("Rust", Some(5)), ("Go", Some(2)), ("Perl", None)] {
            Repository::<Skill>::create(
                &store,
                SkillDraft { resume: resume.id, name: name.to_string(), level },
            )
            .await
            .unwrap();
        }
        let fetched = Repository::<Resume>::get(&store, resume.id).await.unwrap().unwrap();
        assert_eq!(fetched.skills.len(), 3);
        assert_eq!(fetched.avg_rating(), Some(3.5));
    }

    #[tokio::test]
    async fn test_page_window() {
        let (store, _, _) = seeded().await;
        for n in 2..=5 {
            Repository::<Resume>::create(
                &store,
                ResumeDraft { owner: n, success_summary: format!("Resume {n}") },
            )
            .await
            .unwrap();
        }
        let page = Repository::<Resume>::list(&store, Some(Page { limit: 2, offset: 1 }))
            .await
            .unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (store, _, _) = seeded().await;
        let updated = Repository::<Resume>::update(
            &store,
            99,
            ResumeDraft { owner: 1, success_summary: "x".to_string() },
        )
        .await
        .unwrap();
        assert!(updated.is_none());
    }
}
