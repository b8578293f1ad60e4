//! Entity store: durable storage and referential-integrity enforcement.
//!
//! `Repository<E>` is the seam between endpoints and persistence. `PgStore`
//! backs production; `MemoryStore` keeps the same semantics in process.
//! Both implement the repository for every entity, and `Repositories` holds
//! one handle per entity inside `AppState`.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Company, Education, PreviousJob, Project, Resume, Skill};
use crate::serializers::Resource;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A foreign key in the draft names a record that does not exist.
    #[error("{field} {id} does not exist")]
    InvalidReference { field: &'static str, id: i64 },

    /// The record is still referenced and the delete policy forbids orphans.
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    Protected {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A limit/offset window over a collection ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait Repository<E: Resource>: Send + Sync {
    /// Records ordered by id, optionally windowed.
    async fn list(&self, page: Option<Page>) -> Result<Vec<E>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<E>, StoreError>;

    async fn create(&self, draft: E::Draft) -> Result<E, StoreError>;

    /// Overwrites every writable field. `None` when the record is absent.
    async fn update(&self, id: i64, draft: E::Draft) -> Result<Option<E>, StoreError>;

    /// `false` when the record is absent.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

/// One repository handle per entity type.
#[derive(Clone)]
pub struct Repositories {
    pub resumes: Arc<dyn Repository<Resume>>,
    pub skills: Arc<dyn Repository<Skill>>,
    pub educations: Arc<dyn Repository<Education>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub previous_jobs: Arc<dyn Repository<PreviousJob>>,
    pub companies: Arc<dyn Repository<Company>>,
}

impl Repositories {
    /// Routes every entity to the same backing store.
    pub fn from_store<S>(store: S) -> Self
    where
        S: Repository<Resume>
            + Repository<Skill>
            + Repository<Education>
            + Repository<Project>
            + Repository<PreviousJob>
            + Repository<Company>
            + 'static,
    {
        let store = Arc::new(store);
        Repositories {
            resumes: store.clone(),
            skills: store.clone(),
            educations: store.clone(),
            projects: store.clone(),
            previous_jobs: store.clone(),
            companies: store,
        }
    }
}

/// Picks the repository for a resource type out of `Repositories`.
pub trait Stored: Resource {
    fn repository(repos: &Repositories) -> &dyn Repository<Self>;
}

impl Stored for Resume {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.resumes.as_ref()
    }
}

impl Stored for Skill {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.skills.as_ref()
    }
}

impl Stored for Education {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.educations.as_ref()
    }
}

impl Stored for Project {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.projects.as_ref()
    }
}

impl Stored for PreviousJob {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.previous_jobs.as_ref()
    }
}

impl Stored for Company {
    fn repository(repos: &Repositories) -> &dyn Repository<Self> {
        repos.companies.as_ref()
    }
}
