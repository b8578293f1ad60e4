pub mod company;
pub mod education;
pub mod previous_job;
pub mod project;
pub mod resume;
pub mod skill;

pub use company::{Company, CompanyDraft};
pub use education::{Education, EducationDraft};
pub use previous_job::{PreviousJob, PreviousJobDraft};
pub use project::{Project, ProjectDraft};
pub use resume::{Resume, ResumeDraft};
pub use skill::{Skill, SkillDraft};
