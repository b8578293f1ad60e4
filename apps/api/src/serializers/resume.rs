use serde_json::{json, Value};

use crate::models::{Resume, ResumeDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

impl Resource for Resume {
    type Draft = ResumeDraft;

    const NAME: &'static str = "resume";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<ResumeDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = ResumeDraft {
            owner: r.integer_id("owner"),
            success_summary: r.text("success_summary", None),
        };
        r.finish(draft)
    }

    fn encode(&self) -> Value {
        let skills: Vec<Value> = self
            .skills
            .iter()
            .map(|s| json!({ "name": s.name, "level": s.level }))
            .collect();
        json!({
            "id": self.id,
            "owner": self.owner,
            "success_summary": self.success_summary,
            "skills": skills,
            "avg_rating": self.avg_rating(),
        })
    }

    fn to_draft(&self) -> ResumeDraft {
        ResumeDraft {
            owner: self.owner,
            success_summary: self.success_summary.clone(),
        }
    }
}
