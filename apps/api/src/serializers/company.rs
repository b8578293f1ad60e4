use serde_json::{json, Value};

use crate::models::{Company, CompanyDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

const TEXT_MAX_LEN: usize = 200;

impl Resource for Company {
    type Draft = CompanyDraft;

    const NAME: &'static str = "company";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<CompanyDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = CompanyDraft {
            name: r.text("name", Some(TEXT_MAX_LEN)),
            location: r.text_or_default("location", Some(TEXT_MAX_LEN)),
            description: r.text_or_default("description", None),
        };
        r.finish(draft)
    }

    fn encode(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "location": self.location,
            "description": self.description,
        })
    }

    fn to_draft(&self) -> CompanyDraft {
        CompanyDraft {
            name: self.name.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }
}
