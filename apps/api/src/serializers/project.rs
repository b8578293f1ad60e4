use serde_json::{json, Value};

use crate::models::{Project, ProjectDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

const NAME_MAX_LEN: usize = 200;
const URL_MAX_LEN: usize = 500;

impl Resource for Project {
    type Draft = ProjectDraft;

    const NAME: &'static str = "project";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<ProjectDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = ProjectDraft {
            resume: r.primary_key("resume"),
            name: r.text("name", Some(NAME_MAX_LEN)),
            description: r.text_or_default("description", None),
            url: r.nullable_text("url", Some(URL_MAX_LEN)),
            start_date: r.nullable_date("start_date"),
            end_date: r.nullable_date("end_date"),
        };
        r.check_date_order("start_date", draft.start_date, "end_date", draft.end_date);
        r.finish(draft)
    }

    fn encode(&self) -> Value {
        json!({
            "id": self.id,
            "resume": self.resume,
            "name": self.name,
            "description": self.description,
            "url": self.url,
            "start_date": self.start_date,
            "end_date": self.end_date,
        })
    }

    fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            resume: self.resume,
            name: self.name.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_defaults_description() {
        let draft = Project::decode(&json!({"resume": 1, "name": "resumeval"})).unwrap();
        assert_eq!(draft.description, "");
        assert_eq!(draft.url, None);
    }

    #[test]
    fn test_decode_null_description_rejected() {
        let errors =
            Project::decode(&json!({"resume": 1, "name": "x", "description": null})).unwrap_err();
        assert_eq!(errors.get("description").unwrap(), ["This field may not be null."]);
    }
}
