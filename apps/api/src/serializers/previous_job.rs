use serde_json::{json, Value};

use crate::models::{PreviousJob, PreviousJobDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

const POSITION_MAX_LEN: usize = 200;

impl Resource for PreviousJob {
    type Draft = PreviousJobDraft;

    const NAME: &'static str = "previous job";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<PreviousJobDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = PreviousJobDraft {
            resume: r.primary_key("resume"),
            company: r.primary_key("company"),
            position: r.text("position", Some(POSITION_MAX_LEN)),
            start_date: r.date("start_date"),
            end_date: r.nullable_date("end_date"),
            description: r.text_or_default("description", None),
        };
        r.check_date_order("start_date", Some(draft.start_date), "end_date", draft.end_date);
        r.finish(draft)
    }

    fn encode(&self) -> Value {
        json!({
            "id": self.id,
            "resume": self.resume,
            "company": self.company,
            "position": self.position,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "description": self.description,
        })
    }

    fn to_draft(&self) -> PreviousJobDraft {
        PreviousJobDraft {
            resume: self.resume,
            company: self.company,
            position: self.position.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_previous_job() {
        let draft = PreviousJob::decode(&json!({
            "resume": 1,
            "company": 2,
            "position": "Developer",
            "start_date": "2020-01-01",
            "description": "Working hard",
        }))
        .unwrap();
        assert_eq!(draft.start_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(draft.end_date, None);
        assert_eq!(draft.company, 2);
    }

    #[test]
    fn test_decode_requires_start_date_and_company() {
        let errors = PreviousJob::decode(&json!({"resume": 1, "position": "Dev"})).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["company", "start_date"]
        );
    }

    #[test]
    fn test_decode_bad_date_format() {
        let errors = PreviousJob::decode(&json!({
            "resume": 1,
            "company": 2,
            "position": "Dev",
            "start_date": "January 2020",
        }))
        .unwrap_err();
        assert!(errors.get("start_date").unwrap()[0].starts_with("Date has wrong format"));
    }

    #[test]
    fn test_missing_start_date_does_not_flag_end_date() {
        let errors = PreviousJob::decode(&json!({
            "resume": 1,
            "company": 1,
            "position": "Dev",
            "end_date": "1960-01-01",
        }))
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["start_date"]);
    }
}
