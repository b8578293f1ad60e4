use serde_json::{json, Value};

use crate::models::{Education, EducationDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

const TEXT_MAX_LEN: usize = 200;

impl Resource for Education {
    type Draft = EducationDraft;

    const NAME: &'static str = "education";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<EducationDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = EducationDraft {
            resume: r.primary_key("resume"),
            institution: r.text("institution", Some(TEXT_MAX_LEN)),
            degree: r.nullable_text("degree", Some(TEXT_MAX_LEN)),
            field_of_study: r.nullable_text("field_of_study", Some(TEXT_MAX_LEN)),
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
            "institution": self.institution,
            "degree": self.degree,
            "field_of_study": self.field_of_study,
            "start_date": self.start_date,
            "end_date": self.end_date,
        })
    }

    fn to_draft(&self) -> EducationDraft {
        EducationDraft {
            resume: self.resume,
            institution: self.institution.clone(),
            degree: self.degree.clone(),
            field_of_study: self.field_of_study.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_decode_full_education() {
        let draft = Education::decode(&json!({
            "resume": 2,
            "institution": "MIT",
            "degree": "BSc",
            "field_of_study": "Computer Science",
            "start_date": "2014-09-01",
            "end_date": "2018-06-30",
        }))
        .unwrap();
        assert_eq!(draft.start_date, NaiveDate::from_ymd_opt(2014, 9, 1));
        assert_eq!(draft.degree.as_deref(), Some("BSc"));
    }

    #[test]
    fn test_decode_rejects_inverted_dates() {
        let errors = Education::decode(&json!({
            "resume": 2,
            "institution": "MIT",
            "start_date": "2018-09-01",
            "end_date": "2014-06-30",
        }))
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["end_date"]);
    }

    #[test]
    fn test_encode_dates_as_iso() {
        let education = Education {
            id: 1,
            resume: 2,
            institution: "ETH".to_string(),
            degree: None,
            field_of_study: None,
            start_date: NaiveDate::from_ymd_opt(2019, 1, 15),
            end_date: None,
        };
        let out = education.encode();
        assert_eq!(out["start_date"], "2019-01-15");
        assert_eq!(out["end_date"], Value::Null);
    }
}
