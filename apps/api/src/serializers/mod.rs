//! Validation & serialization layer.
//!
//! Each entity has an explicit draft struct (its writable fields), a `decode`
//! that walks those fields over an inbound JSON object collecting every
//! failure, and an `encode` that renders the outbound representation.

pub mod company;
pub mod education;
pub mod previous_job;
pub mod project;
pub mod resume;
pub mod skill;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";
const NULL_CHARACTER: &str = "Null characters are not allowed.";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// One-line summary used as the error message.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, msgs)| format!("{field}: {}", msgs.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A record type exposed as a CRUD resource.
pub trait Resource: Sized + Send + Sync + 'static {
    /// Writable fields, as accepted by create and update.
    type Draft: Serialize + Send + Sync + 'static;

    /// Singular name used in messages and logs.
    const NAME: &'static str;

    fn id(&self) -> i64;

    /// Validates an inbound body. Unknown and read-only keys are ignored.
    fn decode(data: &Value) -> Result<Self::Draft, FieldErrors>;

    fn encode(&self) -> Value;

    /// The writable fields of a stored record, used as the base of a partial update.
    fn to_draft(&self) -> Self::Draft;
}

/// Overlays the keys of `patch` onto the current writable fields of `record`.
pub fn merge_partial<R: Resource>(record: &R, patch: &Value) -> Result<Value, FieldErrors> {
    let patch = as_object(patch)?;
    let mut base = match serde_json::to_value(record.to_draft()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(base))
}

fn as_object(data: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    data.as_object().ok_or_else(|| {
        FieldErrors::single(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type(data)
            ),
        )
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads typed fields out of a JSON object, recording a message for every
/// field that fails. Failed reads return a placeholder so decoding can carry on
/// and report all problems at once; `finish` discards the draft if any failed.
pub struct FieldReader<'a> {
    data: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a Value) -> Result<Self, FieldErrors> {
        Ok(FieldReader {
            data: as_object(data)?,
            errors: FieldErrors::default(),
        })
    }

    pub fn finish<T>(self, draft: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(draft)
        } else {
            Err(self.errors)
        }
    }

    fn value(&self, field: &str) -> Option<&'a Value> {
        self.data.get(field)
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Required, non-blank text.
    pub fn text(&mut self, field: &str, max_len: Option<usize>) -> String {
        match self.value(field) {
            None => self.fail(field, REQUIRED),
            Some(Value::Null) => self.fail(field, NOT_NULL),
            Some(value) => match self.coerce_text(field, value, max_len) {
                Some(text) if text.is_empty() => self.fail(field, NOT_BLANK),
                Some(text) => text,
                None => String::new(),
            },
        }
    }

    /// Optional text that may be blank but not null; defaults to `""`.
    pub fn text_or_default(&mut self, field: &str, max_len: Option<usize>) -> String {
        match self.value(field) {
            None => String::new(),
            Some(Value::Null) => self.fail(field, NOT_NULL),
            Some(value) => self.coerce_text(field, value, max_len).unwrap_or_default(),
        }
    }

    /// Optional text where both absence and `null` mean "no value".
    pub fn nullable_text(&mut self, field: &str, max_len: Option<usize>) -> Option<String> {
        match self.value(field) {
            None | Some(Value::Null) => None,
            Some(value) => self.coerce_text(field, value, max_len),
        }
    }

    /// Optional bounded integer; absence and `null` mean "no value".
    pub fn nullable_integer(&mut self, field: &str, min: i64, max: i64) -> Option<i64> {
        match self.value(field) {
            None | Some(Value::Null) => None,
            Some(value) => self.coerce_integer(field, value, Some(min), Some(max)),
        }
    }

    /// Required positive integer identifier.
    pub fn integer_id(&mut self, field: &str) -> i64 {
        match self.value(field) {
            None => self.fail(field, REQUIRED),
            Some(Value::Null) => self.fail(field, NOT_NULL),
            Some(value) => self
                .coerce_integer(field, value, Some(1), None)
                .unwrap_or_default(),
        }
    }

    /// Required reference to another record. Existence is checked by the store.
    pub fn primary_key(&mut self, field: &str) -> i64 {
        let value = match self.value(field) {
            None => return self.fail(field, REQUIRED),
            Some(Value::Null) => return self.fail(field, NOT_NULL),
            Some(value) => value,
        };
        match parse_integer(value) {
            Some(pk) => pk,
            None => {
                let message = match value {
                    Value::String(s) => format!("Invalid pk \"{s}\" - object does not exist."),
                    other => format!(
                        "Incorrect type. Expected pk value, received {}.",
                        json_type(other)
                    ),
                };
                self.fail(field, message)
            }
        }
    }

    pub fn date(&mut self, field: &str) -> NaiveDate {
        match self.value(field) {
            None => self.fail(field, REQUIRED),
            Some(Value::Null) => self.fail(field, NOT_NULL),
            Some(value) => self.coerce_date(field, value).unwrap_or_default(),
        }
    }

    pub fn nullable_date(&mut self, field: &str) -> Option<NaiveDate> {
        match self.value(field) {
            None | Some(Value::Null) => None,
            Some(value) => self.coerce_date(field, value),
        }
    }

    /// Records an error on `end_field` when it precedes the start date.
    /// Skipped when either date already failed to decode.
    pub fn check_date_order(
        &mut self,
        start_field: &str,
        start: Option<NaiveDate>,
        end_field: &str,
        end: Option<NaiveDate>,
    ) {
        if self.errors.contains(start_field) || self.errors.contains(end_field) {
            return;
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add_error(end_field, "End date must not be before the start date.");
            }
        }
    }

    fn fail<T: Default>(&mut self, field: &str, message: impl Into<String>) -> T {
        self.errors.add(field, message);
        T::default()
    }

    fn coerce_text(&mut self, field: &str, value: &Value, max_len: Option<usize>) -> Option<String> {
        let text = match value {
            Value::String(s) if s.contains('\0') => return self.fail(field, NULL_CHARACTER),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return self.fail(field, NOT_A_STRING),
        };
        if let Some(max) = max_len {
            if text.chars().count() > max {
                return self.fail(
                    field,
                    format!("Ensure this field has no more than {max} characters."),
                );
            }
        }
        Some(text)
    }

    fn coerce_integer(
        &mut self,
        field: &str,
        value: &Value,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Option<i64> {
        let Some(n) = parse_integer(value) else {
            return self.fail(field, NOT_AN_INTEGER);
        };
        if let Some(min) = min {
            if n < min {
                return self.fail(
                    field,
                    format!("Ensure this value is greater than or equal to {min}."),
                );
            }
        }
        if let Some(max) = max {
            if n > max {
                return self.fail(
                    field,
                    format!("Ensure this value is less than or equal to {max}."),
                );
            }
        }
        Some(n)
    }

    fn coerce_date(&mut self, field: &str, value: &Value) -> Option<NaiveDate> {
        value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .or_else(|| self.fail(field, BAD_DATE))
    }
}

/// Accepts JSON integers, integral floats and numeric strings.
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_body_is_rejected() {
        let err = FieldReader::new(&json!([1, 2])).err().unwrap();
        assert_eq!(
            err.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected a dictionary, but got array."]
        );
    }

    #[test]
    fn test_text_trims_and_rejects_blank() {
        let data = json!({"a": "  hi  ", "b": "   ", "c": null});
        let mut r = FieldReader::new(&data).unwrap();
        assert_eq!(r.text("a", None), "hi");
        r.text("b", None);
        r.text("c", None);
        r.text("d", None);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(errors.get("b").unwrap(), [NOT_BLANK]);
        assert_eq!(errors.get("c").unwrap(), [NOT_NULL]);
        assert_eq!(errors.get("d").unwrap(), [REQUIRED]);
        assert!(errors.get("a").is_none());
    }

    #[test]
    fn test_text_max_length_counts_chars() {
        let data = json!({"ok": "ééé", "long": "abcd"});
        let mut r = FieldReader::new(&data).unwrap();
        assert_eq!(r.text("ok", Some(3)), "ééé");
        r.text("long", Some(3));
        let errors = r.finish(()).unwrap_err();
        assert_eq!(
            errors.get("long").unwrap(),
            ["Ensure this field has no more than 3 characters."]
        );
    }

    #[test]
    fn test_text_rejects_non_scalar() {
        let data = json!({"a": {"nested": true}, "b": 42});
        let mut r = FieldReader::new(&data).unwrap();
        r.text("a", None);
        assert_eq!(r.text("b", None), "42");
        assert_eq!(r.finish(()).unwrap_err().get("a").unwrap(), [NOT_A_STRING]);
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(parse_integer(&json!(3)), Some(3));
        assert_eq!(parse_integer(&json!(3.0)), Some(3));
        assert_eq!(parse_integer(&json!(" 12 ")), Some(12));
        assert_eq!(parse_integer(&json!(3.5)), None);
        assert_eq!(parse_integer(&json!(true)), None);
    }

    #[test]
    fn test_nullable_integer_bounds() {
        let data = json!({"low": 0, "high": 9, "fine": 2});
        let mut r = FieldReader::new(&data).unwrap();
        assert_eq!(r.nullable_integer("fine", 1, 5), Some(2));
        assert_eq!(r.nullable_integer("missing", 1, 5), None);
        r.nullable_integer("low", 1, 5);
        r.nullable_integer("high", 1, 5);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(
            errors.get("low").unwrap(),
            ["Ensure this value is greater than or equal to 1."]
        );
        assert_eq!(
            errors.get("high").unwrap(),
            ["Ensure this value is less than or equal to 5."]
        );
    }

    #[test]
    fn test_primary_key_messages() {
        let data = json!({"a": "abc", "b": true, "c": "4"});
        let mut r = FieldReader::new(&data).unwrap();
        r.primary_key("a");
        r.primary_key("b");
        assert_eq!(r.primary_key("c"), 4);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(
            errors.get("a").unwrap(),
            ["Invalid pk \"abc\" - object does not exist."]
        );
        assert_eq!(
            errors.get("b").unwrap(),
            ["Incorrect type. Expected pk value, received boolean."]
        );
    }

    #[test]
    fn test_dates_and_ordering() {
        let data = json!({"start": "2021-05-01", "end": "2020-01-01", "bad": "01/02/2020"});
        let mut r = FieldReader::new(&data).unwrap();
        let start = r.date("start");
        let end = r.nullable_date("end");
        r.nullable_date("bad");
        r.check_date_order("start", Some(start), "end", end);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(errors.get("bad").unwrap(), [BAD_DATE]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["bad", "end"]);
    }

    #[test]
    fn test_date_order_skipped_when_start_missing() {
        let data = json!({"end": "1960-01-01"});
        let mut r = FieldReader::new(&data).unwrap();
        let start = r.date("start");
        let end = r.nullable_date("end");
        r.check_date_order("start", Some(start), "end", end);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["start"]);
    }

    #[test]
    fn test_text_rejects_null_characters() {
        let data = json!({"a": "AC\0ME", "b": "ACME"});
        let mut r = FieldReader::new(&data).unwrap();
        r.text("a", None);
        r.nullable_text("b", None);
        let errors = r.finish(()).unwrap_err();
        assert_eq!(errors.get("a").unwrap(), [NULL_CHARACTER]);
        assert!(errors.get("b").is_none());
    }

    #[test]
    fn test_summary_lists_every_field() {
        let mut errors = FieldErrors::single("name", REQUIRED);
        errors.add("level", NOT_AN_INTEGER);
        assert_eq!(
            errors.summary(),
            "level: A valid integer is required.; name: This field is required."
        );
    }
}
