//! Type coercion and derived fields, applied after cleaning.

use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::Record;
use crate::validation::{coerce_integer, display_value};

/// Fields rendered in title case.
pub const NAME_FIELDS: &[&str] = &["name", "first_name", "last_name"];

/// Age bucket for an integer age. Boundaries are lower-inclusive.
pub fn categorize_age(age: i64) -> &'static str {
    match age {
        a if a < 18 => "Minor",
        a if a < 30 => "Young Adult",
        a if a < 50 => "Adult",
        a if a < 65 => "Middle Aged",
        _ => "Senior",
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
///
/// `"mary-jane o'neil"` → `"Mary-Jane O'Neil"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

fn type_error(field: &str, value: &Value) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: format!("must be a string, got {}", type_name(value)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Apply the field transformations to a cleaned record.
///
/// An `age` that does not coerce becomes null with a warning. A non-string
/// `email` or name field fails the whole record with [`AppError::Validation`].
pub fn transform_record(mut record: Record) -> AppResult<Record> {
    if let Some(age) = record.get_mut("age") {
        if !age.is_null() {
            match coerce_integer(age) {
                Some(n) => *age = Value::from(n),
                None => {
                    warn!("Invalid age value: {}", display_value(age));
                    *age = Value::Null;
                }
            }
        }
    }

    if let Some(email) = record.get_mut("email") {
        match email {
            Value::Null => {}
            Value::String(s) => *s = s.to_lowercase(),
            other => return Err(type_error("email", other)),
        }
    }

    for field in NAME_FIELDS {
        if let Some(value) = record.get_mut(*field) {
            match value {
                Value::Null => {}
                Value::String(s) => *s = title_case(s),
                other => return Err(type_error(field, other)),
            }
        }
    }

    if let Some(age) = record.get("age").and_then(Value::as_i64) {
        record.insert("age_category".to_string(), Value::from(categorize_age(age)));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_age_buckets() {
        assert_eq!(categorize_age(-3), "Minor");
        assert_eq!(categorize_age(17), "Minor");
        assert_eq!(categorize_age(18), "Young Adult");
        assert_eq!(categorize_age(29), "Young Adult");
        assert_eq!(categorize_age(30), "Adult");
        assert_eq!(categorize_age(49), "Adult");
        assert_eq!(categorize_age(50), "Middle Aged");
        assert_eq!(categorize_age(64), "Middle Aged");
        assert_eq!(categorize_age(65), "Senior");
        assert_eq!(categorize_age(120), "Senior");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("john doe"), "John Doe");
        assert_eq!(title_case("JANE SMITH"), "Jane Smith");
        assert_eq!(title_case("mary-jane o'neil"), "Mary-Jane O'Neil");
        assert_eq!(title_case("agent 007bond"), "Agent 007Bond");
        assert_eq!(title_case("élodie"), "Élodie");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_transform_record() {
        let out = transform_record(record(json!({
            "name": "john doe",
            "email": "John@Example.COM",
            "age": "30",
            "city": "oslo"
        })))
        .unwrap();

        assert_eq!(out["name"], "John Doe");
        assert_eq!(out["email"], "john@example.com");
        assert_eq!(out["age"], 30);
        assert_eq!(out["age_category"], "Adult");
        assert_eq!(out["city"], "oslo");
    }

    #[test]
    fn test_invalid_age_becomes_null_without_category() {
        let out = transform_record(record(json!({"age": "invalid", "name": null}))).unwrap();
        assert_eq!(out["age"], Value::Null);
        assert!(!out.contains_key("age_category"));
    }

    #[test]
    fn test_float_and_bool_ages_truncate() {
        let out = transform_record(record(json!({"age": 64.9}))).unwrap();
        assert_eq!(out["age"], 64);
        assert_eq!(out["age_category"], "Middle Aged");

        let out = transform_record(record(json!({"age": true}))).unwrap();
        assert_eq!(out["age"], 1);
    }

    #[test]
    fn test_non_string_fields_fail_the_record() {
        let err = transform_record(record(json!({"email": 5}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[VALIDATION_ERROR] Field 'email': must be a string, got number"
        );

        let err = transform_record(record(json!({"last_name": ["x"]}))).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "last_name"));
    }
}
