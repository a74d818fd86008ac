//! Field-level validation rules for ingested records.
//!
//! [`FieldValidator::validate_record`] applies every rule independently and
//! collects one error per failed check:
//!
//! | Field           | Rule                                             |
//! |-----------------|--------------------------------------------------|
//! | `name`, `email` | required (present and non-blank)                 |
//! | `email`         | conservative address pattern                     |
//! | `age`           | integer in `[0, 150]`                            |
//! | `phone`         | North-American style number                      |
//! | `date_of_birth` | `YYYY-MM-DD`, not in the future, not before 1900 |
//!
//! Optional fields are only checked when they carry a value. String values of
//! the checked fields with surrounding whitespace produce warnings.
//!
//! # Example
//!
//! ```rust
//! use recordflow::models::record_from_pairs;
//! use recordflow::validation::FieldValidator;
//!
//! let validator = FieldValidator::new();
//! let record = record_from_pairs([("name", "Ann"), ("email", "ann@example.com")]);
//! assert!(validator.validate_record(&record).is_valid());
//! ```

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Record, ValidationResult};

// =============================================================================
// Rules
// =============================================================================

/// Fields every record must carry.
pub const REQUIRED_FIELDS: &[&str] = &["name", "email"];

/// Fields whose string values are checked for surrounding whitespace.
const CHECKED_FIELDS: &[&str] = &["name", "email", "age", "phone", "date_of_birth"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MAX_AGE: i64 = 150;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?1?[-.\s]?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}$")
        .expect("valid phone regex")
});

/// Expected type for [`validate_data_types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "str",
            FieldType::Integer => "int",
            FieldType::Float => "float",
            FieldType::Boolean => "bool",
        }
    }

    fn accepts_text(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            FieldType::String => true,
            FieldType::Integer => text.parse::<i64>().is_ok(),
            FieldType::Float => text.parse::<f64>().is_ok(),
            FieldType::Boolean => matches!(
                text.to_ascii_lowercase().as_str(),
                "true" | "false" | "1" | "0" | "yes" | "no" | "on" | "off"
            ),
        }
    }

    fn accepts_value(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldType::Float, Value::Number(_)) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Text used when a value is quoted back in a message.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Single-value checks
// =============================================================================

/// Whether `field` is present, not null and not a blank string.
pub fn has_value(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

/// Integer view of a value: integers as-is, floats truncated, booleans as
/// 0/1 and strings parsed after trimming.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Error message for an invalid age, `None` when the age is acceptable.
pub fn validate_age(age: &Value) -> Option<String> {
    match coerce_integer(age) {
        None => Some(format!("Age must be a number, got: {}", display_value(age))),
        Some(n) if n < 0 => Some("Age cannot be negative".to_string()),
        Some(n) if n > MAX_AGE => Some(format!("Age cannot be greater than {MAX_AGE}")),
        Some(_) => None,
    }
}

/// Error message for an invalid `YYYY-MM-DD` date, `None` when acceptable.
pub fn validate_date(date: &Value) -> Option<String> {
    let Value::String(text) = date else {
        return Some(format!(
            "Date must be a string, got: {}",
            json_type_name(date)
        ));
    };

    match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
        Ok(parsed) if parsed > Local::now().date_naive() => {
            Some("Date cannot be in the future".to_string())
        }
        Ok(parsed) if parsed.year() < 1900 => Some("Date cannot be before year 1900".to_string()),
        Ok(_) => None,
        Err(_) => Some(format!(
            "Invalid date format. Expected {DATE_FORMAT}, got: {text}"
        )),
    }
}

/// Names of the `required` fields that are missing or blank.
pub fn validate_required_fields<'a>(record: &Record, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|field| !has_value(record, field))
        .collect()
}

/// Type mismatches for the listed fields. Null and absent fields are skipped.
pub fn validate_data_types(record: &Record, types: &[(&str, FieldType)]) -> Vec<String> {
    let mut errors = Vec::new();

    for (field, expected) in types {
        let value = match record.get(*field) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };

        let ok = match value {
            Value::String(s) => expected.accepts_text(s),
            other => expected.accepts_value(other),
        };
        if ok {
            continue;
        }

        let got = match value {
            Value::String(s) => s.clone(),
            other => json_type_name(other).to_string(),
        };
        errors.push(format!(
            "Field '{}' should be {}, got: {}",
            field,
            expected.name(),
            got
        ));
    }

    errors
}

// =============================================================================
// Record validator
// =============================================================================

/// Applies the record-level rules.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator;

impl FieldValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_record(&self, record: &Record) -> ValidationResult {
        let mut result = ValidationResult::new();

        for field in validate_required_fields(record, REQUIRED_FIELDS) {
            result.add_error(field, format!("Required field '{field}' is missing or empty"));
        }

        if has_value(record, "email") {
            let email = &record["email"];
            let ok = email.as_str().map(validate_email).unwrap_or(false);
            if !ok {
                result.add_error(
                    "email",
                    format!("Invalid email format: {}", display_value(email)),
                );
            }
        }

        if has_value(record, "age") {
            if let Some(message) = validate_age(&record["age"]) {
                result.add_error("age", message);
            }
        }

        if has_value(record, "phone") {
            let phone = &record["phone"];
            let ok = phone.as_str().map(validate_phone).unwrap_or(false);
            if !ok {
                result.add_error(
                    "phone",
                    format!("Invalid phone format: {}", display_value(phone)),
                );
            }
        }

        if has_value(record, "date_of_birth") {
            if let Some(message) = validate_date(&record["date_of_birth"]) {
                result.add_error("date_of_birth", message);
            }
        }

        for field in CHECKED_FIELDS {
            if let Some(Value::String(s)) = record.get(*field) {
                if !s.trim().is_empty() && s.trim().len() != s.len() {
                    result.add_warning(
                        *field,
                        format!("Field '{field}' has leading or trailing whitespace"),
                    );
                }
            }
        }

        result
    }
}
