//! Record cleaning: key normalisation and value trimming.

use serde_json::Value;

use crate::models::Record;

/// Lower-case a field name and turn spaces and hyphens into underscores.
///
/// `"First Name"` → `"first_name"`, `"E-Mail"` → `"e_mail"`.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace([' ', '-'], "_")
}

/// Trim string values; strings that end up empty become null.
pub fn clean_value(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

/// Clean every field of a record.
///
/// When two keys normalise to the same name, the later one wins but keeps
/// the position of the first.
pub fn clean_record(record: &Record) -> Record {
    let mut cleaned = Record::new();
    for (key, value) in record {
        cleaned.insert(normalize_key(key), clean_value(value));
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("First Name"), "first_name");
        assert_eq!(normalize_key("E-Mail"), "e_mail");
        assert_eq!(normalize_key("date_of_birth"), "date_of_birth");
        assert_eq!(normalize_key("  Age"), "__age");
    }

    #[test]
    fn test_clean_record() {
        let record = json!({
            "Full Name": "  Ann Lee ",
            "Age": "",
            "Score": 3.5,
            "Note": "   ",
            "Active": true
        });
        let cleaned = clean_record(record.as_object().unwrap());

        assert_eq!(
            Value::Object(cleaned),
            json!({
                "full_name": "Ann Lee",
                "age": null,
                "score": 3.5,
                "note": null,
                "active": true
            })
        );
    }

    #[test]
    fn test_colliding_keys_last_wins() {
        let record = json!({"First Name": "a", "first-name": "b", "Other": 1});
        let cleaned = clean_record(record.as_object().unwrap());

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned["first_name"], "b");
        assert_eq!(cleaned.keys().next().map(String::as_str), Some("first_name"));
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[ a-zA-Z0-9\\t-]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_cleaning_is_idempotent(
            fields in prop::collection::vec(("[ a-zA-Z_-]{1,10}", scalar()), 0..8)
        ) {
            let record: Record = fields.into_iter().collect();
            let once = clean_record(&record);
            let twice = clean_record(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
