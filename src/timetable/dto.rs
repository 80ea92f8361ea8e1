use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{LessonOccurrence, SelectedGroup};

/// Decodes a schedule response. Anything but a JSON array is an error; array
/// items that do not look like lessons are dropped.
pub fn decode_lessons(body: Value) -> Result<Vec<LessonOccurrence>, AppError> {
    decode_array(body, "lesson")
}

pub fn decode_groups(body: Value) -> Result<Vec<SelectedGroup>, AppError> {
    decode_array(body, "group")
}

fn decode_array<T: DeserializeOwned>(body: Value, what: &str) -> Result<Vec<T>, AppError> {
    let Value::Array(items) = body else {
        return Err(AppError::Network(format!(
            "expected a JSON array of {}s, got {}",
            what,
            kind_of(&body)
        )));
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(value) => decoded.push(value),
            Err(e) => {
                tracing::warn!("Failed to parse {} #{} from timetable response: {}", what, index, e);
            }
        }
    }
    Ok(decoded)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_non_array_is_network_error() {
        let err = decode_lessons(json!({"error": "group not found"})).unwrap_err();
        assert!(matches!(err, AppError::Network(msg) if msg.contains("an object")));
    }

    #[test]
    fn test_bad_items_are_skipped() {
        let lessons = decode_lessons(json!([
            {"discipline": "Физика", "date": "2024.01.10", "beginLesson": "09:00"},
            42,
            {"discipline": "Химия", "date": "2024.01.10", "beginLesson": "10:40"}
        ]))
        .unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[1].discipline, "Химия");
    }

    #[test]
    fn test_decode_groups() {
        let groups = decode_groups(json!([{"id": 1, "label": "ПИН-221", "description": "ФИТиКС"}])).unwrap();
        assert_eq!(groups[0].id, "1");
    }
}
