//! Storage keys for lesson notes.
//!
//! A key is the prefix [`NOTE_KEY_PREFIX`] followed by exactly four netstrings
//! (`<byte length>:<bytes>,`) holding room, kind of work, date and start time.
//! Length prefixes keep the encoding injective whatever the field values contain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::LessonOccurrence;

pub const NOTE_KEY_PREFIX: &str = "note:v1:";

const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("not a note key")]
    NotANoteKey,
    #[error("invalid field length")]
    BadLength,
    #[error("field shorter than its declared length")]
    Truncated,
    #[error("field is not terminated by ','")]
    MissingTerminator,
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
}

/// Identity of a lesson slot. Two lessons with the same room, kind, date and
/// start time share one key and therefore one note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteKey {
    pub room_id: String,
    pub kind: String,
    pub date: String,
    pub start_time: String,
}

impl NoteKey {
    pub fn new(
        room_id: impl Into<String>,
        kind: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            kind: kind.into(),
            date: date.into(),
            start_time: start_time.into(),
        }
    }

    pub fn for_lesson(lesson: &LessonOccurrence) -> Self {
        Self::new(
            lesson.room_id(),
            lesson.kind_of_work.as_str(),
            lesson.date.as_str(),
            lesson.begin_lesson.as_str(),
        )
    }

    fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            self.room_id.as_str(),
            self.kind.as_str(),
            self.date.as_str(),
            self.start_time.as_str(),
        ]
    }

    /// Renders the storage key string.
    pub fn encode(&self) -> String {
        let mut out = String::from(NOTE_KEY_PREFIX);
        for field in self.fields() {
            out.push_str(&field.len().to_string());
            out.push(':');
            out.push_str(field);
            out.push(',');
        }
        out
    }
}

pub fn derive_note_key(lesson: &LessonOccurrence) -> String {
    NoteKey::for_lesson(lesson).encode()
}

/// Inverse of [`NoteKey::encode`]. Foreign keys (e.g. `selectedGroup`) fail with
/// [`KeyParseError::NotANoteKey`].
pub fn parse_storage_key(raw: &str) -> Result<NoteKey, KeyParseError> {
    let mut rest = raw
        .strip_prefix(NOTE_KEY_PREFIX)
        .ok_or(KeyParseError::NotANoteKey)?;

    let mut fields: Vec<&str> = Vec::with_capacity(FIELD_COUNT);
    while !rest.is_empty() {
        let (len, after) = rest.split_once(':').ok_or(KeyParseError::BadLength)?;
        // Digits only, no leading zeros: one key string per lesson.
        if len.is_empty()
            || !len.bytes().all(|b| b.is_ascii_digit())
            || (len.len() > 1 && len.starts_with('0'))
        {
            return Err(KeyParseError::BadLength);
        }
        let len: usize = len.parse().map_err(|_| KeyParseError::BadLength)?;

        let value = after.get(..len).ok_or(KeyParseError::Truncated)?;
        rest = after[len..]
            .strip_prefix(',')
            .ok_or(KeyParseError::MissingTerminator)?;
        fields.push(value);
    }

    match fields.as_slice() {
        [room_id, kind, date, start_time] => Ok(NoteKey::new(*room_id, *kind, *date, *start_time)),
        _ => Err(KeyParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn lesson(room: &str, kind: &str, date: &str, start: &str) -> LessonOccurrence {
        LessonOccurrence {
            discipline: "Физика".to_string(),
            auditorium: format!("6-{}", room),
            auditorium_guid: room.to_string(),
            kind_of_work: kind.to_string(),
            date: date.to_string(),
            day_of_week_string: "Ср".to_string(),
            begin_lesson: start.to_string(),
            end_lesson: "10:30".to_string(),
            sub_group: None,
            lecturer: None,
        }
    }

    #[test]
    fn test_key_layout() {
        let key = derive_note_key(&lesson("212", "ЛК", "2024.01.10", "09:00"));
        assert_eq!(key, "note:v1:3:212,4:ЛК,10:2024.01.10,5:09:00,");
    }

    #[test]
    fn test_same_slot_same_key() {
        let a = lesson("212", "ЛК", "2024.01.10", "09:00");
        let mut b = a.clone();
        b.discipline = "Другая дисциплина".to_string();
        b.end_lesson = "11:00".to_string();
        assert_eq!(derive_note_key(&a), derive_note_key(&b));
    }

    #[test]
    fn test_any_field_change_changes_key() {
        let base = derive_note_key(&lesson("212", "ЛК", "2024.01.10", "09:00"));
        for other in [
            lesson("213", "ЛК", "2024.01.10", "09:00"),
            lesson("212", "ПЗ", "2024.01.10", "09:00"),
            lesson("212", "ЛК", "2024.01.11", "09:00"),
            lesson("212", "ЛК", "2024.01.10", "10:40"),
        ] {
            assert_ne!(base, derive_note_key(&other));
        }
    }

    #[test]
    fn test_separator_characters_do_not_collide() {
        // A bare "_" join would map both of these to "a_b_c_d_e".
        let a = NoteKey::new("a_b", "c", "d", "e");
        let b = NoteKey::new("a", "b_c", "d", "e");
        assert_ne!(a.encode(), b.encode());

        let alphabet = ["", "_", ":", ",", "1:", "a,", "1:a,", "ЛК"];
        let mut seen = HashSet::new();
        for room in alphabet {
            for kind in alphabet {
                for date in alphabet {
                    for start in alphabet {
                        let key = NoteKey::new(room, kind, date, start);
                        let encoded = key.encode();
                        assert_eq!(parse_storage_key(&encoded), Ok(key));
                        assert!(seen.insert(encoded));
                    }
                }
            }
        }
        assert_eq!(seen.len(), alphabet.len().pow(4));
    }

    #[test]
    fn test_foreign_keys_are_rejected() {
        assert_eq!(parse_storage_key("onlyonepart"), Err(KeyParseError::NotANoteKey));
        assert_eq!(parse_storage_key("selectedGroup"), Err(KeyParseError::NotANoteKey));
        assert_eq!(
            parse_storage_key("2024.01.10_Физика"),
            Err(KeyParseError::NotANoteKey)
        );
    }

    #[test]
    fn test_malformed_note_keys() {
        assert_eq!(
            parse_storage_key("note:v1:3:212,"),
            Err(KeyParseError::FieldCount { expected: 4, found: 1 })
        );
        assert_eq!(
            parse_storage_key("note:v1:"),
            Err(KeyParseError::FieldCount { expected: 4, found: 0 })
        );
        assert_eq!(
            parse_storage_key("note:v1:1:a,1:b,1:c,1:d,1:e,"),
            Err(KeyParseError::FieldCount { expected: 4, found: 5 })
        );
        assert_eq!(parse_storage_key("note:v1:9:212,"), Err(KeyParseError::Truncated));
        assert_eq!(parse_storage_key("note:v1:3:212;"), Err(KeyParseError::MissingTerminator));
        assert_eq!(parse_storage_key("note:v1:x:212,"), Err(KeyParseError::BadLength));
        assert_eq!(parse_storage_key("note:v1:03:212,"), Err(KeyParseError::BadLength));
        assert_eq!(parse_storage_key("note:v1:212"), Err(KeyParseError::BadLength));
        // Length ending inside a multi-byte character.
        assert_eq!(parse_storage_key("note:v1:1:Л,"), Err(KeyParseError::Truncated));
    }
}
