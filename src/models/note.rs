use serde::{Deserialize, Serialize};

use crate::models::LessonOccurrence;
use crate::notes::NoteKey;

/// Characters of task text shown in the notes list before truncation.
pub const PREVIEW_CHARS: usize = 100;

/// Stored note body.
///
/// Older bodies only carry `task` and `attachment`; the lesson name is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub task: String,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_name: Option<String>,
}

impl Note {
    /// A note exists only while it has text or an attachment.
    pub fn has_content(&self) -> bool {
        !self.task.trim().is_empty() || self.has_attachment()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    pub fn preview(&self) -> String {
        if self.task.chars().count() > PREVIEW_CHARS {
            let head: String = self.task.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.task.clone()
        }
    }
}

/// One row of the notes list, rebuilt from the storage key and the note body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEntry {
    pub key: String,
    pub date: String,
    pub start_time: String,
    pub room_id: String,
    pub kind: String,
    pub lesson_name: Option<String>,
    pub task: String,
    pub preview: String,
    pub attachment: Option<String>,
    pub has_attachment: bool,
}

impl NoteEntry {
    pub fn new(key: &NoteKey, note: Note) -> Self {
        let preview = note.preview();
        let has_attachment = note.has_attachment();
        Self {
            key: key.encode(),
            date: key.date.clone(),
            start_time: key.start_time.clone(),
            room_id: key.room_id.clone(),
            kind: key.kind.clone(),
            lesson_name: note.lesson_name,
            task: note.task,
            preview,
            attachment: note.attachment,
            has_attachment,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveNoteRequest {
    pub lesson: LessonOccurrence,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageKeyParams {
    pub key: String,
}
