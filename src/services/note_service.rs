use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{LessonOccurrence, Note, NoteEntry};
use crate::notes::{self, KeyParseError, NoteKey, parse_storage_key};
use crate::store::KeyValueStore;
use crate::week::parse_api_date;

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn KeyValueStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn exists_note_for(&self, lesson: &LessonOccurrence) -> bool {
        notes::exists_note_for(lesson, self.store.as_ref()).await
    }

    /// Reads a note; read failures and undecodable bodies yield `None`.
    pub async fn load_note(&self, key: &NoteKey) -> Option<Note> {
        let storage_key = key.encode();
        let raw = match self.store.get(&storage_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read note {}: {}", storage_key, e);
                return None;
            }
        };

        match serde_json::from_str::<Note>(&raw) {
            Ok(note) => Some(note),
            Err(e) => {
                warn!("Failed to decode note {}: {}", storage_key, e);
                None
            }
        }
    }

    pub async fn load_by_storage_key(&self, raw_key: &str) -> Result<Option<Note>, AppError> {
        let key = parse_storage_key(raw_key)?;
        Ok(self.load_note(&key).await)
    }

    pub async fn note_for_lesson(&self, lesson: &LessonOccurrence) -> Option<Note> {
        self.load_note(&NoteKey::for_lesson(lesson)).await
    }

    /// Writes the note for `lesson`, replacing any previous one. A save with
    /// neither text nor attachment removes the note and returns `None`.
    pub async fn save_note(
        &self,
        lesson: &LessonOccurrence,
        task: String,
        attachment: Option<String>,
    ) -> Result<Option<NoteEntry>, AppError> {
        let key = NoteKey::for_lesson(lesson);
        let attachment = attachment.filter(|a| !a.trim().is_empty());
        let lesson_name = Some(lesson.discipline.clone()).filter(|n| !n.is_empty());
        let note = Note { task, attachment, lesson_name };

        if !note.has_content() {
            debug!("Empty note for {}, removing", key.encode());
            self.delete_note(&key).await?;
            return Ok(None);
        }

        let body = serde_json::to_string(&note).map_err(|e| {
            warn!("Failed to encode note: {}", e);
            AppError::InternalServerError
        })?;
        self.store.set(&key.encode(), &body).await?;
        info!("Saved note for {} {} {}", key.date, key.start_time, lesson.discipline);

        Ok(Some(NoteEntry::new(&key, note)))
    }

    pub async fn delete_note(&self, key: &NoteKey) -> Result<(), AppError> {
        self.store.remove(&key.encode()).await
    }

    pub async fn delete_by_storage_key(&self, raw_key: &str) -> Result<(), AppError> {
        let key = parse_storage_key(raw_key)?;
        self.delete_note(&key).await
    }

    /// All notes, ordered by lesson date and start time. Keys that are not note
    /// keys or do not parse are skipped, as are bodies that do not decode; a
    /// failing store yields an empty list.
    pub async fn list_notes(&self) -> Vec<NoteEntry> {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list notes: {}", e);
                return Vec::new();
            }
        };

        let mut parsed: HashMap<String, NoteKey> = HashMap::new();
        for raw in keys {
            match parse_storage_key(&raw) {
                Ok(key) => {
                    parsed.insert(raw, key);
                }
                Err(KeyParseError::NotANoteKey) => debug!("Skipping non-note key {:?}", raw),
                Err(e) => warn!("Skipping malformed note key {:?}: {}", raw, e),
            }
        }

        let raw_keys: Vec<String> = parsed.keys().cloned().collect();
        let pairs = match self.store.multi_get(&raw_keys).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!("Failed to read notes: {}", e);
                return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(pairs.len());
        for (raw, value) in pairs {
            let Some(key) = parsed.get(&raw) else {
                continue;
            };
            match serde_json::from_str::<Note>(&value) {
                Ok(note) => entries.push(NoteEntry::new(key, note)),
                Err(e) => warn!("Skipping undecodable note {:?}: {}", raw, e),
            }
        }

        entries.sort_by(|a, b| {
            let by_date = match (parse_api_date(&a.date), parse_api_date(&b.date)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.date.cmp(&b.date),
            };
            by_date
                .then_with(|| a.start_time.cmp(&b.start_time))
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }

    /// Every stored pair, notes and settings alike.
    pub async fn export(&self) -> Result<Vec<(String, String)>, AppError> {
        let keys = self.store.list_keys().await?;
        self.store.multi_get(&keys).await
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.store.clear().await?;
        info!("Local storage cleared");
        Ok(())
    }
}
