pub mod key;

pub use key::{KeyParseError, NOTE_KEY_PREFIX, NoteKey, derive_note_key, parse_storage_key};

use tracing::warn;

use crate::models::{LessonOccurrence, Note};
use crate::store::KeyValueStore;

/// Whether a note is stored for the lesson's slot. Store failures and bodies
/// that do not decode count as "no note".
pub async fn exists_note_for(lesson: &LessonOccurrence, store: &dyn KeyValueStore) -> bool {
    let key = derive_note_key(lesson);
    match store.get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str::<Note>(&raw) {
            Ok(note) => note.has_content(),
            Err(e) => {
                warn!("undecodable note under {}: {}", key, e);
                false
            }
        },
        Ok(None) => false,
        Err(e) => {
            warn!("note lookup failed for {}: {}", key, e);
            false
        }
    }
}
