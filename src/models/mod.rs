pub mod group;
pub mod lesson;
pub mod note;

pub use group::{GroupSearchParams, SELECTED_GROUP_KEY, SelectedGroup};
pub use lesson::{LessonOccurrence, SubGroup};
pub use note::{Note, NoteEntry, SaveNoteRequest, StorageKeyParams};
