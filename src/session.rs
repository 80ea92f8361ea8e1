//! View state of the weekly schedule screen and its transitions.
//!
//! Transitions are pure: they take the current state and an [`Action`] and
//! return the next state plus, when the displayed `(group, week window)`
//! changes, the fetch that has to run. The window depends on the day the
//! action happens, so a session left open across midnight Sunday refetches. Results come back through [`apply_schedule`], which
//! drops anything that is not the answer to the latest request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{LessonOccurrence, SelectedGroup};
use crate::notes::NoteKey;
use crate::week::compute_week_window;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchIdentity {
    pub group_id: String,
    pub week_offset: i32,
    /// Monday of the requested window.
    #[serde(with = "crate::week::api_date")]
    pub week_start: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub identity: FetchIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Action {
    SelectGroup(SelectedGroup),
    SelectWeek(i32),
    NextWeek,
    PreviousWeek,
    CurrentWeek,
    SelectDay(String),
    OpenEditor(NoteKey),
    CloseEditor,
    Refresh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub group: Option<SelectedGroup>,
    pub week_offset: i32,
    /// `None` means "today when showing the current week, Monday otherwise".
    pub selected_day: Option<String>,
    pub editor: Option<NoteKey>,
    pub loading: bool,
    pub error: Option<String>,
    /// Whole-week lessons for `loaded`.
    pub lessons: Option<Vec<LessonOccurrence>>,
    pub loaded: Option<FetchIdentity>,
    #[serde(skip)]
    request_seq: u64,
    #[serde(skip)]
    pending: Option<FetchIdentity>,
}

impl ViewState {
    /// `None` without a group or when the window is out of range.
    pub fn identity(&self, today: NaiveDate) -> Option<FetchIdentity> {
        let group = self.group.as_ref()?;
        let window = compute_week_window(today, self.week_offset).ok()?;
        Some(FetchIdentity {
            group_id: group.id.clone(),
            week_offset: self.week_offset,
            week_start: window.start,
        })
    }

    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    pub fn pending(&self) -> Option<&FetchIdentity> {
        self.pending.as_ref()
    }

    fn fetch_if_needed(&mut self, force: bool, today: NaiveDate) -> Option<FetchRequest> {
        self.group.as_ref()?;
        let Some(identity) = self.identity(today) else {
            if self.pending.take().is_some() {
                self.request_seq += 1;
            }
            self.loading = false;
            self.lessons = Some(Vec::new());
            self.loaded = None;
            self.error = Some(format!("Week {} is out of range", self.week_offset));
            return None;
        };

        if self.pending.as_ref() == Some(&identity) {
            return None;
        }
        if !force && self.pending.is_none() && self.loaded.as_ref() == Some(&identity) {
            return None;
        }

        if self.loaded.as_ref() != Some(&identity) {
            self.lessons = None;
            self.loaded = None;
        }
        self.request_seq += 1;
        self.pending = Some(identity.clone());
        self.loading = true;
        self.error = None;

        Some(FetchRequest {
            seq: self.request_seq,
            identity,
        })
    }
}

pub fn reduce(
    mut state: ViewState,
    action: Action,
    today: NaiveDate,
) -> (ViewState, Option<FetchRequest>) {
    let fetch = match action {
        Action::SelectGroup(group) => {
            state.group = Some(group);
            state.editor = None;
            state.fetch_if_needed(false, today)
        }
        Action::SelectWeek(offset) => {
            state.week_offset = offset;
            state.fetch_if_needed(false, today)
        }
        Action::NextWeek => {
            state.week_offset = state.week_offset.saturating_add(1);
            state.fetch_if_needed(false, today)
        }
        Action::PreviousWeek => {
            state.week_offset = state.week_offset.saturating_sub(1);
            state.fetch_if_needed(false, today)
        }
        Action::CurrentWeek => {
            state.week_offset = 0;
            state.selected_day = None;
            state.fetch_if_needed(false, today)
        }
        Action::SelectDay(label) => {
            state.selected_day = Some(label);
            state.fetch_if_needed(false, today)
        }
        Action::OpenEditor(key) => {
            state.editor = Some(key);
            None
        }
        Action::CloseEditor => {
            state.editor = None;
            None
        }
        Action::Refresh => state.fetch_if_needed(true, today),
    };
    (state, fetch)
}

/// Applies the outcome of `request`. Returns `false` and leaves the state
/// untouched when a newer request has been issued since.
pub fn apply_schedule(
    mut state: ViewState,
    request: &FetchRequest,
    result: Result<Vec<LessonOccurrence>, String>,
) -> (ViewState, bool) {
    if request.seq != state.request_seq || state.pending.as_ref() != Some(&request.identity) {
        return (state, false);
    }

    state.pending = None;
    state.loading = false;
    match result {
        Ok(lessons) => {
            state.lessons = Some(lessons);
            state.loaded = Some(request.identity.clone());
            state.error = None;
        }
        Err(message) => {
            state.lessons = Some(Vec::new());
            state.loaded = None;
            state.error = Some(message);
        }
    }
    (state, true)
}

/// Drops the outstanding request, if any; its result will be ignored.
pub fn cancel_pending(mut state: ViewState) -> ViewState {
    if state.pending.take().is_some() {
        state.request_seq += 1;
        state.loading = false;
    }
    state
}
