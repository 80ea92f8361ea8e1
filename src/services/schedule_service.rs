use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::{LessonOccurrence, SubGroup};
use crate::notes::derive_note_key;
use crate::services::NoteService;
use crate::store::KeyValueStore;
use crate::timetable::TimetableClient;
use crate::week::{WeekWindow, compute_week_window};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: LessonOccurrence,
    pub note_key: String,
    pub has_note: bool,
    pub sub_group_badge: SubGroup,
    pub sub_group_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub window: WeekWindow,
    pub lessons: Vec<LessonView>,
}

impl WeekSchedule {
    /// Lessons whose `dayOfWeekString` matches `label`, in served order.
    pub fn for_day(&self, label: &str) -> Vec<&LessonView> {
        self.lessons
            .iter()
            .filter(|l| l.lesson.day_of_week_string == label)
            .collect()
    }
}

pub struct ScheduleService {
    timetable: Arc<dyn TimetableClient>,
    notes: NoteService,
}

impl ScheduleService {
    pub fn new(timetable: Arc<dyn TimetableClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            timetable,
            notes: NoteService::new(store),
        }
    }

    pub async fn week(
        &self,
        group_id: &str,
        today: NaiveDate,
        offset: i32,
    ) -> Result<WeekSchedule, AppError> {
        let window = compute_week_window(today, offset)?;
        let lessons = self.timetable.fetch_schedule(group_id, &window).await?;
        info!(
            "Loaded {} lessons for group {} ({} - {})",
            lessons.len(),
            group_id,
            window.start_param(),
            window.end_param()
        );

        Ok(WeekSchedule {
            lessons: self.annotate(lessons).await,
            window,
        })
    }

    /// Attaches note keys, note presence and sub-group badges.
    pub async fn annotate(&self, lessons: Vec<LessonOccurrence>) -> Vec<LessonView> {
        let mut views = Vec::with_capacity(lessons.len());
        for lesson in lessons {
            let has_note = self.notes.exists_note_for(&lesson).await;
            let badge = lesson.sub_group_badge();
            views.push(LessonView {
                note_key: derive_note_key(&lesson),
                has_note,
                sub_group_badge: badge,
                sub_group_label: badge.label(),
                lesson,
            });
        }
        views
    }
}
