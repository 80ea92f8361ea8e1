use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::services::schedule_service::{LessonView, ScheduleService};
use crate::session::{Action, FetchRequest, ViewState, apply_schedule, cancel_pending, reduce};
use crate::store::KeyValueStore;
use crate::timetable::TimetableClient;
use crate::week::{WeekWindow, compute_week_window, label_for_date, parse_api_date};

/// What the schedule screen renders: the state, the window it refers to and
/// the lessons of the effective day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub state: ViewState,
    pub window: WeekWindow,
    pub day: String,
    pub lessons: Vec<LessonView>,
}

/// Drives a [`ViewState`]: runs fetch effects on background tasks and makes
/// sure only the latest, non-cancelled one lands in the state.
pub struct ScheduleSession {
    state: Arc<Mutex<ViewState>>,
    timetable: Arc<dyn TimetableClient>,
    schedule: ScheduleService,
    inflight: Mutex<Option<CancellationToken>>,
}

impl ScheduleSession {
    pub fn new(timetable: Arc<dyn TimetableClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::default())),
            schedule: ScheduleService::new(timetable.clone(), store),
            timetable,
            inflight: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn dispatch(&self, action: Action, today: NaiveDate) -> ViewState {
        debug!("session action: {:?}", action);
        let mut state = self.state.lock().await;
        let (next, fetch) = reduce(std::mem::take(&mut *state), action, today);
        *state = next;

        if let Some(request) = fetch {
            self.start_fetch(request).await;
        }
        state.clone()
    }

    async fn start_fetch(&self, request: FetchRequest) {
        let token = CancellationToken::new();
        if let Some(previous) = self.inflight.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let state = self.state.clone();
        let timetable = self.timetable.clone();

        tokio::spawn(async move {
            let seq = request.seq;
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    debug!("schedule fetch #{} cancelled", seq);
                    return;
                }
                outcome = fetch_week(timetable.as_ref(), &request) => outcome,
            };

            let mut state = state.lock().await;
            if token.is_cancelled() {
                debug!("schedule fetch #{} finished after cancellation, dropped", seq);
                return;
            }
            let (next, applied) = apply_schedule(std::mem::take(&mut *state), &request, outcome);
            *state = next;
            if !applied {
                debug!("schedule fetch #{} superseded, dropped", seq);
            }
        });
    }

    /// Stops applying the outstanding fetch, e.g. when the screen goes away.
    pub async fn close(&self) {
        if let Some(token) = self.inflight.lock().await.take() {
            token.cancel();
        }
        let mut state = self.state.lock().await;
        *state = cancel_pending(std::mem::take(&mut *state));
        info!("schedule session closed");
    }

    /// Cancels everything and forgets the state.
    pub async fn reset(&self) {
        self.close().await;
        *self.state.lock().await = ViewState::default();
    }

    pub async fn view(&self, today: NaiveDate) -> Result<SessionView, AppError> {
        let state = self.state().await;
        let window = compute_week_window(today, state.week_offset)?;
        let day = state
            .selected_day
            .clone()
            .unwrap_or_else(|| default_day(&window, today).to_string());

        // Lessons loaded for another window are not shown.
        let todays: Vec<_> = state
            .lessons
            .iter()
            .flatten()
            .filter(|l| parse_api_date(&l.date).is_some_and(|d| window.contains(d)))
            .filter(|l| l.day_of_week_string == day)
            .cloned()
            .collect();
        let lessons = self.schedule.annotate(todays).await;

        Ok(SessionView {
            state,
            window,
            day,
            lessons,
        })
    }
}

fn default_day(window: &WeekWindow, today: NaiveDate) -> &'static str {
    if window.contains(today) {
        label_for_date(today)
    } else {
        window.days[0].label
    }
}

async fn fetch_week(
    timetable: &dyn TimetableClient,
    request: &FetchRequest,
) -> Result<Vec<crate::models::LessonOccurrence>, String> {
    let window = compute_week_window(request.identity.week_start, 0).map_err(|e| e.to_string())?;

    timetable
        .fetch_schedule(&request.identity.group_id, &window)
        .await
        .map_err(|e| {
            warn!("schedule fetch #{} failed: {}", request.seq, e);
            match e {
                AppError::Timeout => "The timetable service did not answer in time".to_string(),
                _ => "Failed to load the schedule, try again later".to_string(),
            }
        })
}
