use axum::Json;
use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;
use crate::services::{GroupService, NoteService, ScheduleService, SessionView, WeekSchedule};
use crate::session::Action;
use crate::state::AppState;
use crate::week::{WeekWindow, compute_week_window};

#[derive(Deserialize)]
struct WeekParams {
    #[serde(default)]
    offset: i32,
}

#[derive(Deserialize)]
struct ScheduleParams {
    #[serde(default)]
    offset: i32,
    day: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/week", get(week))
        .route("/schedule", get(schedule))
        .route("/groups/search", get(search_groups))
        .route("/groups/selected", get(selected_group).put(select_group))
        .route("/notes", get(list_notes).put(save_note))
        .route("/notes/lookup", post(lookup_note))
        .route("/notes/entry", get(get_note).delete(delete_note))
        .route("/export", get(export))
        .route("/storage", delete(clear_storage))
        .route("/session", get(session_view))
        .route("/session/actions", post(session_action))
        .route("/session/close", post(close_session))
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.get(SELECTED_GROUP_KEY).await?;
    Ok(StatusCode::OK)
}

async fn week(Query(params): Query<WeekParams>) -> Result<Json<WeekWindow>, AppError> {
    Ok(Json(compute_week_window(today(), params.offset)?))
}

async fn schedule(
    State(state): State<AppState>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<WeekSchedule>, AppError> {
    let groups = GroupService::new(state.store.clone(), state.timetable.clone());
    let group = groups
        .selected()
        .await
        .ok_or_else(|| AppError::BadRequest("Select a group first".to_string()))?;

    let service = ScheduleService::new(state.timetable.clone(), state.store.clone());
    let week = service.week(&group.id, today(), params.offset).await?;
    let Some(day) = params.day else {
        return Ok(Json(week));
    };
    let lessons = week.for_day(&day).into_iter().cloned().collect();
    Ok(Json(WeekSchedule {
        window: week.window,
        lessons,
    }))
}

async fn search_groups(
    State(state): State<AppState>,
    Query(params): Query<GroupSearchParams>,
) -> Result<Json<Vec<SelectedGroup>>, AppError> {
    let service = GroupService::new(state.store.clone(), state.timetable.clone());
    Ok(Json(service.search(&params.term).await?))
}

async fn selected_group(State(state): State<AppState>) -> Result<Json<SelectedGroup>, AppError> {
    let service = GroupService::new(state.store.clone(), state.timetable.clone());
    service.selected().await.map(Json).ok_or(AppError::NotFound)
}

async fn select_group(
    State(state): State<AppState>,
    Json(group): Json<SelectedGroup>,
) -> Result<Json<SelectedGroup>, AppError> {
    let service = GroupService::new(state.store.clone(), state.timetable.clone());
    service.select(&group).await?;
    state
        .session
        .dispatch(Action::SelectGroup(group.clone()), today())
        .await;
    Ok(Json(group))
}

async fn list_notes(State(state): State<AppState>) -> Json<Vec<NoteEntry>> {
    Json(NoteService::new(state.store.clone()).list_notes().await)
}

async fn save_note(
    State(state): State<AppState>,
    Json(req): Json<SaveNoteRequest>,
) -> Result<Response, AppError> {
    let service = NoteService::new(state.store.clone());
    let saved = service.save_note(&req.lesson, req.task, req.attachment).await?;
    Ok(match saved {
        Some(entry) => Json(entry).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn lookup_note(
    State(state): State<AppState>,
    Json(lesson): Json<LessonOccurrence>,
) -> Result<Json<Note>, AppError> {
    let service = NoteService::new(state.store.clone());
    service
        .note_for_lesson(&lesson)
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn get_note(
    State(state): State<AppState>,
    Query(params): Query<StorageKeyParams>,
) -> Result<Json<Note>, AppError> {
    let service = NoteService::new(state.store.clone());
    service
        .load_by_storage_key(&params.key)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn delete_note(
    State(state): State<AppState>,
    Query(params): Query<StorageKeyParams>,
) -> Result<StatusCode, AppError> {
    let service = NoteService::new(state.store.clone());
    service.delete_by_storage_key(&params.key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export(State(state): State<AppState>) -> Result<Json<Vec<(String, String)>>, AppError> {
    let service = NoteService::new(state.store.clone());
    Ok(Json(service.export().await?))
}

async fn clear_storage(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let service = NoteService::new(state.store.clone());
    service.clear_all().await?;
    state.session.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn session_view(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.session.view(today()).await?))
}

async fn session_action(
    State(state): State<AppState>,
    Json(action): Json<Action>,
) -> Result<Json<SessionView>, AppError> {
    let today = today();
    state.session.dispatch(action, today).await;
    Ok(Json(state.session.view(today).await?))
}

async fn close_session(State(state): State<AppState>) -> StatusCode {
    state.session.close().await;
    StatusCode::NO_CONTENT
}
