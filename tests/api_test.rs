mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Local;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{group, week_of_lessons};
use studl::api::router;
use studl::state::AppState;
use studl::store::{KeyValueStore, MemoryStore};
use studl::timetable::{StaticTimetableClient, TimetableClient};
use studl::week::compute_week_window;

fn app() -> Router {
    let window = compute_week_window(Local::now().date_naive(), 0).unwrap();
    let timetable: Arc<dyn TimetableClient> = Arc::new(StaticTimetableClient::new(
        week_of_lessons(&window),
        vec![group("493", "ПИН-221"), group("17", "ХТ-231")],
    ));
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    router(AppState::new(store, timetable))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn entry_uri(key: &str) -> String {
    let url = reqwest::Url::parse_with_params("http://localhost/notes/entry", &[("key", key)]).unwrap();
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

#[tokio::test]
async fn test_health() {
    let (status, _) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_week_window() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/week?offset=-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offset"], -1);
    assert_eq!(body["days"].as_array().unwrap().len(), 7);
    assert_eq!(body["days"][0]["label"], "Пн");

    let (status, body) = send(&app, Method::GET, "/week?offset=2147483647", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400 Bad Request");
}

#[tokio::test]
async fn test_schedule_requires_group() {
    let (status, body) = send(&app(), Method::GET, "/schedule", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Select a group first");
}

#[tokio::test]
async fn test_group_search_and_selection() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/groups/search?term=%D0%BF%D0%B8%D0%BD", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "493");

    let (status, _) = send(&app, Method::GET, "/groups/selected", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/groups/selected",
        Some(json!({"id": 493, "label": "ПИН-221"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/groups/selected", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "493");

    let (status, body) = send(&app, Method::GET, "/schedule", None).await;
    assert_eq!(status, StatusCode::OK);
    let lessons = body["lessons"].as_array().unwrap();
    assert_eq!(lessons.len(), 7);
    assert_eq!(lessons[0]["hasNote"], false);
    assert!(lessons[0]["noteKey"].as_str().unwrap().starts_with("note:v1:"));

    let (_, body) = send(&app, Method::GET, "/schedule?day=%D0%92%D1%82", None).await;
    assert_eq!(body["lessons"].as_array().unwrap().len(), 1);
    assert_eq!(body["lessons"][0]["discipline"], "Пара Вт");
}

#[tokio::test]
async fn test_note_lifecycle() {
    let app = app();
    let lesson = json!({
        "discipline": "Физика",
        "auditorium": "6-212",
        "auditoriumGUID": "212",
        "kindOfWork": "ЛК",
        "date": "2024.01.10",
        "dayOfWeekString": "Ср",
        "beginLesson": "09:00",
        "endLesson": "10:30"
    });

    let (status, _) = send(&app, Method::POST, "/notes/lookup", Some(lesson.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, entry) = send(
        &app,
        Method::PUT,
        "/notes",
        Some(json!({"lesson": lesson, "task": "Read chapter 3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let key = entry["key"].as_str().unwrap().to_string();
    assert_eq!(key, "note:v1:3:212,4:ЛК,10:2024.01.10,5:09:00,");
    assert_eq!(entry["lessonName"], "Физика");

    let (status, note) = send(&app, Method::POST, "/notes/lookup", Some(lesson.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["task"], "Read chapter 3");

    let (_, listed) = send(&app, Method::GET, "/notes", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["startTime"], "09:00");

    let (status, note) = send(&app, Method::GET, &entry_uri(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["task"], "Read chapter 3");

    let (status, _) = send(&app, Method::DELETE, &entry_uri(&key), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &entry_uri(&key), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/notes",
        Some(json!({"lesson": lesson, "task": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_malformed_storage_key_is_rejected() {
    let (status, body) = send(&app(), Method::DELETE, "/notes/entry?key=onlyonepart", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_export_and_clear() {
    let app = app();
    send(
        &app,
        Method::PUT,
        "/groups/selected",
        Some(json!({"id": "493", "label": "ПИН-221"})),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0][0], "selectedGroup");

    let (status, _) = send(&app, Method::DELETE, "/storage", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/groups/selected", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, session) = send(&app, Method::GET, "/session", None).await;
    assert_eq!(session["state"]["group"], Value::Null);
}

#[tokio::test]
async fn test_session_actions() {
    let app = app();

    let (status, view) = send(
        &app,
        Method::POST,
        "/session/actions",
        Some(json!({"type": "selectWeek", "payload": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"]["weekOffset"], 2);
    assert_eq!(view["state"]["loading"], false);
    assert_eq!(view["day"], "Пн");

    let (_, view) = send(
        &app,
        Method::POST,
        "/session/actions",
        Some(json!({"type": "currentWeek"})),
    )
    .await;
    assert_eq!(view["state"]["weekOffset"], 0);
    assert_eq!(view["window"]["offset"], 0);

    let (status, _) = send(
        &app,
        Method::POST,
        "/session/actions",
        Some(json!({"type": "teleport"})),
    )
    .await;
    assert!(status.is_client_error());

    let (status, _) = send(&app, Method::POST, "/session/close", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
