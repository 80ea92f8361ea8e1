pub mod dto;

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{LessonOccurrence, SelectedGroup};
use crate::week::{WeekWindow, parse_api_date};

pub const DEFAULT_BASE_URL: &str = "https://rasp.omgtu.ru";

#[derive(Clone, Debug)]
pub struct TimetableConfig {
    pub base_url: String,
    /// Value of the `lng` query parameter.
    pub language: String,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "1".to_string(),
            timeout: Duration::from_secs(10),
            retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl TimetableConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let timeout_secs = parse_env("TIMETABLE_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        let retries = parse_env("TIMETABLE_RETRIES", defaults.retries)?;
        let backoff_ms = parse_env(
            "TIMETABLE_RETRY_BACKOFF_MS",
            defaults.retry_backoff.as_millis() as u64,
        )?;

        Ok(Self {
            base_url: env::var("TIMETABLE_BASE_URL").unwrap_or(defaults.base_url),
            language: env::var("TIMETABLE_LANGUAGE").unwrap_or(defaults.language),
            timeout: Duration::from_secs(timeout_secs),
            retries,
            retry_backoff: Duration::from_millis(backoff_ms),
        })
    }
}

pub(crate) fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[async_trait]
pub trait TimetableClient: Send + Sync {
    async fn fetch_schedule(
        &self,
        group_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<LessonOccurrence>, AppError>;
    async fn search_groups(&self, term: &str) -> Result<Vec<SelectedGroup>, AppError>;
}

pub struct TimetableHttpClient {
    client: Client,
    config: TimetableConfig,
}

enum Attempt {
    Retry(AppError),
    Fail(AppError),
}

impl TimetableHttpClient {
    pub fn new(config: TimetableConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("studl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, segments: &[&str], params: &[(&str, &str)]) -> Result<Url, AppError> {
        let invalid = |detail: String| {
            AppError::Config(format!("Invalid TIMETABLE_BASE_URL {:?}: {}", self.config.base_url, detail))
        };

        let mut url = Url::parse(&self.config.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    /// GET with bounded retries. Transport failures, timeouts and 5xx answers are
    /// retried with doubling backoff; 4xx and undecodable bodies are not.
    async fn get_json(&self, url: Url) -> Result<Value, AppError> {
        let attempts = self.config.retries.saturating_add(1);
        let mut delay = self.config.retry_backoff;
        let mut attempt = 1;

        loop {
            debug!("GET {} (attempt {}/{})", url, attempt, attempts);
            match self.get_once(url.clone()).await {
                Ok(body) => return Ok(body),
                Err(Attempt::Retry(e)) if attempt < attempts => {
                    warn!("timetable request failed, retrying in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(Attempt::Retry(e)) | Err(Attempt::Fail(e)) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: Url) -> Result<Value, Attempt> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = AppError::Network(format!("timetable API error {}: {}", status, body));
            return Err(if status.is_server_error() {
                Attempt::Retry(err)
            } else {
                Attempt::Fail(err)
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::Retry(AppError::Timeout)
            } else {
                Attempt::Fail(AppError::Network(format!(
                    "Failed to parse timetable response: {}",
                    e
                )))
            }
        })
    }
}

fn transport_error(e: reqwest::Error) -> Attempt {
    if e.is_timeout() {
        Attempt::Retry(AppError::Timeout)
    } else if e.is_builder() {
        Attempt::Fail(AppError::Network(e.to_string()))
    } else {
        Attempt::Retry(AppError::Network(e.to_string()))
    }
}

#[async_trait]
impl TimetableClient for TimetableHttpClient {
    async fn fetch_schedule(
        &self,
        group_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<LessonOccurrence>, AppError> {
        let start = window.start_param();
        let finish = window.end_param();
        let url = self.endpoint(
            &["api", "schedule", "group", group_id],
            &[
                ("start", start.as_str()),
                ("finish", finish.as_str()),
                ("lng", self.config.language.as_str()),
            ],
        )?;

        let lessons = dto::decode_lessons(self.get_json(url).await?)?;
        debug!("fetched {} lessons for group {} ({} - {})", lessons.len(), group_id, start, finish);
        Ok(lessons)
    }

    async fn search_groups(&self, term: &str) -> Result<Vec<SelectedGroup>, AppError> {
        let url = self.endpoint(&["api", "search"], &[("term", term), ("type", "group")])?;
        dto::decode_groups(self.get_json(url).await?)
    }
}

/// In-process timetable serving fixed data.
pub struct StaticTimetableClient {
    lessons: Vec<LessonOccurrence>,
    groups: Vec<SelectedGroup>,
    delay: Option<Duration>,
    schedule_calls: AtomicUsize,
}

impl StaticTimetableClient {
    pub fn new(lessons: Vec<LessonOccurrence>, groups: Vec<SelectedGroup>) -> Self {
        Self {
            lessons,
            groups,
            delay: None,
            schedule_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimetableClient for StaticTimetableClient {
    async fn fetch_schedule(
        &self,
        _group_id: &str,
        window: &WeekWindow,
    ) -> Result<Vec<LessonOccurrence>, AppError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .lessons
            .iter()
            .filter(|l| parse_api_date(&l.date).is_some_and(|d| window.contains(d)))
            .cloned()
            .collect())
    }

    async fn search_groups(&self, term: &str) -> Result<Vec<SelectedGroup>, AppError> {
        let needle = term.to_lowercase();
        Ok(self
            .groups
            .iter()
            .filter(|g| g.label.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
