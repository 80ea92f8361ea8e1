use std::sync::Arc;

use chrono::Local;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studl::api::router;
use studl::config::AppConfig;
use studl::services::GroupService;
use studl::session::Action;
use studl::state::AppState;
use studl::store::SqliteStore;
use studl::timetable::TimetableHttpClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "studl=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let timetable = Arc::new(TimetableHttpClient::new(config.timetable.clone())?);
    info!("timetable API at {}", config.timetable.base_url);

    let state = AppState::new(store, timetable);

    let groups = GroupService::new(state.store.clone(), state.timetable.clone());
    if let Some(group) = groups.selected().await {
        info!("restoring session for group {}", group.label);
        state
            .session
            .dispatch(Action::SelectGroup(group), Local::now().date_naive())
            .await;
    }

    let app = router(state);

    info!("listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
