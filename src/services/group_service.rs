use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{SELECTED_GROUP_KEY, SelectedGroup};
use crate::store::KeyValueStore;
use crate::timetable::TimetableClient;

pub struct GroupService {
    store: Arc<dyn KeyValueStore>,
    timetable: Arc<dyn TimetableClient>,
}

impl GroupService {
    pub fn new(store: Arc<dyn KeyValueStore>, timetable: Arc<dyn TimetableClient>) -> Self {
        Self { store, timetable }
    }

    pub async fn search(&self, term: &str) -> Result<Vec<SelectedGroup>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.timetable.search_groups(term).await
    }

    /// The persisted selection, or `None` when absent or unreadable.
    pub async fn selected(&self) -> Option<SelectedGroup> {
        let raw = match self.store.get(SELECTED_GROUP_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read selected group: {}", e);
                return None;
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| warn!("Failed to decode selected group: {}", e))
            .ok()
    }

    pub async fn select(&self, group: &SelectedGroup) -> Result<(), AppError> {
        let body = serde_json::to_string(group).map_err(|e| {
            warn!("Failed to encode selected group: {}", e);
            AppError::InternalServerError
        })?;
        self.store.set(SELECTED_GROUP_KEY, &body).await?;
        info!("Selected group {} ({})", group.label, group.id);
        Ok(())
    }
}
