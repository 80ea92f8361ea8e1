use std::sync::Arc;

use crate::services::ScheduleSession;
use crate::store::KeyValueStore;
use crate::timetable::TimetableClient;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub timetable: Arc<dyn TimetableClient>,
    pub session: Arc<ScheduleSession>,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, timetable: Arc<dyn TimetableClient>) -> Self {
        let session = Arc::new(ScheduleSession::new(timetable.clone(), store.clone()));
        Self {
            store,
            timetable,
            session,
        }
    }
}
