pub mod group_service;
pub mod note_service;
pub mod schedule_service;
pub mod schedule_session;

pub use group_service::GroupService;
pub use note_service::NoteService;
pub use schedule_service::{LessonView, ScheduleService, WeekSchedule};
pub use schedule_session::{ScheduleSession, SessionView};
