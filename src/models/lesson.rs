use serde::{Deserialize, Deserializer, Serialize};

/// One class meeting as served by the timetable API.
///
/// The API carries no stable lesson id, so a lesson is identified by its
/// slot: room, kind of work, date and start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOccurrence {
    #[serde(default, deserialize_with = "nullable_string")]
    pub discipline: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub auditorium: String,
    #[serde(default, rename = "auditoriumGUID", deserialize_with = "nullable_string")]
    pub auditorium_guid: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub kind_of_work: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub day_of_week_string: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub begin_lesson: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub end_lesson: String,
    #[serde(default)]
    pub sub_group: Option<String>,
    #[serde(default)]
    pub lecturer: Option<String>,
}

impl LessonOccurrence {
    /// Room identifier used for note identity: the room GUID, or the room label
    /// for lessons the API serves without one.
    pub fn room_id(&self) -> &str {
        if self.auditorium_guid.trim().is_empty() {
            &self.auditorium
        } else {
            &self.auditorium_guid
        }
    }

    pub fn sub_group_badge(&self) -> SubGroup {
        SubGroup::from_api(self.sub_group.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubGroup {
    First,
    Second,
    /// Sub-group is set but names neither half of the group.
    Shared,
    /// No sub-group: the whole group attends.
    All,
}

impl SubGroup {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            None => SubGroup::All,
            Some(s) if s.trim().is_empty() => SubGroup::All,
            Some(s) if s.contains("/1") => SubGroup::First,
            Some(s) if s.contains("/2") => SubGroup::Second,
            Some(_) => SubGroup::Shared,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubGroup::First => "1",
            SubGroup::Second => "2",
            SubGroup::Shared => "Общая",
            SubGroup::All => "ВСЕ",
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
