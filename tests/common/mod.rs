#![allow(dead_code)]

use chrono::NaiveDate;
use studl::models::{LessonOccurrence, SelectedGroup};
use studl::week::{WeekWindow, format_api_date, label_for_date};

pub fn lesson(room: &str, kind: &str, date: &str, start: &str) -> LessonOccurrence {
    let day = studl::week::parse_api_date(date)
        .map(label_for_date)
        .unwrap_or("Пн");
    LessonOccurrence {
        discipline: format!("Дисциплина {}", room),
        auditorium: format!("6-{}", room),
        auditorium_guid: room.to_string(),
        kind_of_work: kind.to_string(),
        date: date.to_string(),
        day_of_week_string: day.to_string(),
        begin_lesson: start.to_string(),
        end_lesson: "10:30".to_string(),
        sub_group: None,
        lecturer: None,
    }
}

pub fn lesson_on(date: NaiveDate, discipline: &str, start: &str) -> LessonOccurrence {
    let mut l = lesson("212", "Лекции", &format_api_date(date), start);
    l.discipline = discipline.to_string();
    l
}

/// One lesson per weekday of `window`, named after the weekday label.
pub fn week_of_lessons(window: &WeekWindow) -> Vec<LessonOccurrence> {
    window
        .days
        .iter()
        .map(|d| lesson_on(d.date, &format!("Пара {}", d.label), "09:00"))
        .collect()
}

pub fn group(id: &str, label: &str) -> SelectedGroup {
    SelectedGroup {
        id: id.to_string(),
        label: label.to_string(),
        description: Some("ФИТиКС".to_string()),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
