//! ISO week windows for schedule requests.
//!
//! Every window is a pure function of a reference date and a whole-week
//! offset, so "back to the current week" is always `offset = 0`.

use chrono::{Datelike, Days, NaiveDate, TimeDelta, Weekday};
use serde::Serialize;
use thiserror::Error;

/// Date format used by the timetable API, both in query strings and in lesson payloads.
pub const API_DATE_FORMAT: &str = "%Y.%m.%d";

/// Weekday abbreviations as served in `dayOfWeekString`, Monday first.
pub const DAY_LABELS: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("week offset {offset} from {reference} is out of the supported calendar range")]
    OutOfRange { reference: NaiveDate, offset: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLabel {
    pub weekday: Weekday,
    pub label: &'static str,
    #[serde(with = "api_date")]
    pub date: NaiveDate,
    /// Button caption, e.g. `Пн 8`.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    #[serde(with = "api_date")]
    pub start: NaiveDate,
    #[serde(with = "api_date")]
    pub end: NaiveDate,
    pub iso_year: i32,
    pub iso_week: u32,
    pub offset: i32,
    pub days: [DayLabel; 7],
}

impl WeekWindow {
    pub fn start_param(&self) -> String {
        format_api_date(self.start)
    }

    pub fn end_param(&self) -> String {
        format_api_date(self.end)
    }

    pub fn is_current(&self) -> bool {
        self.offset == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn day(&self, label: &str) -> Option<&DayLabel> {
        self.days.iter().find(|d| d.label == label)
    }
}

/// Computes the Monday..Sunday window `offset` weeks away from the week containing `reference`.
pub fn compute_week_window(reference: NaiveDate, offset: i32) -> Result<WeekWindow, WindowError> {
    let out_of_range = || WindowError::OutOfRange { reference, offset };

    let back = u64::from(reference.weekday().num_days_from_monday());
    let start = reference
        .checked_sub_days(Days::new(back))
        .and_then(|monday| monday.checked_add_signed(TimeDelta::weeks(i64::from(offset))))
        .ok_or_else(out_of_range)?;
    let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(out_of_range)?;

    let days = std::array::from_fn(|i| {
        let date = start + Days::new(i as u64);
        DayLabel {
            weekday: WEEKDAYS[i],
            label: DAY_LABELS[i],
            date,
            display: format!("{} {}", DAY_LABELS[i], date.day()),
        }
    });

    let iso = start.iso_week();
    Ok(WeekWindow {
        start,
        end,
        iso_year: iso.year(),
        iso_week: iso.week(),
        offset,
        days,
    })
}

pub fn day_label(weekday: Weekday) -> &'static str {
    DAY_LABELS[weekday.num_days_from_monday() as usize]
}

pub fn label_for_date(date: NaiveDate) -> &'static str {
    day_label(date.weekday())
}

pub fn weekday_for_label(label: &str) -> Option<Weekday> {
    DAY_LABELS
        .iter()
        .position(|l| *l == label)
        .map(|i| WEEKDAYS[i])
}

pub fn format_api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), API_DATE_FORMAT).ok()
}

pub(crate) mod api_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_api_date(*date))
    }
}
