use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Weekday number used by templates: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// One day of an employee's recurring week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WeeklyEntry {
    /// 0 = Sunday .. 6 = Saturday
    #[schema(example = 1)]
    pub day_of_week: u8,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
    #[schema(example = false)]
    pub is_day_off: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeeklyTemplate {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub days: Vec<WeeklyEntry>,
}

impl WeeklyTemplate {
    /// Entry for the weekday of `date`, if the template carries one.
    pub fn entry_for(&self, date: NaiveDate) -> Option<&WeeklyEntry> {
        let dow = day_of_week(date);
        self.days.iter().find(|d| d.day_of_week == dow)
    }
}

/// A one-off schedule for a single employee and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScheduleOverride {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "10:00", nullable = true)]
    pub start_time: Option<String>,
    #[schema(example = "14:00", nullable = true)]
    pub end_time: Option<String>,
    pub is_day_off: bool,
    #[schema(example = "Public holiday", nullable = true)]
    pub reason: Option<String>,
}

/// Built-in shift used when neither an override nor a template applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultShift {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub is_day_off: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleSource {
    Override,
    Weekly,
    Default,
}

/// The schedule that applies to one employee on one date.
///
/// Serialises flat with a `source` tag, e.g.
/// `{"source":"weekly","day_of_week":1,"start_time":"09:00",...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolvedSchedule {
    Override(ScheduleOverride),
    Weekly(WeeklyEntry),
    Default(DefaultShift),
}

impl ResolvedSchedule {
    pub fn source(&self) -> ScheduleSource {
        match self {
            ResolvedSchedule::Override(_) => ScheduleSource::Override,
            ResolvedSchedule::Weekly(_) => ScheduleSource::Weekly,
            ResolvedSchedule::Default(_) => ScheduleSource::Default,
        }
    }

    pub fn is_day_off(&self) -> bool {
        match self {
            ResolvedSchedule::Override(o) => o.is_day_off,
            ResolvedSchedule::Weekly(w) => w.is_day_off,
            ResolvedSchedule::Default(d) => d.is_day_off,
        }
    }

    /// Raw start time as stored. Callers must check `is_day_off` first.
    pub fn start_time(&self) -> Option<&str> {
        match self {
            ResolvedSchedule::Override(o) => o.start_time.as_deref(),
            ResolvedSchedule::Weekly(w) => Some(&w.start_time),
            ResolvedSchedule::Default(d) => d.start_time.as_deref(),
        }
    }

    pub fn end_time(&self) -> Option<&str> {
        match self {
            ResolvedSchedule::Override(o) => o.end_time.as_deref(),
            ResolvedSchedule::Weekly(w) => Some(&w.end_time),
            ResolvedSchedule::Default(d) => d.end_time.as_deref(),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ResolvedSchedule::Override(o) => o.reason.as_deref(),
            _ => None,
        }
    }
}

/// Outcome of classifying a check-in. Check-outs are never classified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn weekday_numbers_start_on_sunday() {
        assert_eq!(day_of_week(date("2024-06-09")), 0); // Sunday
        assert_eq!(day_of_week(date("2024-06-10")), 1); // Monday
        assert_eq!(day_of_week(date("2024-06-15")), 6); // Saturday
    }

    #[test]
    fn resolved_schedule_serialises_with_source_tag() {
        let resolved = ResolvedSchedule::Weekly(WeeklyEntry {
            day_of_week: 1,
            start_time: "08:30".into(),
            end_time: "16:30".into(),
            is_day_off: false,
        });

        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["source"], "weekly");
        assert_eq!(value["start_time"], "08:30");
        assert_eq!(value["is_day_off"], false);
    }

    #[test]
    fn weekend_default_omits_times() {
        let resolved = ResolvedSchedule::Default(DefaultShift {
            start_time: None,
            end_time: None,
            is_day_off: true,
        });

        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "source": "default", "is_day_off": true })
        );
    }

    #[test]
    fn status_uses_snake_case_everywhere() {
        assert_eq!(AttendanceStatus::OnTime.as_ref(), "on_time");
        assert_eq!(AttendanceStatus::Late.to_string(), "late");
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::OnTime).unwrap(),
            "\"on_time\""
        );
        assert_eq!(ScheduleSource::Override.as_ref(), "override");
    }
}
