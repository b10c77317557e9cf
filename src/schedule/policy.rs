use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::model::DefaultShift;
use super::time::parse_shift_time;
use crate::error::ScheduleError;

pub const DEFAULT_GRACE_MINUTES: i64 = 15;
pub const DEFAULT_START_TIME: &str = "09:00";
pub const DEFAULT_END_TIME: &str = "17:00";

/// Organisation-wide constants used by resolution and classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Slack after the scheduled start before a check-in counts as late.
    pub grace: Duration,
    pub default_start: String,
    pub default_end: String,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            grace: Duration::minutes(DEFAULT_GRACE_MINUTES),
            default_start: DEFAULT_START_TIME.to_string(),
            default_end: DEFAULT_END_TIME.to_string(),
        }
    }
}

impl SchedulePolicy {
    pub fn new(
        grace_minutes: i64,
        default_start: &str,
        default_end: &str,
    ) -> Result<Self, ScheduleError> {
        if !(0..=24 * 60).contains(&grace_minutes) {
            return Err(ScheduleError::InvalidSchedule(format!(
                "grace period must be between 0 and 1440 minutes, got {grace_minutes}"
            )));
        }

        let start = parse_shift_time(default_start)?;
        let end = parse_shift_time(default_end)?;
        if start >= end {
            return Err(ScheduleError::InvalidSchedule(format!(
                "default start {default_start} must be before default end {default_end}"
            )));
        }

        Ok(Self {
            grace: Duration::minutes(grace_minutes),
            default_start: default_start.to_string(),
            default_end: default_end.to_string(),
        })
    }

    /// Built-in shift for `date`: weekends off, weekdays on default hours.
    pub fn default_for(&self, date: NaiveDate) -> DefaultShift {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DefaultShift {
                start_time: None,
                end_time: None,
                is_day_off: true,
            },
            _ => DefaultShift {
                start_time: Some(self.default_start.clone()),
                end_time: Some(self.default_end.clone()),
                is_day_off: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_nine_to_five_with_fifteen_minutes_grace() {
        let policy = SchedulePolicy::default();
        assert_eq!(policy.grace.num_milliseconds(), 900_000);

        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let shift = policy.default_for(monday);
        assert!(!shift.is_day_off);
        assert_eq!(shift.start_time.as_deref(), Some("09:00"));
        assert_eq!(shift.end_time.as_deref(), Some("17:00"));
    }

    #[test]
    fn weekends_are_off_by_default() {
        let policy = SchedulePolicy::default();
        for d in [15, 16] {
            let shift = policy.default_for(NaiveDate::from_ymd_opt(2024, 6, d).unwrap());
            assert!(shift.is_day_off);
            assert_eq!(shift.start_time, None);
        }
    }

    #[test]
    fn new_rejects_bad_constants() {
        assert!(SchedulePolicy::new(-1, "09:00", "17:00").is_err());
        assert!(matches!(
            SchedulePolicy::new(15, "9", "17:00"),
            Err(ScheduleError::InvalidScheduleFormat(_))
        ));
        assert!(matches!(
            SchedulePolicy::new(15, "17:00", "09:00"),
            Err(ScheduleError::InvalidSchedule(_))
        ));

        let custom = SchedulePolicy::new(5, "08:00", "16:00").unwrap();
        assert_eq!(custom.grace, Duration::minutes(5));
    }
}
