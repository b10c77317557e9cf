use super::model::{ScheduleOverride, WeeklyEntry};
use super::time::parse_shift_time;
use crate::error::ScheduleError;

/// Checks a weekly template before it replaces the stored one.
///
/// Days must be 0..=6 without repeats, every time must be `HH:MM`, and a
/// working day must start before it ends.
pub fn validate_weekly_days(days: &[WeeklyEntry]) -> Result<(), ScheduleError> {
    if days.is_empty() {
        return Err(ScheduleError::InvalidSchedule(
            "weekly template needs at least one day".into(),
        ));
    }

    let mut seen = [false; 7];
    for day in days {
        let slot = seen.get_mut(usize::from(day.day_of_week)).ok_or_else(|| {
            ScheduleError::InvalidSchedule(format!(
                "day_of_week must be 0 (Sunday) to 6 (Saturday), got {}",
                day.day_of_week
            ))
        })?;
        if *slot {
            return Err(ScheduleError::InvalidSchedule(format!(
                "day_of_week {} appears more than once",
                day.day_of_week
            )));
        }
        *slot = true;

        let start = parse_shift_time(&day.start_time)?;
        let end = parse_shift_time(&day.end_time)?;
        if !day.is_day_off && start >= end {
            return Err(ScheduleError::InvalidSchedule(format!(
                "day {}: start {} must be before end {}",
                day.day_of_week, day.start_time, day.end_time
            )));
        }
    }

    if seen.iter().any(|d| !d) {
        tracing::debug!(days = days.len(), "Weekly template does not cover every weekday");
    }

    Ok(())
}

/// Checks an override before it is stored.
pub fn validate_override(ov: &ScheduleOverride) -> Result<(), ScheduleError> {
    let start = ov.start_time.as_deref().map(parse_shift_time).transpose()?;
    let end = ov.end_time.as_deref().map(parse_shift_time).transpose()?;

    if ov.is_day_off {
        return Ok(());
    }

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(()),
        (Some(_), Some(_)) => Err(ScheduleError::InvalidSchedule(
            "override start_time must be before end_time".into(),
        )),
        _ => Err(ScheduleError::InvalidSchedule(
            "a working override needs both start_time and end_time".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::resolver::tests::{day_off_override, entry, full_week};

    #[test]
    fn full_week_is_valid() {
        assert!(validate_weekly_days(&full_week(1).days).is_ok());
    }

    #[test]
    fn partial_week_is_accepted() {
        assert!(validate_weekly_days(&[entry(1, "09:00", "17:00", false)]).is_ok());
    }

    #[test]
    fn weekly_rules() {
        assert!(validate_weekly_days(&[]).is_err());
        assert!(matches!(
            validate_weekly_days(&[entry(7, "09:00", "17:00", false)]),
            Err(ScheduleError::InvalidSchedule(_))
        ));
        assert!(matches!(
            validate_weekly_days(&[
                entry(2, "09:00", "17:00", false),
                entry(2, "10:00", "18:00", false)
            ]),
            Err(ScheduleError::InvalidSchedule(_))
        ));
        assert!(matches!(
            validate_weekly_days(&[entry(3, "9:00", "17:00", false)]),
            Err(ScheduleError::InvalidScheduleFormat(_))
        ));
        assert!(matches!(
            validate_weekly_days(&[entry(3, "17:00", "09:00", false)]),
            Err(ScheduleError::InvalidSchedule(_))
        ));
        // reversed hours are ignored on a day off
        assert!(validate_weekly_days(&[entry(0, "00:00", "00:00", true)]).is_ok());
    }

    #[test]
    fn override_rules() {
        let day_off = day_off_override(1, "2024-06-10");
        assert!(validate_override(&day_off).is_ok());

        let mut no_times = day_off.clone();
        no_times.start_time = None;
        no_times.end_time = None;
        assert!(validate_override(&no_times).is_ok());

        no_times.is_day_off = false;
        assert!(matches!(
            validate_override(&no_times),
            Err(ScheduleError::InvalidSchedule(_))
        ));

        let mut working = day_off.clone();
        working.is_day_off = false;
        assert!(validate_override(&working).is_ok());

        working.end_time = Some("09:00".into());
        assert!(validate_override(&working).is_err());

        let mut garbled = day_off;
        garbled.start_time = Some("noon".into());
        assert!(matches!(
            validate_override(&garbled),
            Err(ScheduleError::InvalidScheduleFormat(_))
        ));
    }
}
