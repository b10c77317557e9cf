use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// First instant of `date` in `tz`, as UTC.
///
/// Falls back to the earliest valid local time when midnight itself is
/// skipped by a DST change.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    (0..=120)
        .step_by(15)
        .find_map(|m| {
            tz.from_local_datetime(&(midnight + Duration::minutes(m)))
                .earliest()
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Half-open `[start, end)` UTC bounds of a local calendar day range.
pub fn local_range<Tz: TimeZone>(tz: &Tz, from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = to.succ_opt().unwrap_or(to);
    (start_of_day(tz, from), start_of_day(tz, end))
}
