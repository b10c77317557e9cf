use chrono::{DateTime, Duration, LocalResult, NaiveTime, Offset, TimeZone, Utc};

use super::model::{AttendanceStatus, ResolvedSchedule};
use super::time::parse_shift_time;
use crate::error::ScheduleError;

/// Classifies a check-in against the schedule resolved for its day.
///
/// Day offs and schedules without a start time are always on time.
/// Otherwise the check-in is late only when it is strictly after
/// `start + grace`, both taken as absolute instants in the check-in's
/// timezone.
pub fn classify_check_in<Tz: TimeZone>(
    schedule: &ResolvedSchedule,
    check_in: &DateTime<Tz>,
    grace: Duration,
) -> Result<AttendanceStatus, ScheduleError> {
    if schedule.is_day_off() {
        return Ok(AttendanceStatus::OnTime);
    }

    let Some(start) = schedule.start_time() else {
        return Ok(AttendanceStatus::OnTime);
    };

    let start = parse_shift_time(start)?;
    let deadline = scheduled_start(check_in, start) + grace;

    if check_in.with_timezone(&Utc) > deadline {
        Ok(AttendanceStatus::Late)
    } else {
        Ok(AttendanceStatus::OnTime)
    }
}

/// `start` on the check-in's calendar day, as an absolute instant.
fn scheduled_start<Tz: TimeZone>(check_in: &DateTime<Tz>, start: NaiveTime) -> DateTime<Utc> {
    let local = check_in.date_naive().and_time(start);

    match check_in.timezone().from_local_datetime(&local) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
        // skipped by a DST jump: read it with the offset in force the day before
        LocalResult::None => {
            let before = check_in
                .timezone()
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(before.local_minus_utc()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SchedulePolicy;
    use crate::schedule::model::{DefaultShift, ScheduleSource};
    use crate::schedule::resolver::resolve_schedule;
    use crate::schedule::resolver::tests::{
        MemoryStore, date, day_off_override, entry, full_week,
    };
    use crate::schedule::model::WeeklyTemplate;
    use chrono::{FixedOffset, NaiveDateTime};

    fn grace() -> Duration {
        SchedulePolicy::default().grace
    }

    fn at_utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f")
            .unwrap()
            .and_utc()
    }

    fn working(start: &str) -> ResolvedSchedule {
        ResolvedSchedule::Default(DefaultShift {
            start_time: Some(start.into()),
            end_time: Some("17:00".into()),
            is_day_off: false,
        })
    }

    #[test]
    fn grace_boundary_is_inclusive() {
        let schedule = working("09:00");

        let edge = at_utc("2024-06-10 09:15:00.000");
        assert_eq!(
            classify_check_in(&schedule, &edge, grace()).unwrap(),
            AttendanceStatus::OnTime
        );

        let one_ms_later = at_utc("2024-06-10 09:15:00.001");
        assert_eq!(
            classify_check_in(&schedule, &one_ms_later, grace()).unwrap(),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn early_check_in_is_on_time() {
        let early = at_utc("2024-06-10 06:00:00.000");
        assert_eq!(
            classify_check_in(&working("09:00"), &early, grace()).unwrap(),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn day_off_is_always_on_time() {
        let schedules = [
            ResolvedSchedule::Override(day_off_override(1, "2024-06-10")),
            ResolvedSchedule::Weekly(entry(1, "09:00", "17:00", true)),
            ResolvedSchedule::Default(DefaultShift {
                start_time: None,
                end_time: None,
                is_day_off: true,
            }),
        ];

        let late_evening = at_utc("2024-06-10 23:59:59.999");
        for schedule in &schedules {
            assert_eq!(
                classify_check_in(schedule, &late_evening, grace()).unwrap(),
                AttendanceStatus::OnTime
            );
        }
    }

    #[test]
    fn working_override_without_start_is_on_time() {
        let mut ov = day_off_override(1, "2024-06-10");
        ov.is_day_off = false;
        ov.start_time = None;

        let noon = at_utc("2024-06-10 12:00:00.000");
        assert_eq!(
            classify_check_in(&ResolvedSchedule::Override(ov), &noon, grace()).unwrap(),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn malformed_start_time_fails_fast() {
        let noon = at_utc("2024-06-10 12:00:00.000");
        let err = classify_check_in(&working("9:00am"), &noon, grace()).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidScheduleFormat(ref v) if v == "9:00am"));
    }

    #[test]
    fn malformed_start_time_is_ignored_on_a_day_off() {
        let schedule = ResolvedSchedule::Weekly(entry(1, "late", "never", true));
        let noon = at_utc("2024-06-10 12:00:00.000");
        assert_eq!(
            classify_check_in(&schedule, &noon, grace()).unwrap(),
            AttendanceStatus::OnTime
        );
    }

    #[test]
    fn start_is_taken_in_the_check_in_timezone() {
        let helsinki_summer = FixedOffset::east_opt(3 * 3600).unwrap();
        let schedule = working("09:00");

        // 09:14 local is 06:14 UTC
        let local_on_time = helsinki_summer
            .with_ymd_and_hms(2024, 6, 10, 9, 14, 0)
            .unwrap();
        assert_eq!(
            classify_check_in(&schedule, &local_on_time, grace()).unwrap(),
            AttendanceStatus::OnTime
        );

        let local_late = helsinki_summer
            .with_ymd_and_hms(2024, 6, 10, 9, 16, 0)
            .unwrap();
        assert_eq!(
            classify_check_in(&schedule, &local_late, grace()).unwrap(),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn start_skipped_by_dst_moves_forward() {
        // Europe/Helsinki jumps 03:00 -> 04:00 on 2024-03-31, so 03:30 reads as 04:30
        let tz = chrono_tz::Europe::Helsinki;
        let schedule = working("03:30");

        let on_time = tz.with_ymd_and_hms(2024, 3, 31, 4, 30, 0).unwrap();
        assert_eq!(
            classify_check_in(&schedule, &on_time, grace()).unwrap(),
            AttendanceStatus::OnTime
        );

        let late = tz.with_ymd_and_hms(2024, 3, 31, 4, 50, 0).unwrap();
        assert_eq!(
            classify_check_in(&schedule, &late, grace()).unwrap(),
            AttendanceStatus::Late
        );
    }

    #[actix_web::test]
    async fn monday_template_scenario() {
        let store = MemoryStore::default().with_template(WeeklyTemplate {
            employee_id: 4,
            days: vec![entry(1, "09:00", "17:00", false)],
        });
        let policy = SchedulePolicy::default();
        let monday = date("2024-06-10");

        let schedule = resolve_schedule(&store, &policy, 4, monday).await.unwrap();
        assert_eq!(schedule.source(), ScheduleSource::Weekly);

        let on_time = at_utc("2024-06-10 09:14:59.000");
        assert_eq!(
            classify_check_in(&schedule, &on_time, policy.grace).unwrap(),
            AttendanceStatus::OnTime
        );

        let late = at_utc("2024-06-10 09:15:01.000");
        assert_eq!(
            classify_check_in(&schedule, &late, policy.grace).unwrap(),
            AttendanceStatus::Late
        );
    }

    #[actix_web::test]
    async fn override_day_off_scenario() {
        let store = MemoryStore::default()
            .with_template(full_week(5))
            .with_override(day_off_override(5, "2024-06-10"));
        let policy = SchedulePolicy::default();

        let schedule = resolve_schedule(&store, &policy, 5, date("2024-06-10"))
            .await
            .unwrap();
        assert!(schedule.is_day_off());

        for t in ["2024-06-10 00:00:00.000", "2024-06-10 10:00:00.000", "2024-06-10 18:45:00.000"] {
            assert_eq!(
                classify_check_in(&schedule, &at_utc(t), policy.grace).unwrap(),
                AttendanceStatus::OnTime
            );
        }
    }

    #[actix_web::test]
    async fn saturday_without_template_scenario() {
        let policy = SchedulePolicy::default();
        let schedule = resolve_schedule(&MemoryStore::default(), &policy, 6, date("2024-06-15"))
            .await
            .unwrap();

        assert_eq!(schedule.source(), ScheduleSource::Default);
        assert!(schedule.is_day_off());
        assert_eq!(
            classify_check_in(&schedule, &at_utc("2024-06-15 13:00:00.000"), policy.grace).unwrap(),
            AttendanceStatus::OnTime
        );
    }
}
