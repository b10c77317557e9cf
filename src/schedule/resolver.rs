use chrono::NaiveDate;

use super::model::ResolvedSchedule;
use super::policy::SchedulePolicy;
use super::store::ScheduleStore;
use crate::error::ScheduleError;

/// Resolves the schedule for `employee_id` on `date`.
///
/// First match wins, tiers are never merged:
/// 1. the override for (employee, date);
/// 2. the weekly template entry for the date's weekday;
/// 3. the policy default (weekdays on default hours, weekends off).
///
/// A template that lacks the weekday falls through to the default.
/// Store failures propagate unchanged.
pub async fn resolve_schedule<S: ScheduleStore>(
    store: &S,
    policy: &SchedulePolicy,
    employee_id: u64,
    date: NaiveDate,
) -> Result<ResolvedSchedule, ScheduleError> {
    if let Some(ov) = store.get_override(employee_id, date).await? {
        return Ok(ResolvedSchedule::Override(ov));
    }

    if let Some(template) = store.get_weekly_template(employee_id).await? {
        if let Some(entry) = template.entry_for(date) {
            return Ok(ResolvedSchedule::Weekly(entry.clone()));
        }
        tracing::warn!(
            employee_id,
            %date,
            "Weekly template has no entry for this weekday, using default schedule"
        );
    }

    Ok(ResolvedSchedule::Default(policy.default_for(date)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schedule::model::{ScheduleOverride, ScheduleSource, WeeklyEntry, WeeklyTemplate};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store keyed like the MySQL tables.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        overrides: Mutex<HashMap<(u64, NaiveDate), ScheduleOverride>>,
        templates: Mutex<HashMap<u64, WeeklyTemplate>>,
    }

    impl MemoryStore {
        pub(crate) fn with_override(self, ov: ScheduleOverride) -> Self {
            self.overrides
                .lock()
                .unwrap()
                .insert((ov.employee_id, ov.date), ov);
            self
        }

        pub(crate) fn with_template(self, template: WeeklyTemplate) -> Self {
            self.templates
                .lock()
                .unwrap()
                .insert(template.employee_id, template);
            self
        }
    }

    impl ScheduleStore for MemoryStore {
        async fn get_override(
            &self,
            employee_id: u64,
            date: NaiveDate,
        ) -> Result<Option<ScheduleOverride>, ScheduleError> {
            Ok(self.overrides.lock().unwrap().get(&(employee_id, date)).cloned())
        }

        async fn get_weekly_template(
            &self,
            employee_id: u64,
        ) -> Result<Option<WeeklyTemplate>, ScheduleError> {
            Ok(self.templates.lock().unwrap().get(&employee_id).cloned())
        }
    }

    pub(crate) struct DownStore;

    impl ScheduleStore for DownStore {
        async fn get_override(
            &self,
            _: u64,
            _: NaiveDate,
        ) -> Result<Option<ScheduleOverride>, ScheduleError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn get_weekly_template(&self, _: u64) -> Result<Option<WeeklyTemplate>, ScheduleError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn entry(day_of_week: u8, start: &str, end: &str, is_day_off: bool) -> WeeklyEntry {
        WeeklyEntry {
            day_of_week,
            start_time: start.into(),
            end_time: end.into(),
            is_day_off,
        }
    }

    /// Sunday and Saturday off, 08:00-16:00 otherwise.
    pub(crate) fn full_week(employee_id: u64) -> WeeklyTemplate {
        WeeklyTemplate {
            employee_id,
            days: (0..7)
                .map(|d| entry(d, "08:00", "16:00", d == 0 || d == 6))
                .collect(),
        }
    }

    pub(crate) fn day_off_override(employee_id: u64, on: &str) -> ScheduleOverride {
        ScheduleOverride {
            employee_id,
            date: date(on),
            start_time: Some("10:00".into()),
            end_time: Some("12:00".into()),
            is_day_off: true,
            reason: Some("Public holiday".into()),
        }
    }

    #[actix_web::test]
    async fn override_wins_over_template() {
        let store = MemoryStore::default()
            .with_template(full_week(1))
            .with_override(day_off_override(1, "2024-06-10"));

        let resolved = resolve_schedule(&store, &SchedulePolicy::default(), 1, date("2024-06-10"))
            .await
            .unwrap();

        assert_eq!(resolved, ResolvedSchedule::Override(day_off_override(1, "2024-06-10")));
        assert_eq!(resolved.source(), ScheduleSource::Override);
        assert!(resolved.is_day_off());
        assert_eq!(resolved.reason(), Some("Public holiday"));
    }

    #[actix_web::test]
    async fn override_only_applies_to_its_own_date_and_employee() {
        let store = MemoryStore::default()
            .with_template(full_week(1))
            .with_override(day_off_override(1, "2024-06-10"));
        let policy = SchedulePolicy::default();

        let next_day = resolve_schedule(&store, &policy, 1, date("2024-06-11")).await.unwrap();
        assert_eq!(next_day.source(), ScheduleSource::Weekly);

        let colleague = resolve_schedule(&store, &policy, 2, date("2024-06-10")).await.unwrap();
        assert_eq!(colleague.source(), ScheduleSource::Default);
    }

    #[actix_web::test]
    async fn template_entry_used_without_override() {
        let store = MemoryStore::default().with_template(full_week(1));

        let resolved = resolve_schedule(&store, &SchedulePolicy::default(), 1, date("2024-06-12"))
            .await
            .unwrap();

        assert_eq!(resolved, ResolvedSchedule::Weekly(entry(3, "08:00", "16:00", false)));
        assert_eq!(resolved.start_time(), Some("08:00"));
        assert_eq!(resolved.end_time(), Some("16:00"));
    }

    #[actix_web::test]
    async fn template_can_make_a_weekend_a_working_day() {
        let mut template = full_week(1);
        template.days[6] = entry(6, "10:00", "14:00", false);
        let store = MemoryStore::default().with_template(template);

        let saturday = resolve_schedule(&store, &SchedulePolicy::default(), 1, date("2024-06-15"))
            .await
            .unwrap();

        assert!(!saturday.is_day_off());
        assert_eq!(saturday.start_time(), Some("10:00"));
    }

    #[actix_web::test]
    async fn no_schedule_falls_back_to_default() {
        let store = MemoryStore::default();
        let policy = SchedulePolicy::default();

        let monday = resolve_schedule(&store, &policy, 9, date("2024-06-10")).await.unwrap();
        assert_eq!(monday.source(), ScheduleSource::Default);
        assert!(!monday.is_day_off());
        assert_eq!(monday.start_time(), Some("09:00"));
        assert_eq!(monday.end_time(), Some("17:00"));

        let saturday = resolve_schedule(&store, &policy, 9, date("2024-06-15")).await.unwrap();
        assert!(saturday.is_day_off());
        assert_eq!(saturday.start_time(), None);

        let sunday = resolve_schedule(&store, &policy, 9, date("2024-06-16")).await.unwrap();
        assert!(sunday.is_day_off());
    }

    #[actix_web::test]
    async fn template_gap_falls_through_to_default() {
        // Monday only
        let store = MemoryStore::default().with_template(WeeklyTemplate {
            employee_id: 1,
            days: vec![entry(1, "07:00", "15:00", false)],
        });
        let policy = SchedulePolicy::default();

        let tuesday = resolve_schedule(&store, &policy, 1, date("2024-06-11")).await.unwrap();
        assert_eq!(tuesday.source(), ScheduleSource::Default);
        assert_eq!(tuesday.start_time(), Some("09:00"));

        let monday = resolve_schedule(&store, &policy, 1, date("2024-06-10")).await.unwrap();
        assert_eq!(monday.start_time(), Some("07:00"));
    }

    #[actix_web::test]
    async fn default_hours_come_from_policy() {
        let policy = SchedulePolicy::new(10, "08:30", "17:30").unwrap();
        let resolved = resolve_schedule(&MemoryStore::default(), &policy, 1, date("2024-06-10"))
            .await
            .unwrap();

        assert_eq!(resolved.start_time(), Some("08:30"));
        assert_eq!(resolved.end_time(), Some("17:30"));
    }

    #[actix_web::test]
    async fn repeated_resolution_is_identical() {
        let store = MemoryStore::default()
            .with_template(full_week(1))
            .with_override(day_off_override(1, "2024-06-10"));
        let policy = SchedulePolicy::default();

        for on in ["2024-06-10", "2024-06-11", "2024-06-15"] {
            let first = resolve_schedule(&store, &policy, 1, date(on)).await.unwrap();
            let second = resolve_schedule(&store, &policy, 1, date(on)).await.unwrap();
            assert_eq!(first, second);
        }
    }

    #[actix_web::test]
    async fn store_failure_propagates() {
        let err = resolve_schedule(&DownStore, &SchedulePolicy::default(), 1, date("2024-06-10"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScheduleError::StoreUnavailable(sqlx::Error::PoolTimedOut)
        ));
    }
}
