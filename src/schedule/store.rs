use chrono::NaiveDate;
use sqlx::MySqlPool;

use super::model::{ScheduleOverride, WeeklyEntry, WeeklyTemplate};
use crate::error::ScheduleError;

/// Read access the resolver needs. "Not found" is `Ok(None)`.
#[allow(async_fn_in_trait)]
pub trait ScheduleStore {
    async fn get_override(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, ScheduleError>;

    async fn get_weekly_template(
        &self,
        employee_id: u64,
    ) -> Result<Option<WeeklyTemplate>, ScheduleError>;
}

/// MySQL-backed schedules: `work_schedule_days` and `schedule_overrides`.
pub struct MySqlScheduleStore<'a> {
    pool: &'a MySqlPool,
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    employee_id: u64,
    day_of_week: u8,
    start_time: String,
    end_time: String,
    is_day_off: bool,
}

impl<'a> MySqlScheduleStore<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Replaces every weekday row of an employee in one transaction.
    pub async fn replace_weekly_template(
        &self,
        employee_id: u64,
        days: &[WeeklyEntry],
    ) -> Result<(), ScheduleError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM work_schedule_days WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        for day in days {
            sqlx::query(
                r#"
                INSERT INTO work_schedule_days
                    (employee_id, day_of_week, start_time, end_time, is_day_off)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(employee_id)
            .bind(day.day_of_week)
            .bind(&day.start_time)
            .bind(&day.end_time)
            .bind(day.is_day_off)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert or replace the override on its (employee, date) key.
    pub async fn upsert_override(&self, ov: &ScheduleOverride) -> Result<(), ScheduleError> {
        sqlx::query(
            r#"
            INSERT INTO schedule_overrides
                (employee_id, date, start_time, end_time, is_day_off, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                start_time = VALUES(start_time),
                end_time = VALUES(end_time),
                is_day_off = VALUES(is_day_off),
                reason = VALUES(reason)
            "#,
        )
        .bind(ov.employee_id)
        .bind(ov.date)
        .bind(&ov.start_time)
        .bind(&ov.end_time)
        .bind(ov.is_day_off)
        .bind(&ov.reason)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Every stored template, one per employee, ordered by employee id.
    pub async fn list_weekly_templates(&self) -> Result<Vec<WeeklyTemplate>, ScheduleError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT employee_id, day_of_week, start_time, end_time, is_day_off
            FROM work_schedule_days
            ORDER BY employee_id, day_of_week
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(group_templates(rows))
    }
}

fn group_templates(rows: Vec<TemplateRow>) -> Vec<WeeklyTemplate> {
    let mut templates: Vec<WeeklyTemplate> = Vec::new();

    for row in rows {
        let entry = WeeklyEntry {
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            is_day_off: row.is_day_off,
        };

        match templates.last_mut() {
            Some(t) if t.employee_id == row.employee_id => t.days.push(entry),
            _ => templates.push(WeeklyTemplate {
                employee_id: row.employee_id,
                days: vec![entry],
            }),
        }
    }

    templates
}

impl ScheduleStore for MySqlScheduleStore<'_> {
    async fn get_override(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, ScheduleError> {
        let ov = sqlx::query_as::<_, ScheduleOverride>(
            r#"
            SELECT employee_id, date, start_time, end_time, is_day_off, reason
            FROM schedule_overrides
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        Ok(ov)
    }

    async fn get_weekly_template(
        &self,
        employee_id: u64,
    ) -> Result<Option<WeeklyTemplate>, ScheduleError> {
        let days = sqlx::query_as::<_, WeeklyEntry>(
            r#"
            SELECT day_of_week, start_time, end_time, is_day_off
            FROM work_schedule_days
            WHERE employee_id = ?
            ORDER BY day_of_week
            "#,
        )
        .bind(employee_id)
        .fetch_all(self.pool)
        .await?;

        if days.is_empty() {
            return Ok(None);
        }

        Ok(Some(WeeklyTemplate { employee_id, days }))
    }
}
