use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::schedule::validate::{validate_override, validate_weekly_days};
use crate::schedule::{
    MySqlScheduleStore, ScheduleOverride, ScheduleStore, WeeklyEntry, resolve_schedule,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EffectiveScheduleQuery {
    /// Employee to resolve for; defaults to the caller
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Calendar date, YYYY-MM-DD
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct WeeklyScheduleInput {
    pub days: Vec<WeeklyEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct OverrideInput {
    #[schema(example = "2024-06-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "10:00")]
    pub start_time: Option<String>,
    #[schema(example = "14:00")]
    pub end_time: Option<String>,
    pub is_day_off: bool,
    #[schema(example = "Public holiday")]
    pub reason: Option<String>,
}

/// Effective schedule for one employee and date
#[utoipa::path(
    get,
    path = "/api/schedule/effective",
    params(EffectiveScheduleQuery),
    responses(
        (status = 200, description = "Resolved schedule", body = Object, example = json!({
            "source": "weekly",
            "day_of_week": 1,
            "start_time": "09:00",
            "end_time": "17:00",
            "is_day_off": false
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Schedule store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn effective_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<EffectiveScheduleQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;

    let store = MySqlScheduleStore::new(pool.get_ref());
    let resolved =
        resolve_schedule(&store, &config.schedule_policy, employee_id, query.date).await?;

    Ok(HttpResponse::Ok().json(resolved))
}

/// Weekly template of an employee
#[utoipa::path(
    get,
    path = "/api/schedule/weekly/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose template to fetch")
    ),
    responses(
        (status = 200, description = "Weekly template", body = WeeklyTemplate),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No weekly template", body = Object, example = json!({
            "message": "No weekly schedule for this employee"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn get_weekly_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.target_employee(Some(path.into_inner()))?;

    let store = MySqlScheduleStore::new(pool.get_ref());
    match store.get_weekly_template(employee_id).await? {
        Some(template) => Ok(HttpResponse::Ok().json(template)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No weekly schedule for this employee"
        }))),
    }
}

/// All weekly templates (admin)
#[utoipa::path(
    get,
    path = "/api/schedule/weekly",
    responses(
        (status = 200, description = "Every stored weekly template", body = [WeeklyTemplate]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn list_weekly_schedules(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let templates = MySqlScheduleStore::new(pool.get_ref())
        .list_weekly_templates()
        .await?;

    Ok(HttpResponse::Ok().json(templates))
}

/// Replace an employee's weekly template (admin)
#[utoipa::path(
    put,
    path = "/api/schedule/weekly/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose template to replace")
    ),
    request_body = WeeklyScheduleInput,
    responses(
        (status = 200, description = "Template replaced", body = Object, example = json!({
            "message": "Weekly schedule saved"
        })),
        (status = 400, description = "Invalid template"),
        (status = 422, description = "Malformed time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn update_weekly_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<WeeklyScheduleInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = path.into_inner();
    validate_weekly_days(&payload.days)?;

    MySqlScheduleStore::new(pool.get_ref())
        .replace_weekly_template(employee_id, &payload.days)
        .await?;

    tracing::info!(
        employee_id,
        days = payload.days.len(),
        admin = auth.user_id,
        "Weekly schedule replaced"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Weekly schedule saved"
    })))
}

/// Create or replace a one-day override (admin)
#[utoipa::path(
    put,
    path = "/api/schedule/override/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee the override applies to")
    ),
    request_body = OverrideInput,
    responses(
        (status = 200, description = "Override saved", body = ScheduleOverride),
        (status = 400, description = "Invalid override"),
        (status = 422, description = "Malformed time"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn set_schedule_override(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<OverrideInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let input = payload.into_inner();
    let ov = ScheduleOverride {
        employee_id: path.into_inner(),
        date: input.date,
        start_time: input.start_time,
        end_time: input.end_time,
        is_day_off: input.is_day_off,
        reason: input.reason.filter(|r| !r.trim().is_empty()),
    };
    validate_override(&ov)?;

    MySqlScheduleStore::new(pool.get_ref())
        .upsert_override(&ov)
        .await?;

    tracing::info!(
        employee_id = ov.employee_id,
        date = %ov.date,
        is_day_off = ov.is_day_off,
        "Schedule override saved"
    );

    Ok(HttpResponse::Ok().json(ov))
}
