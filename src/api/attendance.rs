use crate::api::device::{DeviceInfo, peer_ip, touch_or_register};
use crate::api::office::load_offices;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::lock_employee;
use crate::geofence;
use crate::model::attendance::{AttendanceKind, AttendanceRecord};
use crate::schedule::{
    AttendanceStatus, MySqlScheduleStore, ResolvedSchedule, SchedulePolicy, ScheduleStore,
    classify_check_in, resolve_schedule,
};
use crate::utils::pagination::Page;
use crate::utils::time::local_range;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlConnection, MySqlPool};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceInput {
    #[schema(example = 60.1699)]
    pub latitude: f64,
    #[schema(example = 24.9384)]
    pub longitude: f64,
    #[schema(example = "Mannerheimintie 1, Helsinki")]
    pub address: Option<String>,
    #[schema(example = "https://cdn.example.com/selfies/1.jpg")]
    pub selfie_url: String,
    /// Client-side verdict (face mismatch, mock location, ...)
    #[serde(default)]
    pub is_suspicious: bool,
    #[schema(example = "b7f3c2a1")]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceReportQuery {
    /// First local date, inclusive
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub from: NaiveDate,
    /// Last local date, inclusive
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    pub to: NaiveDate,
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 50)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceReportResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 50)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Where the employee was and whether to trust it.
struct Presence {
    office_location_id: Option<u64>,
    is_suspicious: bool,
}

/// A record is suspicious when the client says so, when offices exist but
/// none contains the position, or when the device is unknown/unapproved.
fn flag_suspicious(
    client_flag: bool,
    offices_configured: bool,
    inside_office: bool,
    device_approved: Option<bool>,
) -> bool {
    client_flag || (offices_configured && !inside_office) || device_approved == Some(false)
}

fn validate_input(input: &AttendanceInput) -> actix_web::Result<()> {
    geofence::validate_coordinates(input.latitude, input.longitude)
        .map_err(actix_web::error::ErrorBadRequest)?;
    if input.selfie_url.trim().is_empty() {
        return Err(actix_web::error::ErrorBadRequest("selfie_url is required"));
    }
    Ok(())
}

fn internal(e: sqlx::Error, employee_id: u64, what: &'static str) -> actix_web::Error {
    tracing::error!(error = %e, employee_id, "{what}");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Geofence and device checks for one attendance event. A supplied device
/// id is touched, or registered when unknown.
async fn assess_presence(
    conn: &mut MySqlConnection,
    employee_id: u64,
    input: &AttendanceInput,
    ip_address: &str,
) -> actix_web::Result<Presence> {
    let offices = load_offices(&mut *conn)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to load office locations"))?;
    let office = geofence::locate(&offices, input.latitude, input.longitude);

    let device_approved = match input.device_id.as_deref().map(str::trim) {
        Some(device_id) if !device_id.is_empty() => {
            let info = DeviceInfo {
                device_id,
                browser_info: None,
                os_info: None,
                ip_address,
            };
            let (device, created) = touch_or_register(&mut *conn, employee_id, &info)
                .await
                .map_err(|e| internal(e, employee_id, "Failed to record device"))?;
            if created {
                info!(employee_id, device_id, is_approved = device.is_approved, "Device registered at attendance");
            }
            Some(device.is_approved)
        }
        _ => None,
    };

    let is_suspicious = flag_suspicious(
        input.is_suspicious,
        !offices.is_empty(),
        office.is_some(),
        device_approved,
    );
    if is_suspicious {
        info!(
            employee_id,
            client_flag = input.is_suspicious,
            inside_office = office.is_some(),
            ?device_approved,
            "Attendance flagged as suspicious"
        );
    }

    Ok(Presence {
        office_location_id: office.map(|o| o.id),
        is_suspicious,
    })
}

/// Latest record of the employee within `[start, end)`.
async fn latest_record<'e, E>(
    executor: E,
    employee_id: u64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<AttendanceRecord>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, employee_id, kind, latitude, longitude, address, selfie_url,
               device_id, office_location_id, is_suspicious, recorded_at, status
        FROM attendance_records
        WHERE employee_id = ? AND recorded_at >= ? AND recorded_at < ?
        ORDER BY recorded_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(start)
    .bind(end)
    .fetch_optional(executor)
    .await
}

async fn insert_record(
    conn: &mut MySqlConnection,
    employee_id: u64,
    kind: AttendanceKind,
    input: &AttendanceInput,
    presence: &Presence,
    recorded_at: DateTime<Utc>,
    status: Option<AttendanceStatus>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records
            (employee_id, kind, latitude, longitude, address, selfie_url,
             device_id, office_location_id, is_suspicious, recorded_at, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(kind.as_ref())
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(&input.address)
    .bind(&input.selfie_url)
    .bind(&input.device_id)
    .bind(presence.office_location_id)
    .bind(presence.is_suspicious)
    .bind(recorded_at)
    .bind(status.map(|s| s.as_ref().to_string()))
    .execute(conn)
    .await?;

    Ok(result.last_insert_id())
}

/// Resolves the schedule for the local date of `now` and classifies the
/// check-in. `record` only runs once both succeeded, so a schedule failure
/// never leaves a record behind.
async fn classify_then_record<S, Tz, R, Fut, T>(
    store: &S,
    policy: &SchedulePolicy,
    employee_id: u64,
    now: &DateTime<Tz>,
    record: R,
) -> actix_web::Result<(ResolvedSchedule, AttendanceStatus, T)>
where
    S: ScheduleStore,
    Tz: TimeZone,
    R: FnOnce(AttendanceStatus) -> Fut,
    Fut: Future<Output = actix_web::Result<T>>,
{
    let schedule = resolve_schedule(store, policy, employee_id, now.date_naive()).await?;
    let status = classify_check_in(&schedule, now, policy.grace)?;
    debug!(employee_id, source = %schedule.source(), %status, "Check-in classified");

    let recorded = record(status).await?;
    Ok((schedule, status, recorded))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = AttendanceInput,
    responses(
        (status = 200, description = "Checked in", body = Object, example = json!({
            "message": "Checked in successfully",
            "id": 42,
            "status": "late",
            "is_suspicious": false,
            "office_location_id": 1,
            "schedule": {
                "source": "default",
                "start_time": "09:00",
                "end_time": "17:00",
                "is_day_off": false
            }
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Stored schedule has a malformed start time"),
        (status = 503, description = "Schedule store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "attendance_check_in",
    skip(auth, req, pool, config, payload),
    fields(user_id = auth.user_id)
)]
pub async fn check_in(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AttendanceInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    validate_input(&payload)?;

    let now = Utc::now().with_timezone(&config.timezone);
    let today = now.date_naive();
    let (day_start, day_end) = local_range(&config.timezone, today, today);
    let ip_address = peer_ip(&req);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| internal(e, employee_id, "Failed to start check-in"))?;
    lock_employee(&mut tx, employee_id)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to lock employee"))?;

    let already = latest_record(&mut *tx, employee_id, day_start, day_end)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to read today's attendance"))?;
    if already.is_some_and(|r| r.kind == AttendanceKind::CheckIn.as_ref()) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already checked in today"
        })));
    }

    let store = MySqlScheduleStore::new(pool.get_ref());
    let conn = &mut *tx;
    let input = &*payload;
    let ip = ip_address.as_str();
    let (schedule, status, (id, presence)) = classify_then_record(
        &store,
        &config.schedule_policy,
        employee_id,
        &now,
        move |status| async move {
            let presence = assess_presence(&mut *conn, employee_id, input, ip).await?;
            let id = insert_record(
                conn,
                employee_id,
                AttendanceKind::CheckIn,
                input,
                &presence,
                now.with_timezone(&Utc),
                Some(status),
            )
            .await
            .map_err(|e| internal(e, employee_id, "Check-in failed"))?;
            Ok::<_, actix_web::Error>((id, presence))
        },
    )
    .await?;

    tx.commit()
        .await
        .map_err(|e| internal(e, employee_id, "Check-in failed"))?;

    info!(employee_id, id, %status, "Checked in");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "id": id,
        "status": status,
        "is_suspicious": presence.is_suspicious,
        "office_location_id": presence.office_location_id,
        "schedule": schedule
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = AttendanceInput,
    responses(
        (status = 200, description = "Checked out", body = Object, example = json!({
            "message": "Checked out successfully",
            "id": 43,
            "is_suspicious": false
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AttendanceInput>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    validate_input(&payload)?;

    let now = Utc::now().with_timezone(&config.timezone);
    let today = now.date_naive();
    let (day_start, day_end) = local_range(&config.timezone, today, today);
    let ip_address = peer_ip(&req);

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| internal(e, employee_id, "Failed to start check-out"))?;
    lock_employee(&mut tx, employee_id)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to lock employee"))?;

    let latest = latest_record(&mut *tx, employee_id, day_start, day_end)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to read today's attendance"))?;
    if !latest.is_some_and(|r| r.kind == AttendanceKind::CheckIn.as_ref()) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    let presence = assess_presence(&mut tx, employee_id, &payload, &ip_address).await?;

    let id = insert_record(
        &mut tx,
        employee_id,
        AttendanceKind::CheckOut,
        &payload,
        &presence,
        now.with_timezone(&Utc),
        None,
    )
    .await
    .map_err(|e| internal(e, employee_id, "Check-out failed"))?;

    tx.commit()
        .await
        .map_err(|e| internal(e, employee_id, "Check-out failed"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "id": id,
        "is_suspicious": presence.is_suspicious
    })))
}

/// Caller's latest attendance record today
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Latest record today", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Nothing recorded today", body = Object, example = json!({
            "message": "No attendance recorded today"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let today = Utc::now().with_timezone(&config.timezone).date_naive();
    let (start, end) = local_range(&config.timezone, today, today);

    match latest_record(pool.get_ref(), employee_id, start, end)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to read today's attendance"))?
    {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No attendance recorded today"
        }))),
    }
}

/// Attendance report over a local date range (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(AttendanceReportQuery),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceReportResponse),
        (status = 400, description = "from is after to, or page out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<AttendanceReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if query.from > query.to {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "from cannot be after to"
        })));
    }

    // -------------------------
    // Pagination
    // -------------------------
    let window = match Page::from_query(query.page, query.per_page, 50, 500) {
        Ok(w) => w,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
        }
    };

    let (start, end) = local_range(&config.timezone, query.from, query.to);

    let mut where_sql = String::from(" WHERE recorded_at >= ? AND recorded_at < ?");
    if query.employee_id.is_some() {
        where_sql.push_str(" AND employee_id = ?");
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance_records{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql).bind(start).bind(end);
    if let Some(emp_id) = query.employee_id {
        count_q = count_q.bind(emp_id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, kind, latitude, longitude, address, selfie_url,
               device_id, office_location_id, is_suspicious, recorded_at, status
        FROM attendance_records
        {}
        ORDER BY recorded_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql)
        .bind(start)
        .bind(end);
    if let Some(emp_id) = query.employee_id {
        data_q = data_q.bind(emp_id);
    }

    let records = data_q
        .bind(window.per_page)
        .bind(window.offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance report");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceReportResponse {
        data: records,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::schedule::WeeklyTemplate;
    use crate::schedule::resolver::tests::{DownStore, MemoryStore, date, entry};
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use chrono::FixedOffset;
    use sqlx::mysql::MySqlPoolOptions;
    use std::cell::Cell;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    /// Runs the check-in gate with a recorder that only counts its calls.
    async fn check_in_with<S: ScheduleStore>(
        store: &S,
        now: &DateTime<FixedOffset>,
        writes: &Cell<u32>,
    ) -> actix_web::Result<(ResolvedSchedule, AttendanceStatus, u32)> {
        classify_then_record(store, &SchedulePolicy::default(), 7, now, move |_| async move {
            writes.set(writes.get() + 1);
            Ok::<_, actix_web::Error>(writes.get())
        })
        .await
    }

    #[actix_web::test]
    async fn classified_check_in_is_recorded_once() {
        let writes = Cell::new(0);
        // Monday, default 09:00 start
        let (schedule, status, _) =
            check_in_with(&MemoryStore::default(), &at("2024-06-10T09:20:00+00:00"), &writes)
                .await
                .unwrap();

        assert_eq!(schedule.source().as_ref(), "default");
        assert_eq!(status, AttendanceStatus::Late);
        assert_eq!(writes.get(), 1);
    }

    #[actix_web::test]
    async fn malformed_start_time_records_nothing() {
        let store = MemoryStore::default().with_template(WeeklyTemplate {
            employee_id: 7,
            days: vec![entry(1, "9am", "17:00", false)],
        });
        let writes = Cell::new(0);

        let err = check_in_with(&store, &at("2024-06-10T09:00:00+00:00"), &writes)
            .await
            .unwrap_err();

        assert_eq!(err.as_response_error().status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(writes.get(), 0);
    }

    #[actix_web::test]
    async fn unavailable_store_records_nothing() {
        let writes = Cell::new(0);

        let err = check_in_with(&DownStore, &at("2024-06-10T09:00:00+00:00"), &writes)
            .await
            .unwrap_err();

        assert_eq!(err.as_response_error().status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(writes.get(), 0);
    }

    #[actix_web::test]
    async fn report_rejects_pages_past_the_limit() {
        // never connects: the request is refused before any query
        let pool = MySqlPoolOptions::new()
            .connect_lazy("mysql://root@localhost/attendance")
            .unwrap();
        let config = Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://root@localhost/attendance".into()),
            "JWT_SECRET" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        let admin = AuthUser {
            user_id: 1,
            username: "admin".into(),
            role: Role::Admin,
            employee_id: None,
        };
        let query = AttendanceReportQuery {
            from: date("2024-06-01"),
            to: date("2024-06-30"),
            employee_id: None,
            page: Some(u64::MAX),
            per_page: Some(50),
        };

        let responder = attendance_report(
            admin,
            web::Data::new(pool),
            web::Data::new(config),
            web::Query(query),
        )
        .await
        .unwrap();
        let resp = responder.respond_to(&TestRequest::default().to_http_request());

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    fn input(latitude: f64, selfie_url: &str) -> AttendanceInput {
        AttendanceInput {
            latitude,
            longitude: 24.9384,
            address: None,
            selfie_url: selfie_url.into(),
            is_suspicious: false,
            device_id: None,
        }
    }

    #[test]
    fn suspicion_rules() {
        // inside an office, no device info
        assert!(!flag_suspicious(false, true, true, None));
        // no offices configured means no geofence
        assert!(!flag_suspicious(false, false, false, None));
        assert!(flag_suspicious(false, true, false, None));
        assert!(flag_suspicious(true, true, true, Some(true)));
        assert!(flag_suspicious(false, true, true, Some(false)));
        assert!(!flag_suspicious(false, true, true, Some(true)));
    }

    #[test]
    fn input_validation() {
        assert!(validate_input(&input(60.17, "https://cdn/selfie.jpg")).is_ok());
        assert!(validate_input(&input(91.0, "https://cdn/selfie.jpg")).is_err());
        assert!(validate_input(&input(60.17, "  ")).is_err());
    }

    #[test]
    fn client_flag_defaults_to_false() {
        let parsed: AttendanceInput = serde_json::from_value(serde_json::json!({
            "latitude": 60.17,
            "longitude": 24.94,
            "selfie_url": "https://cdn/selfie.jpg"
        }))
        .unwrap();
        assert!(!parsed.is_suspicious);
        assert!(parsed.device_id.is_none());
    }
}
