use crate::auth::auth::AuthUser;
use crate::model::absence_request::{AbsenceRequest, AbsenceStatus, AbsenceType};
use crate::utils::pagination::Page;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateAbsence {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub absence_type: AbsenceType, // enum ensures Swagger dropdown
    #[schema(example = "Flu")]
    pub reason: String,
    #[schema(example = "https://cdn.example.com/docs/note.pdf")]
    pub document_url: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PendingFilter {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct AbsenceListResponse {
    pub data: Vec<AbsenceRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

const ABSENCE_COLUMNS: &str = "id, employee_id, absence_type, reason, start_date, end_date, \
     document_url, status, approved_by, created_at";

fn validate_absence(payload: &CreateAbsence) -> Result<(), &'static str> {
    if payload.start_date > payload.end_date {
        return Err("start_date cannot be after end_date");
    }
    if payload.reason.trim().is_empty() {
        return Err("reason is required");
    }
    Ok(())
}

/* =========================
Submit absence request
========================= */
/// Submit an absence request for the caller
#[utoipa::path(
    post,
    path = "/api/absence",
    request_body(
        content = CreateAbsence,
        description = "Absence request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Absence request submitted successfully",
         body = Object,
         example = json!({
            "message": "Absence request submitted",
            "id": 12,
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn create_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAbsence>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if let Err(message) = validate_absence(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO absence_requests
            (employee_id, absence_type, reason, start_date, end_date, document_url, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.absence_type.as_ref())
    .bind(payload.reason.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.document_url)
    .bind(AbsenceStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create absence request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Absence request submitted",
        "id": result.last_insert_id(),
        "status": AbsenceStatus::Pending
    })))
}

/// Caller's absence requests, newest first
#[utoipa::path(
    get,
    path = "/api/absence",
    responses(
        (status = 200, description = "Own absence requests", body = [AbsenceRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn my_absences(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let sql = format!(
        "SELECT {} FROM absence_requests WHERE employee_id = ? ORDER BY created_at DESC, id DESC",
        ABSENCE_COLUMNS
    );
    let requests = sqlx::query_as::<_, AbsenceRequest>(&sql)
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch absence requests");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(requests))
}

/// Pending absence requests (admin)
#[utoipa::path(
    get,
    path = "/api/absence/pending",
    params(PendingFilter),
    responses(
        (status = 200, description = "Paginated pending requests", body = AbsenceListResponse),
        (status = 400, description = "page out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn pending_absences(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PendingFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let window = match Page::from_query(query.page, query.per_page, 10, 100) {
        Ok(w) => w,
        Err(message) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
        }
    };

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM absence_requests WHERE status = ?",
    )
    .bind(AbsenceStatus::Pending.as_ref())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to count pending absence requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let sql = format!(
        r#"
        SELECT {}
        FROM absence_requests
        WHERE status = ?
        ORDER BY created_at ASC, id ASC
        LIMIT ? OFFSET ?
        "#,
        ABSENCE_COLUMNS
    );
    let requests = sqlx::query_as::<_, AbsenceRequest>(&sql)
        .bind(AbsenceStatus::Pending.as_ref())
        .bind(window.per_page)
        .bind(window.offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch pending absence requests");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AbsenceListResponse {
        data: requests,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}

/// Moves a pending request to `decision`, recording who decided.
async fn decide(
    auth: &AuthUser,
    pool: &MySqlPool,
    absence_id: u64,
    decision: AbsenceStatus,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        UPDATE absence_requests
        SET status = ?, approved_by = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(decision.as_ref())
    .bind(auth.user_id)
    .bind(absence_id)
    .bind(AbsenceStatus::Pending.as_ref())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, absence_id, %decision, "Absence decision failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Absence request not found or already processed"
        })));
    }

    tracing::info!(absence_id, %decision, admin = auth.user_id, "Absence request decided");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Absence request {decision}")
    })))
}

/* =========================
Approve absence (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/absence/{absence_id}/approve",
    params(
        ("absence_id" = u64, Path, description = "ID of the absence request to approve")
    ),
    responses(
        (status = 200, description = "Absence approved", body = Object, example = json!({
            "message": "Absence request approved"
        })),
        (status = 400, description = "Absence request not found or already processed", body = Object, example = json!({
            "message": "Absence request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn approve_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, pool.get_ref(), path.into_inner(), AbsenceStatus::Approved).await
}

/* =========================
Reject absence (admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/absence/{absence_id}/reject",
    params(
        ("absence_id" = u64, Path, description = "ID of the absence request to reject")
    ),
    responses(
        (status = 200, description = "Absence rejected", body = Object, example = json!({
            "message": "Absence request rejected"
        })),
        (status = 400, description = "Absence request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
pub async fn reject_absence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    decide(&auth, pool.get_ref(), path.into_inner(), AbsenceStatus::Rejected).await
}
