use crate::auth::auth::AuthUser;
use crate::db::lock_employee;
use crate::model::device::DeviceFingerprint;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlConnection, MySqlPool};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterDevice {
    #[schema(example = "b7f3c2a1")]
    pub device_id: String,
    #[schema(example = "Firefox 128")]
    pub browser_info: Option<String>,
    #[schema(example = "Linux")]
    pub os_info: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VerifyDeviceQuery {
    #[schema(example = "b7f3c2a1")]
    pub device_id: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DeviceListQuery {
    /// Defaults to the caller's own devices
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct DeviceVerification {
    pub is_known: bool,
    pub is_approved: bool,
}

impl DeviceVerification {
    fn of(device: Option<&DeviceFingerprint>) -> Self {
        Self {
            is_known: device.is_some(),
            is_approved: device.is_some_and(|d| d.is_approved),
        }
    }
}

const DEVICE_COLUMNS: &str =
    "id, employee_id, device_id, browser_info, os_info, ip_address, is_approved, last_seen";

/// What a client tells us about the device it is using.
pub(crate) struct DeviceInfo<'a> {
    pub device_id: &'a str,
    pub browser_info: Option<&'a str>,
    pub os_info: Option<&'a str>,
    pub ip_address: &'a str,
}

pub(crate) async fn find_device(
    conn: &mut MySqlConnection,
    employee_id: u64,
    device_id: &str,
) -> Result<Option<DeviceFingerprint>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM device_fingerprints WHERE employee_id = ? AND device_id = ?",
        DEVICE_COLUMNS
    );
    sqlx::query_as::<_, DeviceFingerprint>(&sql)
        .bind(employee_id)
        .bind(device_id)
        .fetch_optional(conn)
        .await
}

/// Only an employee's first device is trusted without an admin.
fn auto_approve(known_devices: i64) -> bool {
    known_devices == 0
}

/// Bumps `last_seen` of a known device, or registers it. Returns the device
/// and whether it was created.
///
/// Run inside a transaction holding [`lock_employee`] for `employee_id`.
pub(crate) async fn touch_or_register(
    conn: &mut MySqlConnection,
    employee_id: u64,
    info: &DeviceInfo<'_>,
) -> Result<(DeviceFingerprint, bool), sqlx::Error> {
    let created = find_device(&mut *conn, employee_id, info.device_id)
        .await?
        .is_none();

    if created {
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM device_fingerprints WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO device_fingerprints
                (employee_id, device_id, browser_info, os_info, ip_address, is_approved, last_seen)
            VALUES (?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())
            "#,
        )
        .bind(employee_id)
        .bind(info.device_id)
        .bind(info.browser_info)
        .bind(info.os_info)
        .bind(info.ip_address)
        .bind(auto_approve(known))
        .execute(&mut *conn)
        .await?;
    } else {
        sqlx::query(
            "UPDATE device_fingerprints SET last_seen = UTC_TIMESTAMP() WHERE employee_id = ? AND device_id = ?",
        )
        .bind(employee_id)
        .bind(info.device_id)
        .execute(&mut *conn)
        .await?;
    }

    let device = find_device(conn, employee_id, info.device_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok((device, created))
}

pub(crate) fn peer_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or_default()
        .to_string()
}

fn internal(e: sqlx::Error, employee_id: u64, what: &'static str) -> actix_web::Error {
    tracing::error!(error = %e, employee_id, "{what}");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Register (or refresh) the caller's device
#[utoipa::path(
    post,
    path = "/api/device",
    request_body = RegisterDevice,
    responses(
        (status = 200, description = "Known device, last_seen refreshed", body = DeviceFingerprint),
        (status = 201, description = "Device registered; only a first device is auto-approved", body = DeviceFingerprint),
        (status = 400, description = "device_id missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Device"
)]
pub async fn register_device(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RegisterDevice>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let device_id = payload.device_id.trim();
    if device_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "device_id is required"
        })));
    }

    let ip_address = peer_ip(&req);
    let info = DeviceInfo {
        device_id,
        browser_info: payload.browser_info.as_deref(),
        os_info: payload.os_info.as_deref(),
        ip_address: &ip_address,
    };

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| internal(e, employee_id, "Failed to start device transaction"))?;
    lock_employee(&mut tx, employee_id)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to lock employee"))?;
    let (device, created) = touch_or_register(&mut tx, employee_id, &info)
        .await
        .map_err(|e| internal(e, employee_id, "Failed to register device"))?;
    tx.commit()
        .await
        .map_err(|e| internal(e, employee_id, "Failed to commit device"))?;

    if created {
        tracing::info!(employee_id, device_id, is_approved = device.is_approved, "Device registered");
        Ok(HttpResponse::Created().json(device))
    } else {
        Ok(HttpResponse::Ok().json(device))
    }
}

/// Is this device known and approved for the caller?
#[utoipa::path(
    get,
    path = "/api/device/verify",
    params(VerifyDeviceQuery),
    responses(
        (status = 200, description = "Verification result", body = DeviceVerification),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Device"
)]
pub async fn verify_device(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<VerifyDeviceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| internal(e, employee_id, "Failed to verify device"))?;
    let device = find_device(&mut conn, employee_id, query.device_id.trim())
        .await
        .map_err(|e| internal(e, employee_id, "Failed to verify device"))?;

    Ok(HttpResponse::Ok().json(DeviceVerification::of(device.as_ref())))
}

/// Devices of an employee
#[utoipa::path(
    get,
    path = "/api/device",
    params(DeviceListQuery),
    responses(
        (status = 200, description = "Registered devices", body = [DeviceFingerprint]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Device"
)]
pub async fn list_devices(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DeviceListQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;

    let sql = format!(
        "SELECT {} FROM device_fingerprints WHERE employee_id = ? ORDER BY last_seen DESC",
        DEVICE_COLUMNS
    );
    let devices = sqlx::query_as::<_, DeviceFingerprint>(&sql)
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| internal(e, employee_id, "Failed to list devices"))?;

    Ok(HttpResponse::Ok().json(devices))
}

/// Approve a pending device (admin)
#[utoipa::path(
    put,
    path = "/api/device/{device_pk}/approve",
    params(
        ("device_pk" = u64, Path, description = "Row id of the device")
    ),
    responses(
        (status = 200, description = "Device approved", body = Object, example = json!({
            "message": "Device approved"
        })),
        (status = 400, description = "Device not found or already approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Device"
)]
pub async fn approve_device(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let device_pk = path.into_inner();
    let result = sqlx::query(
        "UPDATE device_fingerprints SET is_approved = TRUE WHERE id = ? AND is_approved = FALSE",
    )
    .bind(device_pk)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, device_pk, "Approve device failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Device not found or already approved"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Device approved"
    })))
}
