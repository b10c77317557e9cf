use crate::auth::auth::AuthUser;
use crate::geofence;
use crate::model::office_location::OfficeLocation;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::{MySql, MySqlPool};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OfficeInput {
    #[schema(example = "Head office")]
    pub name: String,
    #[schema(example = 60.1699)]
    pub latitude: f64,
    #[schema(example = 24.9384)]
    pub longitude: f64,
    #[schema(example = 150.0)]
    pub radius_m: f64,
}

impl OfficeInput {
    fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        geofence::validate_coordinates(self.latitude, self.longitude)?;
        geofence::validate_radius(self.radius_m)
    }
}

pub(crate) async fn load_offices<'e, E>(executor: E) -> Result<Vec<OfficeLocation>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    sqlx::query_as::<_, OfficeLocation>(
        "SELECT id, name, latitude, longitude, radius_m FROM office_locations ORDER BY id",
    )
    .fetch_all(executor)
    .await
}

fn internal(e: sqlx::Error, what: &'static str) -> actix_web::Error {
    tracing::error!(error = %e, "{what}");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// List office geofences
#[utoipa::path(
    get,
    path = "/api/office",
    responses(
        (status = 200, description = "All office locations", body = [OfficeLocation]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Office"
)]
pub async fn list_offices(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let offices = load_offices(pool.get_ref())
        .await
        .map_err(|e| internal(e, "Failed to list office locations"))?;

    Ok(HttpResponse::Ok().json(offices))
}

/// Create an office geofence (admin)
#[utoipa::path(
    post,
    path = "/api/office",
    request_body = OfficeInput,
    responses(
        (status = 201, description = "Office created", body = OfficeLocation),
        (status = 400, description = "Invalid office", body = Object, example = json!({
            "message": "radius_m must be a positive number of metres"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Office"
)]
pub async fn create_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<OfficeInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
    }

    let result = sqlx::query(
        "INSERT INTO office_locations (name, latitude, longitude, radius_m) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_m)
    .execute(pool.get_ref())
    .await
    .map_err(|e| internal(e, "Failed to create office location"))?;

    let office = OfficeLocation {
        id: result.last_insert_id(),
        name: payload.name.trim().to_string(),
        latitude: payload.latitude,
        longitude: payload.longitude,
        radius_m: payload.radius_m,
    };
    tracing::info!(office_id = office.id, admin = auth.user_id, "Office location created");

    Ok(HttpResponse::Created().json(office))
}

/// Update an office geofence (admin)
#[utoipa::path(
    put,
    path = "/api/office/{office_id}",
    params(
        ("office_id" = u64, Path, description = "Office to update")
    ),
    request_body = OfficeInput,
    responses(
        (status = 200, description = "Office updated", body = OfficeLocation),
        (status = 400, description = "Invalid office"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Office not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Office"
)]
pub async fn update_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<OfficeInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let office_id = path.into_inner();
    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": message })));
    }

    let result = sqlx::query(
        r#"
        UPDATE office_locations
        SET name = ?, latitude = ?, longitude = ?, radius_m = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_m)
    .bind(office_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| internal(e, "Failed to update office location"))?;

    // MySQL reports 0 affected rows for an unchanged row too
    if result.rows_affected() == 0 {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM office_locations WHERE id = ?",
        )
        .bind(office_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| internal(e, "Failed to look up office location"))?;

        if found == 0 {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Office location not found"
            })));
        }
    }

    Ok(HttpResponse::Ok().json(OfficeLocation {
        id: office_id,
        name: payload.name.trim().to_string(),
        latitude: payload.latitude,
        longitude: payload.longitude,
        radius_m: payload.radius_m,
    }))
}

/// Delete an office geofence (admin)
#[utoipa::path(
    delete,
    path = "/api/office/{office_id}",
    params(
        ("office_id" = u64, Path, description = "Office to delete")
    ),
    responses(
        (status = 204, description = "Office deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Office not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Office"
)]
pub async fn delete_office(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let office_id = path.into_inner();
    let result = sqlx::query("DELETE FROM office_locations WHERE id = ?")
        .bind(office_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| internal(e, "Failed to delete office location"))?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Office location not found"
        })));
    }

    tracing::info!(office_id, admin = auth.user_id, "Office location deleted");
    Ok(HttpResponse::NoContent().finish())
}
