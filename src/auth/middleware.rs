use crate::auth::auth::{AuthUser, bearer_token};
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use serde_json::json;

fn reject(req: ServiceRequest, message: &str, details: Option<String>) -> ServiceResponse<BoxBody> {
    tracing::debug!(path = req.path(), message, "Rejected unauthenticated request");
    let body = match details {
        Some(details) => json!({ "message": message, "details": details }),
        None => json!({ "message": message }),
    };
    req.into_response(HttpResponse::Unauthorized().json(body).map_into_boxed_body())
}

/// Guards protected scopes: verifies the bearer token once and stores the
/// resulting [`AuthUser`] in the request extensions for the handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match bearer_token(req.headers().get(AUTHORIZATION)) {
        Ok(t) => t.to_owned(),
        Err(message) => return Ok(reject(req, message, None)),
    };

    let auth_user = match AuthUser::from_token(&token, &config.jwt_secret) {
        Ok(u) => u,
        Err(e) => return Ok(reject(req, "Invalid or expired token", Some(e))),
    };

    tracing::debug!(
        user_id = auth_user.user_id,
        username = %auth_user.username,
        path = req.path(),
        "Authenticated request"
    );
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
