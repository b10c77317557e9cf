use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error, From};
use serde_json::json;

/// Failures surfaced by schedule resolution and check-in classification.
///
/// Absence of an override, a template or a weekday entry is never an
/// error; only malformed data and store outages are.
#[derive(Debug, Display, Error, From)]
pub enum ScheduleError {
    /// A shift time did not match `HH:MM` (hour 0-23, minute 0-59).
    #[display(fmt = "invalid schedule time format: {:?} (expected HH:MM)", _0)]
    #[from(ignore)]
    InvalidScheduleFormat(#[error(not(source))] String),

    /// A schedule submitted for storage breaks a template/override rule.
    #[display(fmt = "invalid schedule: {}", _0)]
    #[from(ignore)]
    InvalidSchedule(#[error(not(source))] String),

    /// The backing store could not answer; propagated unchanged.
    #[display(fmt = "schedule store unavailable: {}", _0)]
    StoreUnavailable(sqlx::Error),
}

impl ResponseError for ScheduleError {
    fn status_code(&self) -> StatusCode {
        match self {
            ScheduleError::InvalidScheduleFormat(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::InvalidSchedule(_) => StatusCode::BAD_REQUEST,
            ScheduleError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // store details stay in the logs
        let message = match self {
            ScheduleError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Schedule store unavailable");
                "Schedule store unavailable".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
