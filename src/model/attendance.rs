use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "check_in")]
    pub kind: String,
    #[schema(example = 60.1699)]
    pub latitude: f64,
    #[schema(example = 24.9384)]
    pub longitude: f64,
    #[schema(example = "Mannerheimintie 1, Helsinki", nullable = true)]
    pub address: Option<String>,
    #[schema(example = "https://cdn.example.com/selfies/1.jpg")]
    pub selfie_url: String,
    #[schema(example = "b7f3c2a1", nullable = true)]
    pub device_id: Option<String>,
    #[schema(example = 1, nullable = true)]
    pub office_location_id: Option<u64>,
    pub is_suspicious: bool,
    #[schema(example = "2026-01-05T07:02:11Z", format = "date-time", value_type = String)]
    pub recorded_at: DateTime<Utc>,
    /// `on_time` or `late`; only set on check-ins
    #[schema(example = "on_time", nullable = true)]
    pub status: Option<String>,
}
