use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DeviceFingerprint {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "b7f3c2a1")]
    pub device_id: String,
    #[schema(example = "Firefox 128", nullable = true)]
    pub browser_info: Option<String>,
    #[schema(example = "Linux", nullable = true)]
    pub os_info: Option<String>,
    #[schema(example = "203.0.113.7")]
    pub ip_address: String,
    pub is_approved: bool,
    #[schema(example = "2026-01-05T07:02:11Z", format = "date-time", value_type = String)]
    pub last_seen: DateTime<Utc>,
}
