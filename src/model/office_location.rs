use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Head office",
        "latitude": 60.1699,
        "longitude": 24.9384,
        "radius_m": 150.0
    })
)]
pub struct OfficeLocation {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Head office")]
    pub name: String,

    #[schema(example = 60.1699)]
    pub latitude: f64,

    #[schema(example = 24.9384)]
    pub longitude: f64,

    /// Geofence radius in metres
    #[schema(example = 150.0)]
    pub radius_m: f64,
}
