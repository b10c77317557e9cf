//! Office geofences: great-circle distance and containment.

use crate::model::office_location::OfficeLocation;

/// IUGG mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two WGS84 points, in metres.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// The nearest office whose geofence contains the point.
pub fn locate(offices: &[OfficeLocation], latitude: f64, longitude: f64) -> Option<&OfficeLocation> {
    offices
        .iter()
        .map(|o| (o, distance_m(o.latitude, o.longitude, latitude, longitude)))
        .filter(|(o, d)| *d <= o.radius_m)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o)
}

/// Rejects coordinates outside WGS84 bounds and non-positive radii.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("longitude must be between -180 and 180");
    }
    Ok(())
}

pub fn validate_radius(radius_m: f64) -> Result<(), &'static str> {
    if radius_m.is_finite() && radius_m > 0.0 {
        Ok(())
    } else {
        Err("radius_m must be a positive number of metres")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office(id: u64, latitude: f64, longitude: f64, radius_m: f64) -> OfficeLocation {
        OfficeLocation {
            id,
            name: format!("office-{id}"),
            latitude,
            longitude,
            radius_m,
        }
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_m(60.17, 24.94, 60.17, 24.94), 0.0);
    }

    #[test]
    fn helsinki_to_tallinn_is_about_eighty_km() {
        let d = distance_m(60.1699, 24.9384, 59.4370, 24.7536);
        assert!((d - 82_000.0).abs() < 1_500.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn containment_respects_radius() {
        let hq = [office(1, 60.1699, 24.9384, 100.0)];
        // ~55 m north
        assert!(locate(&hq, 60.1704, 24.9384).is_some());
        // ~222 m north
        assert!(locate(&hq, 60.1719, 24.9384).is_none());
    }

    #[test]
    fn locate_prefers_the_nearest_enclosing_office() {
        let offices = vec![
            office(1, 60.1699, 24.9384, 5_000.0),
            office(2, 60.1710, 24.9400, 500.0),
            office(3, 59.4370, 24.7536, 1_000.0),
        ];

        assert_eq!(locate(&offices, 60.1711, 24.9401).map(|o| o.id), Some(2));
        assert_eq!(locate(&offices, 60.1500, 24.9384).map(|o| o.id), Some(1));
        assert_eq!(locate(&offices, 61.0, 25.0).map(|o| o.id), None);
        assert!(locate(&[], 60.0, 24.0).is_none());
    }

    #[test]
    fn coordinate_and_radius_bounds() {
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.5).is_err());
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(25.0).is_ok());
    }
}
