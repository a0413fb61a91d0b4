//! Haversine geofence checks.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A possibly incomplete coordinate pair as submitted by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    /// Both coordinates, if present and finite.
    fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

fn haversine_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Great-circle distance in kilometres, or `None` when either point is incomplete.
pub fn get_distance(p1: &GeoPoint, p2: &GeoPoint) -> Option<f64> {
    Some(haversine_km(p1.coords()?, p2.coords()?))
}

/// Whether `point` lies within `radius_km` of `center`. Incomplete input is never inside.
pub fn is_within_radius(point: &GeoPoint, center: &GeoPoint, radius_km: f64) -> bool {
    match get_distance(point, center) {
        Some(distance) => distance <= radius_km,
        None => false,
    }
}
