//! Great-circle distance between GPS coordinates

use serde::{Deserialize, Serialize};

/// Statute miles per degree of arc, times kilometres per statute mile
const KM_PER_DEGREE: f64 = 60.0 * 1.1515 * 1.609344;

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GpsPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Distance between two points in kilometres
///
/// Uses the spherical law of cosines. Identical points are exactly 0 km
/// apart; the cosine is clamped so rounding cannot push `acos` out of its
/// domain for nearly identical points.
pub fn distance_between_gps_points(from: GpsPoint, to: GpsPoint) -> f64 {
    if from == to {
        return 0.0;
    }

    let theta = (from.lng - to.lng).to_radians();
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());

    let cos_dist = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * theta.cos();
    cos_dist.clamp(-1.0, 1.0).acos().to_degrees() * KM_PER_DEGREE
}
