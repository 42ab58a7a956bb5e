//! Haversine segment estimator (fallback when routing is unavailable).
//!
//! Uses great-circle distance to estimate driving distance and time.
//! Less accurate than a routing backend (ignores roads) but always available.

/// Minutes per kilometer assumed for fallback durations (~50 km/h).
pub const FALLBACK_MINUTES_PER_KM: f64 = 1.2;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Haversine-based segment estimator.
///
/// Estimates travel time from straight-line distance and an assumed pace.
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    pub minutes_per_km: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            minutes_per_km: FALLBACK_MINUTES_PER_KM,
        }
    }
}

impl HaversineEstimator {
    /// Estimated (distance km, duration minutes) between two points.
    pub fn estimate(&self, from: (f64, f64), to: (f64, f64)) -> (f64, f64) {
        let km = haversine_km(from, to);
        (km, km * self.minutes_per_km)
    }
}
