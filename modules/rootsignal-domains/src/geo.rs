use std::f64::consts::PI;

const EARTH_RADIUS_MILES: f64 = 3958.8;
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance unit for haversine calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Meters,
    Kilometers,
}

impl DistanceUnit {
    fn earth_radius(self) -> f64 {
        match self {
            Self::Miles => EARTH_RADIUS_MILES,
            Self::Meters => EARTH_RADIUS_METERS,
            Self::Kilometers => EARTH_RADIUS_KM,
        }
    }
}

/// Haversine distance between two lat/lng points in the specified unit.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64, unit: DistanceUnit) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(lat2 - lat1);
    let dlng = to_rad(lng2 - lng1);

    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();
    unit.earth_radius() * c
}

/// Haversine distance between two lat/lng points in miles.
pub fn haversine_distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    haversine_distance(lat1, lng1, lat2, lng2, DistanceUnit::Miles)
}

/// Haversine distance between two lat/lng points in meters.
pub fn haversine_distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    haversine_distance(lat1, lng1, lat2, lng2, DistanceUnit::Meters)
}

/// Round coordinates to 2 decimal places (~1km precision).
pub fn coarsen_coords(lat: f64, lng: f64) -> (f64, f64) {
    ((lat * 100.0).round() / 100.0, (lng * 100.0).round() / 100.0)
}
