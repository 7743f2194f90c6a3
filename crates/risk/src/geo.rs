//! Geographic primitives: coordinates, great-circle distance, and the
//! deterministic name geocoder used by the eco-route engine.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::xxh32;

/// Mean Earth radius in kilometers (haversine).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Base coordinate for the name geocoder (San Francisco).
const GEOCODE_BASE_LAT: f64 = 37.7749;
const GEOCODE_BASE_LON: f64 = -122.4194;

/// Seed for the geocoder hash.
const GEOCODE_HASH_SEED: u32 = 0;

/// A WGS84-ish coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance between two points, in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Deterministically map a free-form location name to a coordinate.
///
/// There is no real geocoding backend; names hash (xxh32) to a small offset
/// from the base coordinate, so the same name always lands on the same spot
/// and distinct names usually spread apart.
pub fn geocode(name: &str) -> GeoPoint {
    let hash = xxh32(name.as_bytes(), GEOCODE_HASH_SEED);
    GeoPoint {
        lat: GEOCODE_BASE_LAT + f64::from(hash % 1000) / 10_000.0,
        lon: GEOCODE_BASE_LON + f64::from(hash % 1500) / 10_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(34.0522, -118.2437);
        let d1 = haversine_km(a, b);
        let d2 = haversine_km(b, a);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_new_york_to_los_angeles() {
        // Known great-circle distance is ~3936 km.
        let nyc = GeoPoint::new(40.7128, -74.0060);
        let la = GeoPoint::new(34.0522, -118.2437);
        let d = haversine_km(nyc, la);
        assert!((3900.0..4000.0).contains(&d), "got {d} km");
    }

    #[test]
    fn test_geocode_is_deterministic() {
        let a = geocode("Mission District");
        let b = geocode("Mission District");
        assert_eq!(a, b);
    }

    #[test]
    fn test_geocode_stays_near_base() {
        let p = geocode("anywhere at all");
        assert!((p.lat - GEOCODE_BASE_LAT).abs() < 0.1);
        assert!((p.lon - GEOCODE_BASE_LON).abs() < 0.15);
    }

    #[test]
    fn test_geocode_distinct_names_spread() {
        let a = geocode("Oakland");
        let b = geocode("Berkeley");
        assert_ne!(a, b);
    }

    #[test]
    fn test_geopoint_serde_roundtrip() {
        let p = GeoPoint::new(29.7604, -95.3698);
        let json = serde_json::to_string(&p).expect("serialize");
        let back: GeoPoint = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(p, back);
    }
}
