// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance between coordinates.

use crate::models::Coordinate;
use geo::{coord, Intersects, Point, Rect};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in km, rounded to 2 decimal places.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let dlat = (b.latitude() - a.latitude()).to_radians();
    let dlon = (b.longitude() - a.longitude()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding error can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (EARTH_RADIUS_KM * c * 100.0).round() / 100.0
}

/// Distance from `a` to `b` when it is at most `radius_km`.
pub fn distance_within(a: Coordinate, b: Coordinate, radius_km: f64) -> Option<f64> {
    let d = distance(a, b);
    (d <= radius_km).then_some(d)
}

/// Box that contains every point within `radius_km` of `center`.
///
/// Returns `None` when the circle reaches a pole or crosses the
/// antimeridian; callers then fall back to exact distance checks only.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> Option<Rect<f64>> {
    // Slack for the 2-decimal rounding in `distance`.
    let angular = (radius_km + 0.01) / EARTH_RADIUS_KM;
    let lat = center.latitude().to_radians();

    let min_lat = lat - angular;
    let max_lat = lat + angular;
    if min_lat <= -std::f64::consts::FRAC_PI_2 || max_lat >= std::f64::consts::FRAC_PI_2 {
        return None;
    }

    let ratio = angular.sin() / lat.cos();
    if ratio >= 1.0 {
        return None;
    }
    let dlon = ratio.asin().to_degrees();

    let min_lon = center.longitude() - dlon;
    let max_lon = center.longitude() + dlon;
    if min_lon < -180.0 || max_lon > 180.0 {
        return None;
    }

    Some(Rect::new(
        coord! { x: min_lon, y: min_lat.to_degrees() },
        coord! { x: max_lon, y: max_lat.to_degrees() },
    ))
}

/// Cheap rejection test against a precomputed box.
pub fn may_be_within(bounds: Option<&Rect<f64>>, candidate: Coordinate) -> bool {
    match bounds {
        Some(rect) => rect.intersects(&Point::from(candidate)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_same_point_is_zero() {
        let mumbai = c(19.0760, 72.8777);
        assert_eq!(distance(mumbai, mumbai), 0.0);
    }

    #[test]
    fn test_mumbai_delhi() {
        let mumbai = c(19.0760, 72.8777);
        let delhi = c(28.6139, 77.2090);
        let d = distance(mumbai, delhi);
        assert!((1161.0..=1163.0).contains(&d), "got {d}");
        assert_eq!(d, distance(delhi, mumbai));
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let d = distance(c(12.9716, 77.5946), c(12.9352, 77.6245));
        assert_eq!(d, (d * 100.0).round() / 100.0);
    }

    #[test]
    fn test_distance_within_boundary() {
        let a = c(0.0, 0.0);
        let b = c(0.0, 0.1);
        let d = distance(a, b);
        assert_eq!(distance_within(a, b, d), Some(d));
        assert_eq!(distance_within(a, b, d - 0.01), None);
    }

    #[test]
    fn test_bounding_box_never_rejects_a_match() {
        let center = c(18.5204, 73.8567);
        let rect = bounding_box(center, 15.0).unwrap();
        // Points on the circle in several directions
        for (dlat, dlon) in [(0.134, 0.0), (0.0, 0.141), (-0.095, -0.1), (0.095, 0.1)] {
            let p = c(center.latitude() + dlat, center.longitude() + dlon);
            if distance_within(center, p, 15.0).is_some() {
                assert!(may_be_within(Some(&rect), p), "{dlat},{dlon} rejected");
            }
        }
        assert!(!may_be_within(Some(&rect), c(19.0760, 72.8777)));
    }

    #[test]
    fn test_bounding_box_skipped_at_edges() {
        assert!(bounding_box(c(89.99, 0.0), 50.0).is_none());
        assert!(bounding_box(c(0.0, 179.9), 50.0).is_none());
        assert!(may_be_within(None, c(0.0, 0.0)));
    }
}
