//! Spherical geodesy helpers for route synthesis and path analysis.
//!
//! All functions work on a sphere of radius [`EARTH_RADIUS_KM`]. Longitudes
//! produced by [`destination`] are normalized to `[-180, 180)`; paths that
//! cross the antimeridian are not otherwise unwrapped.

use crate::models::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance between two points in meters.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Forward azimuth from `a` to `b` in degrees, normalized to `[0, 360)`.
/// 0 = north, 90 = east.
pub fn initial_bearing(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Point reached by travelling `distance_km` from `origin` along the great
/// circle with initial bearing `bearing_deg`.
pub fn destination(origin: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    if distance_km.abs() <= f64::EPSILON {
        return origin;
    }

    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular_distance = distance_km / EARTH_RADIUS_KM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing.cos();
    // Clamp guards asin against rounding just past the poles.
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Normalize any angle in degrees to `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn angular_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = (a_deg - b_deg).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Sum of great-circle distances along `points`, optionally closing the ring.
pub fn path_length_km(points: &[GeoPoint], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total: f64 = points
        .windows(2)
        .map(|pair| distance_km(pair[0], pair[1]))
        .sum();
    if closed {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            total += distance_km(*last, *first);
        }
    }
    total
}

// ==== Local metric projection ====
// Converts degree offsets to meters around a reference latitude.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Minimum distance in meters from `point` to the segment `start`-`end`.
///
/// Projects into a local east/north plane anchored at `start`, which is
/// accurate for the short segments of a decoded road shape.
pub fn distance_to_segment_m(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    let m_lat = meters_per_deg_lat(start.lat);
    let m_lon = meters_per_deg_lon(start.lat);

    let px = (point.lon - start.lon) * m_lon;
    let py = (point.lat - start.lat) * m_lat;
    let sx = (end.lon - start.lon) * m_lon;
    let sy = (end.lat - start.lat) * m_lat;

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * sx;
    let dy = py - t * sy;
    (dx * dx + dy * dy).sqrt()
}

/// True when segment `a1`-`a2` touches or crosses segment `b1`-`b2`.
///
/// Tested in the local east/north plane anchored at `a1`.
pub fn segments_cross(a1: GeoPoint, a2: GeoPoint, b1: GeoPoint, b2: GeoPoint) -> bool {
    // Square meters; absorbs projection and rounding noise only.
    const EPS: f64 = 1e-6;

    fn orient(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> f64 {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    }

    fn on_segment(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> bool {
        r.0 >= p.0.min(q.0) - EPS
            && r.0 <= p.0.max(q.0) + EPS
            && r.1 >= p.1.min(q.1) - EPS
            && r.1 <= p.1.max(q.1) + EPS
    }

    let m_lat = meters_per_deg_lat(a1.lat);
    let m_lon = meters_per_deg_lon(a1.lat);
    let local = |p: GeoPoint| ((p.lon - a1.lon) * m_lon, (p.lat - a1.lat) * m_lat);
    let (p1, p2, q1, q2) = (local(a1), local(a2), local(b1), local(b2));

    let o1 = orient(p1, p2, q1);
    let o2 = orient(p1, p2, q2);
    let o3 = orient(q1, q2, p1);
    let o4 = orient(q1, q2, p2);

    let straddles = |x: f64, y: f64| (x > EPS && y < -EPS) || (x < -EPS && y > EPS);
    if straddles(o1, o2) && straddles(o3, o4) {
        return true;
    }

    (o1.abs() <= EPS && on_segment(p1, p2, q1))
        || (o2.abs() <= EPS && on_segment(p1, p2, q2))
        || (o3.abs() <= EPS && on_segment(q1, q2, p1))
        || (o4.abs() <= EPS && on_segment(q1, q2, p2))
}

/// Linear interpolation between two points by fraction `t` in `[0, 1]`.
pub fn lerp(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(45.4642, 9.19);
        assert!(distance_km(p, p) < 1e-9);
    }

    #[test]
    fn bearings_of_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((initial_bearing(origin, GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing(origin, GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_destination_is_origin() {
        let origin = GeoPoint::new(45.0, 9.0);
        for bearing in [0.0, 45.0, 133.7, 270.0, 359.9] {
            let p = destination(origin, 0.0, bearing);
            assert!((p.lat - origin.lat).abs() < 1e-12);
            assert!((p.lon - origin.lon).abs() < 1e-12);
        }
    }

    #[test]
    fn destination_agrees_with_distance_and_bearing() {
        let origin = GeoPoint::new(45.4642, 9.19);
        let target = destination(origin, 25.0, 60.0);
        assert!((distance_km(origin, target) - 25.0).abs() < 1e-6);
        assert!((initial_bearing(origin, target) - 60.0).abs() < 1e-6);
    }

    #[test]
    fn destination_near_pole_stays_finite() {
        let origin = GeoPoint::new(89.9999, 10.0);
        let p = destination(origin, 50.0, 0.0);
        assert!(p.lat.is_finite() && p.lon.is_finite());
        assert!(p.lat <= 90.0);
    }

    #[test]
    fn destination_across_antimeridian_wraps_longitude() {
        let p = destination(GeoPoint::new(0.0, 179.9), 50.0, 90.0);
        assert!(p.lon < -179.0 && p.lon >= -180.0, "got {}", p.lon);
    }

    #[test]
    fn angular_difference_is_circular() {
        assert!((angular_difference(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((angular_difference(10.0, 350.0) - 20.0).abs() < 1e-9);
        assert!((angular_difference(0.0, 180.0) - 180.0).abs() < 1e-9);
        assert!((angular_difference(-40.0, 320.0)).abs() < 1e-9);
    }

    #[test]
    fn segment_distance_of_point_beside_segment() {
        let start = GeoPoint::new(45.0, 9.0);
        let end = GeoPoint::new(45.0, 9.01);
        let beside = GeoPoint::new(45.0 + 100.0 / meters_per_deg_lat(45.0), 9.005);
        let d = distance_to_segment_m(beside, start, end);
        assert!((d - 100.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn crossing_and_parallel_segments() {
        let sw = GeoPoint::new(45.0, 9.0);
        let ne = GeoPoint::new(45.01, 9.01);
        let nw = GeoPoint::new(45.01, 9.0);
        let se = GeoPoint::new(45.0, 9.01);
        assert!(segments_cross(sw, ne, nw, se));

        let north_of = GeoPoint::new(45.02, 9.0);
        let north_east_of = GeoPoint::new(45.03, 9.01);
        assert!(!segments_cross(sw, ne, north_of, north_east_of));

        // Shared endpoint counts as touching.
        assert!(segments_cross(sw, ne, ne, se));
    }
}
