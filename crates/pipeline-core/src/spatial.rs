//! Spherical geometry helpers for route search.

use crate::models::Position;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Length of one degree of arc on the mean sphere, in kilometres.
pub const KM_PER_DEGREE: f64 = 111.195;

/// Calculate distance between two points in kilometres using the Haversine
/// formula.
///
/// # Arguments
/// * `a`, `b` - Points in decimal degrees
///
/// # Returns
/// Great-circle distance in kilometres
pub fn haversine_km(a: Position, b: Position) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of great-circle leg lengths along a polyline.
pub fn path_length_km(path: &[Position]) -> f64 {
    path.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

/// Convert an arc expressed in degrees into kilometres.
pub fn degrees_to_km(degrees: f64) -> f64 {
    degrees * KM_PER_DEGREE
}

/// Initial bearing from `a` towards `b`, in degrees clockwise from north
/// within `[0, 360)`.
pub fn initial_bearing_deg(a: Position, b: Position) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Heading change at `point` when travelling `prev -> point -> next`,
/// in degrees within `[0, 180]`.
///
/// The incoming heading is the bearing on arrival at `point`, so three
/// points on one great circle give zero.
pub fn turn_angle_deg(prev: Position, point: Position, next: Position) -> f64 {
    let incoming = (initial_bearing_deg(point, prev) + 180.0).rem_euclid(360.0);
    let outgoing = initial_bearing_deg(point, next);
    let diff = (outgoing - incoming).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Point at `fraction` of the way along the great circle from `a` to `b`.
///
/// Fractions at or beyond the ends return the exact endpoint.
pub fn intermediate_point(a: Position, b: Position, fraction: f64) -> Position {
    if fraction <= 0.0 {
        return a;
    }
    if fraction >= 1.0 {
        return b;
    }
    let delta = haversine_km(a, b) / EARTH_RADIUS_KM;
    if delta < 1e-12 {
        return a;
    }

    let (phi1, lambda1) = (a.lat.to_radians(), a.lon.to_radians());
    let (phi2, lambda2) = (b.lat.to_radians(), b.lon.to_radians());
    let wa = ((1.0 - fraction) * delta).sin() / delta.sin();
    let wb = (fraction * delta).sin() / delta.sin();

    let x = wa * phi1.cos() * lambda1.cos() + wb * phi2.cos() * lambda2.cos();
    let y = wa * phi1.cos() * lambda1.sin() + wb * phi2.cos() * lambda2.sin();
    let z = wa * phi1.sin() + wb * phi2.sin();

    Position::new(
        z.atan2((x * x + y * y).sqrt()).to_degrees(),
        y.atan2(x).to_degrees(),
    )
}

/// Planar distance in degrees from `point` to the segment `start..end`.
///
/// Terrain features are described with widths and radii in degrees, so
/// proximity tests stay in that unit.
pub fn point_to_segment_deg(point: Position, start: Position, end: Position) -> f64 {
    let px = point.lon - start.lon;
    let py = point.lat - start.lat;
    let sx = end.lon - start.lon;
    let sy = end.lat - start.lat;

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 1e-18 {
        return (px * px + py * py).sqrt();
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * sx;
    let dy = py - t * sy;
    (dx * dx + dy * dy).sqrt()
}

/// Planar distance in degrees between two points.
pub fn degree_distance(a: Position, b: Position) -> f64 {
    ((a.lat - b.lat).powi(2) + (a.lon - b.lon).powi(2)).sqrt()
}
