//! Compass headings between coordinates on a spherical Earth.

use crate::core::Coordinate;

/// Initial bearing (forward azimuth) from `from` to `to` in degrees,
/// normalized to [0, 360). 0 is north, 90 is east.
///
/// Coincident points have no defined heading and return 0.0; callers keep
/// their last known bearing in that case.
pub fn bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let lat1 = from.lat().to_radians();
    let lat2 = to.lat().to_radians();
    let delta_lon = (to.lon() - from.lon()).to_radians();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(x.atan2(y).to_degrees())
}

/// Heading on arrival at `to` when travelling the great circle from `from`.
pub fn final_bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }
    normalize_degrees(bearing(to, from) + 180.0)
}

/// Wrap any finite angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Smallest absolute difference between two headings, in [0, 180].
pub fn heading_difference(a: f64, b: f64) -> f64 {
    let d = normalize_degrees(a - b);
    if d > 180.0 { 360.0 - d } else { d }
}
