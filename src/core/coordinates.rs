//! Core coordinate utilities
//!
//! Geographic coordinates (longitude, latitude in degrees) and the helpers the
//! arc builder, bearing calculator and both renderers share:
//! - validated construction and linear interpolation
//! - great-circle distance on a spherical Earth
//! - placement on the globe in Bevy world coordinates (y up, km)

use bevy::math::{DVec3, Vec3};

use crate::core::error::RouteError;

pub const EARTH_RADIUS_KM: f32 = 6371.0;

/// A geographic position in degrees. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

impl Coordinate {
    /// (0, 0), used only when there is no point to fall back on.
    pub const NULL_ISLAND: Coordinate = Coordinate { lon: 0.0, lat: 0.0 };

    /// Validated constructor. Rejects non-finite values, longitude outside
    /// [-180, 180] and latitude outside [-90, 90].
    pub fn new(lon: f64, lat: f64) -> Result<Self, RouteError> {
        if !lon.is_finite()
            || !lat.is_finite()
            || !(-180.0..=180.0).contains(&lon)
            || !(-90.0..=90.0).contains(&lat)
        {
            return Err(RouteError::InvalidCoordinate { lon, lat });
        }
        Ok(Self { lon, lat })
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Component-wise linear interpolation. `t` is clamped to [0, 1] so the
    /// result stays a valid coordinate.
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Linear interpolation along the shorter way around in longitude, so
    /// 170 -> -170 passes through 180 rather than 0. The result is wrapped
    /// back into [-180, 180]. `t` is clamped to [0, 1].
    pub fn lerp_wrapped(&self, other: &Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lon: wrap_longitude(self.lon + longitude_delta(self.lon, other.lon) * t),
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Equality within `tolerance` degrees on both components.
    pub fn approx_eq(&self, other: &Coordinate, tolerance: f64) -> bool {
        (self.lon - other.lon).abs() <= tolerance && (self.lat - other.lat).abs() <= tolerance
    }

    /// Unit vector in an Earth-centred frame (x toward lon 0, z toward the
    /// north pole). Used for spherical interpolation.
    pub fn to_unit_vector(&self) -> DVec3 {
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.lon.to_radians().sin_cos();
        DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Inverse of [`Coordinate::to_unit_vector`]. The vector does not need to
    /// be normalized but must not be zero.
    pub(crate) fn from_unit_vector(v: DVec3) -> Coordinate {
        let lat = v.z.atan2((v.x * v.x + v.y * v.y).sqrt()).to_degrees();
        let lon = v.y.atan2(v.x).to_degrees();
        Coordinate {
            lon: lon.clamp(-180.0, 180.0),
            lat: lat.clamp(-90.0, 90.0),
        }
    }

    /// Point on the globe in Bevy world space, `altitude` is a fraction of the
    /// Earth radius added above the surface.
    pub fn to_globe(&self, altitude: f64) -> Vec3 {
        // note: bevy coords where y is up
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        let y = lat.sin();
        let mut r = lat.cos();
        // Clamp residual radius near the poles to avoid f32 artifacts
        if (std::f64::consts::FRAC_PI_2 - lat.abs()).abs() < 1e-7 {
            r = 0.0;
        }
        let x = lon.sin() * r;
        let z = lon.cos() * r;
        let radius = EARTH_RADIUS_KM as f64 * (1.0 + altitude);
        Vec3::new((x * radius) as f32, (y * radius) as f32, (z * radius) as f32)
    }
}

/// Haversine great-circle distance in kilometers.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM as f64 * h.sqrt().min(1.0).asin()
}

/// Signed longitude change from `from` to `to` the shorter way around, in
/// [-180, 180).
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    (to - from + 540.0).rem_euclid(360.0) - 180.0
}

/// Wrap any longitude into [-180, 180]. 180 itself is kept.
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}
