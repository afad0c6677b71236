//! Shared geographic types and engine errors

pub mod coordinates;
pub mod error;

pub use coordinates::{Coordinate, EARTH_RADIUS_KM, distance_km, longitude_delta, wrap_longitude};
pub use error::RouteError;
