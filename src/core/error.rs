use thiserror::Error;

/// Configuration errors raised before a route animation can start.
///
/// Degenerate geometry (origin equal to destination, arcs with fewer than two
/// points) is not an error; the scheduler resolves it on its first tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("invalid coordinate: lon = {lon}, lat = {lat}")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("step count must be at least 1, got {0}")]
    InvalidSteps(u32),

    #[error("{name} must be positive and finite, got {value}")]
    InvalidSpeed { name: &'static str, value: f64 },

    #[error("antipodal endpoints have no unique great circle")]
    AntipodalEndpoints,
}
