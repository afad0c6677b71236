//! Arc builder: the ordered, interpolated path between two coordinates.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::{Coordinate, RouteError};

/// Peak altitude of the arc as a fraction of the globe radius.
pub const DEFAULT_MAX_ALTITUDE: f64 = 0.35;

/// How intermediate arc points are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcInterpolation {
    /// Component-wise lerp of longitude and latitude.
    #[default]
    Linear,
    /// Equal-distance samples along the great circle through both endpoints.
    GreatCircle,
}

impl ArcInterpolation {
    pub fn toggled(self) -> Self {
        match self {
            ArcInterpolation::Linear => ArcInterpolation::GreatCircle,
            ArcInterpolation::GreatCircle => ArcInterpolation::Linear,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArcInterpolation::Linear => "linear",
            ArcInterpolation::GreatCircle => "great circle",
        }
    }
}

/// Two consecutive arc points with their relative position and altitude hint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Coordinate,
    pub end: Coordinate,
    /// Relative position of `end` along the arc, in (0, 1].
    pub t: f64,
    pub altitude: f64,
}

/// `sin(π·t)·max_altitude`: zero at both ends, peak at the midpoint.
pub fn altitude(t: f64, max_altitude: f64) -> f64 {
    (PI * t.clamp(0.0, 1.0)).sin() * max_altitude
}

/// Ordered interpolated path. `points[0]` is the origin and the last point is
/// the destination; index `i` sits at `t = i / steps`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightArc {
    points: Vec<Coordinate>,
    interpolation: ArcInterpolation,
}

impl FlightArc {
    /// Linear arc with `steps + 1` points.
    pub fn build(
        origin: Coordinate,
        destination: Coordinate,
        steps: u32,
    ) -> Result<Self, RouteError> {
        Self::build_with(origin, destination, steps, ArcInterpolation::Linear)
    }

    /// Great-circle arc with `steps + 1` points spaced at equal distance.
    pub fn build_great_circle(
        origin: Coordinate,
        destination: Coordinate,
        steps: u32,
    ) -> Result<Self, RouteError> {
        Self::build_with(origin, destination, steps, ArcInterpolation::GreatCircle)
    }

    pub fn build_with(
        origin: Coordinate,
        destination: Coordinate,
        steps: u32,
        interpolation: ArcInterpolation,
    ) -> Result<Self, RouteError> {
        if steps == 0 {
            return Err(RouteError::InvalidSteps(steps));
        }

        let mut points = match interpolation {
            ArcInterpolation::Linear => (0..=steps)
                .map(|i| origin.lerp(&destination, i as f64 / steps as f64))
                .collect::<Vec<_>>(),
            ArcInterpolation::GreatCircle => great_circle_points(&origin, &destination, steps)?,
        };

        // Pin the endpoints so they match the inputs exactly
        points[0] = origin;
        points[steps as usize] = destination;

        Ok(Self {
            points,
            interpolation,
        })
    }

    /// Wrap an arbitrary point list. Used for arcs that did not come from the
    /// builder, including degenerate ones with fewer than two points.
    pub fn from_points(points: Vec<Coordinate>) -> Self {
        Self {
            points,
            interpolation: ArcInterpolation::Linear,
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn steps(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn interpolation(&self) -> ArcInterpolation {
        self.interpolation
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.points.last()
    }

    /// Parametrization of index `i`: `i / steps`, 0 for arcs without steps.
    pub fn t_at(&self, index: usize) -> f64 {
        let steps = self.steps();
        if steps == 0 {
            return 0.0;
        }
        index.min(steps) as f64 / steps as f64
    }

    /// Elevation hint for index `i` (3-D renderers).
    pub fn altitude_at(&self, index: usize, max_altitude: f64) -> f64 {
        altitude(self.t_at(index), max_altitude)
    }

    /// Elevation hint at a fractional index, used for a marker between points.
    pub fn altitude_at_fraction(&self, cursor: f64, max_altitude: f64) -> f64 {
        let steps = self.steps();
        if steps == 0 {
            return 0.0;
        }
        altitude(cursor / steps as f64, max_altitude)
    }

    pub fn segments(&self, max_altitude: f64) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).enumerate().map(move |(i, pair)| {
            let t = self.t_at(i + 1);
            Segment {
                start: pair[0],
                end: pair[1],
                t,
                altitude: altitude(t, max_altitude),
            }
        })
    }
}

fn great_circle_points(
    origin: &Coordinate,
    destination: &Coordinate,
    steps: u32,
) -> Result<Vec<Coordinate>, RouteError> {
    let a = origin.to_unit_vector();
    let b = destination.to_unit_vector();
    let cross = a.cross(b).length();
    let omega = cross.atan2(a.dot(b));

    if omega < 1e-12 {
        return Ok(vec![*origin; steps as usize + 1]);
    }
    let sin_omega = omega.sin();
    if sin_omega < 1e-9 {
        return Err(RouteError::AntipodalEndpoints);
    }

    Ok((0..=steps)
        .map(|i| {
            let f = i as f64 / steps as f64;
            let wa = ((1.0 - f) * omega).sin() / sin_omega;
            let wb = (f * omega).sin() / sin_omega;
            Coordinate::from_unit_vector(a * wa + b * wb)
        })
        .collect())
}
