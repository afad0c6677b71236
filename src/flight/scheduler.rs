//! Frame-driven animation over one flight arc.
//!
//! The scheduler knows nothing about wall-clock time or draw calls. Each call
//! to [`AnimationScheduler::tick`] advances the animation by one frame and
//! returns the instruction the renderer should apply for that frame:
//!
//! ```text
//! Drawing ──(whole path revealed)──> Traversing ──(marker at destination)──> Done
//! ```
//!
//! Speeds are expressed in arc indices per tick, so the number of ticks to
//! completion depends only on the arc length and the configured speeds.

use bevy::log::{debug, trace};

use crate::core::{Coordinate, RouteError};
use crate::flight::arc::{ArcInterpolation, FlightArc};
use crate::flight::bearing::bearing;

/// Validated speeds and resolution for one animated route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    pub steps: u32,
    /// Arc indices revealed per tick while drawing.
    pub draw_speed: f64,
    /// Arc indices travelled per tick by the marker.
    pub marker_speed: f64,
}

impl AnimationConfig {
    pub fn new(steps: u32, draw_speed: f64, marker_speed: f64) -> Result<Self, RouteError> {
        let config = Self {
            steps,
            draw_speed,
            marker_speed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.steps == 0 {
            return Err(RouteError::InvalidSteps(self.steps));
        }
        check_speed("draw_speed", self.draw_speed)?;
        check_speed("marker_speed", self.marker_speed)?;
        Ok(())
    }
}

fn check_speed(name: &'static str, value: f64) -> Result<(), RouteError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RouteError::InvalidSpeed { name, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drawing,
    Traversing,
    Done,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Drawing => "drawing",
            Phase::Traversing => "flying",
            Phase::Done => "arrived",
        }
    }
}

/// Mutable progress of one route animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub phase: Phase,
    /// Index of the last revealed arc point. Never decreases.
    pub reveal: f64,
    /// Fractional arc index of the marker. Never decreases.
    pub traversal: f64,
    /// Heading applied when no new one can be computed.
    pub last_bearing: f64,
}

impl AnimationState {
    fn initial(arc: &FlightArc) -> Self {
        let last_bearing = match arc.points() {
            [first, second, ..] => bearing(first, second),
            _ => 0.0,
        };
        Self {
            phase: Phase::Drawing,
            reveal: 0.0,
            traversal: 0.0,
            last_bearing,
        }
    }
}

/// What the renderer should do for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction {
    /// Draw the path through these points, in order.
    RevealPath(Vec<Coordinate>),
    /// Place the marker at `at`, rotated to `heading_deg` (0 = north).
    PositionMarker { at: Coordinate, heading_deg: f64 },
    /// Final marker placement. No further instructions follow for this route.
    Complete { at: Coordinate, heading_deg: f64 },
}

/// Drives the two-phase animation over a single arc it exclusively owns.
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    arc: FlightArc,
    config: AnimationConfig,
    state: AnimationState,
    ticks: u64,
}

impl AnimationScheduler {
    pub fn new(arc: FlightArc, config: AnimationConfig) -> Result<Self, RouteError> {
        config.validate()?;
        let state = AnimationState::initial(&arc);
        Ok(Self {
            arc,
            config,
            state,
            ticks: 0,
        })
    }

    pub fn arc(&self) -> &FlightArc {
        &self.arc
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_done(&self) -> bool {
        self.state.phase == Phase::Done
    }

    /// Ticks processed so far, including the one that reached `Done`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of arc points currently revealed.
    pub fn revealed_len(&self) -> usize {
        match self.state.phase {
            Phase::Drawing if self.ticks == 0 => 0,
            Phase::Drawing => (self.state.reveal.floor() as usize + 1).min(self.arc.len()),
            Phase::Traversing | Phase::Done => self.arc.len(),
        }
    }

    /// Rewind to the start of the drawing phase over the same arc.
    pub fn reset(&mut self) {
        self.state = AnimationState::initial(&self.arc);
        self.ticks = 0;
    }

    /// Advance one frame. Returns `None` once the animation is done.
    pub fn tick(&mut self) -> Option<RenderInstruction> {
        if self.is_done() {
            return None;
        }
        self.ticks += 1;

        if self.is_degenerate() {
            return Some(self.finish_degenerate());
        }

        let instruction = match self.state.phase {
            Phase::Drawing => self.tick_drawing(),
            Phase::Traversing => self.tick_traversing(),
            Phase::Done => return None,
        };
        trace!(
            "tick {} phase={:?} reveal={:.2} traversal={:.2}",
            self.ticks, self.state.phase, self.state.reveal, self.state.traversal
        );
        Some(instruction)
    }

    fn last_index(&self) -> usize {
        self.arc.len() - 1
    }

    fn is_degenerate(&self) -> bool {
        match self.arc.points() {
            [first, .., last] => first == last,
            _ => true,
        }
    }

    fn finish_degenerate(&mut self) -> RenderInstruction {
        // An empty arc has no point to show at all
        let at = self
            .arc
            .last()
            .copied()
            .unwrap_or(Coordinate::NULL_ISLAND);
        debug!(
            "degenerate arc with {} point(s), completing immediately",
            self.arc.len()
        );
        self.state.reveal = self.arc.steps() as f64;
        self.state.traversal = self.arc.steps() as f64;
        self.state.phase = Phase::Done;
        RenderInstruction::Complete {
            at,
            heading_deg: self.state.last_bearing,
        }
    }

    fn tick_drawing(&mut self) -> RenderInstruction {
        let last = self.last_index() as f64;
        self.state.reveal = (self.state.reveal + self.config.draw_speed).min(last);

        if self.state.reveal >= last {
            self.state.reveal = last;
            self.state.phase = Phase::Traversing;
            debug!(
                "path fully revealed after {} tick(s), starting traversal",
                self.ticks
            );
            return RenderInstruction::RevealPath(self.arc.points().to_vec());
        }

        let upto = self.state.reveal.floor() as usize;
        RenderInstruction::RevealPath(self.arc.points()[..=upto].to_vec())
    }

    fn tick_traversing(&mut self) -> RenderInstruction {
        let last = self.last_index();
        self.state.traversal += self.config.marker_speed;

        if self.state.traversal >= last as f64 {
            self.state.traversal = last as f64;
            self.state.phase = Phase::Done;
            debug!("marker reached destination after {} tick(s)", self.ticks);
            return RenderInstruction::Complete {
                at: self.arc.points()[last],
                heading_deg: self.state.last_bearing,
            };
        }

        let idx = (self.state.traversal.floor() as usize).min(last);
        let frac = self.state.traversal - idx as f64;
        let next = (idx + 1).min(last);
        let points = self.arc.points();
        let at = match self.arc.interpolation() {
            ArcInterpolation::Linear => points[idx].lerp(&points[next], frac),
            // great-circle samples may straddle the antimeridian
            ArcInterpolation::GreatCircle => points[idx].lerp_wrapped(&points[next], frac),
        };

        if next > idx && points[idx] != points[next] {
            self.state.last_bearing = bearing(&points[idx], &points[next]);
        }

        RenderInstruction::PositionMarker {
            at,
            heading_deg: self.state.last_bearing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miami() -> Coordinate {
        Coordinate::new(-80.19, 25.76).unwrap()
    }

    fn bogota() -> Coordinate {
        Coordinate::new(-74.07, 4.71).unwrap()
    }

    fn scheduler(steps: u32, draw: f64, marker: f64) -> AnimationScheduler {
        let arc = FlightArc::build(miami(), bogota(), steps).unwrap();
        AnimationScheduler::new(arc, AnimationConfig::new(steps, draw, marker).unwrap()).unwrap()
    }

    fn run_to_end(s: &mut AnimationScheduler) -> Vec<RenderInstruction> {
        let mut out = Vec::new();
        // generous bound so a regression can't hang the test
        for _ in 0..100_000 {
            match s.tick() {
                Some(i) => out.push(i),
                None => break,
            }
        }
        out
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert_eq!(
            AnimationConfig::new(0, 1.0, 1.0),
            Err(RouteError::InvalidSteps(0))
        );
        assert!(matches!(
            AnimationConfig::new(4, 0.0, 1.0),
            Err(RouteError::InvalidSpeed {
                name: "draw_speed",
                ..
            })
        ));
        assert!(matches!(
            AnimationConfig::new(4, 1.0, -2.0),
            Err(RouteError::InvalidSpeed {
                name: "marker_speed",
                ..
            })
        ));
        assert!(AnimationConfig::new(4, f64::NAN, 1.0).is_err());
        assert!(AnimationConfig::new(4, 1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_new_rejects_unvalidated_config() {
        let arc = FlightArc::build(miami(), bogota(), 4).unwrap();
        let config = AnimationConfig {
            steps: 4,
            draw_speed: 0.0,
            marker_speed: 1.0,
        };
        assert!(AnimationScheduler::new(arc, config).is_err());
    }

    #[test]
    fn test_miami_bogota_example() {
        let mut s = scheduler(4, 2.0, 2.0);
        let arc = s.arc().clone();
        assert_eq!(arc.len(), 5);

        // tick 1: points 0..=2
        match s.tick() {
            Some(RenderInstruction::RevealPath(points)) => {
                assert_eq!(points, arc.points()[..=2].to_vec())
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.phase(), Phase::Drawing);

        // tick 2: everything, then traversal
        match s.tick() {
            Some(RenderInstruction::RevealPath(points)) => assert_eq!(points.len(), 5),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.phase(), Phase::Traversing);

        // tick 3: marker at index 2 heading toward index 3
        match s.tick() {
            Some(RenderInstruction::PositionMarker { at, heading_deg }) => {
                assert!(at.approx_eq(&arc.points()[2], 1e-9));
                let expected = bearing(&arc.points()[2], &arc.points()[3]);
                assert!((heading_deg - expected).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }

        // tick 4: snapped to Bogotá
        match s.tick() {
            Some(RenderInstruction::Complete { at, heading_deg }) => {
                assert_eq!(at, bogota());
                let expected = bearing(&arc.points()[2], &arc.points()[3]);
                assert!((heading_deg - expected).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(s.is_done());
        assert_eq!(s.tick(), None);
        assert_eq!(s.ticks(), 4);
    }

    #[test]
    fn test_termination_tick_count() {
        let cases = [
            (4, 2.0, 2.0),
            (240, 6.0, 1.25),
            (200, 4.0, 1.5),
            (10, 1.0, 0.25),
            (7, 3.0, 100.0),
            (1, 1.0, 1.0),
            (33, 2.5, 0.75),
        ];
        for (steps, draw, marker) in cases {
            let mut s = scheduler(steps, draw, marker);
            let instructions = run_to_end(&mut s);
            let len = steps as f64 + 1.0;
            let bound = (len / draw).ceil() + ((len - 1.0) / marker).ceil();
            let n = instructions.len() as f64;
            assert!(
                (n - bound).abs() <= 1.0,
                "steps={} draw={} marker={} ticks={} bound={}",
                steps,
                draw,
                marker,
                n,
                bound
            );
            assert!(s.is_done());
        }
    }

    #[test]
    fn test_termination_exact_for_fractional_draw_speed() {
        for (steps, draw, marker, expected) in [(4, 0.25, 1.0, 20), (10, 0.75, 0.5, 34)] {
            let mut s = scheduler(steps, draw, marker);
            let instructions = run_to_end(&mut s);
            let last = steps as f64;
            let formula = (last / draw).ceil() + (last / marker).ceil();
            assert_eq!(formula as usize, expected);
            assert_eq!(instructions.len(), expected, "steps={} draw={}", steps, draw);
            assert!(s.is_done());
        }
    }

    #[test]
    fn test_marker_crosses_antimeridian_the_short_way() {
        let origin = Coordinate::new(170.0, 10.0).unwrap();
        let destination = Coordinate::new(-170.0, 10.0).unwrap();
        let arc = FlightArc::build_great_circle(origin, destination, 3).unwrap();
        let mut s =
            AnimationScheduler::new(arc, AnimationConfig::new(3, 100.0, 1.5).unwrap()).unwrap();

        assert!(matches!(s.tick(), Some(RenderInstruction::RevealPath(p)) if p.len() == 4));
        match s.tick() {
            Some(RenderInstruction::PositionMarker { at, heading_deg }) => {
                // halfway between the samples either side of 180
                assert!(at.lon().abs() > 179.0, "marker at lon {}", at.lon());
                assert!(at.lat() > 10.0);
                assert!((heading_deg - 90.0).abs() < 10.0);
            }
            other => panic!("expected a marker, got {:?}", other),
        }

        let mut longitudes = Vec::new();
        let mut s = AnimationScheduler::new(
            FlightArc::build_great_circle(origin, destination, 3).unwrap(),
            AnimationConfig::new(3, 100.0, 0.2).unwrap(),
        )
        .unwrap();
        for instruction in run_to_end(&mut s) {
            if let RenderInstruction::PositionMarker { at, .. } = instruction {
                longitudes.push(at.lon());
            }
        }
        assert!(!longitudes.is_empty());
        assert!(longitudes.iter().all(|lon| lon.abs() >= 170.0 - 1e-9));
    }

    #[test]
    fn test_reveal_is_monotonic_and_bounded() {
        let mut s = scheduler(50, 1.75, 1.0);
        let mut previous = 0;
        while s.phase() == Phase::Drawing {
            match s.tick() {
                Some(RenderInstruction::RevealPath(points)) => {
                    assert!(points.len() >= previous);
                    assert!(points.len() <= s.arc().len());
                    assert_eq!(points[0], miami());
                    assert_eq!(points.len(), s.revealed_len());
                    previous = points.len();
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(previous, 51);
    }

    #[test]
    fn test_traversal_is_monotonic() {
        let mut s = scheduler(30, 10.0, 0.7);
        let mut last_traversal = 0.0;
        while s.tick().is_some() {
            assert!(s.state().traversal >= last_traversal);
            assert!(s.state().traversal <= 30.0);
            assert!(s.state().reveal <= 30.0);
            last_traversal = s.state().traversal;
        }
    }

    #[test]
    fn test_final_instruction_is_destination() {
        for interpolation in [ArcInterpolation::Linear, ArcInterpolation::GreatCircle] {
            let arc = FlightArc::build_with(miami(), bogota(), 37, interpolation).unwrap();
            let mut s =
                AnimationScheduler::new(arc, AnimationConfig::new(37, 3.0, 1.3).unwrap()).unwrap();
            let instructions = run_to_end(&mut s);
            match instructions.last() {
                Some(RenderInstruction::Complete { at, .. }) => assert_eq!(*at, bogota()),
                other => panic!("unexpected {:?}", other),
            }
            let completes = instructions
                .iter()
                .filter(|i| matches!(i, RenderInstruction::Complete { .. }))
                .count();
            assert_eq!(completes, 1);
        }
    }

    #[test]
    fn test_marker_positions_stay_on_arc_segment() {
        let mut s = scheduler(8, 100.0, 0.5);
        s.tick();
        while let Some(instruction) = s.tick() {
            if let RenderInstruction::PositionMarker { at, heading_deg } = instruction {
                assert!(heading_deg.is_finite());
                // linear arc: every marker position is on the straight lon/lat line
                let t = (at.lon() - miami().lon()) / (bogota().lon() - miami().lon());
                let expected = miami().lerp(&bogota(), t);
                assert!(at.approx_eq(&expected, 1e-9));
            }
        }
    }

    #[test]
    fn test_empty_arc_short_circuits() {
        let arc = FlightArc::from_points(Vec::new());
        let mut s =
            AnimationScheduler::new(arc, AnimationConfig::new(1, 1.0, 1.0).unwrap()).unwrap();
        match s.tick() {
            Some(RenderInstruction::Complete { at, heading_deg }) => {
                assert_eq!(at, Coordinate::NULL_ISLAND);
                assert_eq!(heading_deg, 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(s.is_done());
        assert_eq!(s.tick(), None);
    }

    #[test]
    fn test_single_point_arc_short_circuits() {
        let arc = FlightArc::from_points(vec![bogota()]);
        let mut s =
            AnimationScheduler::new(arc, AnimationConfig::new(1, 1.0, 1.0).unwrap()).unwrap();
        assert_eq!(
            s.tick(),
            Some(RenderInstruction::Complete {
                at: bogota(),
                heading_deg: 0.0
            })
        );
        assert_eq!(s.tick(), None);
    }

    #[test]
    fn test_same_origin_and_destination_short_circuits() {
        let arc = FlightArc::build(miami(), miami(), 10).unwrap();
        let mut s =
            AnimationScheduler::new(arc, AnimationConfig::new(10, 2.0, 2.0).unwrap()).unwrap();
        let instructions = run_to_end(&mut s);
        assert_eq!(
            instructions,
            vec![RenderInstruction::Complete {
                at: miami(),
                heading_deg: 0.0
            }]
        );
    }

    #[test]
    fn test_fast_marker_keeps_initial_heading() {
        // marker covers the whole arc in one tick, heading comes from the first segment
        let mut s = scheduler(5, 10.0, 50.0);
        let initial = bearing(&s.arc().points()[0], &s.arc().points()[1]);
        let instructions = run_to_end(&mut s);
        assert_eq!(instructions.len(), 2);
        match &instructions[1] {
            RenderInstruction::Complete { heading_deg, .. } => {
                assert!((heading_deg - initial).abs() < 1e-9)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut s = scheduler(12, 2.5, 1.5);
        let first = run_to_end(&mut s);
        s.reset();
        assert_eq!(s.phase(), Phase::Drawing);
        assert_eq!(s.revealed_len(), 0);
        let second = run_to_end(&mut s);
        assert_eq!(first, second);
    }
}
