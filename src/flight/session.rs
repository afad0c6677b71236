//! Route lifecycle: one active scheduler per view, replaced atomically.
//!
//! Every successful [`FlightAnimator::start`] issues a [`TickHandle`] tagged
//! with a generation number. Stopping or replacing the route bumps the
//! generation, so a frame callback scheduled for the old route that fires late
//! is recognised as stale and ignored.

use bevy::log::debug;
use bevy::prelude::Component;

use crate::core::{Coordinate, RouteError};
use crate::flight::arc::{ArcInterpolation, FlightArc};
use crate::flight::scheduler::{AnimationConfig, AnimationScheduler, Phase, RenderInstruction};

/// Everything needed to animate one route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub steps: u32,
    pub draw_speed: f64,
    pub marker_speed: f64,
    pub interpolation: ArcInterpolation,
}

impl RouteRequest {
    pub fn config(&self) -> Result<AnimationConfig, RouteError> {
        AnimationConfig::new(self.steps, self.draw_speed, self.marker_speed)
    }

    pub fn build_arc(&self) -> Result<FlightArc, RouteError> {
        FlightArc::build_with(self.origin, self.destination, self.steps, self.interpolation)
    }
}

/// Permission to tick one specific route activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle {
    generation: u64,
}

impl TickHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct ActiveRoute {
    handle: TickHandle,
    request: RouteRequest,
    scheduler: AnimationScheduler,
}

/// Host-facing controller owning at most one route animation.
#[derive(Component, Debug, Default)]
pub struct FlightAnimator {
    generation: u64,
    active: Option<ActiveRoute>,
}

impl FlightAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down any current route, then build and activate `route`.
    ///
    /// On error the animator is left stopped.
    pub fn start(&mut self, route: &RouteRequest) -> Result<TickHandle, RouteError> {
        self.stop();

        let config = route.config()?;
        let arc = route.build_arc()?;
        let scheduler = AnimationScheduler::new(arc, config)?;

        self.generation += 1;
        let handle = TickHandle {
            generation: self.generation,
        };
        self.active = Some(ActiveRoute {
            handle,
            request: *route,
            scheduler,
        });
        Ok(handle)
    }

    /// Halt the current route. Every handle issued so far becomes stale.
    pub fn stop(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!(
                "stopping route generation {} after {} tick(s)",
                previous.handle.generation,
                previous.scheduler.ticks()
            );
        }
        self.generation += 1;
    }

    /// Replace the current route with `route`.
    pub fn on_route_changed(&mut self, route: &RouteRequest) -> Result<TickHandle, RouteError> {
        self.start(route)
    }

    /// Replay the current route from the beginning under a fresh handle.
    pub fn restart(&mut self) -> Option<TickHandle> {
        let active = self.active.as_mut()?;
        self.generation += 1;
        active.handle = TickHandle {
            generation: self.generation,
        };
        active.scheduler.reset();
        debug!("replaying route as generation {}", self.generation);
        Some(active.handle)
    }

    /// Advance the route `handle` was issued for. Stale handles are a no-op.
    pub fn tick(&mut self, handle: TickHandle) -> Option<RenderInstruction> {
        let active = self.active.as_mut()?;
        if active.handle != handle {
            debug!(
                "ignoring stale tick for generation {} (current {})",
                handle.generation, active.handle.generation
            );
            return None;
        }
        active.scheduler.tick()
    }

    /// Advance whatever route is currently active.
    pub fn tick_active(&mut self) -> Option<RenderInstruction> {
        let handle = self.current_handle()?;
        self.tick(handle)
    }

    pub fn current_handle(&self) -> Option<TickHandle> {
        self.active.as_ref().map(|a| a.handle)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.active.as_ref().map(|a| a.scheduler.phase())
    }

    pub fn request(&self) -> Option<&RouteRequest> {
        self.active.as_ref().map(|a| &a.request)
    }

    pub fn scheduler(&self) -> Option<&AnimationScheduler> {
        self.active.as_ref().map(|a| &a.scheduler)
    }
}

/// Draw-side adapter a visual backend implements.
pub trait RouteRenderer {
    fn reveal_path(&mut self, points: &[Coordinate]);
    fn position_marker(&mut self, at: Coordinate, heading_deg: f64);
    fn complete(&mut self, at: Coordinate, heading_deg: f64);
    fn clear(&mut self);

    fn apply(&mut self, instruction: &RenderInstruction) {
        match instruction {
            RenderInstruction::RevealPath(points) => self.reveal_path(points),
            RenderInstruction::PositionMarker { at, heading_deg } => {
                self.position_marker(*at, *heading_deg)
            }
            RenderInstruction::Complete { at, heading_deg } => self.complete(*at, *heading_deg),
        }
    }
}
