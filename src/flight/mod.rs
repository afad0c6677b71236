//! Flight route animation
//!
//! The engine (arc builder, bearing calculator, scheduler) is plain Rust and
//! knows nothing about Bevy. [`FlightPlugin`] hosts one [`FlightAnimator`] per
//! view entity, restarts them when the selected route changes and ticks them
//! once per frame into a [`RouteTrace`] that the draw systems read.

use bevy::prelude::*;

pub mod arc;
pub mod bearing;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use arc::ArcInterpolation;
pub use scheduler::{Phase, RenderInstruction};
pub use session::{FlightAnimator, RouteRenderer, RouteRequest};
pub use settings::FlightSettings;

use crate::cities::{self, City};
use crate::core::{Coordinate, distance_km};

/// Plugin for route selection and per-frame animation
pub struct FlightPlugin;

impl Plugin for FlightPlugin {
    fn build(&self, app: &mut App) {
        let settings = FlightSettings::load_or_default();
        let selection = SelectedRoute::with_defaults(settings.interpolation);

        app.insert_resource(settings)
            .insert_resource(selection)
            .add_systems(Startup, spawn_route_views)
            .add_systems(Update, (sync_route_selection, tick_routes).chain());
    }
}

/// Which renderer a route entity feeds
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteView {
    Globe,
    Map,
}

impl RouteView {
    pub fn label(self) -> &'static str {
        match self {
            RouteView::Globe => "globe",
            RouteView::Map => "map",
        }
    }
}

/// Origin and destination picked by the user, as catalog indices
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SelectedRoute {
    pub origin: Option<usize>,
    pub destination: Option<usize>,
    pub interpolation: ArcInterpolation,
}

impl SelectedRoute {
    pub fn with_defaults(interpolation: ArcInterpolation) -> Self {
        Self {
            origin: cities::find(cities::DEFAULT_ORIGIN),
            destination: cities::find(cities::DEFAULT_DESTINATION),
            interpolation,
        }
    }

    /// Both endpoints when they are set and name different places
    pub fn endpoints(&self) -> Option<(&'static City, &'static City)> {
        let origin = cities::get(self.origin?)?;
        let destination = cities::get(self.destination?)?;
        if cities::same_place(origin, destination) {
            return None;
        }
        Some((origin, destination))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPose {
    pub at: Coordinate,
    pub heading_deg: f64,
}

/// What a view should currently draw
#[derive(Component, Debug, Default)]
pub struct RouteTrace {
    pub path: Vec<Coordinate>,
    pub marker: Option<MarkerPose>,
    pub completed: bool,
}

impl RouteRenderer for RouteTrace {
    fn reveal_path(&mut self, points: &[Coordinate]) {
        self.path.clear();
        self.path.extend_from_slice(points);
    }

    fn position_marker(&mut self, at: Coordinate, heading_deg: f64) {
        self.marker = Some(MarkerPose { at, heading_deg });
    }

    fn complete(&mut self, at: Coordinate, heading_deg: f64) {
        self.marker = Some(MarkerPose { at, heading_deg });
        self.completed = true;
    }

    fn clear(&mut self) {
        self.path.clear();
        self.marker = None;
        self.completed = false;
    }
}

/// Build the request a view animates for the given endpoints
pub fn route_request(
    view: RouteView,
    settings: &FlightSettings,
    origin: Coordinate,
    destination: Coordinate,
    interpolation: ArcInterpolation,
) -> RouteRequest {
    match view {
        RouteView::Globe => settings
            .globe
            .route_request(origin, destination, interpolation),
        RouteView::Map => settings.map.route_request(origin, destination, interpolation),
    }
}

pub(crate) fn spawn_route_views(mut commands: Commands) {
    for view in [RouteView::Globe, RouteView::Map] {
        commands.spawn((
            view,
            FlightAnimator::new(),
            RouteTrace::default(),
            Name::new(format!("Route ({})", view.label())),
        ));
    }
}

/// Restart every view's animator when the selection or settings change
pub fn sync_route_selection(
    selection: Res<SelectedRoute>,
    settings: Res<FlightSettings>,
    mut views: Query<(&RouteView, &mut FlightAnimator, &mut RouteTrace)>,
) {
    if !selection.is_changed() && !settings.is_changed() {
        return;
    }

    let Some((origin, destination)) = selection.endpoints() else {
        for (_, mut animator, mut trace) in views.iter_mut() {
            animator.stop();
            trace.clear();
        }
        return;
    };

    let endpoints = origin
        .coordinate()
        .and_then(|o| destination.coordinate().map(|d| (o, d)));
    let (from, to) = match endpoints {
        Ok(pair) => pair,
        Err(err) => {
            warn!("Cannot route {} -> {}: {}", origin.name, destination.name, err);
            for (_, mut animator, mut trace) in views.iter_mut() {
                animator.stop();
                trace.clear();
            }
            return;
        }
    };

    for (view, mut animator, mut trace) in views.iter_mut() {
        trace.clear();
        let request = route_request(*view, &settings, from, to, selection.interpolation);
        match animator.on_route_changed(&request) {
            Ok(handle) => info!(
                "Route {} -> {} on {} ({:.0} km, {} steps, {}, generation {})",
                origin.name,
                destination.name,
                view.label(),
                distance_km(&from, &to),
                request.steps,
                request.interpolation.label(),
                handle.generation()
            ),
            Err(err) => warn!(
                "Rejected route {} -> {} on {}: {}",
                origin.name,
                destination.name,
                view.label(),
                err
            ),
        }
    }
}

/// Advance every active animator by one frame
pub fn tick_routes(mut views: Query<(&RouteView, &mut FlightAnimator, &mut RouteTrace)>) {
    for (view, mut animator, mut trace) in views.iter_mut() {
        let Some(instruction) = animator.tick_active() else {
            continue;
        };
        if let RenderInstruction::Complete { at, .. } = &instruction {
            info!(
                "Arrived on {} at ({:.4}, {:.4})",
                view.label(),
                at.lon(),
                at.lat()
            );
        }
        trace.apply(&instruction);
    }
}
