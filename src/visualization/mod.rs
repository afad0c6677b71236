//! Visualization module
//!
//! Draws what the flight animators produce: the globe view and the flat map
//! view, each fed by its own `RouteTrace`.

use bevy::prelude::*;

pub mod globe;
pub mod map;

pub use map::{GeoBounds, MapFrame};

use crate::flight::tick_routes;

/// Plugin for the globe and map renderers
pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapFrame>()
            .add_systems(Startup, (globe::spawn_globe, map::spawn_map))
            .add_systems(
                Update,
                (
                    globe::draw_globe_route,
                    globe::update_globe_marker,
                    map::draw_graticule,
                    map::draw_map_route,
                    map::update_map_marker,
                    map::update_map_frame,
                )
                    .after(tick_routes),
            );
    }
}
