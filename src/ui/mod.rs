//! User interface module
//!
//! Keyboard route selection, the status line, and the orbit camera focus
//! switch between the globe and the map.

use bevy::prelude::*;

pub mod state;
pub mod systems;

pub use state::{GLOBE_POSE, MainCamera, ViewFocus};

use crate::flight::sync_route_selection;
use crate::visualization::map::update_map_frame;

/// Plugin for user interface management
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewFocus>()
            .add_systems(Startup, systems::spawn_status_text)
            .add_systems(
                Update,
                (systems::handle_route_keys, systems::toggle_view_focus)
                    .before(sync_route_selection),
            )
            .add_systems(
                Update,
                (
                    systems::apply_view_focus.after(update_map_frame),
                    systems::auto_rotate_globe,
                    systems::update_status_text,
                ),
            );
    }
}
