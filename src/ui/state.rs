//! UI state management

use bevy::prelude::*;

/// Marks the orbit camera the focus systems drive
#[derive(Component)]
pub struct MainCamera;

/// Status line in the top-left corner
#[derive(Component)]
pub struct StatusText;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// Initial globe framing, ~4x Earth's radius
pub const GLOBE_POSE: CameraPose = CameraPose {
    radius: 25_000.0,
    yaw: 0.0,
    pitch: 0.3,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusTarget {
    Globe,
    Map,
}

impl FocusTarget {
    pub fn toggled(self) -> Self {
        match self {
            FocusTarget::Globe => FocusTarget::Map,
            FocusTarget::Map => FocusTarget::Globe,
        }
    }
}

#[derive(Resource, Debug)]
pub struct ViewFocus {
    pub target: FocusTarget,
    /// Globe pose saved when switching to the map, restored on the way back
    pub last_globe_pose: Option<CameraPose>,
}

impl Default for ViewFocus {
    fn default() -> Self {
        Self {
            target: FocusTarget::Globe,
            last_globe_pose: None,
        }
    }
}
