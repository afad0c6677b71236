//! Per-view animation settings, loadable from a JSON file
//!
//! The file lives in the platform config directory:
//! - macOS: ~/Library/Application Support/flightarc/settings.json
//! - Linux: ~/.config/flightarc/settings.json
//! - Windows: %APPDATA%\flightarc\config\settings.json
//!
//! Every key is optional; missing keys take the defaults below.

use anyhow::{Context, Result};
use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::Coordinate;
use crate::flight::arc::{ArcInterpolation, DEFAULT_MAX_ALTITUDE};
use crate::flight::scheduler::AnimationConfig;
use crate::flight::session::RouteRequest;

const SETTINGS_FILE: &str = "settings.json";

/// Globe view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub steps: u32,
    pub draw_speed: f64,
    pub marker_speed: f64,
    /// Arc peak height as a fraction of the Earth radius
    pub max_altitude: f64,
    /// Path color at the origin, fading to `path_color_end` at the destination
    pub path_color: [f32; 3],
    pub path_color_end: [f32; 3],
    pub marker_color: [f32; 3],
    /// Camera yaw in radians per second while the globe is idle
    pub auto_rotate_speed: f32,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            steps: 240,
            draw_speed: 6.0,
            marker_speed: 1.2,
            max_altitude: DEFAULT_MAX_ALTITUDE,
            path_color: [0.22, 0.74, 0.97],
            path_color_end: [0.12, 0.23, 0.54],
            marker_color: [1.0, 1.0, 1.0],
            auto_rotate_speed: 0.05,
        }
    }
}

/// Flat map view settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub steps: u32,
    pub draw_speed: f64,
    pub marker_speed: f64,
    /// Fraction of the route bounds added on every side when framing
    pub zoom_padding: f64,
    pub path_color: [f32; 3],
    pub marker_color: [f32; 3],
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            steps: 200,
            draw_speed: 4.0,
            marker_speed: 1.6,
            zoom_padding: 0.15,
            path_color: [1.0, 0.1, 0.1],
            marker_color: [0.1, 0.1, 0.1],
        }
    }
}

/// Settings resource for both route views
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSettings {
    pub interpolation: ArcInterpolation,
    pub globe: GlobeSettings,
    pub map: MapSettings,
}

impl GlobeSettings {
    pub fn route_request(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        interpolation: ArcInterpolation,
    ) -> RouteRequest {
        RouteRequest {
            origin,
            destination,
            steps: self.steps,
            draw_speed: self.draw_speed,
            marker_speed: self.marker_speed,
            interpolation,
        }
    }
}

impl MapSettings {
    pub fn route_request(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        interpolation: ArcInterpolation,
    ) -> RouteRequest {
        RouteRequest {
            origin,
            destination,
            steps: self.steps,
            draw_speed: self.draw_speed,
            marker_speed: self.marker_speed,
            interpolation,
        }
    }
}

impl FlightSettings {
    /// Path of the settings file in the platform config directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "flightarc")
            .ok_or_else(|| anyhow::anyhow!("Failed to resolve config directory"))?;
        Ok(proj_dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Read settings from `path`
    ///
    /// Returns Ok(None) if the file doesn't exist.
    /// Returns Err if the file exists but cannot be read, parsed or validated.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: FlightSettings = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        settings.validate()?;

        Ok(Some(settings))
    }

    /// Load from the platform config directory, falling back to defaults
    pub fn load_or_default() -> Self {
        let loaded = Self::default_path().and_then(|path| {
            let settings = Self::load_from_path(&path)?;
            Ok((path, settings))
        });
        match loaded {
            Ok((path, Some(settings))) => {
                info!("Loaded flight settings from {}", path.display());
                settings
            }
            Ok((_, None)) => Self::default(),
            Err(err) => {
                warn!("Using default flight settings: {:#}", err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        AnimationConfig::new(self.globe.steps, self.globe.draw_speed, self.globe.marker_speed)
            .context("globe settings")?;
        AnimationConfig::new(self.map.steps, self.map.draw_speed, self.map.marker_speed)
            .context("map settings")?;
        if !self.globe.max_altitude.is_finite() || self.globe.max_altitude < 0.0 {
            anyhow::bail!("globe max_altitude must be >= 0, got {}", self.globe.max_altitude);
        }
        if !self.map.zoom_padding.is_finite() || self.map.zoom_padding < 0.0 {
            anyhow::bail!("map zoom_padding must be >= 0, got {}", self.map.zoom_padding);
        }
        Ok(())
    }
}

/// `[r, g, b]` in sRGB to a Bevy color
pub fn srgb(rgb: [f32; 3]) -> Color {
    Color::srgb(rgb[0], rgb[1], rgb[2])
}
