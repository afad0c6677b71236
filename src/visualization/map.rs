//! Flat map view: an equirectangular plane next to the globe showing the
//! same route with its own animator.

use bevy::prelude::*;

use crate::cities::CITIES;
use crate::core::{Coordinate, longitude_delta};
use crate::flight::settings::srgb;
use crate::flight::{FlightAnimator, FlightSettings, RouteTrace, RouteView};

/// World units (km) per degree on the map plane
pub const MAP_SCALE: f32 = 40.0;
/// Centre of the map plane, to the side of the globe
pub const MAP_CENTER: Vec3 = Vec3::new(30_000.0, 0.0, 0.0);
/// Height of route drawings above the plane
const LIFT: f32 = 15.0;
const GRATICULE_STEP_DEG: i32 = 30;
/// Smallest span the camera frames, in degrees
const MIN_FRAME_SPAN_DEG: f64 = 4.0;

const CITY_RADIUS: f32 = 40.0;
const MARKER_RADIUS: f32 = 70.0;
const MARKER_HEIGHT: f32 = 220.0;

/// Project a coordinate onto the map plane (x east, y north)
pub fn project(at: &Coordinate) -> Vec3 {
    project_degrees(at.lon(), at.lat())
}

fn project_degrees(lon: f64, lat: f64) -> Vec3 {
    MAP_CENTER + Vec3::new(lon as f32 * MAP_SCALE, lat as f32 * MAP_SCALE, 0.0)
}

fn project_lifted(at: &Coordinate) -> Vec3 {
    project(at) + Vec3::Z * LIFT
}

/// Lifted line strips for a path. A step that crosses the antimeridian ends
/// one strip at the map edge and starts the next at the opposite edge.
pub fn route_strips(points: &[Coordinate]) -> Vec<Vec<Vec3>> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut strips = Vec::new();
    let mut current = vec![project_lifted(first)];
    for pair in points.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if (to.lon() - from.lon()).abs() > 180.0 {
            let delta = longitude_delta(from.lon(), to.lon());
            let edge = if delta > 0.0 { 180.0 } else { -180.0 };
            let t = ((edge - from.lon()) / delta).clamp(0.0, 1.0);
            let lat = from.lat() + (to.lat() - from.lat()) * t;
            current.push(project_degrees(edge, lat) + Vec3::Z * LIFT);
            strips.push(std::mem::take(&mut current));
            current.push(project_degrees(-edge, lat) + Vec3::Z * LIFT);
        }
        current.push(project_lifted(to));
    }
    strips.push(current);
    strips.retain(|strip| strip.len() > 1);
    strips
}

/// Cone rotation in the map plane: apex north at 0, clockwise with heading
pub fn marker_rotation(heading_deg: f64) -> Quat {
    Quat::from_rotation_z(-(heading_deg.to_radians() as f32))
}

/// Lon/lat box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub const WORLD: GeoBounds = GeoBounds {
        min_lon: -180.0,
        min_lat: -90.0,
        max_lon: 180.0,
        max_lat: 90.0,
    };

    /// Bounds of a path. Longitudes are unwrapped step by step, so a path
    /// across the antimeridian gets a narrow box reaching past 180 instead
    /// of one spanning the whole map.
    pub fn from_points(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = GeoBounds {
            min_lon: first.lon(),
            min_lat: first.lat(),
            max_lon: first.lon(),
            max_lat: first.lat(),
        };
        let mut lon = first.lon();
        let mut previous = first.lon();
        for p in rest {
            lon += longitude_delta(previous, p.lon());
            previous = p.lon();
            bounds.min_lon = bounds.min_lon.min(lon);
            bounds.min_lat = bounds.min_lat.min(p.lat());
            bounds.max_lon = bounds.max_lon.max(lon);
            bounds.max_lat = bounds.max_lat.max(p.lat());
        }
        Some(bounds)
    }

    /// Grow every side by `ratio` of the span on that axis
    pub fn pad(&self, ratio: f64) -> Self {
        let dlon = (self.max_lon - self.min_lon).abs() * ratio;
        let dlat = (self.max_lat - self.min_lat).abs() * ratio;
        GeoBounds {
            min_lon: self.min_lon - dlon,
            min_lat: self.min_lat - dlat,
            max_lon: self.max_lon + dlon,
            max_lat: self.max_lat + dlat,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Centre on the map plane, in world space
    pub fn center(&self) -> Vec3 {
        MAP_CENTER
            + Vec3::new(
                ((self.min_lon + self.max_lon) / 2.0) as f32 * MAP_SCALE,
                ((self.min_lat + self.max_lat) / 2.0) as f32 * MAP_SCALE,
                0.0,
            )
    }

    /// Camera distance at which the box fills a perspective view
    pub fn fit_distance(&self, vertical_fov: f32, aspect_ratio: f32) -> f32 {
        let width = self.width().max(MIN_FRAME_SPAN_DEG) as f32 * MAP_SCALE;
        let height = self.height().max(MIN_FRAME_SPAN_DEG) as f32 * MAP_SCALE;
        let half_extent = (height.max(width / aspect_ratio.max(f32::EPSILON))) / 2.0;
        half_extent / (vertical_fov / 2.0).tan()
    }
}

/// Padded bounds of the route the map view is animating
#[derive(Resource, Debug, Default)]
pub struct MapFrame {
    pub bounds: Option<GeoBounds>,
    generation: Option<u64>,
}

#[derive(Component)]
pub struct MapCityMarker;

#[derive(Component)]
pub struct MapRouteMarker;

pub fn spawn_map(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<FlightSettings>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Rectangle::new(360.0 * MAP_SCALE, 180.0 * MAP_SCALE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.82, 0.86, 0.9),
            unlit: true,
            ..default()
        })),
        Transform::from_translation(MAP_CENTER),
        Name::new("Map"),
    ));

    let city_mesh = meshes.add(Sphere::new(1.0).mesh().uv(16, 8));
    let city_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.9, 0.5, 0.1),
        unlit: true,
        ..default()
    });
    for city in CITIES {
        let Ok(coordinate) = city.coordinate() else {
            warn!("Skipping city {} with invalid coordinates", city.name);
            continue;
        };
        commands.spawn((
            Mesh3d(city_mesh.clone()),
            MeshMaterial3d(city_material.clone()),
            Transform::from_translation(project_lifted(&coordinate))
                .with_scale(Vec3::splat(CITY_RADIUS)),
            MapCityMarker,
            Name::new(city.name),
        ));
    }

    commands.spawn((
        Mesh3d(meshes.add(Cone {
            radius: MARKER_RADIUS,
            height: MARKER_HEIGHT,
        })),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: srgb(settings.map.marker_color),
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
        MapRouteMarker,
        Name::new("Map route marker"),
    ));
}

pub fn draw_graticule(mut gizmos: Gizmos) {
    let color = Color::srgba(0.3, 0.35, 0.45, 0.6);
    let lift = Vec3::Z * (LIFT * 0.5);
    for lon in (-180..=180).step_by(GRATICULE_STEP_DEG as usize) {
        let x = MAP_CENTER.x + lon as f32 * MAP_SCALE;
        gizmos.line(
            Vec3::new(x, MAP_CENTER.y - 90.0 * MAP_SCALE, MAP_CENTER.z) + lift,
            Vec3::new(x, MAP_CENTER.y + 90.0 * MAP_SCALE, MAP_CENTER.z) + lift,
            color,
        );
    }
    for lat in (-90..=90).step_by(GRATICULE_STEP_DEG as usize) {
        let y = MAP_CENTER.y + lat as f32 * MAP_SCALE;
        gizmos.line(
            Vec3::new(MAP_CENTER.x - 180.0 * MAP_SCALE, y, MAP_CENTER.z) + lift,
            Vec3::new(MAP_CENTER.x + 180.0 * MAP_SCALE, y, MAP_CENTER.z) + lift,
            color,
        );
    }
}

pub fn draw_map_route(
    mut gizmos: Gizmos,
    settings: Res<FlightSettings>,
    views: Query<(&RouteView, &RouteTrace)>,
) {
    let color = srgb(settings.map.path_color);
    for (view, trace) in views.iter() {
        if *view != RouteView::Map || trace.path.len() < 2 {
            continue;
        }
        for strip in route_strips(&trace.path) {
            gizmos.linestrip(strip, color);
        }
    }
}

pub fn update_map_marker(
    views: Query<(&RouteView, &RouteTrace)>,
    mut markers: Query<(&mut Transform, &mut Visibility), With<MapRouteMarker>>,
) {
    let Ok((mut transform, mut visibility)) = markers.single_mut() else {
        return;
    };
    let pose = views
        .iter()
        .find(|(view, _)| **view == RouteView::Map)
        .and_then(|(_, trace)| trace.marker);

    match pose {
        Some(pose) => {
            transform.translation = project_lifted(&pose.at) + Vec3::Z * LIFT;
            transform.rotation = marker_rotation(pose.heading_deg);
            *visibility = Visibility::Visible;
        }
        None => *visibility = Visibility::Hidden,
    }
}

/// Recompute the padded frame whenever the map animator starts a new route
pub fn update_map_frame(
    settings: Res<FlightSettings>,
    mut frame: ResMut<MapFrame>,
    views: Query<(&RouteView, &FlightAnimator)>,
) {
    let Some((_, animator)) = views.iter().find(|(view, _)| **view == RouteView::Map) else {
        return;
    };
    let generation = animator.current_handle().map(|h| h.generation());
    if frame.generation == generation {
        return;
    }

    let bounds = animator
        .scheduler()
        .and_then(|s| GeoBounds::from_points(s.arc().points()))
        .map(|b| b.pad(settings.map.zoom_padding));
    debug!("map frame for generation {:?}: {:?}", generation, bounds);
    frame.bounds = bounds;
    frame.generation = generation;
}
