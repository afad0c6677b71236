//! Globe view: Earth sphere, city markers and the animated route lifted above
//! the surface by the arc's altitude hint.

use bevy::color::Mix;
use bevy::math::DVec3;
use bevy::prelude::*;

use crate::cities::CITIES;
use crate::core::{Coordinate, EARTH_RADIUS_KM};
use crate::flight::arc::FlightArc;
use crate::flight::settings::srgb;
use crate::flight::{FlightAnimator, FlightSettings, RouteTrace, RouteView};

const CITY_RADIUS: f32 = 45.0;
const MARKER_RADIUS: f32 = 90.0;
const MARKER_HEIGHT: f32 = 280.0;

#[derive(Component)]
pub struct GlobeCityMarker;

/// The cone that flies along the globe route
#[derive(Component)]
pub struct GlobeRouteMarker;

/// Spawn the Earth sphere and a marker for every catalog city
pub fn spawn_globe(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<FlightSettings>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(EARTH_RADIUS_KM).mesh().uv(96, 48))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.05, 0.16, 0.35),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_xyz(0.0, 0.0, 0.0),
        Name::new("Earth"),
    ));

    let city_mesh = meshes.add(Sphere::new(1.0).mesh().uv(16, 8));
    let city_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.85, 0.2),
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
            Transform::from_translation(coordinate.to_globe(0.0))
                .with_scale(Vec3::splat(CITY_RADIUS)),
            GlobeCityMarker,
            Name::new(city.name),
        ));
    }

    commands.spawn((
        Mesh3d(meshes.add(Cone {
            radius: MARKER_RADIUS,
            height: MARKER_HEIGHT,
        })),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: srgb(settings.globe.marker_color),
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
        GlobeRouteMarker,
        Name::new("Globe route marker"),
    ));
}

/// Unit vector tangent to the globe at `at`, pointing along `heading_deg`
/// (0 = north, 90 = east), in Bevy world space.
pub fn heading_tangent(at: &Coordinate, heading_deg: f64) -> Vec3 {
    let (sin_lat, cos_lat) = at.lat().to_radians().sin_cos();
    let (sin_lon, cos_lon) = at.lon().to_radians().sin_cos();
    let east = DVec3::new(cos_lon, 0.0, -sin_lon);
    let north = DVec3::new(-sin_lat * sin_lon, cos_lat, -sin_lat * cos_lon);
    let (sin_h, cos_h) = heading_deg.to_radians().sin_cos();
    (north * cos_h + east * sin_h).normalize_or_zero().as_vec3()
}

/// Rotation turning the cone's apex (+Y) toward the heading
pub fn marker_rotation(at: &Coordinate, heading_deg: f64) -> Quat {
    let direction = heading_tangent(at, heading_deg);
    if direction == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Y, direction)
}

/// Draw the revealed prefix, fading from the path color to the end color
pub fn draw_globe_route(
    mut gizmos: Gizmos,
    settings: Res<FlightSettings>,
    views: Query<(&RouteView, &FlightAnimator, &RouteTrace)>,
) {
    let max_altitude = settings.globe.max_altitude;
    let start_color = LinearRgba::from(srgb(settings.globe.path_color));
    let end_color = LinearRgba::from(srgb(settings.globe.path_color_end));

    for (view, animator, trace) in views.iter() {
        if *view != RouteView::Globe || trace.path.len() < 2 {
            continue;
        }
        let Some(scheduler) = animator.scheduler() else {
            continue;
        };

        let points = lifted_path(&trace.path, scheduler.arc(), max_altitude);
        for pair in points.windows(2) {
            let ((from, from_t), (to, to_t)) = (pair[0], pair[1]);
            gizmos.line_gradient(
                from,
                to,
                start_color.mix(&end_color, from_t as f32),
                start_color.mix(&end_color, to_t as f32),
            );
        }
    }
}

/// Globe positions of the revealed path paired with their route fraction.
/// Each point after the first is lifted by the altitude of the arc segment
/// that ends there.
pub fn lifted_path(path: &[Coordinate], arc: &FlightArc, max_altitude: f64) -> Vec<(Vec3, f64)> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut points = vec![(first.to_globe(arc.altitude_at(0, max_altitude)), arc.t_at(0))];
    points.extend(
        rest.iter()
            .zip(arc.segments(max_altitude))
            .map(|(at, segment)| (at.to_globe(segment.altitude), segment.t)),
    );
    points
}

pub fn update_globe_marker(
    settings: Res<FlightSettings>,
    views: Query<(&RouteView, &FlightAnimator, &RouteTrace)>,
    mut markers: Query<(&mut Transform, &mut Visibility), With<GlobeRouteMarker>>,
) {
    let Ok((mut transform, mut visibility)) = markers.single_mut() else {
        return;
    };
    let Some((animator, trace)) = views
        .iter()
        .find(|(view, _, _)| **view == RouteView::Globe)
        .map(|(_, animator, trace)| (animator, trace))
    else {
        return;
    };

    let (Some(pose), Some(scheduler)) = (trace.marker, animator.scheduler()) else {
        *visibility = Visibility::Hidden;
        return;
    };

    let altitude = scheduler
        .arc()
        .altitude_at_fraction(scheduler.state().traversal, settings.globe.max_altitude);
    transform.translation = pose.at.to_globe(altitude);
    transform.rotation = marker_rotation(&pose.at, pose.heading_deg);
    *visibility = Visibility::Visible;
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    #[test]
    fn test_lifted_path_follows_revealed_points() {
        let arc = FlightArc::build(c(-80.0, 25.0), c(-74.0, 5.0), 4).unwrap();
        let revealed = &arc.points()[..3];
        let points = lifted_path(revealed, &arc, 0.35);
        assert_eq!(points.len(), 3);

        // ends sit on the surface, interior points are lifted
        let (start, start_t) = points[0];
        assert!((start - revealed[0].to_globe(0.0)).length() < EPSILON);
        assert_eq!(start_t, 0.0);
        let (mid, mid_t) = points[2];
        assert_eq!(mid_t, 0.5);
        assert!((mid - revealed[2].to_globe(0.35)).length() < 1e-2);
        assert!(mid.length() > EARTH_RADIUS_KM * 1.3);

        // positions come from the given path, not from the arc
        let moved = [c(10.0, 0.0), c(20.0, 0.0)];
        let points = lifted_path(&moved, &arc, 0.0);
        assert!((points[1].0 - moved[1].to_globe(0.0)).length() < 1e-2);
    }

    #[test]
    fn test_heading_north_at_origin() {
        let d = heading_tangent(&c(0.0, 0.0), 0.0);
        assert!((d - Vec3::Y).length() < EPSILON, "got {:?}", d);
    }

    #[test]
    fn test_heading_east_at_origin() {
        let d = heading_tangent(&c(0.0, 0.0), 90.0);
        assert!((d - Vec3::X).length() < EPSILON, "got {:?}", d);
    }

    #[test]
    fn test_heading_is_tangent_to_sphere() {
        for (lon, lat) in [(-80.19, 25.76), (2.17, 41.39), (-77.04, -12.05), (150.0, 70.0)] {
            let at = c(lon, lat);
            let up = at.to_globe(0.0).normalize();
            for heading in [0.0, 45.0, 135.0, 270.0] {
                let d = heading_tangent(&at, heading);
                assert!(d.dot(up).abs() < 1e-4);
                assert!((d.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_north_heading_points_toward_pole() {
        let at = c(-74.07, 4.71);
        let step = c(-74.07, 5.71).to_globe(0.0) - at.to_globe(0.0);
        let d = heading_tangent(&at, 0.0);
        assert!(d.dot(step.normalize()) > 0.99);
    }

    #[test]
    fn test_marker_rotation_points_apex_along_heading() {
        let at = c(-80.19, 25.76);
        let rotation = marker_rotation(&at, 160.0);
        let apex = rotation * Vec3::Y;
        assert!((apex - heading_tangent(&at, 160.0)).length() < 1e-4);
    }
}
