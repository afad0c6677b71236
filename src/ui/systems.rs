use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::cities::{self, CITIES};
use crate::core::distance_km;
use crate::flight::{
    FlightAnimator, FlightSettings, Phase, RouteRenderer, RouteTrace, RouteView, SelectedRoute,
};
use crate::ui::state::{
    CameraPose, FocusTarget, GLOBE_POSE, MainCamera, StatusText, ViewFocus,
};
use crate::visualization::{GeoBounds, MapFrame};

pub const PLACEHOLDER: &str = "Select an origin and a destination";
const KEY_HELP: &str =
    "[O] origin  [D] destination  [R] replay  [S] stop  [G] great circle  [M] globe/map";

pub fn spawn_status_text(mut commands: Commands) {
    commands.spawn((
        Text::new(PLACEHOLDER),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        StatusText,
    ));
}

/// Keyboard route controls
pub fn handle_route_keys(
    input: Res<ButtonInput<KeyCode>>,
    mut selection: ResMut<SelectedRoute>,
    mut views: Query<(&mut FlightAnimator, &mut RouteTrace)>,
) {
    if input.just_pressed(KeyCode::KeyO) {
        let next = cities::next_index(selection.origin);
        selection.origin = Some(next);
        info!("Origin: {}", CITIES[next].name);
    }
    if input.just_pressed(KeyCode::KeyD) {
        let next = cities::next_index(selection.destination);
        selection.destination = Some(next);
        info!("Destination: {}", CITIES[next].name);
    }
    if input.just_pressed(KeyCode::KeyG) {
        selection.interpolation = selection.interpolation.toggled();
        info!("Interpolation: {}", selection.interpolation.label());
    }
    if input.just_pressed(KeyCode::KeyS) {
        for (mut animator, mut trace) in views.iter_mut() {
            animator.stop();
            trace.clear();
        }
        info!("Route stopped");
    }
    if input.just_pressed(KeyCode::KeyR) {
        let mut stopped = false;
        for (mut animator, mut trace) in views.iter_mut() {
            match animator.restart() {
                Some(_) => trace.clear(),
                None => stopped = true,
            }
        }
        // a stopped view has nothing to replay; let the route sync start it again
        if stopped {
            selection.set_changed();
        }
    }
}

pub fn toggle_view_focus(
    input: Res<ButtonInput<KeyCode>>,
    mut focus: ResMut<ViewFocus>,
    cameras: Query<&PanOrbitCamera, With<MainCamera>>,
) {
    if !input.just_pressed(KeyCode::KeyM) {
        return;
    }
    if focus.target == FocusTarget::Globe
        && let Ok(camera) = cameras.single()
    {
        focus.last_globe_pose = Some(CameraPose {
            radius: camera.target_radius,
            yaw: camera.target_yaw,
            pitch: camera.target_pitch,
        });
    }
    focus.target = focus.target.toggled();
    info!("Camera focus: {:?}", focus.target);
}

/// Move the orbit camera onto the globe, or frame the map route
pub fn apply_view_focus(
    focus: Res<ViewFocus>,
    frame: Res<MapFrame>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&mut PanOrbitCamera, &Projection), With<MainCamera>>,
) {
    if !focus.is_changed() && !frame.is_changed() {
        return;
    }
    let Ok((mut camera, projection)) = cameras.single_mut() else {
        return;
    };

    match focus.target {
        FocusTarget::Globe => {
            if !focus.is_changed() {
                return;
            }
            let pose = focus.last_globe_pose.unwrap_or(GLOBE_POSE);
            camera.target_focus = Vec3::ZERO;
            camera.target_radius = pose.radius;
            camera.target_yaw = pose.yaw;
            camera.target_pitch = pose.pitch;
        }
        FocusTarget::Map => {
            let bounds = frame.bounds.unwrap_or(GeoBounds::WORLD);
            let fov = match projection {
                Projection::Perspective(p) => p.fov,
                _ => std::f32::consts::FRAC_PI_4,
            };
            let aspect = windows
                .single()
                .ok()
                .filter(|w| w.height() > 0.0)
                .map(|w| w.width() / w.height())
                .unwrap_or(16.0 / 9.0);
            camera.target_focus = bounds.center();
            camera.target_radius = bounds.fit_distance(fov, aspect);
            camera.target_yaw = 0.0;
            camera.target_pitch = 0.0;
        }
    }
}

/// Slowly spin the globe while the user isn't dragging it
pub fn auto_rotate_globe(
    time: Res<Time>,
    settings: Res<FlightSettings>,
    focus: Res<ViewFocus>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut cameras: Query<&mut PanOrbitCamera, With<MainCamera>>,
) {
    let speed = settings.globe.auto_rotate_speed;
    if focus.target != FocusTarget::Globe || speed <= 0.0 {
        return;
    }
    if mouse.pressed(MouseButton::Left) || mouse.pressed(MouseButton::Right) {
        return;
    }
    for mut camera in cameras.iter_mut() {
        camera.target_yaw += speed * time.delta_secs();
    }
}

pub fn update_status_text(
    selection: Res<SelectedRoute>,
    views: Query<(&RouteView, &FlightAnimator)>,
    mut texts: Query<&mut Text, With<StatusText>>,
) {
    let mut globe = None;
    let mut map = None;
    for (view, animator) in views.iter() {
        match view {
            RouteView::Globe => globe = animator.phase(),
            RouteView::Map => map = animator.phase(),
        }
    }
    let line = status_line(&selection, globe, map);
    for mut text in texts.iter_mut() {
        if text.0 != line {
            text.0 = line.clone();
        }
    }
}

fn phase_label(phase: Option<Phase>) -> &'static str {
    phase.map(Phase::label).unwrap_or("idle")
}

/// Status text for the current selection and view phases
pub fn status_line(selection: &SelectedRoute, globe: Option<Phase>, map: Option<Phase>) -> String {
    let route = selection.endpoints().and_then(|(origin, destination)| {
        let from = origin.coordinate().ok()?;
        let to = destination.coordinate().ok()?;
        Some(format!(
            "{}, {} -> {}, {} ({:.0} km, {})",
            origin.name,
            origin.country,
            destination.name,
            destination.country,
            distance_km(&from, &to),
            selection.interpolation.label()
        ))
    });

    match route {
        Some(route) => format!(
            "{}\nglobe: {}  map: {}\n{}",
            route,
            phase_label(globe),
            phase_label(map),
            KEY_HELP
        ),
        None => format!("{}\n{}", PLACEHOLDER, KEY_HELP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::ArcInterpolation;

    #[test]
    fn test_status_line_shows_route_and_phases() {
        let selection = SelectedRoute::with_defaults(ArcInterpolation::Linear);
        let line = status_line(&selection, Some(Phase::Traversing), None);
        assert!(line.starts_with("Miami, United States -> Bogotá, Colombia"));
        assert!(line.contains("linear"));
        assert!(line.contains("globe: flying"));
        assert!(line.contains("map: idle"));
    }

    #[test]
    fn test_status_line_placeholder_for_same_city() {
        let mut selection = SelectedRoute::with_defaults(ArcInterpolation::GreatCircle);
        selection.destination = selection.origin;
        let line = status_line(&selection, None, None);
        assert!(line.starts_with(PLACEHOLDER));
    }

    #[test]
    fn test_status_line_placeholder_without_origin() {
        let mut selection = SelectedRoute::with_defaults(ArcInterpolation::Linear);
        selection.origin = None;
        assert!(status_line(&selection, None, None).starts_with(PLACEHOLDER));
    }

    fn press(app: &mut App, key: KeyCode) {
        let mut input = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        input.clear();
        input.press(key);
    }

    #[test]
    fn test_route_keys_cycle_origin_and_toggle_interpolation() {
        let mut app = App::new();
        app.insert_resource(ButtonInput::<KeyCode>::default())
            .insert_resource(SelectedRoute::with_defaults(ArcInterpolation::Linear))
            .add_systems(Update, handle_route_keys);

        let origin_before = app.world().resource::<SelectedRoute>().origin;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyO);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyG);
        app.update();

        let selection = app.world().resource::<SelectedRoute>();
        assert_eq!(selection.origin, Some(cities::next_index(origin_before)));
        assert_eq!(selection.interpolation, ArcInterpolation::GreatCircle);
    }

    #[test]
    fn test_stop_key_clears_views_and_replay_key_restarts_them() {
        use crate::flight::{spawn_route_views, sync_route_selection, tick_routes};

        let mut app = App::new();
        app.insert_resource(ButtonInput::<KeyCode>::default())
            .insert_resource(FlightSettings::default())
            .insert_resource(SelectedRoute::with_defaults(ArcInterpolation::Linear))
            .add_systems(Startup, spawn_route_views)
            .add_systems(
                Update,
                (handle_route_keys, sync_route_selection, tick_routes).chain(),
            );
        app.update();
        {
            let mut query = app.world_mut().query::<(&FlightAnimator, &RouteTrace)>();
            for (animator, trace) in query.iter(app.world()) {
                assert!(animator.is_active());
                assert!(!trace.path.is_empty());
            }
        }

        press(&mut app, KeyCode::KeyS);
        app.update();
        {
            let mut query = app.world_mut().query::<(&FlightAnimator, &RouteTrace)>();
            for (animator, trace) in query.iter(app.world()) {
                assert!(!animator.is_active());
                assert!(animator.phase().is_none());
                assert!(trace.path.is_empty());
                assert!(trace.marker.is_none());
            }
        }

        // nothing to replay, so the selection is re-synced and both views start over
        press(&mut app, KeyCode::KeyR);
        app.update();
        let mut query = app.world_mut().query::<(&FlightAnimator, &RouteTrace)>();
        let mut restarted = 0;
        for (animator, trace) in query.iter(app.world()) {
            assert!(animator.is_active());
            assert_eq!(animator.phase(), Some(Phase::Drawing));
            assert!(!trace.path.is_empty() && !trace.completed);
            restarted += 1;
        }
        assert_eq!(restarted, 2);
    }
}
