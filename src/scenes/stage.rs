use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::Duration;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Mesh, PrimitiveTopology};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy::winit::{UpdateMode, WinitSettings};

use crate::audio::PlaybackHost;
use crate::components::rings::{RingId, RingKind, RingTint, TransientRing};
use crate::file::config::AppConfig;
use crate::file::settings::{RingSettings, Settings};
use crate::file::theme::Theme;
use crate::scenes::notice::StageFailure;
use crate::scenes::text::TextRasterizer;
use crate::scenes::StageCamera;
use crate::states::AppState;
use crate::sync::clock::WallClock;
use crate::sync::events::dispatch;
use crate::sync::visualizer::{FrameOutcome, StageStatus, Visualizer};

const IDLE_WAIT: Duration = Duration::from_millis(100);

/// A word plane, addressed by its line and slot in the lyric layout.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LyricWordMesh {
    pub line: usize,
    pub word: usize,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingMesh {
    pub id: RingId,
}

#[derive(Resource)]
pub struct RingAssets {
    filled: Handle<Mesh>,
    outline: Handle<Mesh>,
    materials: HashMap<RingTint, Handle<StandardMaterial>>,
}

impl RingAssets {
    fn mesh(&self, kind: RingKind) -> Handle<Mesh> {
        match kind {
            RingKind::Filled => self.filled.clone(),
            RingKind::Outline => self.outline.clone(),
        }
    }

    fn material(
        &mut self,
        tint: RingTint,
        theme: &Theme,
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        self.materials
            .entry(tint)
            .or_insert_with(|| materials.add(stage_material(theme.ring_color(tint), None)))
            .clone()
    }
}

pub struct StageSystemsPlugin;

impl Plugin for StageSystemsPlugin {
    fn build(&self, app: &mut App) {
        app
        .init_resource::<WallClock>()
        .add_systems(OnEnter(AppState::Stage), setup_ring_assets)
        .add_systems(
            Update,
            (
                pump_player_events,
                handle_pointer,
                drive_frame,
                spawn_lyric_words,
                sync_lyric_words,
                sync_rings,
                apply_camera_pose,
                reflect_status,
                pace_frames,
            )
                .chain()
                .run_if(in_state(AppState::Stage)),
        )
        ;
    }
}

fn stage_material(color: Color, texture: Option<Handle<Image>>) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        base_color_texture: texture,
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        cull_mode: None,
        ..default()
    }
}

/// Closed polygon through the ring's outer corners.
pub fn outline_mesh(settings: &RingSettings) -> Mesh {
    let segments = settings.segments.max(3);
    let radius = settings.outer_radius;
    let positions: Vec<[f32; 3]> = (0..=segments)
        .map(|i| {
            let angle = TAU * (i % segments) as f32 / segments as f32;
            [radius * angle.cos(), radius * angle.sin(), 0.0]
        })
        .collect();
    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];

    Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

fn ring_transform(ring: &TransientRing) -> Transform {
    Transform::from_xyz(ring.x as f32, 0.0, 0.0).with_rotation(
        Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_z(ring.spin as f32),
    )
}

/// Builds the per-session resources: the visualizer context and the fonts.
pub fn prepare_stage(
    mut commands: Commands,
    config: Res<AppConfig>,
    settings: Res<Settings>,
    theme: Res<Theme>,
    mut failure: ResMut<StageFailure>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    commands.insert_resource(Visualizer::new(settings.clone(), theme.ring_palette.len()));

    match TextRasterizer::load(&config) {
        Ok(rasterizer) => commands.insert_resource(rasterizer),
        Err(err) => {
            error!("Failed to prepare lyric text: {err}");
            failure.report(err.to_string());
            next_state.set(AppState::Failed);
        }
    }
}

pub fn setup_ring_assets(
    mut commands: Commands,
    settings: Res<Settings>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let rings = &settings.rings;
    let filled = meshes.add(
        Annulus::new(rings.inner_radius, rings.outer_radius)
            .mesh()
            .resolution(rings.segments.max(3)),
    );
    let outline = meshes.add(outline_mesh(rings));

    commands.insert_resource(RingAssets { filled, outline, materials: HashMap::new() });
}

pub fn pump_player_events(
    mut host: NonSendMut<PlaybackHost>,
    mut visualizer: ResMut<Visualizer>,
    clock: Res<WallClock>,
) {
    let now = clock.now_ms();
    for event in host.poll(now) {
        debug!("player event {event:?}");
        dispatch(&mut *visualizer, now, event);
    }
}

pub fn handle_pointer(
    mut host: NonSendMut<PlaybackHost>,
    mut visualizer: ResMut<Visualizer>,
    clock: Res<WallClock>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let now = clock.now_ms();
    let cursor = window.cursor_position();

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(cursor) = cursor {
            visualizer.press(now, cursor.x as f64);
        }
    }

    if let Some(position) = cursor {
        if *last_cursor != Some(position) {
            *last_cursor = Some(position);
            let height = window.height().max(1.0);
            visualizer.pointer_moved(
                now,
                position.x as f64,
                position.y / height,
                window.width() as f64,
                &mut *host,
            );
        }
    }

    if buttons.just_released(MouseButton::Left) {
        visualizer.release(now, &mut *host);
    }
}

pub fn drive_frame(mut visualizer: ResMut<Visualizer>, clock: Res<WallClock>) {
    visualizer.frame(clock.now_ms());
}

/// Creates one textured plane per word whenever the layout is rebuilt.
pub fn spawn_lyric_words(
    mut commands: Commands,
    visualizer: Res<Visualizer>,
    rasterizer: Res<TextRasterizer>,
    theme: Res<Theme>,
    existing: Query<Entity, With<LyricWordMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut failure: ResMut<StageFailure>,
    mut next_state: ResMut<NextState<AppState>>,
    mut built_generation: Local<u32>,
) {
    if visualizer.layout_generation() == *built_generation {
        return;
    }
    *built_generation = visualizer.layout_generation();

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    let mut plane_cache: HashMap<u64, Handle<Mesh>> = HashMap::new();
    for (line_index, line) in visualizer.layout().lines().iter().enumerate() {
        for (word_index, word) in line.words.iter().enumerate() {
            let texture = match rasterizer.rasterize(&word.text, word.is_emphasized(), theme.lyric_text) {
                Ok(texture) => texture,
                Err(err) => {
                    error!("Failed to rasterize '{}': {err}", word.text);
                    failure.report(err.to_string());
                    next_state.set(AppState::Failed);
                    return;
                }
            };
            let image = images.add(texture.into_image());
            let plane = plane_cache
                .entry(word.len.to_bits())
                .or_insert_with(|| meshes.add(Rectangle::new(word.len as f32, 1.0)))
                .clone();

            commands.spawn((
                Mesh3d(plane),
                MeshMaterial3d(materials.add(stage_material(Color::WHITE, Some(image)))),
                Transform::from_xyz(0.0, line.depth, line.depth),
                Visibility::Hidden,
                LyricWordMesh { line: line_index, word: word_index },
            ));
        }
    }
    info!("Spawned {} lyric words", visualizer.layout().word_count());
}

pub fn sync_lyric_words(
    visualizer: Res<Visualizer>,
    mut words: Query<(&LyricWordMesh, &mut Transform, &mut Visibility)>,
) {
    if visualizer.last_outcome() == FrameOutcome::Idle {
        return;
    }

    let lines = visualizer.layout().lines();
    for (slot, mut transform, mut visibility) in &mut words {
        let placed = lines
            .get(slot.line)
            .and_then(|line| line.words.get(slot.word))
            .filter(|word| word.visible && word.x.is_finite());
        match placed {
            Some(word) => {
                transform.translation.x = word.x as f32;
                visibility.set_if_neq(Visibility::Visible);
            }
            None => {
                visibility.set_if_neq(Visibility::Hidden);
            }
        }
    }
}

pub fn sync_rings(
    mut commands: Commands,
    mut visualizer: ResMut<Visualizer>,
    mut ring_assets: ResMut<RingAssets>,
    theme: Res<Theme>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ring_meshes: Query<(Entity, &RingMesh, &mut Transform)>,
) {
    let changes = visualizer.take_ring_changes();

    for (entity, ring_mesh, mut transform) in &mut ring_meshes {
        if changes.removed.contains(&ring_mesh.id) {
            commands.entity(entity).despawn();
        } else if visualizer.last_outcome() != FrameOutcome::Idle {
            if let Some(ring) = visualizer.rings().get(ring_mesh.id) {
                *transform = ring_transform(ring);
            }
        }
    }

    for ring in changes.spawned {
        commands.spawn((
            Mesh3d(ring_assets.mesh(ring.kind)),
            MeshMaterial3d(ring_assets.material(ring.tint, &theme, &mut materials)),
            ring_transform(&ring),
            RingMesh { id: ring.id },
        ));
    }
}

pub fn apply_camera_pose(
    visualizer: Res<Visualizer>,
    mut cameras: Query<&mut Transform, With<StageCamera>>,
) {
    // Tilt chosen while idle shows up with the next rendered frame.
    if visualizer.last_outcome() == FrameOutcome::Idle {
        return;
    }
    let pose = visualizer.camera();
    for mut transform in &mut cameras {
        let target = Transform::from_xyz(pose.x, pose.y, pose.z).looking_at(Vec3::ZERO, Vec3::Y);
        transform.set_if_neq(target);
    }
}

pub fn status_title(base: &str, status: StageStatus) -> String {
    match (status.ready, status.playing) {
        (false, _) => format!("{base} (loading)"),
        (true, true) => format!("{base} (playing)"),
        (true, false) => format!("{base} (paused)"),
    }
}

/// Mirrors the ready and playing flags onto the window title.
pub fn reflect_status(
    visualizer: Res<Visualizer>,
    config: Res<AppConfig>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut shown: Local<Option<StageStatus>>,
) {
    let status = visualizer.status();
    if *shown == Some(status) {
        return;
    }
    *shown = Some(status);
    if let Ok(mut window) = windows.single_mut() {
        window.title = status_title(&config.window.title, status);
    }
}

/// Redraw continuously while the stage animates, otherwise only on input.
pub fn pace_frames(
    visualizer: Res<Visualizer>,
    mut winit: ResMut<WinitSettings>,
    mut was_active: Local<Option<bool>>,
) {
    let active = visualizer.is_active();
    if *was_active == Some(active) {
        return;
    }
    *was_active = Some(active);
    let mode = if active {
        UpdateMode::Continuous
    } else {
        UpdateMode::reactive_low_power(IDLE_WAIT)
    };
    winit.focused_mode = mode;
    winit.unfocused_mode = mode;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::events::{PlaybackControl, PlayerEvent};

    struct IgnoreRequests;

    impl PlaybackControl for IgnoreRequests {
        fn request_play(&mut self) {}
        fn request_pause(&mut self) {}
        fn request_media_seek(&mut self, _position: f64) {}
    }

    fn camera_app() -> (App, Entity) {
        let settings = Settings::default();
        let pose = crate::sync::visualizer::CameraPose::resting(&settings.camera);
        let mut app = App::new();
        app.insert_resource(Visualizer::new(settings, 6))
            .add_systems(Update, apply_camera_pose);
        let camera = app
            .world_mut()
            .spawn((
                Transform::from_xyz(pose.x, pose.y, pose.z).looking_at(Vec3::ZERO, Vec3::Y),
                StageCamera,
            ))
            .id();
        (app, camera)
    }

    #[test]
    fn test_idle_stage_keeps_camera_still() {
        let (mut app, camera) = camera_app();
        let resting = *app.world().get::<Transform>(camera).unwrap();

        {
            let mut visualizer = app.world_mut().resource_mut::<Visualizer>();
            visualizer.pointer_moved(100.0, 300.0, 0.0, 1_000.0, &mut IgnoreRequests);
            assert_eq!(visualizer.frame(100.0), FrameOutcome::Idle);
        }
        app.update();
        assert_eq!(*app.world().get::<Transform>(camera).unwrap(), resting);

        {
            let mut visualizer = app.world_mut().resource_mut::<Visualizer>();
            dispatch(&mut *visualizer, 200.0, PlayerEvent::Play);
            visualizer.frame(200.0);
        }
        app.update();
        let moved = app.world().get::<Transform>(camera).unwrap();
        assert!(moved.translation.y < -1.0);
    }

    #[test]
    fn test_outline_mesh_closes_the_loop() {
        let settings = RingSettings::default();
        let mesh = outline_mesh(&settings);
        assert_eq!(mesh.count_vertices(), settings.segments as usize + 1);
    }

    #[test]
    fn test_ring_transform_faces_the_track() {
        let ring = TransientRing {
            id: 0,
            kind: RingKind::Filled,
            tint: RingTint::Neutral,
            x: 12.5,
            spin: 0.0,
            visible: true,
        };
        let transform = ring_transform(&ring);
        assert_eq!(transform.translation, Vec3::new(12.5, 0.0, 0.0));
        let normal = transform.rotation * Vec3::Z;
        assert!((normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_status_title_reflects_flags() {
        let ready = StageStatus { ready: true, playing: false };
        assert_eq!(status_title("lyricscope", ready), "lyricscope (paused)");
        let playing = StageStatus { ready: true, playing: true };
        assert_eq!(status_title("lyricscope", playing), "lyricscope (playing)");
        assert_eq!(status_title("lyricscope", StageStatus::default()), "lyricscope (loading)");
    }
}
