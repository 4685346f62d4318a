use bevy::prelude::*;

use crate::file::settings::Settings;
use crate::sync::visualizer::CameraPose;

pub mod loading;
pub mod notice;
pub mod stage;
pub mod text;

pub use stage::{LyricWordMesh, RingMesh, StageSystemsPlugin};
pub use text::{RasterizeError, TextRasterizer};

#[derive(Component)]
pub struct StageCamera;

pub fn setup_camera(mut commands: Commands, settings: Res<Settings>) {
    let camera = &settings.camera;
    let pose = CameraPose::resting(camera);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Transform::from_xyz(pose.x, pose.y, pose.z).looking_at(Vec3::ZERO, Vec3::Y),
        StageCamera,
    ));
}
