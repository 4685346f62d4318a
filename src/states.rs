use bevy::prelude::*;

use crate::file::settings::setup_settings;
use crate::file::theme::setup_theme;
use crate::scenes::loading::{
    check_timing_loaded, cleanup_loading_ui, open_playback, setup_loading_ui, start_loading_timing,
};
use crate::scenes::notice::{setup_failure_notice, StageFailure};
use crate::scenes::stage::{prepare_stage, StageSystemsPlugin};
use crate::scenes::setup_camera;

#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    #[default]
    InitialLoad,
    /// Fonts, timing data and the audio stream are being prepared.
    Loading,
    Stage,
    /// A resource needed to draw the stage could not be produced.
    Failed,
}

// Latches gate a state transition on several independent systems finishing.

#[derive(Resource, Default)]
pub struct StartupLatch {
    pub settings_loaded: bool,
    pub theme_loaded: bool,
}

pub fn check_startup_complete(
    latch: Res<StartupLatch>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if latch.settings_loaded && latch.theme_loaded {
        next_state.set(AppState::Loading);
    }
}

pub struct StartupPlugin;

impl Plugin for StartupPlugin {
    fn build(&self, app: &mut App) {
        app
        .insert_resource(StartupLatch::default())
        .add_systems(OnEnter(AppState::InitialLoad), (setup_theme, setup_settings))
        .add_systems(Update, check_startup_complete.run_if(in_state(AppState::InitialLoad)))
        ;
    }
}

pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app
        .add_systems(
            OnEnter(AppState::Loading),
            (setup_camera, setup_loading_ui, prepare_stage, start_loading_timing, open_playback),
        )
        .add_systems(Update, check_timing_loaded.run_if(in_state(AppState::Loading)))
        .add_systems(OnExit(AppState::Loading), cleanup_loading_ui)
        ;
    }
}

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app
        .add_plugins(StageSystemsPlugin)
        .init_resource::<StageFailure>()
        .add_systems(OnEnter(AppState::Failed), setup_failure_notice)
        ;
    }
}
