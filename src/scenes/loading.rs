use std::sync::Arc;

use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::audio::PlaybackHost;
use crate::file::config::AppConfig;
use crate::file::settings::Settings;
use crate::file::song::SongTiming;
use crate::file::theme::Theme;
use crate::scenes::notice::StageFailure;
use crate::states::AppState;
use crate::sync::clock::WallClock;
use crate::sync::events::{dispatch, PlayerEvent};
use crate::sync::visualizer::Visualizer;

#[derive(Resource, Default)]
pub struct StageAssets {
    timing_handle: Handle<SongTiming>,
}

#[derive(Component)]
pub struct LoadingUI;

pub fn setup_loading_ui(mut commands: Commands, theme: Res<Theme>) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(theme.background),
            LoadingUI,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Loading..."),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
                TextColor(theme.lyric_text),
            ));
        });
}

pub fn cleanup_loading_ui(mut commands: Commands, query: Query<Entity, With<LoadingUI>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

pub fn start_loading_timing(
    mut commands: Commands,
    config: Res<AppConfig>,
    asset_server: Res<AssetServer>,
) {
    let timing_path = config.timing_asset_path();
    info!("Timing path {}", timing_path.display());

    let timing_handle: Handle<SongTiming> = asset_server.load(timing_path);
    commands.insert_resource(StageAssets { timing_handle });
}

/// Kira handles must stay on the main thread, hence the exclusive system.
pub fn open_playback(world: &mut World) {
    let settings = world.resource::<Settings>().playback.clone();
    let audio_path = world.resource::<AppConfig>().audio_file_path();
    info!("Audio path {}", audio_path.display());

    let mut host = PlaybackHost::new(settings);
    if let Err(err) = host.open(&audio_path) {
        error!("{err}; the stage will run without sound");
    }
    world.insert_non_send_resource(host);
}

pub fn check_timing_loaded(
    stage_assets: Res<StageAssets>,
    asset_server: Res<AssetServer>,
    mut timings: ResMut<Assets<SongTiming>>,
    host: NonSend<PlaybackHost>,
    clock: Res<WallClock>,
    mut visualizer: ResMut<Visualizer>,
    mut failure: ResMut<StageFailure>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if failure.is_failed() {
        next_state.set(AppState::Failed);
        return;
    }

    match asset_server.load_state(&stage_assets.timing_handle) {
        LoadState::Failed(err) => {
            error!("Failed to load timing data: {err}");
            failure.report(format!("Could not load timing data: {err}"));
            next_state.set(AppState::Failed);
        }
        LoadState::Loaded => {
            let Some(mut timing) = timings.remove(&stage_assets.timing_handle) else {
                return;
            };
            if let Some(duration) = host.duration_ms() {
                timing.fill_duration(duration);
            }
            dispatch(&mut *visualizer, clock.now_ms(), PlayerEvent::VideoReady(Arc::new(timing)));
            next_state.set(AppState::Stage);
        }
        _ => {}
    }
}
