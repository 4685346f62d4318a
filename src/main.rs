use bevy::{
    prelude::*,
    window::{ WindowPlugin, ExitCondition, PrimaryWindow, Window },
    winit::{ WinitSettings, WinitWindows },
};

use lyricscope::states::{ AppState, StartupPlugin, LoadingPlugin, StagePlugin };
use lyricscope::file::config::{ AppConfig, ConfigPlugin };
use lyricscope::file::song::{ SongTiming, SongTimingLoader };

#[cfg(not(feature = "production"))]
use lyricscope::debug::{ DebugPlugin };

fn main() {
    let mut app = App::new();
    app.add_plugins(ConfigPlugin);
    let title = app.world().resource::<AppConfig>().window.title.clone();

    app
        .add_plugins((
            #[cfg(not(feature = "production"))] DebugPlugin,
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title,
                    ..default()
                }),
                exit_condition: ExitCondition::OnPrimaryClosed,
                ..default()
            }),
            StartupPlugin,
            LoadingPlugin,
            StagePlugin,
        ))
        .insert_resource(WinitSettings::game())
        .init_asset::<SongTiming>()
        .init_asset_loader::<SongTimingLoader>()
        .init_state::<AppState>()
        .add_systems(OnEnter(AppState::InitialLoad), start_maximized)
        .run();
}

fn start_maximized(
    config: Res<AppConfig>,
    winit_windows: NonSend<WinitWindows>,
    primary_window_query: Query<Entity, With<PrimaryWindow>>,
    mut windows: Query<&mut Window>
) {
    if !config.window.maximized {
        return;
    }
    if let Ok(window_entity) = primary_window_query.single() {
        if let Some(window) = winit_windows.get_window(window_entity) {
            if !window.is_maximized() {
                if let Ok(mut window) = windows.get_mut(window_entity) {
                    window.set_maximized(true);
                }
            }
        }
    }
}
