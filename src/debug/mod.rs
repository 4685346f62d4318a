use bevy::{ prelude::*, diagnostic::{ FrameTimeDiagnosticsPlugin } };

use crate::states::AppState;

pub mod progress_hud;

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(FrameTimeDiagnosticsPlugin::default())
            .add_systems(OnEnter(AppState::Stage), progress_hud::spawn_progress_hud)
            .add_systems(
                Update,
                progress_hud::update_progress_hud.run_if(in_state(AppState::Stage)),
            );
    }
}
