use bevy::{
    prelude::*,
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}
};

use crate::file::theme::Theme;
use crate::sync::progress::PlaybackProgress;
use crate::sync::visualizer::Visualizer;

#[derive(Component)]
pub struct ProgressHudText;

pub fn spawn_progress_hud(mut commands: Commands, theme: Res<Theme>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(20.0),
                top: Val::Px(20.0),
                padding: UiRect::all(Val::Px(8.0)),
                ..default()
            },
            BackgroundColor(theme.notice_background),
        ))
        .with_child((
            Text::new(""),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            TextColor(theme.notice_text),
            ProgressHudText,
        ));
}

fn slot(index: Option<usize>) -> String {
    index.map_or_else(|| "-".to_string(), |i| i.to_string())
}

pub fn describe_progress(progress: &PlaybackProgress, chord: Option<&str>, fps: Option<f64>) -> String {
    let fps = fps.map_or_else(|| "-".to_string(), |value| format!("{value:.0}"));
    format!(
        "FPS: {fps}\nposition: {:.0}ms\nbeat: {}\nchord: {}\nchorus: {}\nphrase: {}\nword: {}\nchar: {}\nvolume: {:.2}",
        progress.position,
        slot(progress.beat),
        chord.unwrap_or("-"),
        slot(progress.chorus),
        slot(progress.phrase),
        slot(progress.word),
        slot(progress.char),
        progress.volume,
    )
}

pub fn update_progress_hud(
    diagnostics: Res<DiagnosticsStore>,
    visualizer: Res<Visualizer>,
    mut query: Query<&mut Text, With<ProgressHudText>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed());
    let progress = visualizer.progress();
    let chord = visualizer
        .source()
        .and_then(|source| source.find_chord(progress.position))
        .map(|chord| chord.name.as_str());
    let description = describe_progress(progress, chord, fps);

    for mut text in &mut query {
        if text.0 != description {
            text.0 = description.clone();
        }
    }
}
