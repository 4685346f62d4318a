use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use crate::states::StartupLatch;
use crate::file::config::AppConfig;

/// Tunables for the stage. Every value here was picked by eye, so all of them
/// live in the user's settings file rather than in code.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeline: TimelineSettings,
    pub scrub: ScrubSettings,
    pub rings: RingSettings,
    pub camera: CameraSettings,
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// World units per millisecond of playback.
    pub speed_factor: f64,
    /// Where a line leader sits when its start time equals the progress.
    pub lead_offset: f64,
    pub visibility_window_ms: f64,
    /// Number of distinct y/z slots lines cycle through.
    pub line_cycle: usize,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            speed_factor: 0.005,
            lead_offset: 10.0,
            visibility_window_ms: 200_000.0,
            line_cycle: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubSettings {
    pub click_threshold_ms: f64,
    /// Playback milliseconds covered by a drag across the full viewport width.
    pub span_ms: f64,
    pub drift_tolerance_ms: f64,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            click_threshold_ms: 200.0,
            span_ms: 30_000.0,
            drift_tolerance_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSettings {
    pub spawn_x: f64,
    pub cull_x: f64,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
    /// Spin speed in multiples of PI radians per second.
    pub spin_per_second: f64,
}

impl Default for RingSettings {
    fn default() -> Self {
        Self {
            spawn_x: 15.0,
            cull_x: -100.0,
            inner_radius: 4.9,
            outer_radius: 5.0,
            segments: 5,
            spin_per_second: -0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub x: f32,
    pub distance: f32,
    pub max_tilt_degrees: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            x: -1.2,
            distance: 5.0,
            max_tilt_degrees: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the audio host reports an authoritative position for resync.
    pub resync_interval_ms: f64,
    /// A seek counts as landed once the reported position is this close to the target.
    pub seek_settle_ms: f64,
    pub seek_timeout_ms: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            resync_interval_ms: 1_000.0,
            seek_settle_ms: 250.0,
            seek_timeout_ms: 500.0,
        }
    }
}

pub fn load_or_create_settings(path: &PathBuf) -> Settings {
    if !path.exists() {
        warn!("Settings file not found at '{}', creating default...", path.display());
        let default = Settings::default();
        match serde_yaml::to_string(&default) {
            Ok(yaml) => {
                if let Err(e) = fs::write(path, yaml) {
                    error!("Failed to write default settings file: {e}");
                }
            }
            Err(e) => error!("Failed to serialize default settings: {e}"),
        }
        return default;
    }

    let content = fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to read settings file at '{}'", path.display()));

    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse settings YAML: {e}"))
}

pub fn setup_settings(mut commands: Commands, config: Res<AppConfig>, mut latch: ResMut<StartupLatch>) {
    let path = config.save_directory().join(&config.saves.settings_file);

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).expect("Failed to create save directory");
        }
    }

    let settings = load_or_create_settings(&path);
    commands.insert_resource(settings);
    latch.settings_loaded = true;
}
