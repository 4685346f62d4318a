use serde::Deserialize;
use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "lyricscope.cfg";

#[derive(Debug, Deserialize, Resource)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub paths: PathConfig,
    pub saves: SaveConfig,
}

#[derive(Debug, Deserialize, Resource)]
pub struct WindowConfig {
    pub title: String,
    #[serde(default)]
    pub maximized: bool,
}

#[derive(Debug, Deserialize, Resource)]
pub struct PathConfig {
    /// Folder under `assets/` holding `song.timing` and `song.ogg`.
    pub song_directory: String,
    pub font: String,
    /// Bold face used for nouns. Falls back to a faux-bold pass over `font`.
    #[serde(default)]
    pub emphasis_font: Option<String>,
}

#[derive(Debug, Deserialize, Resource)]
pub struct SaveConfig {
    pub directory: String,
    pub theme_file: String,
    pub settings_file: String,
}

impl AppConfig {
    pub fn save_directory(&self) -> PathBuf {
        PathBuf::from(&self.saves.directory)
    }

    /// Asset-relative path of the timing file.
    pub fn timing_asset_path(&self) -> PathBuf {
        Path::new(&self.paths.song_directory).join("song.timing")
    }

    /// Filesystem path of the audio stream, which kira opens directly.
    pub fn audio_file_path(&self) -> PathBuf {
        Path::new("assets").join(&self.paths.song_directory).join("song.ogg")
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        let mut config = load_config(CONFIG_FILE);
        let save_path = get_save_directory(&config.saves.directory);
        if !save_path.exists() {
            fs::create_dir_all(&save_path).expect("Failed to create save directory");
        }
        config.saves.directory = save_path.to_string_lossy().into_owned();
        app.insert_resource(config);
    }
}

fn load_config(path: &str) -> AppConfig {
    let content = fs
        ::read_to_string(path)
        .unwrap_or_else(|_| panic!("Failed to read config file at: {path}"));

    parse_config(&content)
}

fn parse_config(content: &str) -> AppConfig {
    serde_yaml::from_str(content).unwrap_or_else(|e| panic!("Failed to parse YAML: {e}"))
}

fn get_save_directory(save_dir: &str) -> PathBuf {
    let mut path = dirs::config_dir().expect("Could not find local config directory");
    path.push(save_dir);
    path
}
