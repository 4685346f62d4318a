use bevy::prelude::*;
use serde::{ Deserialize, Serialize };
use std::fs;
use crate::file::config::AppConfig;
use std::path::Path;
use crate::states::StartupLatch;
use crate::components::rings::RingTint;

#[derive(Resource, Debug, Clone, Deserialize, Serialize)]
pub struct Theme {
    #[serde(with = "srgb_float")]
    pub background: Color,
    #[serde(with = "srgb_float")]
    pub lyric_text: Color,
    #[serde(with = "srgb_float")]
    pub ring_neutral: Color,
    #[serde(with = "srgb_float_list")]
    pub ring_palette: Vec<Color>,
    #[serde(with = "srgb_float")]
    pub notice_background: Color,
    #[serde(with = "srgb_float")]
    pub notice_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            lyric_text: Color::srgb_u8(0x39, 0x39, 0x39),
            ring_neutral: Color::srgb_u8(0x39, 0x39, 0x39),
            ring_palette: vec![
                Color::srgb_u8(0xd7, 0x4c, 0x55),
                Color::srgb_u8(0xf4, 0x96, 0x4a),
                Color::srgb_u8(0xe9, 0xf6, 0x08),
                Color::srgb_u8(0x47, 0xc7, 0x76),
                Color::srgb_u8(0x05, 0x66, 0xd1),
                Color::srgb_u8(0xd9, 0x89, 0xef),
            ],
            notice_background: Color::srgba(0.0, 0.0, 0.0, 0.85),
            notice_text: Color::WHITE,
        }
    }
}

impl Theme {
    /// Colour of a palette slot. An empty palette degrades to the neutral colour.
    pub fn palette_color(&self, slot: usize) -> Color {
        if self.ring_palette.is_empty() {
            return self.ring_neutral;
        }
        self.ring_palette[slot % self.ring_palette.len()]
    }

    pub fn ring_color(&self, tint: RingTint) -> Color {
        match tint {
            RingTint::Palette(slot) => self.palette_color(slot),
            RingTint::Neutral => self.ring_neutral,
        }
    }
}

pub fn setup_theme(
    mut commands: Commands,
    config: Res<AppConfig>,
    mut latch: ResMut<StartupLatch>
) {
    let theme_path = config.save_directory().join(&config.saves.theme_file);

    if !Path::new(&theme_path).exists() {
        warn!("Theme file not found at '{}', creating default theme file...", theme_path.display());
        let yaml = serde_yaml
            ::to_string(&Theme::default())
            .expect("Failed to serialize default theme");
        fs::write(&theme_path, yaml).expect("Failed to write default theme file");
    }

    let content = fs
        ::read_to_string(&theme_path)
        .unwrap_or_else(|_| panic!("Failed to read theme file at: {}", theme_path.display()));

    let parsed: Theme = serde_yaml
        ::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse theme YAML: {e}"));

    commands.insert_resource(ClearColor(parsed.background));
    commands.insert_resource(parsed);
    latch.theme_loaded = true;
}

mod srgb_float {
    use bevy::prelude::Color;
    use serde::de::{ Deserializer };
    use serde::ser::{ SerializeSeq, Serializer };
    use serde::{ Deserialize };

    pub fn serialize<S>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        let srgba = color.to_srgba();
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&srgba.red)?;
        seq.serialize_element(&srgba.green)?;
        seq.serialize_element(&srgba.blue)?;
        seq.serialize_element(&srgba.alpha)?;
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color, D::Error>
        where D: Deserializer<'de>
    {
        let rgba: Vec<f32> = Vec::deserialize(deserializer)?;
        super::color_from_components(&rgba).map_err(serde::de::Error::custom)
    }
}

mod srgb_float_list {
    use bevy::prelude::Color;
    use serde::de::{ Deserializer };
    use serde::ser::{ SerializeSeq, Serializer };
    use serde::{ Deserialize };

    pub fn serialize<S>(colors: &[Color], serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        let mut seq = serializer.serialize_seq(Some(colors.len()))?;
        for color in colors {
            let srgba = color.to_srgba();
            seq.serialize_element(&[srgba.red, srgba.green, srgba.blue])?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Color>, D::Error>
        where D: Deserializer<'de>
    {
        let list: Vec<Vec<f32>> = Vec::deserialize(deserializer)?;
        list.iter()
            .map(|rgba| super::color_from_components(rgba))
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}

/// Accepts `[r, g, b]` or `[r, g, b, a]` in the 0..=1 sRGB range.
fn color_from_components(components: &[f32]) -> Result<Color, String> {
    match *components {
        [r, g, b] => Ok(Color::srgb(r, g, b)),
        [r, g, b, a] => Ok(Color::srgba(r, g, b, a)),
        _ => Err(format!("expected 3 or 4 colour components, got {}", components.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_wraps_around() {
        let theme = Theme::default();
        assert_eq!(theme.palette_color(0), theme.palette_color(6));
        assert_ne!(theme.palette_color(0), theme.palette_color(1));
    }

    #[test]
    fn test_empty_palette_falls_back_to_neutral() {
        let theme = Theme { ring_palette: Vec::new(), ..Theme::default() };
        assert_eq!(theme.palette_color(3), theme.ring_neutral);
    }

    #[test]
    fn test_ring_color_follows_tint() {
        let theme = Theme::default();
        assert_eq!(theme.ring_color(RingTint::Palette(7)), theme.ring_palette[1]);
        assert_eq!(theme.ring_color(RingTint::Neutral), theme.ring_neutral);
    }

    #[test]
    fn test_theme_yaml_accepts_rgb_and_rgba() {
        let yaml = "
background: [1.0, 1.0, 1.0]
lyric_text: [0.2, 0.2, 0.2, 1.0]
ring_neutral: [0.2, 0.2, 0.2]
ring_palette: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
notice_background: [0.0, 0.0, 0.0, 0.5]
notice_text: [1.0, 1.0, 1.0]
";
        let theme: Theme = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(theme.ring_palette.len(), 2);
        assert_eq!(theme.notice_background.alpha(), 0.5);
    }

    #[test]
    fn test_bad_component_count_is_rejected() {
        assert!(color_from_components(&[1.0, 0.0]).is_err());
    }
}
