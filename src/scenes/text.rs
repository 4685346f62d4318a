use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use bevy::asset::RenderAssetUsages;
use bevy::color::ColorToPacked;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use thiserror::Error;

use crate::file::config::AppConfig;

const FONT_SIZE: f32 = 64.0;
const MARGIN: f32 = 4.0;
const REGULAR_SCALE: f32 = 0.8;
const MAX_TEXTURE_SIDE: u32 = 16_384;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a usable font")]
    InvalidFont { path: PathBuf },
    #[error("text texture of {width}x{height} exceeds the 16384px limit")]
    TooLarge { width: u32, height: u32 },
}

/// RGBA8 pixels of one rendered word.
#[derive(Debug, Clone)]
pub struct RasterizedText {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterizedText {
    pub fn into_image(self) -> Image {
        Image::new(
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.rgba,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::default(),
        )
    }
}

/// Texture size for a word of `chars` characters: one glyph cell per char.
pub fn texture_size(chars: usize) -> Result<(u32, u32), RasterizeError> {
    let cell = (FONT_SIZE + MARGIN) as u64;
    let width = (chars.max(1) as u64).saturating_mul(cell);
    let height = cell;
    if width > MAX_TEXTURE_SIDE as u64 {
        return Err(RasterizeError::TooLarge {
            width: width.min(u32::MAX as u64) as u32,
            height: height as u32,
        });
    }
    Ok((width as u32, height as u32))
}

/// Draws lyric words into textures. Nouns use the emphasis face at full
/// size; everything else uses the regular face at a smaller size.
#[derive(Resource)]
pub struct TextRasterizer {
    regular: FontVec,
    emphasis: Option<FontVec>,
}

fn load_font(path: &Path) -> Result<FontVec, RasterizeError> {
    let bytes = fs::read(path).map_err(|source| RasterizeError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|_| RasterizeError::InvalidFont {
        path: path.to_path_buf(),
    })
}

impl TextRasterizer {
    pub fn load(config: &AppConfig) -> Result<Self, RasterizeError> {
        let regular = load_font(Path::new(&config.paths.font))?;
        let emphasis = match &config.paths.emphasis_font {
            Some(path) => Some(load_font(Path::new(path))?),
            None => None,
        };
        Ok(Self { regular, emphasis })
    }

    pub fn rasterize(&self, text: &str, emphasized: bool, color: Color) -> Result<RasterizedText, RasterizeError> {
        let (width, height) = texture_size(text.chars().count())?;
        let mut coverage = vec![0f32; (width * height) as usize];

        let (font, size, faux_bold) = match (emphasized, &self.emphasis) {
            (true, Some(bold)) => (bold, FONT_SIZE, false),
            (true, None) => (&self.regular, FONT_SIZE, true),
            (false, _) => (&self.regular, FONT_SIZE * REGULAR_SCALE, false),
        };
        let offsets: &[f32] = if faux_bold { &[0.0, 1.0] } else { &[0.0] };
        for &offset in offsets {
            draw_line(font, PxScale::from(size), text, offset, width, height, &mut coverage);
        }

        let [r, g, b, a] = color.to_srgba().to_u8_array();
        let mut rgba = Vec::with_capacity(coverage.len() * 4);
        for value in coverage {
            let alpha = (value.clamp(0.0, 1.0) * a as f32) as u8;
            rgba.extend_from_slice(&[r, g, b, alpha]);
        }

        Ok(RasterizedText { width, height, rgba })
    }
}

fn draw_line(
    font: &FontVec,
    scale: PxScale,
    text: &str,
    x_offset: f32,
    width: u32,
    height: u32,
    coverage: &mut [f32],
) {
    let scaled = font.as_scaled(scale);
    let mut caret = x_offset;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(caret, FONT_SIZE));
        caret += scaled.h_advance(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, value| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                return;
            }
            let idx = (py as u64 * width as u64 + px as u64) as usize;
            coverage[idx] = coverage[idx].max(value);
        });
    }
}
