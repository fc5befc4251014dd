use crate::builtin_font::BitmapFace;
use ab_glyph::{point, Font, FontVec, GlyphId, OutlinedGlyph, PxScale, Rect, ScaleFont};
use image::{GrayImage, Luma};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/arial.ttf",
    "C:/Windows/Fonts/msyh.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

pub fn default_font_candidates() -> Vec<PathBuf> {
    SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from).collect()
}

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("could not read font file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a usable TrueType/OpenType font: {}", .0.display())]
    Invalid(PathBuf),
}

pub enum Typeface {
    Outline {
        font: FontVec,
        scale: PxScale,
        origin: PathBuf,
    },
    Builtin(BitmapFace),
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::Outline { scale, origin, .. } => f
                .debug_struct("Outline")
                .field("origin", origin)
                .field("scale", &(scale.x, scale.y))
                .finish(),
            Typeface::Builtin(face) => f.debug_tuple("Builtin").field(face).finish(),
        }
    }
}

impl Typeface {
    pub fn resolve(custom: Option<&Path>, candidates: &[PathBuf], font_size: f32) -> Self {
        if let Some(path) = custom {
            match Self::load(path, font_size) {
                Ok(face) => return face,
                Err(err) => warn!(
                    font = %path.display(),
                    error = %err,
                    "failed to load font, falling back to system fonts"
                ),
            }
        }

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load(candidate, font_size) {
                Ok(face) => return face,
                Err(err) => debug!(font = %candidate.display(), error = %err, "skipping font candidate"),
            }
        }

        warn!("no outline font available, using the built-in bitmap font");
        Typeface::builtin(font_size)
    }

    pub fn load(path: &Path, font_size: f32) -> Result<Self, FontLoadError> {
        let data = fs::read(path).map_err(|source| FontLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|_| FontLoadError::Invalid(path.to_path_buf()))?;
        let scale = em_scale(&font, font_size);
        Ok(Typeface::Outline {
            font,
            scale,
            origin: path.to_path_buf(),
        })
    }

    pub fn builtin(font_size: f32) -> Self {
        Typeface::Builtin(BitmapFace::for_size(font_size))
    }

    pub fn describe(&self) -> String {
        match self {
            Typeface::Outline { origin, .. } => origin.display().to_string(),
            Typeface::Builtin(_) => "built-in bitmap font".to_string(),
        }
    }

    /// Size of the text's ink box, without any outline.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            Typeface::Outline { font, scale, .. } => {
                match ink_bounds(&glyph_run(font, *scale, text)) {
                    Some(ink) => (
                        (ink.max.x - ink.min.x).max(0.0) as u32,
                        (ink.max.y - ink.min.y).max(0.0) as u32,
                    ),
                    None => (0, 0),
                }
            }
            Typeface::Builtin(face) => face.measure(text),
        }
    }

    /// Accumulates glyph coverage into `mask` with the ink box's top-left at `(x, y)`.
    pub fn rasterize(&self, text: &str, mask: &mut GrayImage, x: i32, y: i32) {
        match self {
            Typeface::Outline { font, scale, .. } => {
                let glyphs = glyph_run(font, *scale, text);
                let Some(ink) = ink_bounds(&glyphs) else {
                    return;
                };
                for glyph in &glyphs {
                    let bounds = glyph.px_bounds();
                    let left = x + (bounds.min.x - ink.min.x) as i32;
                    let top = y + (bounds.min.y - ink.min.y) as i32;
                    glyph.draw(|gx, gy, coverage| {
                        accumulate(mask, left + gx as i32, top + gy as i32, coverage);
                    });
                }
            }
            Typeface::Builtin(face) => face.rasterize(text, mask, x, y),
        }
    }
}

fn glyph_run(font: &FontVec, scale: PxScale, text: &str) -> Vec<OutlinedGlyph> {
    let scaled = font.as_scaled(scale);
    let mut cursor = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    let mut glyphs = Vec::new();

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(cursor, scaled.ascent()));
        if let Some(outlined) = font.outline_glyph(glyph) {
            glyphs.push(outlined);
        }
        cursor += scaled.h_advance(id);
        prev = Some(id);
    }
    glyphs
}

// px_bounds are whole pixels, so the union is too.
fn ink_bounds(glyphs: &[OutlinedGlyph]) -> Option<Rect> {
    glyphs
        .iter()
        .map(OutlinedGlyph::px_bounds)
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        })
}

// Font sizes are em sizes in pixels; ab_glyph scales by ascent-to-descent height.
fn em_scale(font: &FontVec, font_size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(font_size * font.height_unscaled() / units),
        _ => PxScale::from(font_size),
    }
}

fn accumulate(mask: &mut GrayImage, x: i32, y: i32, coverage: f32) {
    if x < 0 || y < 0 || x >= mask.width() as i32 || y >= mask.height() as i32 {
        return;
    }
    let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
    let pixel = mask.get_pixel_mut(x as u32, y as u32);
    if value > pixel[0] {
        *pixel = Luma([value]);
    }
}
