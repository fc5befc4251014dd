use crate::anchor::{compute_placement, Anchor, ImageSize, Placement, TextSize};
use crate::capture_date::{resolve_capture_date, CaptureDate};
use crate::color::TextColor;
use crate::error::StampError;
use crate::exif_reader::read_exif;
use crate::typeface::Typeface;
use image::{DynamicImage, GrayImage, ImageError, ImageReader, Rgba, RgbaImage};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_OUTLINE_WIDTH: u32 = 2;
pub const DEFAULT_OUTLINE_COLOR: TextColor = TextColor::black();
pub const MAX_OUTLINE_WIDTH: u32 = 16;

#[derive(Debug)]
pub struct StampStyle {
    pub typeface: Typeface,
    pub color: TextColor,
    pub anchor: Anchor,
    pub margin: u32,
    pub outline_width: u32,
    pub outline_color: TextColor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Stamped {
        source: PathBuf,
        output: PathBuf,
        date: CaptureDate,
    },
    Planned {
        source: PathBuf,
        output: PathBuf,
        date: CaptureDate,
    },
    Skipped {
        source: PathBuf,
        reason: String,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &Path {
        match self {
            FileOutcome::Stamped { source, .. }
            | FileOutcome::Planned { source, .. }
            | FileOutcome::Skipped { source, .. } => source,
        }
    }

    pub fn is_processed(&self) -> bool {
        !matches!(self, FileOutcome::Skipped { .. })
    }
}

/// Stamps one file into `output_dir`. Failures are logged and reported as `Skipped`.
pub fn stamp_file(path: &Path, output_dir: &Path, style: &StampStyle) -> FileOutcome {
    match try_stamp_file(path, output_dir, style) {
        Ok((output, date)) => {
            info!(
                source = %path.display(),
                output = %output.display(),
                date = %date,
                "stamped"
            );
            FileOutcome::Stamped {
                source: path.to_path_buf(),
                output,
                date,
            }
        }
        Err(err) => skipped(path, err),
    }
}

pub fn plan_file(path: &Path, output_dir: &Path) -> FileOutcome {
    let planned = output_path(path, output_dir).and_then(|output| {
        let (width, height) = open_image(path)?
            .into_dimensions()
            .map_err(StampError::Decode)?;
        debug!(source = %path.display(), width, height, "header readable");
        let date = resolve_capture_date(read_exif(path).as_ref(), path)
            .ok_or(StampError::NoCaptureDate)?;
        Ok((output, date))
    });

    match planned {
        Ok((output, date)) => FileOutcome::Planned {
            source: path.to_path_buf(),
            output,
            date,
        },
        Err(err) => skipped(path, err),
    }
}

fn skipped(path: &Path, err: StampError) -> FileOutcome {
    warn!(source = %path.display(), reason = %err, "skipped");
    FileOutcome::Skipped {
        source: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn try_stamp_file(
    path: &Path,
    output_dir: &Path,
    style: &StampStyle,
) -> Result<(PathBuf, CaptureDate), StampError> {
    let output = output_path(path, output_dir)?;
    let decoded = decode(path)?;
    let exif = read_exif(path);
    let date = resolve_capture_date(exif.as_ref(), path).ok_or(StampError::NoCaptureDate)?;
    debug!(source = %path.display(), date_source = ?date.source, "capture date resolved");

    let stamped = stamp_image(decoded.to_rgba8(), &date.label(), style);
    DynamicImage::ImageRgba8(stamped)
        .to_rgb8()
        .save(&output)
        .map_err(|source| StampError::Encode {
            path: output.clone(),
            source,
        })?;

    Ok((output, date))
}

fn output_path(path: &Path, output_dir: &Path) -> Result<PathBuf, StampError> {
    let name = path
        .file_name()
        .ok_or_else(|| StampError::MissingFileName(path.to_path_buf()))?;
    Ok(output_dir.join(name))
}

fn open_image(path: &Path) -> Result<ImageReader<BufReader<File>>, StampError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| StampError::Decode(ImageError::IoError(err)))
}

fn decode(path: &Path) -> Result<DynamicImage, StampError> {
    open_image(path)?.decode().map_err(StampError::Decode)
}

pub fn stamp_image(mut image: RgbaImage, label: &str, style: &StampStyle) -> RgbaImage {
    let overlay = render_label(label, style);
    let placement = compute_placement(
        ImageSize {
            width: image.width(),
            height: image.height(),
        },
        TextSize {
            width: overlay.width(),
            height: overlay.height(),
        },
        style.anchor,
        style.margin,
    );
    composite(&mut image, &overlay, placement);
    image
}

/// Renders the label with its outline on a transparent canvas sized to the outlined text box.
pub fn render_label(label: &str, style: &StampStyle) -> RgbaImage {
    let pad = style.outline_width.min(MAX_OUTLINE_WIDTH);
    let (text_w, text_h) = style.typeface.measure(label);
    let width = text_w.saturating_add(2 * pad).max(1);
    let height = text_h.saturating_add(2 * pad).max(1);

    let mut fill = GrayImage::new(width, height);
    style
        .typeface
        .rasterize(label, &mut fill, pad as i32, pad as i32);
    let outline = dilate(&fill, pad);

    let mut overlay = RgbaImage::new(width, height);
    for (x, y, pixel) in overlay.enumerate_pixels_mut() {
        let stroke = style.outline_color.with_alpha(outline.get_pixel(x, y)[0]);
        let body = style.color.with_alpha(fill.get_pixel(x, y)[0]);
        *pixel = blend_pixels(blend_pixels(Rgba([0, 0, 0, 0]), stroke), body);
    }
    overlay
}

fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }

    let r = radius as i32;
    let offsets: Vec<(i32, i32)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let (width, height) = (mask.width() as i32, mask.height() as i32);
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (x, y) = (x as i32, y as i32);
        let value = offsets
            .iter()
            .filter_map(|(dx, dy)| {
                let (sx, sy) = (x - dx, y - dy);
                (sx >= 0 && sy >= 0 && sx < width && sy < height)
                    .then(|| mask.get_pixel(sx as u32, sy as u32)[0])
            })
            .max()
            .unwrap_or(0);
        pixel[0] = value;
    }
    out
}

pub fn composite(target: &mut RgbaImage, overlay: &RgbaImage, at: Placement) {
    let target_w = target.width() as i64;
    let target_h = target.height() as i64;
    let x_start = i64::from(at.x).max(0);
    let y_start = i64::from(at.y).max(0);
    let x_end = (i64::from(at.x) + overlay.width() as i64).min(target_w);
    let y_end = (i64::from(at.y) + overlay.height() as i64).min(target_h);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let ox = (tx - i64::from(at.x)) as u32;
            let oy = (ty - i64::from(at.y)) as u32;
            let top = *overlay.get_pixel(ox, oy);
            if top[3] == 0 {
                continue;
            }
            let bottom = *target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(bottom, top));
        }
    }
}

// Porter-Duff "over".
fn blend_pixels(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let value = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (value * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(top[0], bottom[0]),
        channel(top[1], bottom[1]),
        channel(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
