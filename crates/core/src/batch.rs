use crate::anchor::Anchor;
use crate::color::TextColor;
use crate::config::{DEFAULT_FONT_SIZE, DEFAULT_MARGIN};
use crate::error::StampError;
use crate::scanner::{collect_image_files, prepare_output_dir, resolve_layout, ScanStats};
use crate::stamp::{
    plan_file, stamp_file, FileOutcome, StampStyle, DEFAULT_OUTLINE_COLOR, DEFAULT_OUTLINE_WIDTH,
    MAX_OUTLINE_WIDTH,
};
use crate::typeface::{default_font_candidates, Typeface};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input: PathBuf,
    pub recursive: bool,
    pub font_size: u32,
    pub color: TextColor,
    pub anchor: Anchor,
    pub margin: u32,
    pub font_path: Option<PathBuf>,
    pub font_candidates: Vec<PathBuf>,
    pub outline_width: u32,
    pub outline_color: TextColor,
    pub dry_run: bool,
    pub jobs: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            recursive: false,
            font_size: DEFAULT_FONT_SIZE,
            color: TextColor::white(),
            anchor: Anchor::BottomRight,
            margin: DEFAULT_MARGIN,
            font_path: None,
            font_candidates: default_font_candidates(),
            outline_width: DEFAULT_OUTLINE_WIDTH,
            outline_color: DEFAULT_OUTLINE_COLOR,
            dry_run: false,
            jobs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub scan: ScanStats,
    pub outcomes: Vec<FileOutcome>,
}

pub fn run_batch(options: &BatchOptions) -> Result<BatchReport, StampError> {
    let layout = resolve_layout(&options.input)?;
    if !options.dry_run {
        prepare_output_dir(&layout)?;
    }

    let outline_width = if options.outline_width > MAX_OUTLINE_WIDTH {
        warn!(
            requested = options.outline_width,
            max = MAX_OUTLINE_WIDTH,
            "outline width capped"
        );
        MAX_OUTLINE_WIDTH
    } else {
        options.outline_width
    };

    let style = StampStyle {
        typeface: Typeface::resolve(
            options.font_path.as_deref(),
            &options.font_candidates,
            options.font_size as f32,
        ),
        color: options.color,
        anchor: options.anchor,
        margin: options.margin,
        outline_width,
        outline_color: options.outline_color,
    };
    debug!(font = %style.typeface.describe(), "font resolved");

    let mut scan = ScanStats::default();
    let files = collect_image_files(&layout.source_dir, options.recursive, &mut scan)?;
    debug!(?scan, "scan finished");

    let mut report = BatchReport {
        source_dir: layout.source_dir.clone(),
        output_dir: layout.output_dir.clone(),
        dry_run: options.dry_run,
        total: files.len(),
        processed: 0,
        skipped: 0,
        scan,
        outcomes: Vec::new(),
    };

    if files.is_empty() {
        info!("no images found to process");
        return Ok(report);
    }

    info!(
        source = %layout.source_dir.display(),
        output = %layout.output_dir.display(),
        count = files.len(),
        "processing images"
    );

    let process = |path: &PathBuf| -> FileOutcome {
        if options.dry_run {
            plan_file(path, &layout.output_dir)
        } else {
            stamp_file(path, &layout.output_dir, &style)
        }
    };

    report.outcomes = match options.jobs {
        Some(1) => files.iter().map(process).collect(),
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()?
            .install(|| files.par_iter().map(process).collect()),
        None => files.par_iter().map(process).collect(),
    };

    report.processed = report
        .outcomes
        .iter()
        .filter(|outcome| outcome.is_processed())
        .count();
    report.skipped = report.total - report.processed;
    Ok(report)
}

impl BatchReport {
    pub fn skipped_files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FileOutcome::Skipped { source, reason } => Some((source.as_path(), reason.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_date::DateSource;
    use crate::exif_reader::tests::{ascii, tiff_bytes};
    use exif::Tag;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn options(input: &Path) -> BatchOptions {
        BatchOptions {
            input: input.to_path_buf(),
            font_candidates: Vec::new(),
            jobs: Some(1),
            ..BatchOptions::default()
        }
    }

    fn write_png(path: &Path) {
        RgbImage::from_pixel(160, 90, Rgb([40, 80, 120]))
            .save(path)
            .expect("write png");
    }

    // Splices an APP1 EXIF segment right after the JPEG SOI marker.
    fn write_jpeg_with_exif(path: &Path, date_time_original: &str) {
        let mut jpeg = Vec::new();
        RgbImage::from_pixel(160, 90, Rgb([200, 200, 200]))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .expect("encode jpeg");

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend(tiff_bytes(&[ascii(Tag::DateTimeOriginal, date_time_original)]));
        let segment_len = u16::try_from(app1.len() + 2).expect("segment fits");

        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend(segment_len.to_be_bytes());
        out.extend(app1);
        out.extend(&jpeg[2..]);
        fs::write(path, out).expect("write jpeg");
    }

    #[test]
    fn stamps_every_image_and_ignores_other_files() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        write_jpeg_with_exif(&root.join("beach.jpg"), "2023:07:15 10:30:00");
        write_png(&root.join("city.png"));
        RgbImage::from_pixel(120, 80, Rgb([0, 0, 0]))
            .save(root.join("night.bmp"))
            .expect("write bmp");
        fs::write(root.join("readme.txt"), b"not an image").expect("write txt");

        let report = run_batch(&options(root)).expect("run");
        assert_eq!((report.processed, report.total), (3, 3));

        let mut written: Vec<String> = fs::read_dir(root.join("_watermark"))
            .expect("read output")
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        written.sort();
        assert_eq!(written, vec!["beach.jpg", "city.png", "night.bmp"]);

        let FileOutcome::Stamped { date, .. } = &report.outcomes[0] else {
            panic!("beach.jpg should be stamped: {:?}", report.outcomes[0]);
        };
        assert_eq!(date.label(), "2023-07-15");
        assert_eq!(date.source, DateSource::ExifDateTimeOriginal);
    }

    #[test]
    fn rerun_does_not_pick_up_generated_files() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("a.png"));

        let first = run_batch(&BatchOptions {
            recursive: true,
            ..options(temp.path())
        })
        .expect("first run");
        let second = run_batch(&BatchOptions {
            recursive: true,
            ..options(temp.path())
        })
        .expect("second run");
        assert_eq!(first.total, 1);
        assert_eq!(second.total, 1);
        assert_eq!(second.scan.skipped_output_dir, 1);
    }

    #[test]
    fn missing_root_is_fatal_and_creates_nothing() {
        let temp = tempdir().expect("tempdir");
        let err = run_batch(&options(&temp.path().join("absent"))).expect_err("must fail");
        assert!(matches!(err, StampError::PathNotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_directory_only_creates_output_dir() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("notes.txt"), b"hello").expect("write");

        let report = run_batch(&options(temp.path())).expect("run");
        assert_eq!(report.total, 0);
        assert_eq!(report.processed, 0);
        assert!(report.outcomes.is_empty());
        let output = temp.path().join("_watermark");
        assert!(output.is_dir());
        assert_eq!(fs::read_dir(&output).expect("read").count(), 0);
    }

    #[test]
    fn single_file_input_processes_whole_parent_directory() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("a.png"));
        write_png(&temp.path().join("b.png"));

        let report = run_batch(&options(&temp.path().join("a.png"))).expect("run");
        assert_eq!(report.source_dir, temp.path());
        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 2);
    }

    #[test]
    fn corrupt_image_is_skipped_without_aborting() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("good.png"));
        fs::write(temp.path().join("bad.jpg"), b"truncated").expect("write");

        let report = run_batch(&options(temp.path())).expect("run");
        assert_eq!(report.total, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        let skipped: Vec<_> = report.skipped_files().collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].0.ends_with("bad.jpg"));
        assert!(temp.path().join("_watermark/good.png").exists());
        assert!(!temp.path().join("_watermark/bad.jpg").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("a.png"));

        let report = run_batch(&BatchOptions {
            dry_run: true,
            ..options(temp.path())
        })
        .expect("run");
        assert_eq!(report.processed, 1);
        assert!(matches!(report.outcomes[0], FileOutcome::Planned { .. }));
        assert!(!temp.path().join("_watermark").exists());
    }

    #[test]
    fn dry_run_counts_match_a_real_run() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("good.png"));
        fs::write(temp.path().join("bad.jpg"), b"truncated").expect("write");

        let planned = run_batch(&BatchOptions {
            dry_run: true,
            ..options(temp.path())
        })
        .expect("dry run");
        let real = run_batch(&options(temp.path())).expect("run");
        assert_eq!((planned.processed, planned.skipped), (1, 1));
        assert_eq!(
            (planned.processed, planned.skipped),
            (real.processed, real.skipped)
        );
    }

    #[test]
    fn oversized_outline_width_still_stamps() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("a.png"));

        let report = run_batch(&BatchOptions {
            outline_width: u32::MAX,
            ..options(temp.path())
        })
        .expect("run");
        assert_eq!(report.processed, 1);
    }

    #[test]
    fn parallel_run_keeps_input_order() {
        let temp = tempdir().expect("tempdir");
        for name in ["c.png", "a.png", "b.png"] {
            write_png(&temp.path().join(name));
        }

        let report = run_batch(&BatchOptions {
            jobs: Some(3),
            ..options(temp.path())
        })
        .expect("run");
        let order: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.source().file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(order, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(report.processed, 3);
    }

    #[test]
    fn report_serializes_outcome_status() {
        let temp = tempdir().expect("tempdir");
        write_png(&temp.path().join("a.png"));

        let report = run_batch(&options(temp.path())).expect("run");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["outcomes"][0]["status"], "stamped");
        assert_eq!(json["processed"], 1);
    }
}
