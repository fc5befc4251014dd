mod anchor;
mod batch;
mod builtin_font;
mod capture_date;
mod color;
mod config;
mod error;
mod exif_reader;
mod scanner;
mod stamp;
mod typeface;

pub use anchor::{compute_placement, Anchor, AnchorParseError, ImageSize, Placement, TextSize};
pub use batch::{run_batch, BatchOptions, BatchReport};
pub use capture_date::{parse_date, resolve_capture_date, CaptureDate, DateSource, DATE_FORMAT};
pub use color::{ColorError, TextColor};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    DEFAULT_COLOR, DEFAULT_FONT_SIZE, DEFAULT_MARGIN,
};
pub use error::StampError;
pub use exif_reader::read_exif;
pub use scanner::{
    collect_image_files, is_image, prepare_output_dir, resolve_layout, ScanStats, SourceLayout,
    IMAGE_EXTENSIONS, OUTPUT_DIR_NAME,
};
pub use stamp::{
    composite, plan_file, render_label, stamp_file, stamp_image, FileOutcome, StampStyle,
    DEFAULT_OUTLINE_COLOR, DEFAULT_OUTLINE_WIDTH, MAX_OUTLINE_WIDTH,
};
pub use typeface::{default_font_candidates, FontLoadError, Typeface, SYSTEM_FONT_CANDIDATES};
