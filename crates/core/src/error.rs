use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("could not create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("directory walk failed under {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("could not build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("no capture date available")]
    NoCaptureDate,
    #[error("could not save image to {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("file has no name: {}", .0.display())]
    MissingFileName(PathBuf),
}

impl StampError {
    // Fatal errors abort the run; the rest are per-file skips.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_)
                | Self::CreateOutputDir { .. }
                | Self::ReadDir { .. }
                | Self::Walk { .. }
                | Self::WorkerPool(_)
        )
    }
}
