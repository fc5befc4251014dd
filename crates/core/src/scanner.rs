use crate::error::StampError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Generated images go here; it is never scanned as input.
pub const OUTPUT_DIR_NAME: &str = "_watermark";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "gif", "webp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLayout {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub image_files: usize,
    pub skipped_non_image: usize,
    pub skipped_output_dir: usize,
    pub unreadable_entries: usize,
}

pub fn resolve_layout(input: &Path) -> Result<SourceLayout, StampError> {
    if !input.exists() {
        return Err(StampError::PathNotFound(input.to_path_buf()));
    }

    let source_dir = if input.is_file() {
        input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        input.to_path_buf()
    };

    Ok(SourceLayout {
        output_dir: source_dir.join(OUTPUT_DIR_NAME),
        source_dir,
    })
}

pub fn prepare_output_dir(layout: &SourceLayout) -> Result<(), StampError> {
    fs::create_dir_all(&layout.output_dir).map_err(|source| StampError::CreateOutputDir {
        path: layout.output_dir.clone(),
        source,
    })
}

pub fn collect_image_files(
    root: &Path,
    recursive: bool,
    stats: &mut ScanStats,
) -> Result<Vec<PathBuf>, StampError> {
    let mut out = Vec::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            visit_walk_entry(root, entry, stats, &mut out)?;
        }
    } else {
        let entries = fs::read_dir(root).map_err(|source| StampError::ReadDir {
            path: root.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!(dir = %root.display(), error = %err, "skipping unreadable entry");
                    stats.unreadable_entries += 1;
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            classify(root, &path, stats, &mut out);
        }
    }

    out.sort();
    Ok(out)
}

// Only a failure on the root aborts the scan; anything below it is logged and counted.
fn visit_walk_entry(
    root: &Path,
    entry: walkdir::Result<DirEntry>,
    stats: &mut ScanStats,
    out: &mut Vec<PathBuf>,
) -> Result<(), StampError> {
    let entry = match entry {
        Ok(entry) => entry,
        Err(source) if source.depth() == 0 => {
            return Err(StampError::Walk {
                path: root.to_path_buf(),
                source,
            })
        }
        Err(err) => {
            let path = err.path().unwrap_or(root).to_path_buf();
            warn!(path = %path.display(), error = %err, "skipping unreadable entry");
            stats.unreadable_entries += 1;
            return Ok(());
        }
    };

    // `is_file` follows symlinks, matching the flat scan.
    if entry.path().is_file() {
        classify(root, entry.path(), stats, out);
    }
    Ok(())
}

fn classify(root: &Path, path: &Path, stats: &mut ScanStats, out: &mut Vec<PathBuf>) {
    stats.scanned_files += 1;

    if inside_output_dir(root, path) {
        stats.skipped_output_dir += 1;
        return;
    }

    if is_image(path) {
        stats.image_files += 1;
        out.push(path.to_path_buf());
    } else {
        stats.skipped_non_image += 1;
    }
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn inside_output_dir(root: &Path, path: &Path) -> bool {
    if root.file_name().is_some_and(|name| name == OUTPUT_DIR_NAME) {
        return true;
    }

    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|rel| {
            rel.components()
                .any(|component| component.as_os_str() == OUTPUT_DIR_NAME)
        })
        .unwrap_or(false)
}
