use crate::anchor::Anchor;
use crate::stamp::DEFAULT_OUTLINE_WIDTH;
use crate::typeface::default_font_candidates;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FONT_SIZE: u32 = 36;
pub const DEFAULT_MARGIN: u32 = 20;
pub const DEFAULT_COLOR: &str = "#FFFFFF";
pub const DEFAULT_OUTLINE_COLOR_NAME: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub font_size: u32,
    pub color: String,
    pub position: Anchor,
    pub margin: u32,
    pub font_path: Option<PathBuf>,
    pub recursive: bool,
    pub outline_width: u32,
    pub outline_color: String,
    pub font_candidates: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_string(),
            position: Anchor::BottomRight,
            margin: DEFAULT_MARGIN,
            font_path: None,
            recursive: false,
            outline_width: DEFAULT_OUTLINE_WIDTH,
            outline_color: DEFAULT_OUTLINE_COLOR_NAME.to_string(),
            font_candidates: default_font_candidates(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "datestamp", "datestamp")
        .context("could not determine the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    load_config_from(&paths.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let paths = app_paths()?;
    save_config_to(config, &paths.config_path)?;
    Ok(paths.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create config directory: {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(config).context("could not serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("could not write config file: {}", path.display()))?;
    Ok(())
}
