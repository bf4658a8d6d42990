//! Viewer configuration.
//!
//! Layered in this order, later layers winning: built-in defaults, an
//! optional YAML file, `GFS_*` environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use forecast_pipeline::PipelineConfig;
use renderer::MapStyle;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr";

/// Root configuration, as read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// DODS root holding the `gfsYYYYMMDD` run directories.
    pub base_url: String,

    /// Where rendered PNGs are written.
    pub output_dir: PathBuf,

    /// TrueType font for map text; text is omitted when unset.
    pub font_path: Option<PathBuf>,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,

    pub pipeline: PipelineConfig,

    pub map: MapConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("output"),
            font_path: None,
            request_timeout_secs: 120,
            pipeline: PipelineConfig::default(),
            map: MapConfig::default(),
        }
    }
}

/// Output image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ViewerConfig {
    /// Read a YAML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ViewerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Defaults, then the file if given, then the environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `GFS_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("GFS_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }

        if let Ok(dir) = std::env::var("GFS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(font) = std::env::var("GFS_FONT_PATH") {
            self.font_path = (!font.is_empty()).then(|| PathBuf::from(font));
        }

        if let Ok(val) = std::env::var("GFS_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.request_timeout_secs = secs;
            }
        }

        self.pipeline.apply_env();
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL, got {}", self.base_url);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be > 0");
        }
        if self.map.width == 0 || self.map.height == 0 {
            bail!("map size must be non-zero, got {}x{}", self.map.width, self.map.height);
        }
        self.pipeline
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid pipeline configuration")?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Drawing style for the map renderer.
    pub fn map_style(&self) -> MapStyle {
        MapStyle {
            width: self.map.width,
            height: self.map.height,
            font_path: self.font_path.clone(),
            ..MapStyle::default()
        }
    }
}
