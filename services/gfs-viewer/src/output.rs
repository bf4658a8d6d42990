//! Writes rendered maps to PNG files.

use std::path::{Path, PathBuf};

use forecast_pipeline::{Parameter, RenderAdapter};
use gfs_common::{PreparedMap, RunId};
use renderer::{MapRenderer, RenderError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `gfs_{YYYYMMDD}_{HH}z_{kind}_t{NNN}.png`
pub fn file_name(run: &RunId, parameter: Parameter, lead: usize) -> String {
    format!(
        "gfs_{}_{}z_{}_t{:03}.png",
        run.date_stamp(),
        run.hour,
        parameter.id(),
        lead
    )
}

/// Render adapter that encodes the map and writes it to `path`.
pub struct PngWriter<'a> {
    renderer: &'a MapRenderer,
    path: PathBuf,
}

impl<'a> PngWriter<'a> {
    pub fn new(renderer: &'a MapRenderer, path: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            path: path.into(),
        }
    }

    /// Writer for the standard file name inside `dir`.
    pub fn in_dir(renderer: &'a MapRenderer, dir: &Path, run: &RunId, parameter: Parameter, lead: usize) -> Self {
        Self::new(renderer, dir.join(file_name(run, parameter, lead)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RenderAdapter for PngWriter<'_> {
    type Output = PathBuf;
    type Error = OutputError;

    fn render(&self, map: &PreparedMap) -> Result<PathBuf, OutputError> {
        let png = self.renderer.render_png(map)?;

        let io_err = |source| OutputError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, &png).map_err(io_err)?;

        info!(path = %self.path.display(), bytes = png.len(), "Wrote map");
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gfs_common::RunHour;

    #[test]
    fn test_file_name() {
        let run = RunId::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), RunHour::Z12);
        assert_eq!(file_name(&run, Parameter::Temperature, 6), "gfs_20240115_12z_temp_t006.png");
        assert_eq!(file_name(&run, Parameter::Wind, 120), "gfs_20240115_12z_wind_t120.png");
    }
}
