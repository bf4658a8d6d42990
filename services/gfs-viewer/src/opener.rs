//! Opens GFS 0.25° hourly runs on the NOMADS DODS server.

use std::sync::Arc;

use async_trait::async_trait;
use forecast_pipeline::DatasetOpener;
use gfs_common::{DatasetError, GriddedDataset, RunId};
use opendap::{ClientConfig, DapClient, DapDataset, DapResult};
use tracing::{debug, instrument};

/// URL of one run below `base_url`, e.g.
/// `{base}/gfs20240115/gfs_0p25_1hr_00z`.
pub fn run_url(base_url: &str, run: &RunId) -> String {
    format!(
        "{}/gfs{}/gfs_0p25_1hr_{}z",
        base_url.trim_end_matches('/'),
        run.date_stamp(),
        run.hour
    )
}

#[derive(Debug, Clone)]
pub struct GfsOpener {
    base_url: String,
    client: DapClient,
}

impl GfsOpener {
    pub fn new(base_url: impl Into<String>, config: ClientConfig) -> DapResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            client: DapClient::new(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DatasetOpener for GfsOpener {
    fn target(&self, run: &RunId) -> String {
        run_url(&self.base_url, run)
    }

    #[instrument(skip(self), fields(run = %run))]
    async fn open(&self, run: &RunId) -> Result<Arc<dyn GriddedDataset>, DatasetError> {
        let url = self.target(run);
        debug!(url = %url, "Opening run");
        let dataset = DapDataset::open(self.client.clone(), &url).await?;
        Ok(Arc::new(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gfs_common::RunHour;

    #[test]
    fn test_run_url() {
        let run = RunId::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), RunHour::Z06);
        assert_eq!(
            run_url("https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr/", &run),
            "https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr/gfs20240115/gfs_0p25_1hr_06z"
        );
    }
}
