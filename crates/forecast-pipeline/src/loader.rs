//! Opening runs through an injected opener and cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gfs_common::{DatasetError, GriddedDataset, RunId, ViewerError, ViewerResult};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, DatasetCache};

/// Source of datasets for a model run.
#[async_trait]
pub trait DatasetOpener: Send + Sync {
    /// Fetch target for a run, used for logging and error messages.
    fn target(&self, run: &RunId) -> String;

    /// Open a run lazily: metadata only.
    async fn open(&self, run: &RunId) -> Result<Arc<dyn GriddedDataset>, DatasetError>;
}

#[async_trait]
impl<T: DatasetOpener + ?Sized> DatasetOpener for Arc<T> {
    fn target(&self, run: &RunId) -> String {
        (**self).target(run)
    }

    async fn open(&self, run: &RunId) -> Result<Arc<dyn GriddedDataset>, DatasetError> {
        (**self).open(run).await
    }
}

/// Memoizing loader: identical runs are opened once while cached.
pub struct DatasetLoader<O> {
    opener: O,
    cache: Mutex<DatasetCache>,
    open_timeout: Duration,
}

impl<O: DatasetOpener> DatasetLoader<O> {
    pub fn new(opener: O, cache: DatasetCache, open_timeout: Duration) -> Self {
        Self {
            opener,
            cache: Mutex::new(cache),
            open_timeout,
        }
    }

    /// Return the dataset for `run`, opening it on a cache miss.
    ///
    /// Failed opens leave the cache untouched.
    #[instrument(skip(self), fields(run = %run))]
    pub async fn load(&self, run: RunId) -> ViewerResult<Arc<dyn GriddedDataset>> {
        // Held across the open so concurrent callers of one run share a single request.
        let mut cache = self.cache.lock().await;
        if let Some(dataset) = cache.get(&run) {
            debug!("Dataset cache hit");
            return Ok(dataset);
        }

        let target = self.opener.target(&run);
        info!(target = %target, "Opening dataset");

        let dataset = match tokio::time::timeout(self.open_timeout, self.opener.open(&run)).await {
            Ok(Ok(dataset)) => dataset,
            Ok(Err(e)) => {
                warn!(target = %target, error = %e, "Failed to open dataset");
                return Err(ViewerError::DataUnavailable(format!("{}: {}", target, e)));
            }
            Err(_) => {
                warn!(target = %target, timeout = ?self.open_timeout, "Dataset open timed out");
                return Err(ViewerError::DataUnavailable(format!(
                    "{}: open timed out after {:?}",
                    target, self.open_timeout
                )));
            }
        };

        if let Some(evicted) = cache.insert(run, dataset.clone()) {
            info!(evicted = %evicted, "Evicted least recently used run");
        }
        Ok(dataset)
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn is_cached(&self, run: &RunId) -> bool {
        self.cache.lock().await.contains(run)
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }
}
