//! Dataset loading and caching behaviour.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use forecast_pipeline::testdata::{gfs_fixture, FixtureOptions, StaticOpener};
use forecast_pipeline::{DatasetCache, DatasetLoader, DatasetOpener};
use gfs_common::{DatasetError, GriddedDataset, RunHour, RunId, ViewerError};

fn run(day: u32, hour: RunHour) -> RunId {
    RunId::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), hour)
}

fn fixture() -> Arc<dyn GriddedDataset> {
    Arc::new(gfs_fixture(&FixtureOptions::default()))
}

#[tokio::test]
async fn test_identical_key_opens_once() {
    let key = run(15, RunHour::Z00);
    let opener = Arc::new(StaticOpener::new().with_run(key, fixture()));
    let loader = DatasetLoader::new(opener.clone(), DatasetCache::new(4), Duration::from_secs(5));

    let a = loader.load(key).await.unwrap();
    let b = loader.load(key).await.unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(opener.open_count(), 1);

    let stats = loader.stats().await;
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[tokio::test]
async fn test_failed_open_not_cached() {
    let key = run(15, RunHour::Z06);
    let opener = Arc::new(StaticOpener::new().with_run(key, fixture()));
    opener.set_failing(key, true);
    let loader = DatasetLoader::new(opener.clone(), DatasetCache::new(4), Duration::from_secs(5));

    let Err(err) = loader.load(key).await else {
        panic!("load should fail");
    };
    assert!(matches!(err, ViewerError::DataUnavailable(ref m) if m.contains("gfs20240115")));
    assert!(!loader.is_cached(&key).await);

    // The next attempt goes back to the opener and now succeeds.
    opener.set_failing(key, false);
    assert!(loader.load(key).await.is_ok());
    assert_eq!(opener.open_count(), 2);
}

#[tokio::test]
async fn test_unknown_run_is_data_unavailable() {
    let opener = StaticOpener::new();
    let loader = DatasetLoader::new(opener, DatasetCache::new(4), Duration::from_secs(5));

    let Err(err) = loader.load(run(1, RunHour::Z18)).await else {
        panic!("load should fail");
    };
    assert!(matches!(err, ViewerError::DataUnavailable(_)));
    assert!(err.hint().is_some());
}

#[tokio::test]
async fn test_capacity_evicts_least_recently_used() {
    let (a, b, c) = (run(15, RunHour::Z00), run(15, RunHour::Z06), run(15, RunHour::Z12));
    let opener = Arc::new(
        StaticOpener::new()
            .with_run(a, fixture())
            .with_run(b, fixture())
            .with_run(c, fixture()),
    );
    let loader = DatasetLoader::new(opener.clone(), DatasetCache::new(2), Duration::from_secs(5));

    loader.load(a).await.unwrap();
    loader.load(b).await.unwrap();
    loader.load(a).await.unwrap();
    loader.load(c).await.unwrap();

    assert!(loader.is_cached(&a).await);
    assert!(!loader.is_cached(&b).await);
    assert!(loader.is_cached(&c).await);
    assert_eq!(loader.stats().await.evictions, 1);

    // b must be opened again.
    loader.load(b).await.unwrap();
    assert_eq!(opener.open_count(), 4);
}

struct HangingOpener;

#[async_trait]
impl DatasetOpener for HangingOpener {
    fn target(&self, run: &RunId) -> String {
        format!("hang://{}", run)
    }

    async fn open(&self, _run: &RunId) -> Result<Arc<dyn GriddedDataset>, DatasetError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(DatasetError::Unavailable("unreachable".into()))
    }
}

#[tokio::test]
async fn test_open_timeout() {
    let loader = DatasetLoader::new(HangingOpener, DatasetCache::new(1), Duration::from_millis(50));
    let Err(err) = loader.load(run(15, RunHour::Z00)).await else {
        panic!("load should fail");
    };
    assert!(matches!(err, ViewerError::DataUnavailable(ref m) if m.contains("timed out")));
    assert_eq!(loader.stats().await.entries, 0);
}
