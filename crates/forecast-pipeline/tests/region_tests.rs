//! Region extraction across storage orders.

use std::time::Duration;

use forecast_pipeline::testdata::{fixture_value, gfs_fixture, FixtureOptions, InMemoryDataset, Layout};
use forecast_pipeline::{resolve, validity, RegionExtractor};
use gfs_common::{BoundingBox, Dimension, RegionField, ViewerError};

fn extractor() -> RegionExtractor {
    RegionExtractor::new(BoundingBox::sumatra(), Duration::from_secs(5))
}

async fn extract(options: FixtureOptions, label: &str, lead: usize) -> RegionField {
    let ds = gfs_fixture(&options);
    let resolved = resolve(&ds, label, lead).unwrap();
    extractor().extract_parameter(&ds, &resolved).await.unwrap().field
}

// ============================================================================
// Normalisation
// ============================================================================

#[tokio::test]
async fn test_region_covers_box_inclusively() {
    let field = extract(FixtureOptions::default(), "tmp2m", 0).await;

    assert_eq!(field.height(), 21);
    assert_eq!(field.width(), 45);
    assert_eq!(field.lats.first(), Some(&0.0));
    assert_eq!(field.lats.last(), Some(&5.0));
    assert_eq!(field.lons.first(), Some(&95.0));
    assert_eq!(field.lons.last(), Some(&106.0));
}

#[tokio::test]
async fn test_descending_latitude_matches_ascending() {
    let ascending = extract(FixtureOptions::default(), "tmp2m", 1).await;
    let descending = extract(
        FixtureOptions {
            lat_descending: true,
            ..Default::default()
        },
        "tmp2m",
        1,
    )
    .await;

    assert_eq!(ascending, descending);
    assert!(descending.lats.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_descending_longitude_matches_ascending() {
    let ascending = extract(FixtureOptions::default(), "wind", 0).await;
    let descending = extract(
        FixtureOptions {
            lon_descending: true,
            lat_descending: true,
            ..Default::default()
        },
        "wind",
        0,
    )
    .await;

    assert_eq!(ascending, descending);
    assert_eq!(descending.lons.first(), Some(&95.0));
    assert_eq!(descending.lons.last(), Some(&106.0));
}

#[tokio::test]
async fn test_lon_lat_storage_matches_lat_lon() {
    let lat_lon = extract(FixtureOptions::default(), "prmslmsl", 2).await;
    let lon_lat = extract(
        FixtureOptions {
            layout: Layout::TimeLonLat,
            lat_descending: true,
            ..Default::default()
        },
        "prmslmsl",
        2,
    )
    .await;

    assert_eq!(lat_lon, lon_lat);
}

#[tokio::test]
async fn test_values_transformed_at_lead() {
    let field = extract(FixtureOptions::default(), "temp", 2).await;
    // Row 4 is 1.0°N, column 8 is 97.0°E.
    let expected = fixture_value("tmp2m", 2, 1.0, 97.0) - 273.15;
    assert!((field.get(4, 8).unwrap() - expected).abs() < 1e-3);
}

#[tokio::test]
async fn test_wind_components_share_grid() {
    let ds = gfs_fixture(&FixtureOptions {
        lat_descending: true,
        ..Default::default()
    });
    let resolved = resolve(&ds, "wind", 0).unwrap();
    let region = extractor().extract_parameter(&ds, &resolved).await.unwrap();

    let vectors = region.vectors.unwrap();
    assert_eq!(vectors.u.lats, region.field.lats);
    assert_eq!(vectors.v.lons, region.field.lons);

    // Components stay in m/s; the primary field is the speed in knots.
    let (u, v) = (vectors.u.get(0, 0).unwrap(), vectors.v.get(0, 0).unwrap());
    assert_eq!(u, fixture_value("ugrd10m", 0, 0.0, 95.0));
    let knots = ((u * u + v * v) as f64).sqrt() * 1.94384;
    assert!((region.field.get(0, 0).unwrap() as f64 - knots).abs() < 1e-3);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_mismatched_wind_layouts() {
    let lats: Vec<f64> = (0..=20).map(|i| i as f64 * 0.25).collect();
    let lons: Vec<f64> = (0..=44).map(|i| 95.0 + i as f64 * 0.25).collect();
    let n = lats.len() * lons.len();
    let ds = InMemoryDataset::new("mixed")
        .with_times(vec![chrono::Utc::now()])
        .with_coordinate("lat", lats.clone())
        .with_coordinate("lon", lons.clone())
        .with_variable(
            "ugrd10m",
            vec![Dimension::new("time", 1), Dimension::new("lat", 21), Dimension::new("lon", 45)],
            vec![1.0; n],
        )
        .with_variable(
            "vgrd10m",
            vec![Dimension::new("time", 1), Dimension::new("lon", 45), Dimension::new("lat", 21)],
            vec![1.0; n],
        );

    let resolved = resolve(&ds, "wind", 0).unwrap();
    let err = extractor().extract_parameter(&ds, &resolved).await.unwrap_err();
    assert!(matches!(err, ViewerError::SliceFailure(_)));
    assert_eq!(ds.read_count(), 0);
}

#[tokio::test]
async fn test_region_outside_grid() {
    let ds = gfs_fixture(&FixtureOptions::default());
    let resolved = resolve(&ds, "tmp2m", 0).unwrap();
    let far = RegionExtractor::new(BoundingBox::new(10.0, 40.0, 20.0, 50.0), Duration::from_secs(5));

    let err = far.extract_parameter(&ds, &resolved).await.unwrap_err();
    assert!(matches!(err, ViewerError::SliceFailure(ref m) if m.contains("selects no grid points")));
}

#[tokio::test]
async fn test_missing_coordinate_axis() {
    let ds = InMemoryDataset::new("no-axes")
        .with_times(vec![chrono::Utc::now()])
        .with_variable(
            "tmp2m",
            vec![Dimension::new("time", 1), Dimension::new("lat", 1), Dimension::new("lon", 1)],
            vec![300.0],
        );
    let resolved = resolve(&ds, "tmp2m", 0).unwrap();
    let err = extractor().extract_parameter(&ds, &resolved).await.unwrap_err();
    assert!(matches!(err, ViewerError::SliceFailure(ref m) if m.contains("'lat' is missing")));
}

#[tokio::test]
async fn test_all_missing_region() {
    let lats: Vec<f64> = (0..=20).map(|i| i as f64 * 0.25).collect();
    let lons: Vec<f64> = (0..=44).map(|i| 95.0 + i as f64 * 0.25).collect();
    let ds = InMemoryDataset::new("nan")
        .with_times(vec![chrono::Utc::now()])
        .with_coordinate("lat", lats)
        .with_coordinate("lon", lons)
        .with_variable(
            "pratesfc",
            vec![Dimension::new("time", 1), Dimension::new("lat", 21), Dimension::new("lon", 45)],
            vec![f32::NAN; 21 * 45],
        );

    let resolved = resolve(&ds, "precip", 0).unwrap();
    let region = extractor().extract_parameter(&ds, &resolved).await.unwrap();
    let err = validity::check(&region.field, "precip", 0).unwrap_err();
    assert!(matches!(err, ViewerError::AllMissing { .. }));
}

#[tokio::test]
async fn test_read_timeout_is_data_unavailable() {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use gfs_common::{DatasetError, GriddedDataset, VariableInfo};
    use std::ops::Range;

    struct Slow(InMemoryDataset);

    #[async_trait]
    impl GriddedDataset for Slow {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn variable_names(&self) -> Vec<String> {
            self.0.variable_names()
        }
        fn variable(&self, name: &str) -> Option<&VariableInfo> {
            self.0.variable(name)
        }
        fn coordinate(&self, name: &str) -> Option<&[f64]> {
            self.0.coordinate(name)
        }
        fn times(&self) -> &[DateTime<Utc>] {
            self.0.times()
        }
        async fn read(&self, variable: &str, slab: &[Range<usize>]) -> Result<Vec<f32>, DatasetError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.0.read(variable, slab).await
        }
    }

    let ds = Slow(gfs_fixture(&FixtureOptions::default()));
    let resolved = resolve(&ds, "tmp2m", 0).unwrap();
    let quick = RegionExtractor::new(BoundingBox::sumatra(), Duration::from_millis(50));

    let err = quick.extract_parameter(&ds, &resolved).await.unwrap_err();
    assert!(matches!(err, ViewerError::DataUnavailable(_)));
}
