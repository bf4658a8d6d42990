//! Parameter resolution against in-memory datasets.

use forecast_pipeline::testdata::{gfs_fixture, FixtureOptions, InMemoryDataset, UntouchableDataset};
use forecast_pipeline::{resolve, Parameter, UnitTransform};
use gfs_common::{ColorScheme, Dimension, RenderMode, ViewerError};

// ============================================================================
// Documented conversions
// ============================================================================

#[test]
fn test_resolve_temperature() {
    let ds = gfs_fixture(&FixtureOptions::default());
    let r = resolve(&ds, "Suhu Permukaan (tmp2m)", 1).unwrap();

    assert_eq!(r.parameter, Parameter::Temperature);
    assert_eq!(r.primary.sources, vec!["tmp2m"]);
    assert_eq!(r.primary.lead, 1);
    assert_eq!(r.primary.transform, UnitTransform::Offset(-273.15));
    assert_eq!(r.display_label, "Suhu (°C)");
    assert_eq!(r.color_scheme, ColorScheme::CoolWarm);
    assert_eq!(r.render_mode, RenderMode::FilledSurface);
    assert!(r.secondary.is_none());
    assert!((r.primary.transform.apply(&[300.0]) - 26.85).abs() < 1e-4);
}

#[test]
fn test_resolve_precipitation() {
    let ds = gfs_fixture(&FixtureOptions::default());
    let r = resolve(&ds, "Curah Hujan per jam (pratesfc)", 0).unwrap();

    assert_eq!(r.display_label, "Curah Hujan (mm/jam)");
    assert_eq!(r.color_scheme, ColorScheme::Blues);
    assert!((r.primary.transform.apply(&[0.001]) - 3.6).abs() < 1e-5);
}

#[test]
fn test_resolve_wind_keeps_components() {
    let ds = gfs_fixture(&FixtureOptions::default());
    let r = resolve(&ds, "Angin Permukaan (ugrd10m & vgrd10m)", 2).unwrap();

    assert_eq!(r.display_label, "Kecepatan Angin (knot)");
    assert_eq!(r.color_scheme, ColorScheme::YlGnBu);
    assert_eq!(r.render_mode, RenderMode::FilledSurfaceWithVectors);
    assert_eq!(r.primary.sources, vec!["ugrd10m", "vgrd10m"]);

    let pair = r.secondary.unwrap();
    assert_eq!((pair.u.as_str(), pair.v.as_str(), pair.lead), ("ugrd10m", "vgrd10m", 2));
    assert!((r.primary.transform.apply(&[3.0, 4.0]) - 9.7192).abs() < 1e-4);
}

#[test]
fn test_resolve_pressure() {
    let ds = gfs_fixture(&FixtureOptions::default());
    let r = resolve(&ds, "Tekanan Permukaan Laut (prmslmsl)", 0).unwrap();

    assert_eq!(r.display_label, "Tekanan Permukaan Laut (hPa)");
    assert_eq!(r.color_scheme, ColorScheme::Cool);
    assert_eq!(r.render_mode, RenderMode::IsolineContour);
    assert_eq!(r.primary.transform.apply(&[101325.0]), 1013.25);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unknown_label_never_touches_dataset() {
    let err = resolve(&UntouchableDataset, "Kelembaban (rh2m)", 0).unwrap_err();
    assert!(matches!(err, ViewerError::UnknownParameter { .. }));
}

#[test]
fn test_lead_out_of_range() {
    let ds = gfs_fixture(&FixtureOptions {
        time_steps: 241,
        variables: vec!["tmp2m"],
        ..Default::default()
    });
    let err = resolve(&ds, "tmp2m", 250).unwrap_err();
    assert!(matches!(err, ViewerError::LeadOutOfRange { lead: 250, available: 241 }));

    assert!(resolve(&ds, "tmp2m", 240).is_ok());
}

#[test]
fn test_missing_field_lists_available() {
    let ds = gfs_fixture(&FixtureOptions {
        variables: vec!["tmp2m", "ugrd10m"],
        ..Default::default()
    });
    let err = resolve(&ds, "wind", 0).unwrap_err();
    match err {
        ViewerError::ParameterNotFound {
            missing, available, ..
        } => {
            assert_eq!(missing, vec!["vgrd10m"]);
            assert_eq!(available, vec!["tmp2m", "ugrd10m"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_dataset() {
    let ds = InMemoryDataset::new("empty").with_variable("tmp2m", vec![Dimension::new("time", 0)], vec![]);
    let err = resolve(&ds, "temp", 0).unwrap_err();
    assert!(matches!(err, ViewerError::LeadOutOfRange { available: 0, .. }));
}
