//! In-memory datasets and openers for tests.
//!
//! [`gfs_fixture`] builds a small GFS-like run around the Sumatra box on a
//! 0.25° grid where every variable has a known value at each point, in any
//! storage order the tests need.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gfs_common::dataset::check_slab;
use gfs_common::{DatasetError, Dimension, GriddedDataset, RunId, VariableInfo};

use crate::loader::DatasetOpener;

/// A dataset held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryDataset {
    name: String,
    variables: Vec<VariableInfo>,
    data: HashMap<String, Vec<f32>>,
    coordinates: HashMap<String, Vec<f64>>,
    times: Vec<DateTime<Utc>>,
    reads: AtomicUsize,
}

impl InMemoryDataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_times(mut self, times: Vec<DateTime<Utc>>) -> Self {
        self.times = times;
        self
    }

    pub fn with_coordinate(mut self, name: &str, values: Vec<f64>) -> Self {
        self.coordinates.insert(name.to_string(), values);
        self
    }

    /// Add a variable with row-major `data` in the order of `dims`.
    pub fn with_variable(mut self, name: &str, dims: Vec<Dimension>, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            dims.iter().map(|d| d.size).product::<usize>(),
            "data length does not match dimensions of {}",
            name
        );
        self.variables.push(VariableInfo::new(name, dims));
        self.data.insert(name.to_string(), data);
        self
    }

    /// Number of `read` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GriddedDataset for InMemoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn coordinate(&self, name: &str) -> Option<&[f64]> {
        self.coordinates.get(name).map(Vec::as_slice)
    }

    fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    async fn read(&self, variable: &str, slab: &[Range<usize>]) -> Result<Vec<f32>, DatasetError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let info = self
            .variable(variable)
            .ok_or_else(|| DatasetError::UnknownVariable(variable.to_string()))?;
        let count = check_slab(info, slab)?;
        let data = &self.data[variable];

        let sizes: Vec<usize> = info.dims.iter().map(|d| d.size).collect();
        let mut strides = vec![1usize; sizes.len()];
        for d in (0..sizes.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * sizes[d + 1];
        }

        let mut out = Vec::with_capacity(count);
        let mut index: Vec<usize> = slab.iter().map(|r| r.start).collect();
        for _ in 0..count {
            let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            out.push(data[offset]);
            // Advance the multi-index, last dimension fastest.
            for d in (0..index.len()).rev() {
                index[d] += 1;
                if index[d] < slab[d].end {
                    break;
                }
                index[d] = slab[d].start;
            }
        }
        Ok(out)
    }
}

/// Panics on any access; proves a code path never touches the dataset.
#[derive(Debug, Default)]
pub struct UntouchableDataset;

#[async_trait]
impl GriddedDataset for UntouchableDataset {
    fn name(&self) -> &str {
        panic!("dataset accessed: name")
    }

    fn variable_names(&self) -> Vec<String> {
        panic!("dataset accessed: variable_names")
    }

    fn variable(&self, _name: &str) -> Option<&VariableInfo> {
        panic!("dataset accessed: variable")
    }

    fn coordinate(&self, _name: &str) -> Option<&[f64]> {
        panic!("dataset accessed: coordinate")
    }

    fn times(&self) -> &[DateTime<Utc>] {
        panic!("dataset accessed: times")
    }

    async fn read(&self, _variable: &str, _slab: &[Range<usize>]) -> Result<Vec<f32>, DatasetError> {
        panic!("dataset accessed: read")
    }
}

/// Storage layout of the spatial dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[time, lat, lon]`
    TimeLatLon,
    /// `[time, lon, lat]`
    TimeLonLat,
}

/// Options for [`gfs_fixture`].
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub layout: Layout,
    pub lat_descending: bool,
    pub lon_descending: bool,
    pub time_steps: usize,
    pub reference: DateTime<Utc>,
    /// Variables to include; defaults to the four surface parameters' sources.
    pub variables: Vec<&'static str>,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            layout: Layout::TimeLatLon,
            lat_descending: false,
            lon_descending: false,
            time_steps: 3,
            reference: DateTime::<Utc>::from_timestamp(1_705_276_800, 0).unwrap_or_default(),
            variables: vec!["pratesfc", "tmp2m", "ugrd10m", "vgrd10m", "prmslmsl"],
        }
    }
}

/// Latitudes of the fixture grid: -2° to 7° at 0.25°, ascending.
pub fn fixture_lats() -> Vec<f64> {
    (0..=36).map(|i| -2.0 + i as f64 * 0.25).collect()
}

/// Longitudes of the fixture grid: 93° to 108° at 0.25°.
pub fn fixture_lons() -> Vec<f64> {
    (0..=60).map(|i| 93.0 + i as f64 * 0.25).collect()
}

/// Known value of `variable` at a point and lead.
pub fn fixture_value(variable: &str, lead: usize, lat: f64, lon: f64) -> f32 {
    let t = lead as f64;
    let v = match variable {
        "pratesfc" => 0.0001 * (1.0 + lat + (lon - 93.0) / 10.0 + t),
        "tmp2m" => 290.0 + lat + (lon - 93.0) * 0.5 + t,
        "ugrd10m" => 3.0 + (lon - 93.0) * 0.1 + t * 0.1,
        "vgrd10m" => 4.0 - lat * 0.1,
        "prmslmsl" => 100_800.0 + lat * 20.0 + (lon - 93.0) * 10.0 + t * 5.0,
        _ => lat * 100.0 + lon,
    };
    v as f32
}

/// Build a GFS-like dataset with known values.
pub fn gfs_fixture(options: &FixtureOptions) -> InMemoryDataset {
    let mut lats = fixture_lats();
    if options.lat_descending {
        lats.reverse();
    }
    let mut lons = fixture_lons();
    if options.lon_descending {
        lons.reverse();
    }
    let nt = options.time_steps;

    let (dims, outer, inner) = match options.layout {
        Layout::TimeLatLon => (
            vec![
                Dimension::new("time", nt),
                Dimension::new("lat", lats.len()),
                Dimension::new("lon", lons.len()),
            ],
            &lats,
            &lons,
        ),
        Layout::TimeLonLat => (
            vec![
                Dimension::new("time", nt),
                Dimension::new("lon", lons.len()),
                Dimension::new("lat", lats.len()),
            ],
            &lons,
            &lats,
        ),
    };

    let times = (0..nt)
        .map(|h| options.reference + Duration::hours(h as i64))
        .collect();

    let mut dataset = InMemoryDataset::new("fixture")
        .with_times(times)
        .with_coordinate("lat", lats.clone())
        .with_coordinate("lon", lons.clone());

    for &name in &options.variables {
        let mut data = Vec::with_capacity(nt * lats.len() * lons.len());
        for t in 0..nt {
            for &a in outer.iter() {
                for &b in inner.iter() {
                    let (lat, lon) = match options.layout {
                        Layout::TimeLatLon => (a, b),
                        Layout::TimeLonLat => (b, a),
                    };
                    data.push(fixture_value(name, t, lat, lon));
                }
            }
        }
        dataset = dataset.with_variable(name, dims.clone(), data);
    }

    dataset
}

/// Opener serving prepared datasets and counting opens.
#[derive(Default)]
pub struct StaticOpener {
    datasets: Mutex<HashMap<RunId, Arc<dyn GriddedDataset>>>,
    failing: Mutex<HashSet<RunId>>,
    opens: AtomicUsize,
}

impl StaticOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run(self, run: RunId, dataset: Arc<dyn GriddedDataset>) -> Self {
        self.insert(run, dataset);
        self
    }

    pub fn insert(&self, run: RunId, dataset: Arc<dyn GriddedDataset>) {
        if let Ok(mut map) = self.datasets.lock() {
            map.insert(run, dataset);
        }
    }

    /// Make opens of `run` fail (or succeed again) from now on.
    pub fn set_failing(&self, run: RunId, failing: bool) {
        if let Ok(mut set) = self.failing.lock() {
            if failing {
                set.insert(run);
            } else {
                set.remove(&run);
            }
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DatasetOpener for StaticOpener {
    fn target(&self, run: &RunId) -> String {
        format!("memory://gfs{}/gfs_0p25_1hr_{}z", run.date_stamp(), run.hour)
    }

    async fn open(&self, run: &RunId) -> Result<Arc<dyn GriddedDataset>, DatasetError> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        let failing = self.failing.lock().map(|s| s.contains(run)).unwrap_or(false);
        if failing {
            return Err(DatasetError::Unavailable(format!("{} is not available", run)));
        }
        self.datasets
            .lock()
            .ok()
            .and_then(|map| map.get(run).cloned())
            .ok_or_else(|| DatasetError::Unavailable(format!("{} is not an available dataset", run)))
    }
}
