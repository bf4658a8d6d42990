//! A lazily read DAP2 dataset.

use std::collections::HashMap;
use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gfs_common::dataset::check_slab;
use gfs_common::{CfTimeUnits, DatasetError, GriddedDataset, VariableInfo};
use tracing::{debug, info, instrument};

use crate::client::DapClient;
use crate::constraint::{hyperslab, projection};
use crate::das::Das;
use crate::error::{DapError, DapResult};

const TIME_NAMES: &[&str] = &["time", "t"];

/// Dataset opened from a DAP2 URL.
///
/// Opening fetches structure, attributes and the one-dimensional coordinate
/// axes. Field values are requested per hyperslab in [`GriddedDataset::read`].
#[derive(Debug)]
pub struct DapDataset {
    url: String,
    client: DapClient,
    variables: Vec<VariableInfo>,
    coordinates: HashMap<String, Vec<f64>>,
    times: Vec<DateTime<Utc>>,
    missing: HashMap<String, Vec<f64>>,
}

impl DapDataset {
    #[instrument(skip(client))]
    pub async fn open(client: DapClient, url: &str) -> DapResult<Self> {
        let dds = client.fetch_dds(url).await?;
        let das = client.fetch_das(url).await?;

        let coord_names: Vec<&str> = dds
            .coordinates()
            .filter(|v| v.dtype.is_numeric())
            .map(|v| v.name.as_str())
            .collect();

        let mut coordinates = HashMap::new();
        if !coord_names.is_empty() {
            let arrays = client.fetch_ascii(url, &projection(&coord_names)).await?;
            for array in arrays {
                if coord_names.contains(&array.name.as_str()) {
                    coordinates.insert(array.name, array.values);
                }
            }
        }
        if let Some(missing) = coord_names.iter().find(|n| !coordinates.contains_key(**n)) {
            return Err(DapError::UnknownVariable(missing.to_string()));
        }

        let times = decode_times(&das, &coordinates)?;

        let variables: Vec<VariableInfo> = dds
            .data_variables()
            .filter(|v| v.dtype.is_numeric() && !v.dims.is_empty())
            .map(|v| {
                let mut info = VariableInfo::new(v.name.clone(), v.dims.clone());
                info.long_name = das.text(&v.name, "long_name").map(|s| s.trim().to_string());
                info.units = das.text(&v.name, "units").map(|s| s.trim().to_string());
                info
            })
            .collect();

        let missing = variables
            .iter()
            .map(|v| (v.name.clone(), das.missing_values(&v.name)))
            .collect();

        info!(
            url = %url,
            variables = variables.len(),
            time_steps = times.len(),
            "Opened DAP dataset"
        );

        Ok(Self {
            url: url.to_string(),
            client,
            variables,
            coordinates,
            times,
            missing,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_missing(&self, variable: &str, value: f64) -> bool {
        if !value.is_finite() {
            return true;
        }
        self.missing
            .get(variable)
            .map_or(false, |fills| fills.iter().any(|&m| (value - m).abs() <= m.abs() * 1e-6))
    }
}

fn decode_times(das: &Das, coordinates: &HashMap<String, Vec<f64>>) -> DapResult<Vec<DateTime<Utc>>> {
    let Some((name, values)) = TIME_NAMES
        .iter()
        .find_map(|n| coordinates.get_key_value(*n))
    else {
        return Ok(Vec::new());
    };

    let units = das
        .text(name, "units")
        .ok_or_else(|| DapError::parse("time axis", format!("'{}' has no units attribute", name)))?;
    let units = CfTimeUnits::parse(units, das.text(name, "calendar"))?;

    values
        .iter()
        .map(|&v| {
            units
                .decode(v)
                .ok_or_else(|| DapError::parse("time axis", format!("value {} out of range", v)))
        })
        .collect()
}

#[async_trait]
impl GriddedDataset for DapDataset {
    fn name(&self) -> &str {
        &self.url
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
        let info = self
            .variable(variable)
            .ok_or_else(|| DatasetError::UnknownVariable(variable.to_string()))?;
        let count = check_slab(info, slab)?;
        let constraint = hyperslab(variable, slab)
            .ok_or_else(|| DatasetError::Malformed(format!("empty hyperslab for '{}'", variable)))?;

        debug!(variable = %variable, constraint = %constraint, "Reading hyperslab");
        let arrays = self.client.fetch_ascii(&self.url, &constraint).await?;

        let array = arrays
            .into_iter()
            .find(|a| a.name == variable)
            .ok_or_else(|| DapError::UnknownVariable(variable.to_string()))?;
        if array.values.len() != count {
            return Err(DapError::ShapeMismatch {
                variable: variable.to_string(),
                expected: count,
                actual: array.values.len(),
            }
            .into());
        }

        Ok(array
            .values
            .iter()
            .map(|&v| if self.is_missing(variable, v) { f32::NAN } else { v as f32 })
            .collect())
    }
}
