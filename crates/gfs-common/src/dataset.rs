//! The dataset seam between remote stores and the field pipeline.

use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A named dimension with its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Shape description of one data variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    /// Dimensions in storage order (slowest varying first).
    pub dims: Vec<Dimension>,
    /// Free-text description from the dataset attributes, if any.
    pub long_name: Option<String>,
    pub units: Option<String>,
}

impl VariableInfo {
    pub fn new(name: impl Into<String>, dims: Vec<Dimension>) -> Self {
        Self {
            name: name.into(),
            dims,
            long_name: None,
            units: None,
        }
    }

    /// Position of the first dimension whose name is one of `names`.
    pub fn dim_position(&self, names: &[&str]) -> Option<usize> {
        self.dims
            .iter()
            .position(|d| names.iter().any(|n| d.name.eq_ignore_ascii_case(n)))
    }

    /// Dimension names in storage order.
    pub fn dim_names(&self) -> Vec<&str> {
        self.dims.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Errors raised by dataset implementations.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The remote store could not be reached or answered with an error.
    #[error("dataset unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the content could not be interpreted.
    #[error("malformed dataset response: {0}")]
    Malformed(String),

    #[error("variable not found: {0}")]
    UnknownVariable(String),

    #[error("hyperslab {requested} is outside variable '{variable}' with shape {shape:?}")]
    OutOfBounds {
        variable: String,
        requested: String,
        shape: Vec<usize>,
    },

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A lazily read, multi-dimensional gridded dataset.
///
/// Metadata (variables, coordinate axes, the decoded time axis) is available
/// synchronously once the dataset is open. Field values are only fetched by
/// [`GriddedDataset::read`].
#[async_trait]
pub trait GriddedDataset: Send + Sync {
    /// Identifier of the dataset (usually its URL).
    fn name(&self) -> &str;

    /// Names of the data variables, excluding coordinate axes.
    fn variable_names(&self) -> Vec<String>;

    /// Shape information for a data variable.
    fn variable(&self, name: &str) -> Option<&VariableInfo>;

    /// Values of a one-dimensional coordinate variable.
    fn coordinate(&self, name: &str) -> Option<&[f64]>;

    /// Decoded time axis.
    fn times(&self) -> &[DateTime<Utc>];

    /// Read a hyperslab of `variable`.
    ///
    /// `slab` holds one half-open index range per dimension, in storage
    /// order. Values come back row-major in that same order, with missing
    /// values already replaced by NaN.
    async fn read(&self, variable: &str, slab: &[Range<usize>]) -> Result<Vec<f32>, DatasetError>;

    /// Number of steps on the time axis.
    fn time_len(&self) -> usize {
        self.times().len()
    }
}

/// Check a hyperslab against a variable's shape.
pub fn check_slab(info: &VariableInfo, slab: &[Range<usize>]) -> Result<usize, DatasetError> {
    let out_of_bounds = || DatasetError::OutOfBounds {
        variable: info.name.clone(),
        requested: format!("{:?}", slab),
        shape: info.dims.iter().map(|d| d.size).collect(),
    };

    if slab.len() != info.dims.len() {
        return Err(out_of_bounds());
    }

    let mut count = 1usize;
    for (range, dim) in slab.iter().zip(&info.dims) {
        if range.start >= range.end || range.end > dim.size {
            return Err(out_of_bounds());
        }
        count *= range.end - range.start;
    }
    Ok(count)
}
