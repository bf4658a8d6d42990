//! Common types and utilities shared across the GFS viewer crates.

pub mod bbox;
pub mod dataset;
pub mod error;
pub mod field;
pub mod style;
pub mod time;

pub use bbox::BoundingBox;
pub use dataset::{Dimension, DatasetError, GriddedDataset, VariableInfo};
pub use error::{ViewerError, ViewerResult};
pub use field::{PreparedMap, RegionField, VectorField};
pub use style::{ColorScheme, RenderMode};
pub use time::{CfTimeUnits, RunHour, RunId, ValidTime};
