//! Forecast map pipeline.
//!
//! Turns a model run and a user's parameter choice into a prepared regional
//! map, strictly in order:
//!
//! ```text
//! RenderRequest (run, lead, label)
//!      │
//!      ├─► DatasetLoader::load(run)        cached by run, metadata only
//!      │
//!      ├─► resolve(dataset, label, lead)   source fields + unit transform
//!      │
//!      ├─► RegionExtractor                 hyperslab read, (lat, lon) order,
//!      │                                   latitude ascending
//!      ├─► validity::check                 all-NaN regions rejected
//!      │
//!      └─► RenderAdapter::render(map)
//! ```
//!
//! Every failure ends the current request with a [`gfs_common::ViewerError`];
//! the dataset cache is only ever modified by a successful open.

pub mod cache;
pub mod config;
pub mod loader;
pub mod parameter;
pub mod pipeline;
pub mod region;
pub mod testdata;
pub mod validity;

pub use cache::{CacheStats, DatasetCache};
pub use config::PipelineConfig;
pub use loader::{DatasetLoader, DatasetOpener};
pub use parameter::{resolve, LazyField, Parameter, ParameterSpec, ResolvedParameter, UnitTransform};
pub use pipeline::{ForecastViewer, RenderAdapter, RenderRequest, Rendered};
pub use region::{label_slice, AxisOrder, ExtractedRegion, RegionExtractor};
