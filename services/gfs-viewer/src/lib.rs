//! Command-line front end for the GFS regional viewer.

pub mod commands;
pub mod config;
pub mod logging;
pub mod opener;
pub mod output;
pub mod session;

pub use config::ViewerConfig;
pub use opener::GfsOpener;
pub use output::{OutputError, PngWriter};
