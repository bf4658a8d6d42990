//! DAP2 (OPeNDAP) client.
//!
//! Supports the subset needed to read gridded model output: DDS and DAS
//! metadata, and ASCII data responses for whole variables or hyperslabs.

pub mod ascii;
pub mod client;
pub mod constraint;
pub mod das;
pub mod dataset;
pub mod dds;
pub mod error;
mod lexer;

pub use client::{ClientConfig, DapClient};
pub use das::{AttrValue, Das};
pub use dataset::DapDataset;
pub use dds::{DapType, Dds, DdsVariable};
pub use error::{DapError, DapResult};
