//! Error types for map rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while drawing or encoding a map.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("canvas {width}x{height} leaves no room for the plot area")]
    NoPlotArea { width: u32, height: u32 },

    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a usable TrueType font")]
    FontInvalid(PathBuf),

    #[error("field has no valid values to scale")]
    EmptyField,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl RenderError {
    pub fn encode(msg: impl Into<String>) -> Self {
        RenderError::Encode(msg.into())
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
