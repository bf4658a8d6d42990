//! Error types for DAP2 requests and responses.

use std::time::Duration;

use gfs_common::time::TimeParseError;
use gfs_common::DatasetError;
use thiserror::Error;

/// Result type for DAP operations.
pub type DapResult<T> = Result<T, DapError>;

#[derive(Error, Debug)]
pub enum DapError {
    /// Transport failure (DNS, connect, TLS, reset).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// A DAP `Error { ... }` document in place of the expected response.
    #[error("server error: {0}")]
    Server(String),

    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("variable not found: {0}")]
    UnknownVariable(String),

    #[error("variable '{variable}' returned {actual} values, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid time axis: {0}")]
    Time(#[from] TimeParseError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl DapError {
    pub fn parse(what: &'static str, message: impl Into<String>) -> Self {
        DapError::Parse {
            what,
            message: message.into(),
        }
    }
}

impl From<DapError> for DatasetError {
    fn from(err: DapError) -> Self {
        match err {
            DapError::Timeout(d) => DatasetError::Timeout(d),
            DapError::Http(_) | DapError::Status { .. } | DapError::Server(_) => {
                DatasetError::Unavailable(err.to_string())
            }
            DapError::UnknownVariable(name) => DatasetError::UnknownVariable(name),
            DapError::Parse { .. } | DapError::ShapeMismatch { .. } | DapError::Time(_) => {
                DatasetError::Malformed(err.to_string())
            }
        }
    }
}
