//! Configuration for the forecast pipeline.

use std::time::Duration;

use gfs_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// Configuration for loading and slicing forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Region every map is cut to.
    pub region: BoundingBox,

    /// Maximum number of open runs kept in the dataset cache.
    pub cache_capacity: usize,

    /// Time allowed to open a run (structure, attributes, axes).
    pub open_timeout_secs: u64,

    /// Time allowed for one field read.
    pub read_timeout_secs: u64,

    /// Keep every n-th grid point along each axis for wind vectors.
    pub vector_stride: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region: BoundingBox::sumatra(),
            cache_capacity: 4,
            open_timeout_secs: 60,
            read_timeout_secs: 120,
            vector_stride: 5,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables that are set and parse.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("GFS_CACHE_CAPACITY") {
            if let Ok(n) = val.parse() {
                self.cache_capacity = n;
            }
        }

        if let Ok(val) = std::env::var("GFS_OPEN_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.open_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("GFS_READ_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.read_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("GFS_VECTOR_STRIDE") {
            if let Ok(n) = val.parse() {
                self.vector_stride = n;
            }
        }

        if let Ok(val) = std::env::var("GFS_REGION") {
            if let Ok(bbox) = BoundingBox::parse(&val) {
                self.region = bbox;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".to_string());
        }

        if self.open_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err("timeouts must be > 0 seconds".to_string());
        }

        if self.vector_stride == 0 {
            return Err("vector_stride must be > 0".to_string());
        }

        if !self.region.is_valid() {
            return Err(format!("region {} has no area", self.region));
        }

        Ok(())
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.vector_stride, 5);
        assert_eq!(config.region, BoundingBox::sumatra());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = PipelineConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            read_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            region: BoundingBox::new(95.0, 5.0, 106.0, 5.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("cache_capacity: 2\n").unwrap();
        assert_eq!(config.cache_capacity, 2);
        assert_eq!(config.open_timeout_secs, 60);
    }
}
