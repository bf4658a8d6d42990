//! The single-request pipeline: load, resolve, extract, check, render.

use std::fmt::Display;

use gfs_common::{PreparedMap, RunId, ValidTime, ViewerError, ViewerResult};
use tracing::{info, instrument};

use crate::cache::{CacheStats, DatasetCache};
use crate::config::PipelineConfig;
use crate::loader::{DatasetLoader, DatasetOpener};
use crate::parameter::{resolve, Parameter};
use crate::region::RegionExtractor;
use crate::validity;

/// One user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub run: RunId,
    pub lead: usize,
    pub parameter: String,
}

impl RenderRequest {
    pub fn new(run: RunId, lead: usize, parameter: impl Into<String>) -> Self {
        Self {
            run,
            lead,
            parameter: parameter.into(),
        }
    }
}

/// Turns a prepared map into some output (an image, a file).
pub trait RenderAdapter {
    type Output;
    type Error: Display;

    fn render(&self, map: &PreparedMap) -> Result<Self::Output, Self::Error>;
}

/// A completed render.
#[derive(Debug)]
pub struct Rendered<T> {
    pub parameter: Parameter,
    pub map: PreparedMap,
    pub output: T,
}

/// Serves render requests against runs from one opener, sharing a cache.
pub struct ForecastViewer<O> {
    loader: DatasetLoader<O>,
    extractor: RegionExtractor,
    vector_stride: usize,
}

impl<O: DatasetOpener> ForecastViewer<O> {
    pub fn new(opener: O, config: &PipelineConfig) -> Self {
        Self::with_cache(opener, DatasetCache::new(config.cache_capacity), config)
    }

    pub fn with_cache(opener: O, cache: DatasetCache, config: &PipelineConfig) -> Self {
        Self {
            loader: DatasetLoader::new(opener, cache, config.open_timeout()),
            extractor: RegionExtractor::new(config.region, config.read_timeout()),
            vector_stride: config.vector_stride.max(1),
        }
    }

    pub fn loader(&self) -> &DatasetLoader<O> {
        &self.loader
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.loader.stats().await
    }

    /// Run steps 1 to 4 and assemble everything the renderer needs.
    #[instrument(skip(self), fields(run = %request.run, lead = request.lead, parameter = %request.parameter))]
    pub async fn prepare(&self, request: &RenderRequest) -> ViewerResult<(Parameter, PreparedMap)> {
        // Unknown labels fail before any network access.
        let parameter = Parameter::from_label(&request.parameter)?;

        let dataset = self.loader.load(request.run).await?;
        let resolved = resolve(dataset.as_ref(), &request.parameter, request.lead)?;
        let region = self.extractor.extract_parameter(dataset.as_ref(), &resolved).await?;
        validity::check(&region.field, resolved.parameter.spec().menu_label, request.lead)?;

        let valid_dt = dataset
            .times()
            .get(request.lead)
            .copied()
            .ok_or(ViewerError::LeadOutOfRange {
                lead: request.lead,
                available: dataset.time_len(),
            })?;
        let valid_time = ValidTime::display(&valid_dt);
        let lead_label = ValidTime::new(request.run.reference_time(), request.lead as u32).lead_label();

        let extent = *self.extractor.region();
        let map = PreparedMap {
            title: PreparedMap::title_for(resolved.display_label, &lead_label),
            subtitle: PreparedMap::subtitle_for(&valid_time),
            vectors: region.vectors.map(|v| v.stride(self.vector_stride)),
            field: region.field,
            render_mode: resolved.render_mode,
            display_label: resolved.display_label.to_string(),
            color_scheme: resolved.color_scheme,
            valid_time,
            lead_label,
            extent,
        };

        info!(
            grid = %format!("{}x{}", map.field.width(), map.field.height()),
            valid = %map.valid_time,
            "Prepared map"
        );
        Ok((parameter, map))
    }

    /// Prepare a map and hand it to `renderer`.
    pub async fn render<R: RenderAdapter>(
        &self,
        request: &RenderRequest,
        renderer: &R,
    ) -> ViewerResult<Rendered<R::Output>> {
        let (parameter, map) = self.prepare(request).await?;
        let output = renderer
            .render(&map)
            .map_err(|e| ViewerError::RenderFailure(e.to_string()))?;
        Ok(Rendered {
            parameter,
            map,
            output,
        })
    }
}
