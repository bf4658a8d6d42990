//! Cutting a resolved field to the map region.
//!
//! Selection follows label-slice semantics: a slice `start..=stop` walks the
//! axis in storage order and keeps every coordinate between the two labels,
//! both ends included. On a descending axis the bounds must be given
//! north-first, so the extractor picks the bound order from the axis
//! direction before slicing.

use std::ops::Range;
use std::time::Duration;

use gfs_common::{
    BoundingBox, GriddedDataset, RegionField, VariableInfo, VectorField, ViewerError, ViewerResult,
};
use tracing::debug;

use crate::parameter::{LazyField, ResolvedParameter};

const TIME_DIMS: &[&str] = &["time", "t"];
const LAT_DIMS: &[&str] = &["lat", "latitude"];
const LON_DIMS: &[&str] = &["lon", "longitude"];

/// Storage direction of a coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    Ascending,
    Descending,
}

impl AxisOrder {
    /// Direction of a strictly monotonic axis; `None` otherwise.
    pub fn detect(axis: &[f64]) -> Option<Self> {
        if axis.is_empty() || axis.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if axis.windows(2).all(|w| w[0] < w[1]) {
            Some(AxisOrder::Ascending)
        } else if axis.windows(2).all(|w| w[0] > w[1]) {
            Some(AxisOrder::Descending)
        } else {
            None
        }
    }
}

/// Indices of `axis` selected by the label slice `start..=stop`.
///
/// On an ascending axis this keeps `start <= x <= stop`; on a descending
/// axis `start >= x >= stop`. Bounds given in the opposite order select
/// nothing.
pub fn label_slice(axis: &[f64], order: AxisOrder, start: f64, stop: f64) -> Range<usize> {
    let inside = |x: f64| match order {
        AxisOrder::Ascending => x >= start && x <= stop,
        AxisOrder::Descending => x <= start && x >= stop,
    };
    match axis.iter().position(|&x| inside(x)) {
        Some(first) => {
            let len = axis[first..].iter().take_while(|&&x| inside(x)).count();
            first..first + len
        }
        None => 0..0,
    }
}

/// How a variable's storage maps onto a normalised (lat, lon) grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabPlan {
    /// Hyperslab to read, one range per storage dimension.
    pub slab: Vec<Range<usize>>,
    pub lat_dim: usize,
    pub lon_dim: usize,
    pub lat_order: AxisOrder,
    pub lon_order: AxisOrder,
    /// Selected latitudes, ascending.
    pub lats: Vec<f64>,
    /// Selected longitudes, ascending.
    pub lons: Vec<f64>,
    /// Dimension names in storage order.
    pub dims: Vec<String>,
}

impl SlabPlan {
    fn slab_sizes(&self) -> Vec<usize> {
        self.slab.iter().map(|r| r.end - r.start).collect()
    }

    /// Reorder values read with `slab` into rows of ascending latitude and
    /// columns of ascending longitude.
    pub fn normalise(&self, values: &[f32]) -> ViewerResult<Vec<f32>> {
        let sizes = self.slab_sizes();
        let expected: usize = sizes.iter().product();
        if values.len() != expected {
            return Err(ViewerError::SliceFailure(format!(
                "read returned {} values, expected {}",
                values.len(),
                expected
            )));
        }

        // Row-major strides of the slab in storage order.
        let mut strides = vec![1usize; sizes.len()];
        for d in (0..sizes.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * sizes[d + 1];
        }

        let nlat = sizes[self.lat_dim];
        let nlon = sizes[self.lon_dim];
        let mut out = Vec::with_capacity(nlat * nlon);
        for row in 0..nlat {
            let lat_idx = match self.lat_order {
                AxisOrder::Ascending => row,
                AxisOrder::Descending => nlat - 1 - row,
            };
            for col in 0..nlon {
                let lon_idx = match self.lon_order {
                    AxisOrder::Ascending => col,
                    AxisOrder::Descending => nlon - 1 - col,
                };
                out.push(values[lat_idx * strides[self.lat_dim] + lon_idx * strides[self.lon_dim]]);
            }
        }
        Ok(out)
    }
}

/// A region ready for validation: the primary field plus optional vectors.
#[derive(Debug, Clone)]
pub struct ExtractedRegion {
    pub field: RegionField,
    pub vectors: Option<VectorField>,
}

/// Cuts fields to a fixed geographic box.
#[derive(Debug, Clone)]
pub struct RegionExtractor {
    region: BoundingBox,
    read_timeout: Duration,
}

impl RegionExtractor {
    pub fn new(region: BoundingBox, read_timeout: Duration) -> Self {
        Self {
            region,
            read_timeout,
        }
    }

    pub fn region(&self) -> &BoundingBox {
        &self.region
    }

    /// Work out the hyperslab and axis handling for `variable` at `lead`.
    pub fn plan(&self, dataset: &dyn GriddedDataset, variable: &str, lead: usize) -> ViewerResult<SlabPlan> {
        let info = dataset
            .variable(variable)
            .ok_or_else(|| ViewerError::SliceFailure(format!("variable '{}' not in dataset", variable)))?;

        let lat_dim = info.dim_position(LAT_DIMS).ok_or_else(|| missing_dim(info, "latitude"))?;
        let lon_dim = info.dim_position(LON_DIMS).ok_or_else(|| missing_dim(info, "longitude"))?;
        let time_dim = info.dim_position(TIME_DIMS);

        let lat_axis = axis(dataset, info, lat_dim)?;
        let lon_axis = axis(dataset, info, lon_dim)?;

        let lat_order = AxisOrder::detect(lat_axis).ok_or_else(|| {
            ViewerError::SliceFailure(format!("latitude axis of '{}' is not monotonic", variable))
        })?;
        let lon_order = AxisOrder::detect(lon_axis).ok_or_else(|| {
            ViewerError::SliceFailure(format!("longitude axis of '{}' is not monotonic", variable))
        })?;

        let (south, north) = self.region.lat_bounds();
        let (lat_start, lat_stop) = match lat_order {
            AxisOrder::Ascending => (south, north),
            AxisOrder::Descending => (north, south),
        };
        let lat_range = label_slice(lat_axis, lat_order, lat_start, lat_stop);

        let (west, east) = self.region.lon_bounds();
        let (lon_start, lon_stop) = match lon_order {
            AxisOrder::Ascending => (west, east),
            AxisOrder::Descending => (east, west),
        };
        let lon_range = label_slice(lon_axis, lon_order, lon_start, lon_stop);

        if lat_range.is_empty() || lon_range.is_empty() {
            return Err(ViewerError::SliceFailure(format!(
                "region {} selects no grid points of '{}'",
                self.region, variable
            )));
        }

        let mut slab = Vec::with_capacity(info.dims.len());
        for (d, dim) in info.dims.iter().enumerate() {
            let range = if d == lat_dim {
                lat_range.clone()
            } else if d == lon_dim {
                lon_range.clone()
            } else if Some(d) == time_dim {
                if lead >= dim.size {
                    return Err(ViewerError::LeadOutOfRange {
                        lead,
                        available: dim.size,
                    });
                }
                lead..lead + 1
            } else if dim.size == 1 {
                0..1
            } else {
                return Err(ViewerError::SliceFailure(format!(
                    "'{}' has an extra dimension '{}' of size {}",
                    variable, dim.name, dim.size
                )));
            };
            slab.push(range);
        }

        let mut lats = lat_axis[lat_range].to_vec();
        if lat_order == AxisOrder::Descending {
            lats.reverse();
        }
        let mut lons = lon_axis[lon_range].to_vec();
        if lon_order == AxisOrder::Descending {
            lons.reverse();
        }

        Ok(SlabPlan {
            slab,
            lat_dim,
            lon_dim,
            lat_order,
            lon_order,
            lats,
            lons,
            dims: info.dim_names().iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Read one plan for `variable`, normalised to (lat, lon).
    async fn read_plan(
        &self,
        dataset: &dyn GriddedDataset,
        variable: &str,
        plan: &SlabPlan,
    ) -> ViewerResult<Vec<f32>> {
        debug!(variable = %variable, slab = ?plan.slab, "Reading region");
        let values = match tokio::time::timeout(self.read_timeout, dataset.read(variable, &plan.slab)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ViewerError::DataUnavailable(format!(
                    "reading '{}' timed out after {:?}",
                    variable, self.read_timeout
                )))
            }
        };
        plan.normalise(&values)
    }

    /// Extract a lazy field, applying its unit transform.
    pub async fn extract(&self, dataset: &dyn GriddedDataset, field: &LazyField) -> ViewerResult<RegionField> {
        let (raw, plan) = self.read_sources(dataset, &field.sources, field.lead).await?;
        region_field(&plan, field.apply(&raw))
    }

    /// Extract a resolved parameter: the primary field and, in vector mode,
    /// the untransformed u and v components on the same grid.
    pub async fn extract_parameter(
        &self,
        dataset: &dyn GriddedDataset,
        resolved: &ResolvedParameter,
    ) -> ViewerResult<ExtractedRegion> {
        let primary = &resolved.primary;
        let (raw, plan) = self.read_sources(dataset, &primary.sources, primary.lead).await?;

        let vectors = match &resolved.secondary {
            Some(pair) => {
                let component = |name: &str| -> ViewerResult<RegionField> {
                    match primary.sources.iter().position(|s| s == name) {
                        Some(i) => region_field(&plan, raw[i].clone()),
                        None => Err(ViewerError::SliceFailure(format!(
                            "vector component '{}' is not a source of the primary field",
                            name
                        ))),
                    }
                };
                let u = component(&pair.u)?;
                let v = component(&pair.v)?;
                Some(VectorField::new(u, v).ok_or_else(|| {
                    ViewerError::SliceFailure("u and v components are on different grids".into())
                })?)
            }
            None => None,
        };

        let field = region_field(&plan, primary.apply(&raw))?;
        Ok(ExtractedRegion { field, vectors })
    }

    /// Read every source with one shared plan.
    async fn read_sources(
        &self,
        dataset: &dyn GriddedDataset,
        sources: &[String],
        lead: usize,
    ) -> ViewerResult<(Vec<Vec<f32>>, SlabPlan)> {
        let first = sources
            .first()
            .ok_or_else(|| ViewerError::SliceFailure("field has no source variables".into()))?;
        let plan = self.plan(dataset, first, lead)?;

        for other in &sources[1..] {
            let other_plan = self.plan(dataset, other, lead)?;
            if other_plan != plan {
                return Err(ViewerError::SliceFailure(format!(
                    "'{}' and '{}' do not share a dimension layout ({:?} vs {:?})",
                    first, other, plan.dims, other_plan.dims
                )));
            }
        }

        let mut raw = Vec::with_capacity(sources.len());
        for name in sources {
            raw.push(self.read_plan(dataset, name, &plan).await?);
        }
        Ok((raw, plan))
    }
}

fn region_field(plan: &SlabPlan, values: Vec<f32>) -> ViewerResult<RegionField> {
    RegionField::new(plan.lats.clone(), plan.lons.clone(), values)
        .ok_or_else(|| ViewerError::SliceFailure("region values do not match the grid".into()))
}

fn missing_dim(info: &VariableInfo, what: &str) -> ViewerError {
    ViewerError::SliceFailure(format!(
        "'{}' has no {} dimension (dimensions: {})",
        info.name,
        what,
        info.dim_names().join(", ")
    ))
}

fn axis<'a>(dataset: &'a dyn GriddedDataset, info: &VariableInfo, dim: usize) -> ViewerResult<&'a [f64]> {
    let dim = &info.dims[dim];
    let values = dataset
        .coordinate(&dim.name)
        .ok_or_else(|| ViewerError::SliceFailure(format!("coordinate axis '{}' is missing", dim.name)))?;
    if values.is_empty() {
        return Err(ViewerError::SliceFailure(format!("coordinate axis '{}' is empty", dim.name)));
    }
    if values.len() != dim.size {
        return Err(ViewerError::SliceFailure(format!(
            "coordinate axis '{}' has {} values but the dimension has {}",
            dim.name,
            values.len(),
            dim.size
        )));
    }
    Ok(values)
}
