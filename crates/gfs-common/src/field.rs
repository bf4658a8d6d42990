//! Regional 2-D fields ready for rendering.

use crate::bbox::BoundingBox;
use crate::style::{ColorScheme, RenderMode};

/// A 2-D field on a regular lat/lon grid.
///
/// Values are row-major with rows running south to north (latitude
/// ascending) and columns west to east. Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionField {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub values: Vec<f32>,
}

impl RegionField {
    /// Build a field, checking that `values` matches the axes.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, values: Vec<f32>) -> Option<Self> {
        if lats.is_empty() || lons.is_empty() || values.len() != lats.len() * lons.len() {
            return None;
        }
        Some(Self { lats, lons, values })
    }

    /// Number of columns (longitudes).
    pub fn width(&self) -> usize {
        self.lons.len()
    }

    /// Number of rows (latitudes).
    pub fn height(&self) -> usize {
        self.lats.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        self.values.get(row * self.width() + col).copied()
    }

    /// Every `step`-th point along both axes, starting at the first.
    pub fn stride(&self, step: usize) -> RegionField {
        let step = step.max(1);
        let rows: Vec<usize> = (0..self.height()).step_by(step).collect();
        let cols: Vec<usize> = (0..self.width()).step_by(step).collect();

        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for &r in &rows {
            for &c in &cols {
                values.push(self.values[r * self.width() + c]);
            }
        }

        RegionField {
            lats: rows.iter().map(|&r| self.lats[r]).collect(),
            lons: cols.iter().map(|&c| self.lons[c]).collect(),
            values,
        }
    }

    /// Apply `f` to every value, leaving NaN untouched.
    pub fn map_values(mut self, f: impl Fn(f32) -> f32) -> Self {
        for v in &mut self.values {
            if !v.is_nan() {
                *v = f(*v);
            }
        }
        self
    }

    /// Minimum and maximum over the non-NaN values.
    pub fn valid_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// Geographic extent spanned by the grid points.
    pub fn extent(&self) -> BoundingBox {
        let first_last = |axis: &[f64]| {
            let a = axis[0];
            let b = axis[axis.len() - 1];
            (a.min(b), a.max(b))
        };
        let (min_lat, max_lat) = first_last(&self.lats);
        let (min_lon, max_lon) = first_last(&self.lons);
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }
}

/// Eastward and northward wind components on one grid, in m/s.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    pub u: RegionField,
    pub v: RegionField,
}

impl VectorField {
    /// Pair two components, which must share the same axes.
    pub fn new(u: RegionField, v: RegionField) -> Option<Self> {
        if u.lats != v.lats || u.lons != v.lons {
            return None;
        }
        Some(Self { u, v })
    }

    pub fn stride(&self, step: usize) -> VectorField {
        VectorField {
            u: self.u.stride(step),
            v: self.v.stride(step),
        }
    }

    /// Iterate over `(lon, lat, u, v)` for points where both components exist.
    pub fn arrows(&self) -> impl Iterator<Item = (f64, f64, f32, f32)> + '_ {
        let width = self.u.width();
        self.u
            .values
            .iter()
            .zip(&self.v.values)
            .enumerate()
            .filter(|(_, (u, v))| !u.is_nan() && !v.is_nan())
            .map(move |(i, (&u, &v))| (self.u.lons[i % width], self.u.lats[i / width], u, v))
    }
}

/// Everything the renderer needs for one map.
#[derive(Debug, Clone)]
pub struct PreparedMap {
    /// The primary field, already in display units.
    pub field: RegionField,
    /// Down-sampled wind components, present in vector mode only.
    pub vectors: Option<VectorField>,
    pub render_mode: RenderMode,
    pub display_label: String,
    pub color_scheme: ColorScheme,
    /// Validity timestamp, e.g. "12UTC Mon 15 Jan 2024".
    pub valid_time: String,
    /// Lead label, e.g. "t+012".
    pub lead_label: String,
    pub title: String,
    pub subtitle: String,
    pub extent: BoundingBox,
}

impl PreparedMap {
    /// Map title, e.g. "Suhu (°C) - GFS t+006".
    pub fn title_for(display_label: &str, lead_label: &str) -> String {
        format!("{} - GFS {}", display_label, lead_label)
    }

    pub fn subtitle_for(valid_time: &str) -> String {
        format!("Valid: {}", valid_time)
    }
}
