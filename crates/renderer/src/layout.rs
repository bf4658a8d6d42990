//! Canvas layout and the plate carrée projection of the plot area.

use gfs_common::BoundingBox;

use crate::error::{RenderError, RenderResult};

const MARGIN_TOP: u32 = 72;
const MARGIN_LEFT: u32 = 56;
const MARGIN_RIGHT: u32 = 24;
const MARGIN_BOTTOM: u32 = 36;
const COLORBAR_BAND: u32 = 84;
const MIN_PLOT: u32 = 16;

/// Integer pixel rectangle on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }
}

/// Maps geographic coordinates onto the plot rectangle.
///
/// Longitude grows to the right and latitude grows upwards, one degree of
/// either spanning the same number of pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    extent: BoundingBox,
    rect: PixelRect,
}

impl Projector {
    pub fn new(extent: BoundingBox, rect: PixelRect) -> Self {
        Self { extent, rect }
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    /// Canvas pixel position of a geographic point.
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (lx, ly) = self.to_local(lon, lat);
        (self.rect.x as f32 + lx, self.rect.y as f32 + ly)
    }

    /// Position relative to the top-left corner of the plot rectangle.
    pub fn to_local(&self, lon: f64, lat: f64) -> (f32, f32) {
        let fx = (lon - self.extent.min_lon) / self.extent.width();
        let fy = (self.extent.max_lat - lat) / self.extent.height();
        (
            (fx * self.rect.width as f64) as f32,
            (fy * self.rect.height as f64) as f32,
        )
    }

    /// Geographic position of the centre of a plot-local pixel.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let fx = (col as f64 + 0.5) / self.rect.width as f64;
        let fy = (row as f64 + 0.5) / self.rect.height as f64;
        (
            self.extent.min_lon + fx * self.extent.width(),
            self.extent.max_lat - fy * self.extent.height(),
        )
    }

    /// Pixels per degree along the horizontal axis.
    pub fn pixels_per_degree(&self) -> f32 {
        (self.rect.width as f64 / self.extent.width()) as f32
    }
}

/// Placement of every map element on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub projector: Projector,
    pub colorbar: Option<PixelRect>,
    pub title_y: i32,
    pub subtitle_y: i32,
}

impl Layout {
    /// Fits the extent into the canvas at equal degree scale, leaving room
    /// for the titles, tick labels and (optionally) a horizontal colour bar.
    pub fn compute(width: u32, height: u32, extent: &BoundingBox, with_colorbar: bool) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidCanvas { width, height });
        }
        if !extent.is_valid() || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(RenderError::NoPlotArea { width, height });
        }

        let bottom = MARGIN_BOTTOM + if with_colorbar { COLORBAR_BAND } else { 0 };
        let avail_w = width.saturating_sub(MARGIN_LEFT + MARGIN_RIGHT);
        let avail_h = height.saturating_sub(MARGIN_TOP + bottom);
        if avail_w < MIN_PLOT || avail_h < MIN_PLOT {
            return Err(RenderError::NoPlotArea { width, height });
        }

        let aspect = extent.width() / extent.height();
        let (plot_w, plot_h) = if avail_w as f64 / avail_h as f64 > aspect {
            ((avail_h as f64 * aspect).round() as u32, avail_h)
        } else {
            (avail_w, (avail_w as f64 / aspect).round() as u32)
        };
        if plot_w < MIN_PLOT || plot_h < MIN_PLOT {
            return Err(RenderError::NoPlotArea { width, height });
        }

        let rect = PixelRect {
            x: MARGIN_LEFT + (avail_w - plot_w) / 2,
            y: MARGIN_TOP + (avail_h - plot_h) / 2,
            width: plot_w,
            height: plot_h,
        };

        let colorbar = with_colorbar.then(|| PixelRect {
            x: rect.x + rect.width / 10,
            y: rect.bottom() + MARGIN_BOTTOM,
            width: (rect.width * 8 / 10).max(1),
            height: 14,
        });

        Ok(Self {
            width,
            height,
            projector: Projector::new(*extent, rect),
            colorbar,
            title_y: 10,
            subtitle_y: 38,
        })
    }

    pub fn plot(&self) -> PixelRect {
        self.projector.rect()
    }
}

/// Evenly spaced tick positions with a readable step, inside `[min, max]`.
pub fn degree_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !(max > min) || target == 0 {
        return vec![];
    }
    let raw = (max - min) / target as f64;
    let step = [0.25, 0.5, 1.0, 2.0, 2.5, 5.0, 10.0, 20.0, 30.0]
        .into_iter()
        .find(|s| *s >= raw)
        .unwrap_or(45.0);

    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

pub fn format_lon(lon: f64) -> String {
    let value = trim_degrees(lon.abs());
    match lon {
        l if l > 0.0 && l < 180.0 => format!("{value}°E"),
        l if l < 0.0 => format!("{value}°W"),
        _ => format!("{value}°"),
    }
}

pub fn format_lat(lat: f64) -> String {
    let value = trim_degrees(lat.abs());
    match lat {
        l if l > 0.0 => format!("{value}°N"),
        l if l < 0.0 => format!("{value}°S"),
        _ => format!("{value}°"),
    }
}

fn trim_degrees(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').to_string()
    }
}
