//! Colour ramps and filled-surface rendering for region fields.

use gfs_common::{ColorScheme, RegionField};
use rayon::prelude::*;

use crate::layout::Projector;

/// Colour value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::opaque(0, 0, 0);
    pub const WHITE: Color = Color::opaque(255, 255, 255);
    pub const LIGHT_GRAY: Color = Color::opaque(211, 211, 211);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

// Stops sampled from the matplotlib colormaps of the same name.
const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c", "#08306b",
];
const COOLWARM: [&str; 9] = [
    "#3b4cc0", "#5977e3", "#7b9ff9", "#9ebeff", "#c0d4f5", "#dddcdc", "#f2cbb7", "#f7ac8e", "#b40426",
];
const YLGNBU: [&str; 9] = [
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8", "#253494", "#081d58",
];
const COOL: [&str; 2] = ["#00ffff", "#ff00ff"];

/// Evenly spaced colour stops spanning normalised values `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<Color>,
}

impl ColorRamp {
    pub fn for_scheme(scheme: ColorScheme) -> Self {
        let hex: &[&str] = match scheme {
            ColorScheme::Blues => &BLUES,
            ColorScheme::CoolWarm => &COOLWARM,
            ColorScheme::YlGnBu => &YLGNBU,
            ColorScheme::Cool => &COOL,
        };
        Self::from_colors(hex.iter().filter_map(|h| Color::from_hex(h)).collect())
    }

    pub fn from_colors(stops: Vec<Color>) -> Self {
        Self { stops }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Colour for a normalised value; NaN maps to transparent.
    pub fn at(&self, t: f32) -> Color {
        if t.is_nan() {
            return Color::TRANSPARENT;
        }
        match self.stops.as_slice() {
            [] => Color::TRANSPARENT,
            [only] => *only,
            stops => {
                let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
                let i = (pos.floor() as usize).min(stops.len() - 2);
                stops[i].lerp(stops[i + 1], pos - i as f32)
            }
        }
    }
}

/// Linear mapping from data values onto `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f32,
    pub max: f32,
}

impl ValueScale {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Auto-scales to the field's valid range.
    pub fn from_field(field: &RegionField) -> Option<Self> {
        field.valid_range().map(|(min, max)| Self::new(min, max))
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn normalize(&self, value: f32) -> f32 {
        if value.is_nan() {
            return f32::NAN;
        }
        if self.span().abs() < 1e-6 {
            return 0.5;
        }
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, t: f32) -> f32 {
        self.min + self.span() * t
    }

    /// `count` evenly spaced values from min to max inclusive.
    pub fn ticks(&self, count: usize) -> Vec<f32> {
        match count {
            0 => vec![],
            1 => vec![self.min],
            n => (0..n).map(|i| self.value_at(i as f32 / (n - 1) as f32)).collect(),
        }
    }
}

/// Fractional index of `value` within an ascending axis, `None` outside it.
pub fn axis_position(axis: &[f64], value: f64) -> Option<f64> {
    let (first, last) = (*axis.first()?, *axis.last()?);
    if value < first || value > last {
        return None;
    }
    let hi = axis.partition_point(|a| *a <= value);
    if hi >= axis.len() {
        return Some((axis.len() - 1) as f64);
    }
    let lo = hi - 1;
    let span = axis[hi] - axis[lo];
    let frac = if span > 0.0 { (value - axis[lo]) / span } else { 0.0 };
    Some(lo as f64 + frac)
}

/// Bilinear sample of the field at a geographic point.
///
/// Missing corners are left out and the remaining weights renormalised; at
/// least half of the weight must come from valid corners.
pub fn sample_bilinear(field: &RegionField, lon: f64, lat: f64) -> f32 {
    let (Some(fx), Some(fy)) = (axis_position(&field.lons, lon), axis_position(&field.lats, lat)) else {
        return f32::NAN;
    };
    let (x0, y0) = (fx.floor() as usize, fy.floor() as usize);
    let x1 = (x0 + 1).min(field.width() - 1);
    let y1 = (y0 + 1).min(field.height() - 1);
    let dx = (fx - x0 as f64) as f32;
    let dy = (fy - y0 as f64) as f32;

    let corners = [
        (y0, x0, (1.0 - dx) * (1.0 - dy)),
        (y0, x1, dx * (1.0 - dy)),
        (y1, x0, (1.0 - dx) * dy),
        (y1, x1, dx * dy),
    ];

    let (mut sum, mut weight) = (0.0f32, 0.0f32);
    for (row, col, w) in corners {
        if w <= 0.0 {
            continue;
        }
        if let Some(v) = field.get(row, col).filter(|v| !v.is_nan()) {
            sum += v * w;
            weight += w;
        }
    }

    if weight >= 0.5 {
        sum / weight
    } else {
        f32::NAN
    }
}

/// Colours every pixel of the plot rectangle from the field.
///
/// Returns straight RGBA bytes sized to the projector's rectangle; pixels
/// without data are transparent. Rows are filled in parallel.
pub fn fill_surface(field: &RegionField, scale: &ValueScale, ramp: &ColorRamp, projector: &Projector) -> Vec<u8> {
    let rect = projector.rect();
    let (width, height) = (rect.width as usize, rect.height as usize);
    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 {
        return pixels;
    }

    pixels.par_chunks_mut(width * 4).enumerate().for_each(|(row, line)| {
        for (col, px) in line.chunks_exact_mut(4).enumerate() {
            let (lon, lat) = projector.pixel_center(col, row);
            let value = sample_bilinear(field, lon, lat);
            px.copy_from_slice(&ramp.at(scale.normalize(value)).to_rgba());
        }
    });

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#08306b"), Some(Color::opaque(8, 48, 107)));
        assert_eq!(Color::from_hex("ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert_eq!(mid, Color::opaque(128, 128, 128));
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 3.0), Color::WHITE);
    }

    #[test]
    fn test_every_scheme_has_stops() {
        for scheme in [ColorScheme::Blues, ColorScheme::CoolWarm, ColorScheme::YlGnBu, ColorScheme::Cool] {
            assert!(ColorRamp::for_scheme(scheme).len() >= 2, "{scheme}");
        }
    }

    #[test]
    fn test_axis_position() {
        let axis = [0.0, 0.25, 0.5, 0.75];
        assert_eq!(axis_position(&axis, 0.0), Some(0.0));
        assert_eq!(axis_position(&axis, 0.375), Some(1.5));
        assert_eq!(axis_position(&axis, 0.75), Some(3.0));
        assert_eq!(axis_position(&axis, 0.8), None);
        assert_eq!(axis_position(&[], 0.0), None);
    }
}
