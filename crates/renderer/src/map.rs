//! Regional forecast map composition.
//!
//! Draws a [`PreparedMap`] onto a fixed-size canvas:
//!
//! 1. plot background and, for filled modes, the colour-ramped surface
//! 2. isolines for the contour mode, or quiver arrows when vectors are present
//! 3. frame, degree ticks and the colour bar
//! 4. text (title, subtitle, tick and isoline labels) when a font is set
//!
//! The title always travels in the PNG `tEXt` metadata as well.

use std::path::PathBuf;

use gfs_common::{PreparedMap, RegionField, RenderMode};
use image::{Rgba, RgbaImage};
use tiny_skia::{IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};
use tracing::{debug, info, instrument};

use crate::contour::{self, Isoline, Point};
use crate::error::{RenderError, RenderResult};
use crate::gradient::{fill_surface, Color, ColorRamp, ValueScale};
use crate::layout::{degree_ticks, format_lat, format_lon, Layout, PixelRect, Projector};
use crate::png;
use crate::text::{Align, TextPainter};
use crate::vectors::{draw_quiver, QuiverStyle};

const TICK_LEN: f32 = 5.0;

/// Canvas size, text sizes and drawing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    pub width: u32,
    pub height: u32,
    pub font_path: Option<PathBuf>,
    pub title_size: f32,
    pub subtitle_size: f32,
    pub tick_size: f32,
    pub label_size: f32,
    pub isoline_levels: usize,
    pub isoline_width: f32,
    pub quiver: QuiverStyle,
    pub background: Color,
    pub plot_background: Color,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            font_path: None,
            title_size: 20.0,
            subtitle_size: 15.0,
            tick_size: 13.0,
            label_size: 12.0,
            isoline_levels: 15,
            isoline_width: 1.1,
            quiver: QuiverStyle::default(),
            background: Color::WHITE,
            plot_background: Color::LIGHT_GRAY,
        }
    }
}

/// Straight RGBA pixels of a finished map.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub title: String,
    pub subtitle: String,
}

impl RenderedMap {
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        png::encode_rgba(
            &self.pixels,
            self.width,
            self.height,
            &[
                ("Title", self.title.as_str()),
                ("Description", self.subtitle.as_str()),
                ("Software", concat!("gfs-viewer ", env!("CARGO_PKG_VERSION"))),
            ],
        )
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).and_then(|p| p.try_into().ok())
    }
}

pub struct MapRenderer {
    style: MapStyle,
    text: TextPainter,
}

impl MapRenderer {
    /// Loads the configured font, if any.
    pub fn new(style: MapStyle) -> RenderResult<Self> {
        if style.width == 0 || style.height == 0 {
            return Err(RenderError::InvalidCanvas {
                width: style.width,
                height: style.height,
            });
        }
        let text = TextPainter::from_config(style.font_path.as_deref())?;
        if !text.has_font() {
            info!("No font configured; map text is omitted and the title is kept as PNG metadata");
        }
        Ok(Self { style, text })
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn draws_text(&self) -> bool {
        self.text.has_font()
    }

    #[instrument(skip_all, fields(title = %map.title, mode = %map.render_mode))]
    pub fn render(&self, map: &PreparedMap) -> RenderResult<RenderedMap> {
        let (width, height) = (self.style.width, self.style.height);
        let scale = ValueScale::from_field(&map.field).ok_or(RenderError::EmptyField)?;
        let layout = Layout::compute(width, height, &map.extent, map.render_mode.is_filled())?;
        let projector = layout.projector;
        let plot = layout.plot();

        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidCanvas { width, height })?;
        pixmap.fill(self.style.background.to_skia());
        fill_rect(&mut pixmap, plot, self.style.plot_background);

        let ramp = ColorRamp::for_scheme(map.color_scheme);
        let labels = match map.render_mode {
            RenderMode::FilledSurface | RenderMode::FilledSurfaceWithVectors => {
                self.draw_surface(&mut pixmap, &map.field, &scale, &ramp, &projector)?;
                Vec::new()
            }
            RenderMode::IsolineContour => self.draw_isolines(&mut pixmap, &map.field, &scale, &projector),
        };

        if let Some(vectors) = &map.vectors {
            let drawn = draw_quiver(&mut pixmap, vectors, &projector, &self.style.quiver);
            debug!(arrows = drawn, "Drew vector arrows");
        }

        stroke_rect(&mut pixmap, plot, Color::BLACK, 1.0);
        let lon_ticks = degree_ticks(map.extent.min_lon, map.extent.max_lon, 6);
        let lat_ticks = degree_ticks(map.extent.min_lat, map.extent.max_lat, 5);
        self.draw_tick_marks(&mut pixmap, &projector, &lon_ticks, &lat_ticks);

        let bar_ticks = scale.ticks(6);
        if let Some(bar) = layout.colorbar {
            draw_colorbar(&mut pixmap, bar, &ramp, &bar_ticks);
        }

        let mut img = to_image(&pixmap);
        if self.text.has_font() {
            self.draw_text(&mut img, map, &layout, &lon_ticks, &lat_ticks, &bar_ticks, &labels);
        }

        Ok(RenderedMap {
            width,
            height,
            pixels: img.into_raw(),
            title: map.title.clone(),
            subtitle: map.subtitle.clone(),
        })
    }

    pub fn render_png(&self, map: &PreparedMap) -> RenderResult<Vec<u8>> {
        self.render(map)?.to_png()
    }

    fn draw_surface(&self, pixmap: &mut Pixmap, field: &RegionField, scale: &ValueScale, ramp: &ColorRamp, projector: &Projector) -> RenderResult<()> {
        let rect = projector.rect();
        let data = fill_surface(field, scale, ramp, projector);
        let size = IntSize::from_wh(rect.width, rect.height).ok_or(RenderError::NoPlotArea {
            width: self.style.width,
            height: self.style.height,
        })?;
        // Ramp colours are opaque and missing pixels fully transparent, so the
        // straight bytes are already valid premultiplied data.
        let surface = Pixmap::from_vec(data, size).ok_or_else(|| RenderError::encode("surface buffer size mismatch"))?;
        pixmap.draw_pixmap(
            rect.x as i32,
            rect.y as i32,
            surface.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Strokes the isolines and returns label anchors in canvas pixels.
    fn draw_isolines(&self, pixmap: &mut Pixmap, field: &RegionField, scale: &ValueScale, projector: &Projector) -> Vec<(Point, f32)> {
        let levels = contour::isoline_levels(scale.min, scale.max, self.style.isoline_levels);
        let lines: Vec<Isoline> = contour::trace(&field.values, field.width(), field.height(), &levels)
            .iter()
            .map(|line| line.map_points(|p| grid_to_pixel(field, projector, p)))
            .collect();
        debug!(levels = levels.len(), lines = lines.len(), "Traced isolines");

        let mut paint = Paint::default();
        paint.set_color(Color::BLACK.to_skia());
        paint.anti_alias = true;
        let stroke = Stroke {
            width: self.style.isoline_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        for line in &lines {
            let Some((first, rest)) = line.points.split_first() else {
                continue;
            };
            let mut pb = PathBuilder::new();
            pb.move_to(first.x, first.y);
            for p in rest {
                pb.line_to(p.x, p.y);
            }
            if line.closed {
                pb.close();
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        let rect = projector.rect();
        let bounds = (rect.x as f32, rect.y as f32, rect.right() as f32, rect.bottom() as f32);
        contour::label_anchors(&lines, 60.0, 90.0, bounds, self.style.label_size)
    }

    fn draw_tick_marks(&self, pixmap: &mut Pixmap, projector: &Projector, lons: &[f64], lats: &[f64]) {
        let rect = projector.rect();
        let mut pb = PathBuilder::new();
        for &lon in lons {
            let (x, _) = projector.to_pixel(lon, projector.extent().min_lat);
            pb.move_to(x, rect.bottom() as f32);
            pb.line_to(x, rect.bottom() as f32 + TICK_LEN);
        }
        for &lat in lats {
            let (_, y) = projector.to_pixel(projector.extent().min_lon, lat);
            pb.move_to(rect.x as f32, y);
            pb.line_to(rect.x as f32 - TICK_LEN, y);
        }
        stroke_path(pixmap, pb, Color::BLACK, 1.0);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        img: &mut RgbaImage,
        map: &PreparedMap,
        layout: &Layout,
        lons: &[f64],
        lats: &[f64],
        bar_ticks: &[f32],
        labels: &[(Point, f32)],
    ) {
        let s = &self.style;
        let plot = layout.plot();
        let center = (layout.width / 2) as i32;

        self.text.draw_bold(img, &map.title, center, layout.title_y, s.title_size, Color::BLACK, Align::Center);
        self.text.draw(img, &map.subtitle, plot.center_x() as i32, layout.subtitle_y, s.subtitle_size, Color::BLACK, Align::Center);

        for &lon in lons {
            let (x, _) = layout.projector.to_pixel(lon, map.extent.min_lat);
            let y = (plot.bottom() as f32 + TICK_LEN + 3.0) as i32;
            self.text.draw(img, &format_lon(lon), x as i32, y, s.tick_size, Color::BLACK, Align::Center);
        }
        for &lat in lats {
            let (_, y) = layout.projector.to_pixel(map.extent.min_lon, lat);
            let x = (plot.x as f32 - TICK_LEN - 3.0) as i32;
            let half = (s.tick_size / 2.0) as i32;
            self.text.draw(img, &format_lat(lat), x, y as i32 - half, s.tick_size, Color::BLACK, Align::Right);
        }

        if let Some(bar) = layout.colorbar {
            for (i, value) in bar_ticks.iter().enumerate() {
                let x = bar.x as f32 + bar.width as f32 * i as f32 / (bar_ticks.len().max(2) - 1) as f32;
                let y = (bar.bottom() as f32 + TICK_LEN + 2.0) as i32;
                self.text.draw(img, &format_bar_value(*value), x as i32, y, s.tick_size, Color::BLACK, Align::Center);
            }
            let y = (bar.bottom() as f32 + TICK_LEN + s.tick_size + 10.0) as i32;
            self.text.draw(img, &map.display_label, bar.center_x() as i32, y, s.tick_size, Color::BLACK, Align::Center);
        }

        for (p, level) in labels {
            self.text.draw_boxed(
                img,
                &contour::level_label(*level),
                p.x as i32,
                p.y as i32,
                s.label_size,
                Color::BLACK,
                s.plot_background,
            );
        }
    }
}

impl std::fmt::Debug for MapRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRenderer")
            .field("style", &self.style)
            .field("text", &self.text)
            .finish()
    }
}

/// Grid-index point to canvas pixels through the field's own axes.
fn grid_to_pixel(field: &RegionField, projector: &Projector, p: Point) -> Point {
    let lon = axis_value(&field.lons, p.x as f64);
    let lat = axis_value(&field.lats, p.y as f64);
    let (x, y) = projector.to_pixel(lon, lat);
    Point::new(x, y)
}

fn axis_value(axis: &[f64], index: f64) -> f64 {
    let last = axis.len().saturating_sub(1);
    let lo = (index.floor().max(0.0) as usize).min(last);
    let hi = (lo + 1).min(last);
    let t = index - lo as f64;
    match (axis.get(lo), axis.get(hi)) {
        (Some(a), Some(b)) => a + (b - a) * t,
        _ => f64::NAN,
    }
}

fn format_bar_value(v: f32) -> String {
    if v.abs() >= 100.0 || (v - v.round()).abs() < 1e-3 {
        format!("{:.0}", v)
    } else if v.abs() >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn fill_rect(pixmap: &mut Pixmap, rect: PixelRect, color: Color) {
    if let Some(r) = Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32) {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        pixmap.fill_rect(r, &paint, Transform::identity(), None);
    }
}

fn stroke_rect(pixmap: &mut Pixmap, rect: PixelRect, color: Color, width: f32) {
    let mut pb = PathBuilder::new();
    let (x0, y0) = (rect.x as f32 + 0.5, rect.y as f32 + 0.5);
    let (x1, y1) = (rect.right() as f32 - 0.5, rect.bottom() as f32 - 0.5);
    pb.move_to(x0, y0);
    pb.line_to(x1, y0);
    pb.line_to(x1, y1);
    pb.line_to(x0, y1);
    pb.close();
    stroke_path(pixmap, pb, color, width);
}

fn stroke_path(pixmap: &mut Pixmap, pb: PathBuilder, color: Color, width: f32) {
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Horizontal bar, minimum on the left, with tick marks under it.
fn draw_colorbar(pixmap: &mut Pixmap, bar: PixelRect, ramp: &ColorRamp, ticks: &[f32]) {
    for i in 0..bar.width {
        let t = (i as f32 + 0.5) / bar.width as f32;
        let column = PixelRect {
            x: bar.x + i,
            y: bar.y,
            width: 1,
            height: bar.height,
        };
        fill_rect(pixmap, column, ramp.at(t));
    }
    stroke_rect(pixmap, bar, Color::BLACK, 1.0);

    let mut pb = PathBuilder::new();
    let n = ticks.len().max(2) - 1;
    for i in 0..ticks.len() {
        let x = bar.x as f32 + bar.width as f32 * i as f32 / n as f32;
        pb.move_to(x, bar.bottom() as f32);
        pb.line_to(x, bar.bottom() as f32 + TICK_LEN);
    }
    stroke_path(pixmap, pb, Color::BLACK, 1.0);
}

fn to_image(pixmap: &Pixmap) -> RgbaImage {
    RgbaImage::from_fn(pixmap.width(), pixmap.height(), |x, y| match pixmap.pixel(x, y) {
        Some(p) => {
            let c = p.demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        }
        None => Rgba([0, 0, 0, 0]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_value_interpolates() {
        let axis = [95.0, 95.25, 95.5];
        assert_eq!(axis_value(&axis, 0.0), 95.0);
        assert_eq!(axis_value(&axis, 1.5), 95.375);
        assert_eq!(axis_value(&axis, 2.0), 95.5);
    }

    #[test]
    fn test_format_bar_value() {
        assert_eq!(format_bar_value(1012.4), "1012");
        assert_eq!(format_bar_value(26.85), "26.9");
        assert_eq!(format_bar_value(0.5), "0.50");
        assert_eq!(format_bar_value(3.0), "3");
    }
}
