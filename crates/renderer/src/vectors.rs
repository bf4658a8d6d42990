//! Quiver arrows for u/v vector fields.
//!
//! Arrow length follows the quiver convention: a vector of magnitude
//! `scale` spans the full plot width. The shaft is `width` times the plot
//! width; the head is three shafts wide and five long.

use gfs_common::VectorField;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::contour::Point;
use crate::gradient::Color;
use crate::layout::Projector;

const HEAD_WIDTH: f32 = 3.0;
const HEAD_LENGTH: f32 = 5.0;
const HEAD_AXIS_LENGTH: f32 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuiverStyle {
    /// Data units per plot width.
    pub scale: f32,
    /// Shaft width as a fraction of the plot width.
    pub width: f32,
    pub color: Color,
}

impl Default for QuiverStyle {
    fn default() -> Self {
        Self {
            scale: 700.0,
            width: 0.002,
            color: Color::BLACK,
        }
    }
}

/// Outline of one arrow, tail centre first, counter-clockwise.
pub fn arrow_outline(tail: Point, dx: f32, dy: f32, shaft: f32) -> Option<[Point; 7]> {
    let length = (dx * dx + dy * dy).sqrt();
    if !(length >= shaft * 0.5) || shaft <= 0.0 {
        return None;
    }

    let (mut head_len, mut head_axis, mut head_half) =
        (HEAD_LENGTH * shaft, HEAD_AXIS_LENGTH * shaft, HEAD_WIDTH * shaft / 2.0);
    if length < head_len {
        let shrink = length / head_len;
        head_len *= shrink;
        head_axis *= shrink;
        head_half *= shrink;
    }

    let (ux, uy) = (dx / length, dy / length);
    let place = |along: f32, across: f32| Point::new(tail.x + along * ux - across * uy, tail.y + along * uy + across * ux);
    let half = shaft / 2.0;

    Some([
        place(0.0, -half),
        place(length - head_axis, -half),
        place(length - head_len, -head_half),
        place(length, 0.0),
        place(length - head_len, head_half),
        place(length - head_axis, half),
        place(0.0, half),
    ])
}

/// Draws one arrow per valid vector; returns how many were drawn.
pub fn draw_quiver(pixmap: &mut Pixmap, vectors: &VectorField, projector: &Projector, style: &QuiverStyle) -> usize {
    let plot_width = projector.rect().width as f32;
    let per_unit = plot_width / style.scale;
    let shaft = (style.width * plot_width).max(1.0);

    let mut pb = PathBuilder::new();
    let mut drawn = 0;
    for (lon, lat, u, v) in vectors.arrows() {
        let (x, y) = projector.to_pixel(lon, lat);
        // Screen y grows downwards while v points north.
        let Some(outline) = arrow_outline(Point::new(x, y), u * per_unit, -v * per_unit, shaft) else {
            continue;
        };
        pb.move_to(outline[0].x, outline[0].y);
        for p in &outline[1..] {
            pb.line_to(p.x, p.y);
        }
        pb.close();
        drawn += 1;
    }

    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color(style.color.to_skia());
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    drawn
}
