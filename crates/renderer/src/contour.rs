//! Isoline tracing with marching squares.
//!
//! Lines are traced in grid-index space (`x` = column, `y` = row) and joined
//! into polylines by the cell edges they cross, so the caller decides how to
//! project them. Cells with a missing corner produce no segments.

use std::collections::HashMap;

/// A point in grid-index or pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Grid cell edge an isoline crosses. `Horizontal(x, y)` joins grid points
/// `(x, y)` and `(x + 1, y)`; `Vertical(x, y)` joins `(x, y)` and `(x, y + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKey {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

/// One straight piece of an isoline inside a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub from: EdgeKey,
    pub to: EdgeKey,
}

/// A connected isoline at one level.
#[derive(Debug, Clone, PartialEq)]
pub struct Isoline {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Isoline {
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Position and direction (radians) at `distance` along the line.
    pub fn point_at(&self, distance: f32) -> Option<(Point, f32)> {
        let mut travelled = 0.0;
        for w in self.points.windows(2) {
            let len = w[0].distance(&w[1]);
            if len > 0.0 && travelled + len >= distance {
                let t = (distance - travelled) / len;
                let p = Point::new(w[0].x + t * (w[1].x - w[0].x), w[0].y + t * (w[1].y - w[0].y));
                return Some((p, (w[1].y - w[0].y).atan2(w[1].x - w[0].x)));
            }
            travelled += len;
        }
        None
    }

    /// Applies `f` to every point, e.g. to move from grid to pixel space.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Isoline {
        Isoline {
            level: self.level,
            points: self.points.iter().copied().map(f).collect(),
            closed: self.closed,
        }
    }
}

/// `count` evenly spaced levels strictly inside `(min, max)`.
pub fn isoline_levels(min: f32, max: f32, count: usize) -> Vec<f32> {
    if count == 0 || !(max > min) {
        return vec![];
    }
    let step = (max - min) / (count + 1) as f32;
    (1..=count).map(|i| min + step * i as f32).collect()
}

/// Inline label text: whole values without decimals, others with one.
pub fn level_label(level: f32) -> String {
    if (level - level.round()).abs() < 0.05 {
        format!("{:.0}", level)
    } else {
        format!("{:.1}", level)
    }
}

/// Marching squares over a row-major grid at a single level.
pub fn march_squares(values: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || values.len() != width * height {
        return vec![];
    }

    let at = |x: usize, y: usize| values[y * width + x];
    let mut segments = Vec::new();

    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let (tl, tr, br, bl) = (at(x, y), at(x + 1, y), at(x + 1, y + 1), at(x, y + 1));
            if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
                continue;
            }

            let case = (tl >= level) as u8
                | ((tr >= level) as u8) << 1
                | ((br >= level) as u8) << 2
                | ((bl >= level) as u8) << 3;

            let (xf, yf) = (x as f32, y as f32);
            let top = (
                EdgeKey::Horizontal(x, y),
                crossing(Point::new(xf, yf), Point::new(xf + 1.0, yf), tl, tr, level),
            );
            let bottom = (
                EdgeKey::Horizontal(x, y + 1),
                crossing(Point::new(xf, yf + 1.0), Point::new(xf + 1.0, yf + 1.0), bl, br, level),
            );
            let left = (
                EdgeKey::Vertical(x, y),
                crossing(Point::new(xf, yf), Point::new(xf, yf + 1.0), tl, bl, level),
            );
            let right = (
                EdgeKey::Vertical(x + 1, y),
                crossing(Point::new(xf + 1.0, yf), Point::new(xf + 1.0, yf + 1.0), tr, br, level),
            );

            let center_high = (tl + tr + br + bl) / 4.0 >= level;
            let pairs = match case {
                1 | 14 => vec![(left, top)],
                2 | 13 => vec![(top, right)],
                3 | 12 => vec![(left, right)],
                4 | 11 => vec![(right, bottom)],
                6 | 9 => vec![(top, bottom)],
                7 | 8 => vec![(left, bottom)],
                5 if center_high => vec![(top, right), (left, bottom)],
                5 => vec![(left, top), (right, bottom)],
                10 if center_high => vec![(left, top), (right, bottom)],
                10 => vec![(top, right), (left, bottom)],
                _ => vec![],
            };

            segments.extend(pairs.into_iter().map(|((from, start), (to, end))| Segment { start, end, from, to }));
        }
    }

    segments
}

fn crossing(a: Point, b: Point, va: f32, vb: f32, level: f32) -> Point {
    let t = if (vb - va).abs() < f32::EPSILON {
        0.5
    } else {
        ((level - va) / (vb - va)).clamp(0.0, 1.0)
    };
    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
}

/// Chains segments that share cell edges into polylines.
///
/// Open lines are started from their loose ends so each comes out whole;
/// whatever is left afterwards forms closed rings.
pub fn join_segments(segments: &[Segment], level: f32) -> Vec<Isoline> {
    let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, s) in segments.iter().enumerate() {
        by_edge.entry(s.from).or_default().push(i);
        by_edge.entry(s.to).or_default().push(i);
    }
    let degree = |edge: &EdgeKey| by_edge.get(edge).map_or(0, Vec::len);

    let loose_ends = (0..segments.len()).filter(|&i| degree(&segments[i].from) == 1 || degree(&segments[i].to) == 1);
    let order: Vec<usize> = loose_ends.chain(0..segments.len()).collect();

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    for start in order {
        if used[start] {
            continue;
        }
        used[start] = true;

        let seg = &segments[start];
        let (first_edge, mut edge, mut points) = if degree(&seg.to) == 1 && degree(&seg.from) != 1 {
            (seg.to, seg.from, vec![seg.end, seg.start])
        } else {
            (seg.from, seg.to, vec![seg.start, seg.end])
        };

        loop {
            let next = by_edge
                .get(&edge)
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));
            let Some(next) = next else { break };
            used[next] = true;

            let s = &segments[next];
            if s.from == edge {
                points.push(s.end);
                edge = s.to;
            } else {
                points.push(s.start);
                edge = s.from;
            }
        }

        let closed = edge == first_edge && points.len() > 2;
        lines.push(Isoline { level, points, closed });
    }

    lines
}

/// Traces every level over the grid.
pub fn trace(values: &[f32], width: usize, height: usize, levels: &[f32]) -> Vec<Isoline> {
    levels
        .iter()
        .flat_map(|&level| join_segments(&march_squares(values, width, height, level), level))
        .collect()
}

/// Picks label positions: one at the middle of each line at least
/// `min_length` long, skipping any closer than `min_gap` to one already
/// placed or within `margin` of the bounds.
pub fn label_anchors(lines: &[Isoline], min_length: f32, min_gap: f32, bounds: (f32, f32, f32, f32), margin: f32) -> Vec<(Point, f32)> {
    let (x0, y0, x1, y1) = bounds;
    let mut anchors: Vec<(Point, f32)> = Vec::new();

    for line in lines {
        let length = line.length();
        if length < min_length {
            continue;
        }
        let Some((p, _)) = line.point_at(length / 2.0) else {
            continue;
        };
        let inside = p.x > x0 + margin && p.x < x1 - margin && p.y > y0 + margin && p.y < y1 - margin;
        if inside && anchors.iter().all(|(q, _)| q.distance(&p) >= min_gap) {
            anchors.push((p, line.level));
        }
    }

    anchors
}
