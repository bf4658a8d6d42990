//! Tests for isoline tracing.

use renderer::contour::{isoline_levels, join_segments, label_anchors, level_label, march_squares, trace, Isoline, Point};

// ============================================================================
// isoline_levels / level_label
// ============================================================================

#[test]
fn test_levels_strictly_inside_range() {
    let levels = isoline_levels(1000.0, 1016.0, 15);
    assert_eq!(levels.len(), 15);
    assert_eq!(levels[0], 1001.0);
    assert_eq!(levels[14], 1015.0);
    assert!(levels.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_levels_for_flat_or_inverted_range() {
    assert!(isoline_levels(5.0, 5.0, 15).is_empty());
    assert!(isoline_levels(10.0, 0.0, 15).is_empty());
    assert!(isoline_levels(0.0, 1.0, 0).is_empty());
    assert!(isoline_levels(f32::NAN, 1.0, 3).is_empty());
}

#[test]
fn test_level_label_format() {
    assert_eq!(level_label(1012.0), "1012");
    assert_eq!(level_label(1012.5), "1012.5");
    assert_eq!(level_label(-3.3), "-3.3");
}

// ============================================================================
// march_squares
// ============================================================================

#[test]
fn test_march_squares_rejects_bad_grids() {
    assert!(march_squares(&[1.0], 1, 1, 0.5).is_empty());
    assert!(march_squares(&[], 0, 0, 0.5).is_empty());
    assert!(march_squares(&[1.0, 2.0, 3.0], 2, 2, 0.5).is_empty());
}

#[test]
fn test_march_squares_vertical_line() {
    // Columns 0, 1, 2; level 1.5 crosses between columns 1 and 2.
    let values = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
    let segments = march_squares(&values, 3, 2, 1.5);
    assert_eq!(segments.len(), 1);

    let s = &segments[0];
    assert_eq!(s.start.x, 1.5);
    assert_eq!(s.end.x, 1.5);
    assert_eq!((s.start.y.min(s.end.y), s.start.y.max(s.end.y)), (0.0, 1.0));
}

#[test]
fn test_march_squares_skips_missing_cells() {
    let values = [0.0, f32::NAN, 2.0, 0.0, 1.0, 2.0];
    // Both cells touch the NaN corner.
    assert!(march_squares(&values, 3, 2, 0.5).is_empty());
}

// ============================================================================
// join_segments / trace
// ============================================================================

fn bump(size: usize) -> Vec<f32> {
    let c = (size - 1) as f32 / 2.0;
    (0..size * size)
        .map(|i| {
            let (x, y) = ((i % size) as f32, (i / size) as f32);
            10.0 - ((x - c).powi(2) + (y - c).powi(2)).sqrt()
        })
        .collect()
}

#[test]
fn test_bump_gives_closed_ring() {
    let lines = trace(&bump(9), 9, 9, &[8.0]);
    assert_eq!(lines.len(), 1);

    let ring = &lines[0];
    assert!(ring.closed);
    assert_eq!(ring.level, 8.0);
    assert_eq!(ring.points.first(), ring.points.last());
    // Radius 2 circle, perimeter close to 4π.
    assert!((ring.length() - 4.0 * std::f32::consts::PI).abs() < 1.0);
}

#[test]
fn test_open_line_joined_end_to_end() {
    // A ramp along x gives one open line from the bottom to the top edge.
    let (w, h) = (4, 6);
    let values: Vec<f32> = (0..w * h).map(|i| (i % w) as f32).collect();
    let segments = march_squares(&values, w, h, 1.5);
    assert_eq!(segments.len(), h - 1);

    let lines = join_segments(&segments, 1.5);
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].closed);
    assert_eq!(lines[0].points.len(), h);
    let ys: Vec<f32> = lines[0].points.iter().map(|p| p.y).collect();
    assert!(ys == (0..h).map(|y| y as f32).collect::<Vec<_>>() || ys.iter().rev().copied().eq((0..h).map(|y| y as f32)));
}

#[test]
fn test_trace_multiple_levels() {
    let lines = trace(&bump(11), 11, 11, &[6.5, 8.0, 9.0]);
    let mut levels: Vec<f32> = lines.iter().map(|l| l.level).collect();
    levels.dedup();
    assert_eq!(levels, vec![6.5, 8.0, 9.0]);
    assert!(lines.iter().all(|l| l.closed));
}

// ============================================================================
// Label placement
// ============================================================================

fn horizontal(level: f32, y: f32, x0: f32, x1: f32) -> Isoline {
    Isoline {
        level,
        points: vec![Point::new(x0, y), Point::new(x1, y)],
        closed: false,
    }
}

#[test]
fn test_label_at_line_middle() {
    let anchors = label_anchors(&[horizontal(1.0, 50.0, 0.0, 200.0)], 60.0, 90.0, (0.0, 0.0, 300.0, 100.0), 10.0);
    assert_eq!(anchors, vec![(Point::new(100.0, 50.0), 1.0)]);
}

#[test]
fn test_labels_skip_short_crowded_and_edge_lines() {
    let lines = [
        horizontal(1.0, 50.0, 0.0, 200.0),
        // Too short.
        horizontal(2.0, 20.0, 0.0, 30.0),
        // Its middle is too close to the first label.
        horizontal(3.0, 60.0, 20.0, 180.0),
        // Against the bottom edge.
        horizontal(4.0, 98.0, 0.0, 200.0),
    ];
    let anchors = label_anchors(&lines, 60.0, 90.0, (0.0, 0.0, 300.0, 100.0), 10.0);
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].1, 1.0);
}
