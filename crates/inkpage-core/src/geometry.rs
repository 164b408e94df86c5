//! Geometry helpers shared by elements, handles and snapping.
//!
//! Everything here is a pure function over kurbo primitives.

use kurbo::{Point, Rect, Vec2};

/// Rotate a vector by `angle` radians.
pub fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate a point around `center` by `angle` radians.
pub fn rotate_point(point: Point, center: Point, angle: f64) -> Point {
    center + rotate_vec(point - center, angle)
}

/// Build an axis-aligned rectangle from two raw corners in any order.
pub fn rect_from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Rect {
    Rect::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

/// Smallest rectangle containing every point.
pub fn bounds_of_points(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut rect = Rect::from_points(*first, *first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    Some(rect)
}

/// Reduce a list of rectangles to a single min/max rectangle.
pub fn union_rects(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Axis-aligned bounds of a rectangle rotated around its own center.
pub fn rotated_rect_bounds(rect: Rect, rotation: f64) -> Rect {
    if rotation == 0.0 {
        return rect;
    }
    let center = rect.center();
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
    .map(|p| rotate_point(p, center, rotation));
    // corners is non-empty
    bounds_of_points(&corners).unwrap_or(rect)
}

/// Angle of `point` seen from `center`, with 0 pointing up and growing clockwise.
pub fn angle_from_center(center: Point, point: Point) -> f64 {
    let d = point - center;
    d.y.atan2(d.x) + std::f64::consts::FRAC_PI_2
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Test if two line segments (a-b) and (c-d) intersect.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

/// Test if a polyline crosses or lies inside a rectangle.
pub fn polyline_intersects_rect(points: &[Point], rect: Rect) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    points.windows(2).any(|w| {
        (0..4).any(|i| segments_intersect(w[0], w[1], corners[i], corners[(i + 1) % 4]))
    })
}

/// Bezier control point of the quadratic curve from `start` to `end` that passes
/// through `through` at t = 0.5.
pub fn curve_control_point(start: Point, through: Point, end: Point) -> Point {
    let mid = start.midpoint(end);
    Point::new(2.0 * through.x - mid.x, 2.0 * through.y - mid.y)
}

/// Evaluate a quadratic bezier at `t`.
pub fn quadratic_point(p0: Point, control: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * control.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * control.y + t * t * p2.y,
    )
}

/// Sample the curve through `through` into `segments + 1` points.
pub fn sample_curve(start: Point, through: Point, end: Point, segments: usize) -> Vec<Point> {
    let control = curve_control_point(start, through, end);
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| quadratic_point(start, control, end, i as f64 / segments as f64))
        .collect()
}

/// Stretch a dash pattern so a whole number of dash+gap periods covers `length`.
///
/// The pattern ends on a full dash, so closed outlines do not show a broken corner.
pub fn balance_dash(length: f64, dash: f64, gap: f64) -> (f64, f64) {
    let period = dash + gap;
    if length <= 0.0 || period <= 0.0 {
        return (dash, gap);
    }
    let count = ((length + gap) / period).round().max(1.0);
    let covered = count * period - gap;
    if covered <= 0.0 {
        return (dash, gap);
    }
    let scale = length / covered;
    (dash * scale, gap * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(Point::new(10.0, 0.0), Point::ZERO, std::f64::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-10);
        assert!((p.y - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_rect_from_corners_sorts() {
        let r = rect_from_corners(100.0, 50.0, 0.0, -10.0);
        assert_eq!(r, Rect::new(0.0, -10.0, 100.0, 50.0));
    }

    #[test]
    fn test_union_rects() {
        let r = union_rects([Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(-5.0, 5.0, 3.0, 20.0)]);
        assert_eq!(r, Some(Rect::new(-5.0, 0.0, 10.0, 20.0)));
        assert_eq!(union_rects(Vec::new()), None);
    }

    #[test]
    fn test_rotated_rect_bounds_grows() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = rotated_rect_bounds(r, std::f64::consts::FRAC_PI_4);
        assert!(b.width() > 140.0 && b.width() < 142.0);
        assert!((b.center().x - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_curve_passes_through_midpoint() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(100.0, 0.0);
        let through = Point::new(50.0, 40.0);
        let control = curve_control_point(start, through, end);
        let mid = quadratic_point(start, control, end, 0.5);
        assert!((mid.x - 50.0).abs() < 1e-10);
        assert!((mid.y - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_balance_dash_fills_length() {
        let (dash, gap) = balance_dash(100.0, 8.0, 4.0);
        // Nine dashes with eight gaps between them.
        assert!((9.0 * dash + 8.0 * gap - 100.0).abs() < 1e-9);
        assert!((dash / gap - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_dash_degenerate_length() {
        assert_eq!(balance_dash(0.0, 8.0, 4.0), (8.0, 4.0));
    }

    #[test]
    fn test_polyline_rect_intersection() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(polyline_intersects_rect(&[Point::new(0.0, 15.0), Point::new(30.0, 15.0)], rect));
        assert!(!polyline_intersects_rect(&[Point::new(0.0, 0.0), Point::new(30.0, 0.0)], rect));
    }

    #[test]
    fn test_point_to_segment_dist() {
        let d = point_to_segment_dist(Point::new(5.0, 5.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }
}
