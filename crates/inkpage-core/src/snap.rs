//! Snapping: grid, angle and alignment guides against other elements.

use kurbo::{Point, Rect, Vec2};

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Snap an angle to the nearest increment. Returns degrees in 0-360.
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

/// Snap a connector endpoint to 15° increments around `start`, keeping its distance.
pub fn snap_line_endpoint(start: Point, end: Point) -> Point {
    let d = end - start;
    let distance = d.hypot();
    if distance < 0.001 {
        return end;
    }
    let angle = snap_angle(d.y.atan2(d.x).to_degrees(), ANGLE_SNAP_INCREMENT).to_radians();
    Point::new(start.x + distance * angle.cos(), start.y + distance * angle.sin())
}

/// Which coordinate a snap edge constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapAxis {
    /// A vertical line at a fixed x.
    X,
    /// A horizontal line at a fixed y.
    Y,
}

/// Where on the element an edge lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapEdgeKind {
    Start,
    Center,
    End,
}

/// An alignment line contributed by an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapEdge {
    pub axis: SnapAxis,
    pub kind: SnapEdgeKind,
    /// The constrained coordinate.
    pub position: f64,
    /// Extent of the line along the other axis.
    pub start: f64,
    pub end: f64,
}

/// Default edges of a box: 4 sides and 2 center lines.
pub fn default_snap_edges(rect: Rect) -> Vec<SnapEdge> {
    let center = rect.center();
    let x = |kind, position| SnapEdge { axis: SnapAxis::X, kind, position, start: rect.y0, end: rect.y1 };
    let y = |kind, position| SnapEdge { axis: SnapAxis::Y, kind, position, start: rect.x0, end: rect.x1 };
    vec![
        x(SnapEdgeKind::Start, rect.x0),
        x(SnapEdgeKind::Center, center.x),
        x(SnapEdgeKind::End, rect.x1),
        y(SnapEdgeKind::Start, rect.y0),
        y(SnapEdgeKind::Center, center.y),
        y(SnapEdgeKind::End, rect.y1),
    ]
}

/// Default points drawn along a matched edge: both ends and the middle.
pub fn default_snap_points(edge: &SnapEdge) -> Vec<Point> {
    let mid = (edge.start + edge.end) / 2.0;
    [edge.start, mid, edge.end]
        .into_iter()
        .map(|along| match edge.axis {
            SnapAxis::X => Point::new(edge.position, along),
            SnapAxis::Y => Point::new(along, edge.position),
        })
        .collect()
}

/// An active alignment guide to display while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapGuide {
    pub axis: SnapAxis,
    pub position: f64,
    /// Points on both the moving and the target elements that line up.
    pub points: Vec<Point>,
}

/// Result of snapping a moving set of edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapResult {
    /// Correction to add to the drag delta.
    pub offset: Vec2,
    pub guides: Vec<SnapGuide>,
}

impl SnapResult {
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// A target edge together with the points its element contributes along it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTarget {
    pub edge: SnapEdge,
    pub points: Vec<Point>,
}

/// Find the closest target edge per axis within `threshold` and return the
/// correction that aligns the moving edges with it.
pub fn snap_edges(moving: &[SnapEdge], targets: &[SnapTarget], threshold: f64) -> SnapResult {
    let mut result = SnapResult::default();
    for axis in [SnapAxis::X, SnapAxis::Y] {
        let mut best: Option<(f64, &SnapEdge, &SnapTarget)> = None;
        for m in moving.iter().filter(|e| e.axis == axis) {
            for t in targets.iter().filter(|t| t.edge.axis == axis) {
                let diff = t.edge.position - m.position;
                if diff.abs() <= threshold && best.is_none_or(|(d, _, _)| diff.abs() < d.abs()) {
                    best = Some((diff, m, t));
                }
            }
        }
        let Some((diff, m, t)) = best else { continue };
        let mut aligned = *m;
        aligned.position += diff;
        let mut points = default_snap_points(&aligned);
        // Every target sharing the snapped position joins the same guide.
        for other in targets.iter().filter(|o| o.edge.axis == axis) {
            if (other.edge.position - t.edge.position).abs() < 1e-6 {
                points.extend(other.points.iter().copied());
            }
        }
        match axis {
            SnapAxis::X => result.offset.x = diff,
            SnapAxis::Y => result.offset.y = diff,
        }
        result.guides.push(SnapGuide { axis, position: t.edge.position, points });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(rect: Rect) -> Vec<SnapTarget> {
        default_snap_edges(rect)
            .into_iter()
            .map(|edge| SnapTarget { edge, points: default_snap_points(&edge) })
            .collect()
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(23.0, 47.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(31.0, 51.0), 20.0), Point::new(40.0, 60.0));
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < 0.01);
        assert!((snap_angle(359.0, 15.0) - 0.0).abs() < 0.01);
        assert!((snap_angle(-10.0, 15.0) - 345.0).abs() < 0.01);
    }

    #[test]
    fn test_snap_line_endpoint_preserves_distance() {
        let end = snap_line_endpoint(Point::ZERO, Point::new(100.0, 5.0));
        assert!(end.y.abs() < 1e-9);
        assert!((end.x - (100.0f64.powi(2) + 25.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_default_edges() {
        let edges = default_snap_edges(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(edges.len(), 6);
        assert_eq!(edges.iter().filter(|e| e.kind == SnapEdgeKind::Center).count(), 2);
    }

    #[test]
    fn test_snap_edges_within_threshold() {
        let moving = default_snap_edges(Rect::new(104.0, 300.0, 154.0, 350.0));
        let targets = target(Rect::new(0.0, 0.0, 100.0, 100.0));
        let result = snap_edges(&moving, &targets, 10.0);
        assert!((result.offset.x + 4.0).abs() < 1e-9);
        assert_eq!(result.offset.y, 0.0);
        assert_eq!(result.guides.len(), 1);
        assert_eq!(result.guides[0].axis, SnapAxis::X);
    }

    #[test]
    fn test_snap_edges_out_of_range() {
        let moving = default_snap_edges(Rect::new(150.0, 250.0, 180.0, 280.0));
        let targets = target(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(!snap_edges(&moving, &targets, 10.0).is_snapped());
    }
}
