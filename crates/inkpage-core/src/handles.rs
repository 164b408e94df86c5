//! Control handles and the handle-driven resize algorithm.
//!
//! Resize math runs in the element's unrotated local frame: the pointer delta is
//! rotated by the inverse rotation before it is applied, and handle positions are
//! rotated forward when they are reported.

use crate::elements::Element;
use crate::geometry::{angle_from_center, rotate_point, rotate_vec};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Distance from the top edge to the rotation handle (page units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Rotation step used while the shift modifier is held.
pub const ROTATION_STEP: f64 = std::f64::consts::PI / 12.0;

/// What a handle drives when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandleKind {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Rotation,
    /// Start point of a connector.
    NodeStart,
    /// End point of a connector.
    NodeEnd,
    /// Curve control of a connector.
    NodeControl,
}

impl HandleKind {
    /// The eight standard edge and corner handles, clockwise from top-left.
    pub const EDGES_AND_CORNERS: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::Top,
        HandleKind::TopRight,
        HandleKind::Right,
        HandleKind::BottomRight,
        HandleKind::Bottom,
        HandleKind::BottomLeft,
        HandleKind::Left,
    ];

    pub const CORNERS: [HandleKind; 4] = [
        HandleKind::TopLeft,
        HandleKind::TopRight,
        HandleKind::BottomRight,
        HandleKind::BottomLeft,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            HandleKind::TopLeft | HandleKind::TopRight | HandleKind::BottomRight | HandleKind::BottomLeft
        )
    }

    pub fn is_edge(self) -> bool {
        matches!(self, HandleKind::Top | HandleKind::Right | HandleKind::Bottom | HandleKind::Left)
    }

    pub fn is_node(self) -> bool {
        matches!(self, HandleKind::NodeStart | HandleKind::NodeEnd | HandleKind::NodeControl)
    }

    fn moves_left(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Left | HandleKind::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, HandleKind::TopRight | HandleKind::Right | HandleKind::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Top | HandleKind::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, HandleKind::BottomLeft | HandleKind::Bottom | HandleKind::BottomRight)
    }

    /// The box handle that stays fixed while this one is dragged.
    pub fn opposite(self) -> Option<HandleKind> {
        Some(match self {
            HandleKind::TopLeft => HandleKind::BottomRight,
            HandleKind::Top => HandleKind::Bottom,
            HandleKind::TopRight => HandleKind::BottomLeft,
            HandleKind::Right => HandleKind::Left,
            HandleKind::BottomRight => HandleKind::TopLeft,
            HandleKind::Bottom => HandleKind::Top,
            HandleKind::BottomLeft => HandleKind::TopRight,
            HandleKind::Left => HandleKind::Right,
            _ => return None,
        })
    }
}

/// A draggable control point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a point hits this handle. `tolerance` should already be divided by the zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Find the first handle under `point`.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles.iter().find(|h| h.hit_test(point, tolerance)).map(|h| h.kind)
}

/// Unrotated position of a box handle for raw corners.
fn box_point(x1: f64, y1: f64, x2: f64, y2: f64, kind: HandleKind) -> Point {
    let cx = (x1 + x2) / 2.0;
    let cy = (y1 + y2) / 2.0;
    match kind {
        HandleKind::TopLeft => Point::new(x1, y1),
        HandleKind::Top => Point::new(cx, y1),
        HandleKind::TopRight => Point::new(x2, y1),
        HandleKind::Right => Point::new(x2, cy),
        HandleKind::BottomRight => Point::new(x2, y2),
        HandleKind::Bottom => Point::new(cx, y2),
        HandleKind::BottomLeft => Point::new(x1, y2),
        HandleKind::Left => Point::new(x1, cy),
        HandleKind::Rotation => Point::new(cx, y1.min(y2) - ROTATE_HANDLE_OFFSET),
        HandleKind::NodeStart | HandleKind::NodeControl => Point::new(x1, y1),
        HandleKind::NodeEnd => Point::new(x2, y2),
    }
}

/// Handles of the given kinds placed on the element's box and rotated with it.
pub fn box_handles(element: &Element, kinds: &[HandleKind]) -> Vec<Handle> {
    let rect = element.rect();
    let center = rect.center();
    kinds
        .iter()
        .map(|&kind| {
            let local = box_point(rect.x0, rect.y0, rect.x1, rect.y1, kind);
            Handle::new(kind, rotate_point(local, center, element.rotation))
        })
        .collect()
}

/// The eight standard edge and corner handles.
pub fn default_handles(element: &Element) -> Vec<Handle> {
    box_handles(element, &HandleKind::EDGES_AND_CORNERS)
}

/// Corner handles plus the rotation handle.
pub fn corner_and_rotation_handles(element: &Element) -> Vec<Handle> {
    let mut kinds = HandleKind::CORNERS.to_vec();
    kinds.push(HandleKind::Rotation);
    box_handles(element, &kinds)
}

/// Edge/corner resize event, carrying the cumulative pointer delta since the gesture
/// started, already converted to page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub handle: HandleKind,
    pub dx: f64,
    pub dy: f64,
    /// Current pointer position in page units.
    pub current: Point,
    /// Aspect-ratio lock / angle-step modifier.
    pub shift_key: bool,
}

impl ResizeEvent {
    pub fn delta(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }
}

/// Apply a box-handle drag to `element`, starting from the immutable `snapshot`.
///
/// With `lock_ratio` the snapshot's width:height ratio is kept. On corners the
/// dominant axis is the one with the larger delta relative to the snapshot size, so
/// a diagonal drag never flips between width- and height-driven results.
pub fn apply_box_resize(
    element: &mut Element,
    snapshot: &Element,
    handle: HandleKind,
    delta: Vec2,
    lock_ratio: bool,
    min_size: f64,
) {
    if !(handle.is_corner() || handle.is_edge()) {
        return;
    }
    let rect = snapshot.rect();
    let (sw, sh) = (rect.width(), rect.height());
    let local = rotate_vec(delta, -snapshot.rotation);

    let (mut x1, mut y1, mut x2, mut y2) = (rect.x0, rect.y0, rect.x1, rect.y1);
    if handle.moves_left() {
        x1 += local.x;
    }
    if handle.moves_right() {
        x2 += local.x;
    }
    if handle.moves_top() {
        y1 += local.y;
    }
    if handle.moves_bottom() {
        y2 += local.y;
    }

    if lock_ratio && sw > f64::EPSILON && sh > f64::EPSILON {
        let ratio = sw / sh;
        if handle.is_corner() {
            if local.x.abs() / sw >= local.y.abs() / sh {
                let height = (x2 - x1) / ratio;
                if handle.moves_top() {
                    y1 = y2 - height;
                } else {
                    y2 = y1 + height;
                }
            } else {
                let width = (y2 - y1) * ratio;
                if handle.moves_left() {
                    x1 = x2 - width;
                } else {
                    x2 = x1 + width;
                }
            }
        } else if handle.moves_top() || handle.moves_bottom() {
            let width = (y2 - y1) * ratio;
            let cx = rect.center().x;
            x1 = cx - width / 2.0;
            x2 = cx + width / 2.0;
        } else {
            let height = (x2 - x1) / ratio;
            let cy = rect.center().y;
            y1 = cy - height / 2.0;
            y2 = cy + height / 2.0;
        }
    }

    // Shrinking stops at the minimum size; the opposite side stays where it was.
    let (mut width, mut height) = (x2 - x1, y2 - y1);
    if lock_ratio && sw > f64::EPSILON && sh > f64::EPSILON {
        let ratio = sw / sh;
        let floor = min_size.max(min_size * ratio);
        if width < floor || height * ratio < floor {
            width = floor;
            height = floor / ratio;
        }
    } else {
        width = width.max(min_size);
        height = height.max(min_size);
    }
    (x1, x2) = clamp_span(x1, x2, width, handle.moves_left(), handle.moves_right());
    (y1, y2) = clamp_span(y1, y2, height, handle.moves_top(), handle.moves_bottom());

    // Keep the opposite handle fixed on the page when the element is rotated.
    if snapshot.rotation != 0.0 {
        if let Some(anchor) = handle.opposite() {
            let before = rotate_point(
                box_point(rect.x0, rect.y0, rect.x1, rect.y1, anchor),
                rect.center(),
                snapshot.rotation,
            );
            let center = Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
            let after = rotate_point(box_point(x1, y1, x2, y2, anchor), center, snapshot.rotation);
            let shift = before - after;
            x1 += shift.x;
            x2 += shift.x;
            y1 += shift.y;
            y2 += shift.y;
        }
    }

    element.x1 = x1;
    element.y1 = y1;
    element.x2 = x2;
    element.y2 = y2;
}

fn clamp_span(start: f64, end: f64, span: f64, moves_start: bool, moves_end: bool) -> (f64, f64) {
    if (end - start - span).abs() <= f64::EPSILON {
        (start, end)
    } else if moves_start {
        (end - span, end)
    } else if moves_end {
        (start, start + span)
    } else {
        let mid = (start + end) / 2.0;
        (mid - span / 2.0, mid + span / 2.0)
    }
}

/// Rotation implied by the pointer position, optionally stepped to 15°.
pub fn rotation_for_pointer(snapshot: &Element, pointer: Point, step: bool) -> f64 {
    let angle = angle_from_center(snapshot.rect().center(), pointer);
    if step {
        (angle / ROTATION_STEP).round() * ROTATION_STEP
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use crate::elements::ElementKind;

    fn rect_element(x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
        let mut el = Element::new(ElementKind::Shape, &Defaults::new());
        el.x1 = x1;
        el.y1 = y1;
        el.x2 = x2;
        el.y2 = y2;
        el
    }

    #[test]
    fn test_default_handles() {
        let el = rect_element(0.0, 0.0, 100.0, 50.0);
        let handles = default_handles(&el);
        assert_eq!(handles.len(), 8);
        assert_eq!(handles[0].kind, HandleKind::TopLeft);
        assert_eq!(handles[4].position, Point::new(100.0, 50.0));
        assert_eq!(handles[1].position, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_rotated_handles_follow_rotation() {
        let mut el = rect_element(0.0, 0.0, 100.0, 100.0);
        el.rotation = std::f64::consts::PI;
        let handles = box_handles(&el, &[HandleKind::TopLeft]);
        assert!((handles[0].position.x - 100.0).abs() < 1e-9);
        assert!((handles[0].position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bottom_right_resize() {
        let snap = rect_element(0.0, 0.0, 100.0, 100.0);
        let mut el = snap.clone();
        apply_box_resize(&mut el, &snap, HandleKind::BottomRight, Vec2::new(50.0, 20.0), false, 1.0);
        assert_eq!((el.x1, el.y1, el.x2, el.y2), (0.0, 0.0, 150.0, 120.0));
    }

    #[test]
    fn test_top_edge_ratio_lock_keeps_square() {
        let snap = rect_element(0.0, 0.0, 100.0, 100.0);
        let mut el = snap.clone();
        apply_box_resize(&mut el, &snap, HandleKind::Top, Vec2::new(0.0, -20.0), true, 1.0);
        assert!((el.y1 + 20.0).abs() < f64::EPSILON);
        assert!(((el.y2 - el.y1) - (el.x2 - el.x1)).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_lock_any_diagonal_direction() {
        let snap = rect_element(0.0, 0.0, 100.0, 50.0);
        let deltas = [
            (30.0, 10.0),
            (10.0, 30.0),
            (-30.0, 45.0),
            (80.0, -5.0),
            (-250.0, -90.0),
            (3.0, 3.0),
        ];
        for handle in HandleKind::CORNERS {
            for (dx, dy) in deltas {
                let mut el = snap.clone();
                apply_box_resize(&mut el, &snap, handle, Vec2::new(dx, dy), true, 1.0);
                let r = el.rect();
                if r.height() > 1e-9 {
                    assert!((r.width() / r.height() - 2.0).abs() < 1e-9, "{handle:?} {dx} {dy}");
                }
            }
        }
    }

    #[test]
    fn test_rotated_resize_keeps_anchor() {
        let mut snap = rect_element(0.0, 0.0, 100.0, 100.0);
        snap.rotation = 0.5;
        let anchor_before = box_handles(&snap, &[HandleKind::TopLeft])[0].position;
        let mut el = snap.clone();
        apply_box_resize(&mut el, &snap, HandleKind::BottomRight, Vec2::new(40.0, 25.0), false, 1.0);
        let anchor_after = box_handles(&el, &[HandleKind::TopLeft])[0].position;
        assert!((anchor_before - anchor_after).hypot() < 1e-9);
    }

    #[test]
    fn test_rotation_step() {
        let snap = rect_element(0.0, 0.0, 100.0, 100.0);
        // Pointer to the right of center is a quarter turn.
        let angle = rotation_for_pointer(&snap, Point::new(200.0, 52.0), true);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_handle_hit_test() {
        let handles = [Handle::new(HandleKind::Top, Point::new(50.0, 0.0))];
        assert_eq!(hit_test_handles(&handles, Point::new(53.0, 2.0), 8.0), Some(HandleKind::Top));
        assert_eq!(hit_test_handles(&handles, Point::new(70.0, 0.0), 8.0), None);
    }
}
