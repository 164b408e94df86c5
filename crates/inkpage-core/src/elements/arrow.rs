//! Connector with optional arrowheads and a single curve control.
//!
//! `x1,y1` is the start and `x2,y2` the end, kept as drawn. The control point is the
//! on-curve midpoint of the quadratic curve, in page coordinates; `None` means a
//! straight connector.

use super::style::{Arrowhead, Rgba, StrokeStyle};
use super::{Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::geometry::{
    bounds_of_points, curve_control_point, point_to_polyline_dist, point_to_segment_dist,
    polyline_intersects_rect, sample_curve,
};
use crate::gesture::CreateEvent;
use crate::handles::{Handle, HandleKind, ResizeEvent};
use crate::snap::{snap_line_endpoint, SnapEdge};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A control point closer than this to the straight chord collapses back to `None`.
pub const CURVE_THRESHOLD: f64 = 5.0;

/// Chord length used for the control point's local frame when the endpoints meet.
const MIN_CHORD: f64 = 1.0;

/// Segments used when sampling the curve for bounds and hit testing.
const CURVE_SEGMENTS: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowData {
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default = "one")]
    pub stroke_opacity: f64,
    #[serde(default)]
    pub start_arrowhead: Arrowhead,
    #[serde(default)]
    pub end_arrowhead: Arrowhead,
    #[serde(default)]
    pub control: Option<Point>,
}

fn one() -> f64 {
    1.0
}

impl Default for ArrowData {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::black(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            stroke_opacity: 1.0,
            start_arrowhead: Arrowhead::None,
            end_arrowhead: Arrowhead::Arrow,
            control: None,
        }
    }
}

impl ArrowData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::StrokeColor => Value::Color(self.stroke_color),
            Field::StrokeWidth => Value::Number(self.stroke_width),
            Field::StrokeStyle => Value::Stroke(self.stroke_style),
            Field::StrokeOpacity => Value::Number(self.stroke_opacity),
            Field::StartArrowhead => Value::Arrowhead(self.start_arrowhead),
            Field::EndArrowhead => Value::Arrowhead(self.end_arrowhead),
            Field::Control => Value::Point(self.control),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::StrokeColor, Value::Color(v)) => self.stroke_color = v,
            (Field::StrokeWidth, Value::Number(v)) => self.stroke_width = v,
            (Field::StrokeStyle, Value::Stroke(v)) => self.stroke_style = v,
            (Field::StrokeOpacity, Value::Number(v)) => self.stroke_opacity = v,
            (Field::StartArrowhead, Value::Arrowhead(v)) => self.start_arrowhead = v,
            (Field::EndArrowhead, Value::Arrowhead(v)) => self.end_arrowhead = v,
            (Field::Control, Value::Point(v)) => self.control = v,
            _ => return false,
        }
        true
    }
}

fn start(element: &Element) -> Point {
    Point::new(element.x1, element.y1)
}

fn end(element: &Element) -> Point {
    Point::new(element.x2, element.y2)
}

fn control(element: &Element) -> Option<Point> {
    match &element.data {
        ElementData::Arrow(data) => data.control,
        _ => None,
    }
}

fn set_control(element: &mut Element, point: Option<Point>) {
    if let ElementData::Arrow(data) = &mut element.data {
        data.control = point;
    }
}

/// Points along the connector, start to end.
pub fn arrow_points(element: &Element) -> Vec<Point> {
    match control(element) {
        Some(through) => sample_curve(start(element), through, end(element), CURVE_SEGMENTS),
        None => vec![start(element), end(element)],
    }
}

/// Express `point` in the frame of the chord `a → b`: (along, across), both scaled by
/// the chord length.
fn to_chord_frame(point: Point, a: Point, b: Point) -> Option<(f64, f64)> {
    let chord = b - a;
    let len_sq = chord.hypot2();
    if len_sq < MIN_CHORD * MIN_CHORD {
        return None;
    }
    let rel = point - a;
    Some((rel.dot(chord) / len_sq, chord.cross(rel) / len_sq))
}

fn from_chord_frame(u: f64, v: f64, a: Point, b: Point) -> Option<Point> {
    let chord = b - a;
    if chord.hypot2() < MIN_CHORD * MIN_CHORD {
        return None;
    }
    let normal = Vec2::new(-chord.y, chord.x);
    Some(a + chord * u + normal * v)
}

pub struct ArrowType;

impl ElementType for ArrowType {
    fn kind(&self) -> ElementKind {
        ElementKind::Arrow
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Arrow(ArrowData::default()).with_defaults(defaults)
    }

    fn on_create_move(&self, element: &mut Element, event: &CreateEvent) {
        if event.shift_key {
            let snapped = snap_line_endpoint(event.origin, event.current);
            element.x2 = snapped.x;
            element.y2 = snapped.y;
        }
    }

    fn normalize(&self, _element: &mut Element) {}

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        let through = control(element).unwrap_or_else(|| start(element).midpoint(end(element)));
        vec![
            Handle::new(HandleKind::NodeStart, start(element)),
            Handle::new(HandleKind::NodeEnd, end(element)),
            Handle::new(HandleKind::NodeControl, through),
        ]
    }

    fn on_resize(&self, element: &mut Element, snapshot: &Element, event: &ResizeEvent) {
        let (s0, e0) = (start(snapshot), end(snapshot));
        let delta = event.delta();
        match event.handle {
            HandleKind::NodeControl => {
                let base = control(snapshot).unwrap_or_else(|| s0.midpoint(e0));
                set_control(element, Some(base + delta));
            }
            HandleKind::NodeStart | HandleKind::NodeEnd => {
                let (mut s1, mut e1) = (s0, e0);
                if event.handle == HandleKind::NodeStart {
                    s1 = s0 + delta;
                    if event.shift_key {
                        s1 = snap_line_endpoint(e0, s1);
                    }
                } else {
                    e1 = e0 + delta;
                    if event.shift_key {
                        e1 = snap_line_endpoint(s0, e1);
                    }
                }
                element.x1 = s1.x;
                element.y1 = s1.y;
                element.x2 = e1.x;
                element.y2 = e1.y;
                // The control keeps its position relative to the chord.
                let moved = control(snapshot)
                    .and_then(|c| to_chord_frame(c, s0, e0))
                    .and_then(|(u, v)| from_chord_frame(u, v, s1, e1));
                set_control(element, moved);
            }
            _ => {}
        }
    }

    fn on_resize_end(&self, element: &mut Element, _snapshot: &Element) {
        if let Some(through) = control(element) {
            if point_to_segment_dist(through, start(element), end(element)) < CURVE_THRESHOLD {
                set_control(element, None);
            }
        }
    }

    fn bounds_outline(&self, element: &Element) -> Option<BezPath> {
        let (s, e) = (start(element), end(element));
        let mut path = BezPath::new();
        path.move_to(s);
        match control(element) {
            Some(through) => path.quad_to(curve_control_point(s, through, e), e),
            None => path.line_to(e),
        }
        Some(path)
    }

    fn bounding_rectangle(&self, element: &Element) -> Rect {
        bounds_of_points(&arrow_points(element)).unwrap_or_else(|| element.rect())
    }

    fn snap_edges(&self, _element: &Element) -> Vec<SnapEdge> {
        Vec::new()
    }

    fn is_value_allowed(&self, _element: &Element, field: Field, value: &Value) -> bool {
        !matches!((field, value), (Field::StrokeStyle, Value::Stroke(StrokeStyle::None)))
    }

    fn on_duplicate(&self, element: &mut Element, dx: f64, dy: f64) {
        if let Some(through) = control(element) {
            set_control(element, Some(through + Vec2::new(dx, dy)));
        }
    }

    fn hit_test(&self, element: &Element, point: Point, tolerance: f64) -> bool {
        let width = match &element.data {
            ElementData::Arrow(data) => data.stroke_width,
            _ => 0.0,
        };
        point_to_polyline_dist(point, &arrow_points(element)) <= tolerance + width / 2.0
    }

    fn intersects_rect(&self, element: &Element, rect: Rect) -> bool {
        polyline_intersects_rect(&arrow_points(element), rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow(x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
        let mut el = Element::new(ElementKind::Arrow, &Defaults::new());
        el.x1 = x1;
        el.y1 = y1;
        el.x2 = x2;
        el.y2 = y2;
        el
    }

    fn resize(handle: HandleKind, dx: f64, dy: f64) -> ResizeEvent {
        ResizeEvent {
            handle,
            dx,
            dy,
            current: Point::ZERO,
            shift_key: false,
        }
    }

    #[test]
    fn test_kept_as_drawn() {
        let mut el = arrow(100.0, 100.0, 0.0, 0.0);
        ArrowType.normalize(&mut el);
        assert_eq!((el.x1, el.y1, el.x2, el.y2), (100.0, 100.0, 0.0, 0.0));
    }

    #[test]
    fn test_node_handles() {
        let el = arrow(0.0, 0.0, 100.0, 0.0);
        let handles = el.handles();
        assert_eq!(handles.len(), 3);
        assert_eq!(handles[2].kind, HandleKind::NodeControl);
        assert_eq!(handles[2].position, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_drag_control_bends_curve() {
        let snap = arrow(0.0, 0.0, 100.0, 0.0);
        let mut el = snap.clone();
        ArrowType.on_resize(&mut el, &snap, &resize(HandleKind::NodeControl, 0.0, 40.0));
        ArrowType.on_resize_end(&mut el, &snap);
        assert_eq!(control(&el), Some(Point::new(50.0, 40.0)));
        let bounds = el.bounding_rect();
        assert!((bounds.y1 - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_control_near_chord_collapses() {
        let snap = arrow(0.0, 0.0, 100.0, 0.0);
        let mut el = snap.clone();
        ArrowType.on_resize(&mut el, &snap, &resize(HandleKind::NodeControl, 10.0, 3.0));
        ArrowType.on_resize_end(&mut el, &snap);
        assert_eq!(control(&el), None);
    }

    #[test]
    fn test_moving_end_keeps_control_relative() {
        let mut snap = arrow(0.0, 0.0, 100.0, 0.0);
        set_control(&mut snap, Some(Point::new(50.0, 20.0)));
        let mut el = snap.clone();
        // Rotate the chord a quarter turn around the start.
        ArrowType.on_resize(&mut el, &snap, &resize(HandleKind::NodeEnd, -100.0, 100.0));
        let through = control(&el).unwrap();
        assert!((through.x + 20.0).abs() < 1e-9);
        assert!((through.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_shifts_control() {
        let mut el = arrow(0.0, 0.0, 100.0, 0.0);
        set_control(&mut el, Some(Point::new(50.0, 20.0)));
        el.translate(10.0, 10.0);
        assert_eq!(control(&el), Some(Point::new(60.0, 30.0)));
        assert_eq!((el.x1, el.y1), (10.0, 10.0));
    }

    #[test]
    fn test_rejects_no_stroke() {
        let el = arrow(0.0, 0.0, 10.0, 10.0);
        assert!(!ArrowType.is_value_allowed(&el, Field::StrokeStyle, &Value::Stroke(StrokeStyle::None)));
        assert!(el.ty().snap_edges(&el).is_empty());
    }

    #[test]
    fn test_hit_test_along_line() {
        let el = arrow(0.0, 0.0, 100.0, 100.0);
        assert!(el.hit_test(Point::new(50.0, 51.0), 2.0));
        assert!(!el.hit_test(Point::new(50.0, 80.0), 2.0));
    }
}
