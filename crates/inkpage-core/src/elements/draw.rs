//! Freehand drawings.
//!
//! Points are stored relative to the drawing's own bounding box at creation time
//! (`draw_width` x `draw_height`); the element box scales them when resized.
//! While the drawing is being created, points are kept in page coordinates.

use super::style::{Rgba, StrokeStyle};
use super::{Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::geometry::{bounds_of_points, point_to_polyline_dist, polyline_intersects_rect, rotate_point};
use crate::gesture::CreateEvent;
use crate::snap::SnapEdge;
use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawData {
    pub points: Vec<Point>,
    pub draw_width: f64,
    pub draw_height: f64,
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    #[serde(default = "one")]
    pub stroke_opacity: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for DrawData {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            draw_width: 1.0,
            draw_height: 1.0,
            stroke_color: Rgba::black(),
            stroke_width: 2.0,
            stroke_opacity: 1.0,
        }
    }
}

impl DrawData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Points => Value::Points(self.points.clone()),
            Field::DrawWidth => Value::Number(self.draw_width),
            Field::DrawHeight => Value::Number(self.draw_height),
            Field::StrokeColor => Value::Color(self.stroke_color),
            Field::StrokeWidth => Value::Number(self.stroke_width),
            Field::StrokeOpacity => Value::Number(self.stroke_opacity),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Points, Value::Points(v)) => self.points = v,
            (Field::DrawWidth, Value::Number(v)) => self.draw_width = v,
            (Field::DrawHeight, Value::Number(v)) => self.draw_height = v,
            (Field::StrokeColor, Value::Color(v)) => self.stroke_color = v,
            (Field::StrokeWidth, Value::Number(v)) => self.stroke_width = v,
            (Field::StrokeOpacity, Value::Number(v)) => self.stroke_opacity = v,
            _ => return false,
        }
        true
    }
}

/// The drawing's points in page coordinates, scaled to the current box and rotated.
pub fn page_points(element: &Element) -> Vec<Point> {
    let ElementData::Draw(data) = &element.data else {
        return Vec::new();
    };
    if element.creating {
        return data.points.clone();
    }
    let rect = element.rect();
    let sx = rect.width() / data.draw_width.max(f64::EPSILON);
    let sy = rect.height() / data.draw_height.max(f64::EPSILON);
    let center = rect.center();
    data.points
        .iter()
        .map(|p| {
            let scaled = Point::new(rect.x0 + p.x * sx, rect.y0 + p.y * sy);
            rotate_point(scaled, center, element.rotation)
        })
        .collect()
}

fn stroke_width(element: &Element) -> f64 {
    match &element.data {
        ElementData::Draw(data) => data.stroke_width,
        _ => 0.0,
    }
}

pub struct DrawType;

impl ElementType for DrawType {
    fn kind(&self) -> ElementKind {
        ElementKind::Draw
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Draw(DrawData::default()).with_defaults(defaults)
    }

    fn on_create_start(&self, element: &mut Element, event: &CreateEvent) {
        if let ElementData::Draw(data) = &mut element.data {
            data.points = vec![event.origin];
        }
    }

    fn on_create_move(&self, element: &mut Element, event: &CreateEvent) {
        let ElementData::Draw(data) = &mut element.data else {
            return;
        };
        data.points.push(event.current);
        if let Some(bounds) = bounds_of_points(&data.points) {
            element.set_rect(bounds);
        }
    }

    fn on_create_end(&self, element: &mut Element) {
        let ElementData::Draw(data) = &mut element.data else {
            return;
        };
        let Some(bounds) = bounds_of_points(&data.points) else {
            return;
        };
        let origin = bounds.origin();
        for p in data.points.iter_mut() {
            *p = Point::new(p.x - origin.x, p.y - origin.y);
        }
        let size = (bounds.width().max(1.0), bounds.height().max(1.0));
        (data.draw_width, data.draw_height) = size;
        element.set_rect(Rect::from_origin_size(origin, size));
    }

    fn bounds_outline(&self, element: &Element) -> Option<BezPath> {
        let points = page_points(element);
        let (first, rest) = points.split_first()?;
        let mut path = BezPath::new();
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        Some(path)
    }

    fn bounding_rectangle(&self, element: &Element) -> Rect {
        let half = stroke_width(element) / 2.0;
        bounds_of_points(&page_points(element))
            .unwrap_or_else(|| element.rect())
            .inflate(half, half)
    }

    fn snap_edges(&self, _element: &Element) -> Vec<SnapEdge> {
        Vec::new()
    }

    fn is_value_allowed(&self, _element: &Element, field: Field, value: &Value) -> bool {
        match (field, value) {
            (Field::StrokeStyle, Value::Stroke(StrokeStyle::None)) => false,
            (Field::StrokeWidth, Value::Number(width)) => *width > 0.0,
            _ => true,
        }
    }

    fn hit_test(&self, element: &Element, point: Point, tolerance: f64) -> bool {
        let points = page_points(element);
        let reach = tolerance + stroke_width(element) / 2.0;
        match points.as_slice() {
            [] => false,
            [single] => (point - *single).hypot() <= reach,
            _ => point_to_polyline_dist(point, &points) <= reach,
        }
    }

    fn intersects_rect(&self, element: &Element, rect: Rect) -> bool {
        polyline_intersects_rect(&page_points(element), rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn(points: &[(f64, f64)]) -> Element {
        let mut el = Element::new(ElementKind::Draw, &Defaults::new());
        el.creating = true;
        let origin = Point::new(points[0].0, points[0].1);
        DrawType.on_create_start(&mut el, &CreateEvent { origin, current: origin, shift_key: false });
        for &(x, y) in &points[1..] {
            let current = Point::new(x, y);
            DrawType.on_create_move(&mut el, &CreateEvent { origin, current, shift_key: false });
        }
        DrawType.on_create_end(&mut el);
        el.creating = false;
        el
    }

    #[test]
    fn test_points_become_relative() {
        let el = drawn(&[(10.0, 10.0), (50.0, 30.0), (30.0, 60.0)]);
        assert_eq!(el.rect(), Rect::new(10.0, 10.0, 50.0, 60.0));
        let ElementData::Draw(data) = &el.data else { panic!("not a drawing") };
        assert_eq!(data.points[0], Point::ZERO);
        assert_eq!((data.draw_width, data.draw_height), (40.0, 50.0));
    }

    #[test]
    fn test_resize_scales_points() {
        let mut el = drawn(&[(0.0, 0.0), (100.0, 100.0)]);
        el.x2 = 200.0;
        let points = page_points(&el);
        assert_eq!(points[1], Point::new(200.0, 100.0));
    }

    #[test]
    fn test_bounding_rect_includes_stroke() {
        let el = drawn(&[(0.0, 0.0), (100.0, 100.0)]);
        assert_eq!(el.bounding_rect(), Rect::new(-1.0, -1.0, 101.0, 101.0));
    }

    #[test]
    fn test_rejects_zero_stroke() {
        let el = drawn(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!DrawType.is_value_allowed(&el, Field::StrokeWidth, &Value::Number(0.0)));
        assert!(DrawType.is_value_allowed(&el, Field::StrokeWidth, &Value::Number(3.0)));
        assert!(!DrawType.is_value_allowed(&el, Field::StrokeStyle, &Value::Stroke(StrokeStyle::None)));
    }

    #[test]
    fn test_hit_test_follows_stroke() {
        let el = drawn(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
        assert!(el.hit_test(Point::new(50.0, 2.0), 2.0));
        assert!(!el.hit_test(Point::new(50.0, 50.0), 2.0));
    }
}
