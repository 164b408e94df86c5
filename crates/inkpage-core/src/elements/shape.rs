//! Box shapes: rectangle, ellipse and diamond with an optional label.

use super::style::{FillStyle, FontFamily, Rgba, ShapeKind, StrokeStyle, TextAlign};
use super::{Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::geometry::rotate_point;
use crate::gesture::CreateEvent;
use crate::handles::{box_handles, Handle, HandleKind};
use kurbo::{BezPath, Ellipse, Point, Shape as _};
use serde::{Deserialize, Serialize};

/// Size of a shape created by a click without dragging.
const CLICK_SIZE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    pub shape: ShapeKind,
    pub fill_color: Rgba,
    #[serde(default)]
    pub fill_style: FillStyle,
    #[serde(default = "one")]
    pub fill_opacity: f64,
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    #[serde(default = "one")]
    pub stroke_opacity: f64,
    /// Centered label.
    #[serde(default)]
    pub text: String,
    pub text_color: Rgba,
    pub text_size: f64,
    #[serde(default)]
    pub text_font: FontFamily,
    #[serde(default)]
    pub text_align: TextAlign,
}

fn one() -> f64 {
    1.0
}

impl Default for ShapeData {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            fill_color: Rgba::white(),
            fill_style: FillStyle::None,
            fill_opacity: 1.0,
            stroke_color: Rgba::black(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            stroke_opacity: 1.0,
            text: String::new(),
            text_color: Rgba::black(),
            text_size: 20.0,
            text_font: FontFamily::Draw,
            text_align: TextAlign::Center,
        }
    }
}

impl ShapeData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Shape => Value::Shape(self.shape),
            Field::FillColor => Value::Color(self.fill_color),
            Field::FillStyle => Value::Fill(self.fill_style),
            Field::FillOpacity => Value::Number(self.fill_opacity),
            Field::StrokeColor => Value::Color(self.stroke_color),
            Field::StrokeWidth => Value::Number(self.stroke_width),
            Field::StrokeStyle => Value::Stroke(self.stroke_style),
            Field::StrokeOpacity => Value::Number(self.stroke_opacity),
            Field::Text => Value::Text(self.text.clone()),
            Field::TextColor => Value::Color(self.text_color),
            Field::TextSize => Value::Number(self.text_size),
            Field::TextFont => Value::Font(self.text_font),
            Field::TextAlign => Value::Align(self.text_align),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Shape, Value::Shape(v)) => self.shape = v,
            (Field::FillColor, Value::Color(v)) => self.fill_color = v,
            (Field::FillStyle, Value::Fill(v)) => self.fill_style = v,
            (Field::FillOpacity, Value::Number(v)) => self.fill_opacity = v,
            (Field::StrokeColor, Value::Color(v)) => self.stroke_color = v,
            (Field::StrokeWidth, Value::Number(v)) => self.stroke_width = v,
            (Field::StrokeStyle, Value::Stroke(v)) => self.stroke_style = v,
            (Field::StrokeOpacity, Value::Number(v)) => self.stroke_opacity = v,
            (Field::Text, Value::Text(v)) => self.text = v,
            (Field::TextColor, Value::Color(v)) => self.text_color = v,
            (Field::TextSize, Value::Number(v)) => self.text_size = v,
            (Field::TextFont, Value::Font(v)) => self.text_font = v,
            (Field::TextAlign, Value::Align(v)) => self.text_align = v,
            _ => return false,
        }
        true
    }
}

pub struct ShapeType;

impl ElementType for ShapeType {
    fn kind(&self) -> ElementKind {
        ElementKind::Shape
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Shape(ShapeData::default()).with_defaults(defaults)
    }

    fn on_create_move(&self, element: &mut Element, event: &CreateEvent) {
        if event.shift_key {
            // Square from the origin, keeping the drag direction.
            let d = event.current - event.origin;
            let side = d.x.abs().max(d.y.abs());
            element.x2 = event.origin.x + side.copysign(d.x);
            element.y2 = event.origin.y + side.copysign(d.y);
        }
    }

    fn on_create_end(&self, element: &mut Element) {
        if element.width() < 2.0 && element.height() < 2.0 {
            element.x2 = element.x1 + CLICK_SIZE;
            element.y2 = element.y1 + CLICK_SIZE;
        }
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        let mut kinds = HandleKind::EDGES_AND_CORNERS.to_vec();
        kinds.push(HandleKind::Rotation);
        box_handles(element, &kinds)
    }

    fn bounds_outline(&self, element: &Element) -> Option<BezPath> {
        let ElementData::Shape(data) = &element.data else {
            return None;
        };
        let rect = element.rect();
        let center = rect.center();
        let path = match data.shape {
            ShapeKind::Rectangle => return None,
            ShapeKind::Ellipse => Ellipse::from_rect(rect).to_path(0.1),
            ShapeKind::Diamond => {
                let mut path = BezPath::new();
                path.move_to(Point::new(center.x, rect.y0));
                path.line_to(Point::new(rect.x1, center.y));
                path.line_to(Point::new(center.x, rect.y1));
                path.line_to(Point::new(rect.x0, center.y));
                path.close_path();
                path
            }
        };
        Some(kurbo::Affine::rotate_about(element.rotation, center) * path)
    }

    fn is_value_allowed(&self, element: &Element, field: Field, value: &Value) -> bool {
        let ElementData::Shape(data) = &element.data else {
            return true;
        };
        // A shape must keep either a visible fill or a visible stroke.
        match (field, value) {
            (Field::StrokeStyle, Value::Stroke(StrokeStyle::None)) => data.fill_style != FillStyle::None,
            (Field::FillStyle, Value::Fill(FillStyle::None)) => data.stroke_style != StrokeStyle::None,
            _ => true,
        }
    }

    fn hit_test(&self, element: &Element, point: Point, tolerance: f64) -> bool {
        let ElementData::Shape(data) = &element.data else {
            return false;
        };
        let rect = element.rect();
        let local = rotate_point(point, rect.center(), -element.rotation);
        let outer = rect.inflate(tolerance + data.stroke_width / 2.0, tolerance + data.stroke_width / 2.0);
        match data.shape {
            ShapeKind::Rectangle => outer.contains(local),
            ShapeKind::Ellipse => {
                let (rx, ry) = (outer.width() / 2.0, outer.height() / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let d = local - outer.center();
                (d.x / rx).powi(2) + (d.y / ry).powi(2) <= 1.0
            }
            ShapeKind::Diamond => {
                let (rx, ry) = (outer.width() / 2.0, outer.height() / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let d = local - outer.center();
                d.x.abs() / rx + d.y.abs() / ry <= 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(kind: ShapeKind) -> Element {
        let mut el = Element::new(ElementKind::Shape, &Defaults::new());
        el.set(Field::Shape, Value::Shape(kind));
        el.x2 = 100.0;
        el.y2 = 50.0;
        el
    }

    #[test]
    fn test_shift_creates_square() {
        let mut el = Element::new(ElementKind::Shape, &Defaults::new());
        let event = CreateEvent {
            origin: Point::ZERO,
            current: Point::new(-40.0, 25.0),
            shift_key: true,
        };
        ShapeType.on_create_move(&mut el, &event);
        assert_eq!((el.x2, el.y2), (-40.0, 40.0));
    }

    #[test]
    fn test_click_creates_default_size() {
        let mut el = Element::new(ElementKind::Shape, &Defaults::new());
        el.x1 = 10.0;
        el.y1 = 10.0;
        el.x2 = 11.0;
        el.y2 = 10.0;
        ShapeType.on_create_end(&mut el);
        assert_eq!(el.rect().width(), 100.0);
        assert_eq!(el.rect().height(), 100.0);
    }

    #[test]
    fn test_stroke_none_needs_fill() {
        let mut el = shape(ShapeKind::Rectangle);
        let none = Value::Stroke(StrokeStyle::None);
        assert!(!ShapeType.is_value_allowed(&el, Field::StrokeStyle, &none));
        el.set(Field::FillStyle, Value::Fill(FillStyle::Solid));
        assert!(ShapeType.is_value_allowed(&el, Field::StrokeStyle, &none));
    }

    #[test]
    fn test_ellipse_hit_test_excludes_corners() {
        let el = shape(ShapeKind::Ellipse);
        assert!(el.hit_test(Point::new(50.0, 25.0), 0.0));
        assert!(!el.hit_test(Point::new(3.0, 3.0), 0.0));
    }

    #[test]
    fn test_handles_include_rotation() {
        let el = shape(ShapeKind::Diamond);
        let handles = el.handles();
        assert_eq!(handles.len(), 9);
        assert_eq!(handles[8].kind, HandleKind::Rotation);
    }
}
