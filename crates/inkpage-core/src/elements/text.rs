//! Free text boxes, sized from their content.

use super::style::{FontFamily, Rgba, TextAlign};
use super::{Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::handles::{box_handles, Handle, HandleKind, ResizeEvent};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size.
pub const TEXT_CHAR_WIDTH: f64 = 0.6;
/// Line height as a fraction of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

const MIN_TEXT_SIZE: f64 = 4.0;

/// Measure `text` at `size`. Empty text still gets room for a caret.
pub fn measure_text(text: &str, size: f64) -> Size {
    let lines = text.split('\n').count().max(1);
    let longest = text.split('\n').map(|line| line.chars().count()).max().unwrap_or(0).max(1);
    Size::new(longest as f64 * TEXT_CHAR_WIDTH * size, lines as f64 * LINE_HEIGHT * size)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    #[serde(default)]
    pub text: String,
    pub text_color: Rgba,
    pub text_size: f64,
    #[serde(default)]
    pub text_font: FontFamily,
    #[serde(default)]
    pub text_align: TextAlign,
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_color: Rgba::black(),
            text_size: 20.0,
            text_font: FontFamily::Draw,
            text_align: TextAlign::Left,
        }
    }
}

impl TextData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
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

/// Resize the box to fit its text, keeping the top-left corner.
fn fit_to_content(element: &mut Element) {
    let ElementData::Text(data) = &element.data else {
        return;
    };
    let size = measure_text(&data.text, data.text_size);
    let rect = element.rect();
    element.set_rect(Rect::from_origin_size(rect.origin(), size));
}

pub struct TextType;

impl ElementType for TextType {
    fn kind(&self) -> ElementKind {
        ElementKind::Text
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Text(TextData::default()).with_defaults(defaults)
    }

    fn on_create_end(&self, element: &mut Element) {
        // Text is placed where the pointer went down.
        element.x2 = element.x1;
        element.y2 = element.y1;
        fit_to_content(element);
    }

    fn normalize(&self, element: &mut Element) {
        let rect = element.rect();
        element.set_rect(rect);
    }

    fn locks_ratio(&self) -> bool {
        true
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        box_handles(element, &HandleKind::CORNERS)
    }

    fn on_resize(&self, element: &mut Element, snapshot: &Element, event: &ResizeEvent) {
        let old = snapshot.rect();
        let new = element.rect();
        let (ElementData::Text(data), ElementData::Text(before)) = (&mut element.data, &snapshot.data) else {
            return;
        };
        if old.height() <= f64::EPSILON {
            return;
        }
        data.text_size = (before.text_size * new.height() / old.height()).max(MIN_TEXT_SIZE);
        let size = measure_text(&data.text, data.text_size);

        // Grow away from the corner opposite to the dragged one.
        let anchor_x = if matches!(event.handle, HandleKind::TopLeft | HandleKind::BottomLeft) {
            old.x1 - size.width
        } else {
            old.x0
        };
        let anchor_y = if matches!(event.handle, HandleKind::TopLeft | HandleKind::TopRight) {
            old.y1 - size.height
        } else {
            old.y0
        };
        element.set_rect(Rect::from_origin_size(Point::new(anchor_x, anchor_y), size));
    }

    fn on_update(&self, element: &mut Element, changed: &[Field]) {
        if changed
            .iter()
            .any(|field| matches!(field, Field::Text | Field::TextSize | Field::TextFont))
        {
            fit_to_content(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Element {
        let mut el = Element::new(ElementKind::Text, &Defaults::new());
        el.set(Field::Text, Value::Text(content.to_string()));
        el.x1 = 10.0;
        el.y1 = 20.0;
        el
    }

    #[test]
    fn test_measure_text() {
        let size = measure_text("ab\nabcd", 10.0);
        assert!((size.width - 24.0).abs() < 1e-9);
        assert!((size.height - 24.0).abs() < 1e-9);
        assert!(measure_text("", 10.0).width > 0.0);
    }

    #[test]
    fn test_create_end_measures() {
        let mut el = text("hello");
        TextType.on_create_end(&mut el);
        assert_eq!((el.x1, el.y1), (10.0, 20.0));
        assert!((el.width() - 60.0).abs() < 1e-9);
        assert!((el.height() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_remeasures() {
        let mut el = text("hi");
        TextType.on_create_end(&mut el);
        el.set(Field::TextSize, Value::Number(40.0));
        TextType.on_update(&mut el, &[Field::TextSize]);
        assert!((el.height() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_refits_size() {
        let mut snap = text("hello");
        TextType.on_create_end(&mut snap);
        let mut el = snap.clone();
        el.y2 = snap.y2 + 24.0;
        let event = ResizeEvent {
            handle: HandleKind::BottomRight,
            dx: 0.0,
            dy: 24.0,
            current: Point::ZERO,
            shift_key: false,
        };
        TextType.on_resize(&mut el, &snap, &event);
        assert_eq!(el.get(Field::TextSize), Some(Value::Number(40.0)));
        assert_eq!((el.x1, el.y1), (10.0, 20.0));
        assert!((el.width() - 120.0).abs() < 1e-9);
    }
}
