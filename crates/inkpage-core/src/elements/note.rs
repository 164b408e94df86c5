//! Sticky notes.

use super::style::{FontFamily, Rgba};
use super::{place_centered, Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::handles::{corner_and_rotation_handles, Handle};
use serde::{Deserialize, Serialize};

/// Side of a freshly placed note.
pub const NOTE_SIZE: f64 = 200.0;

const NOTE_MIN_SIZE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    #[serde(default)]
    pub text: String,
    pub note_color: Rgba,
    pub text_size: f64,
    #[serde(default)]
    pub text_font: FontFamily,
}

impl Default for NoteData {
    fn default() -> Self {
        Self {
            text: String::new(),
            note_color: Rgba::new(0xff, 0xe0, 0x66, 0xff),
            text_size: 16.0,
            text_font: FontFamily::Draw,
        }
    }
}

impl NoteData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Text => Value::Text(self.text.clone()),
            Field::NoteColor => Value::Color(self.note_color),
            Field::TextSize => Value::Number(self.text_size),
            Field::TextFont => Value::Font(self.text_font),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Text, Value::Text(v)) => self.text = v,
            (Field::NoteColor, Value::Color(v)) => self.note_color = v,
            (Field::TextSize, Value::Number(v)) => self.text_size = v,
            (Field::TextFont, Value::Font(v)) => self.text_font = v,
            _ => return false,
        }
        true
    }
}

pub struct NoteType;

impl ElementType for NoteType {
    fn kind(&self) -> ElementKind {
        ElementKind::Note
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Note(NoteData::default()).with_defaults(defaults)
    }

    fn on_create_end(&self, element: &mut Element) {
        place_centered(element, NOTE_SIZE, NOTE_SIZE);
    }

    fn min_size(&self) -> f64 {
        NOTE_MIN_SIZE
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        corner_and_rotation_handles(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    #[test]
    fn test_note_placed_around_pointer() {
        let mut el = Element::new(ElementKind::Note, &Defaults::new());
        el.x1 = 300.0;
        el.y1 = 300.0;
        el.x2 = 420.0;
        el.y2 = 380.0;
        NoteType.on_create_end(&mut el);
        assert_eq!(el.rect(), Rect::new(200.0, 200.0, 400.0, 400.0));
    }

    #[test]
    fn test_min_size_enforced() {
        let mut el = Element::new(ElementKind::Note, &Defaults::new());
        el.x2 = 30.0;
        el.y2 = 250.0;
        NoteType.normalize(&mut el);
        assert_eq!(el.rect(), Rect::new(0.0, 0.0, 100.0, 250.0));
    }
}
