//! Stickers: named pictograms drawn by the renderer.

use super::{place_centered, Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::handles::{corner_and_rotation_handles, Handle};
use serde::{Deserialize, Serialize};

pub const STICKER_SIZE: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerData {
    pub sticker: String,
}

impl Default for StickerData {
    fn default() -> Self {
        Self {
            sticker: "star".to_string(),
        }
    }
}

impl StickerData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        match field {
            Field::Sticker => Some(Value::Text(self.sticker.clone())),
            _ => None,
        }
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Sticker, Value::Text(v)) => {
                self.sticker = v;
                true
            }
            _ => false,
        }
    }
}

pub struct StickerType;

impl ElementType for StickerType {
    fn kind(&self) -> ElementKind {
        ElementKind::Sticker
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Sticker(StickerData::default()).with_defaults(defaults)
    }

    fn on_create_end(&self, element: &mut Element) {
        place_centered(element, STICKER_SIZE, STICKER_SIZE);
    }

    fn locks_ratio(&self) -> bool {
        true
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        corner_and_rotation_handles(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sticker_fixed_size() {
        let mut el = Element::new(ElementKind::Sticker, &Defaults::new());
        el.x1 = 60.0;
        el.y1 = 60.0;
        StickerType.on_create_end(&mut el);
        assert_eq!((el.x1, el.y1, el.x2, el.y2), (0.0, 0.0, 120.0, 120.0));
        assert!(StickerType.locks_ratio());
    }
}
