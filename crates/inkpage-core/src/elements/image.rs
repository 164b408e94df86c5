//! Raster images backed by an asset.

use super::{AssetId, Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::handles::{box_handles, Handle, HandleKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default, rename = "assetId")]
    pub asset: Option<AssetId>,
    /// Intrinsic pixel size of the decoded image.
    pub image_width: f64,
    pub image_height: f64,
    #[serde(default = "one")]
    pub opacity: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            asset: None,
            image_width: 100.0,
            image_height: 100.0,
            opacity: 1.0,
        }
    }
}

impl ImageData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Asset => Value::Id(self.asset),
            Field::ImageWidth => Value::Number(self.image_width),
            Field::ImageHeight => Value::Number(self.image_height),
            Field::Opacity => Value::Number(self.opacity),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Asset, Value::Id(v)) => self.asset = v,
            (Field::ImageWidth, Value::Number(v)) => self.image_width = v,
            (Field::ImageHeight, Value::Number(v)) => self.image_height = v,
            (Field::Opacity, Value::Number(v)) => self.opacity = v,
            _ => return false,
        }
        true
    }
}

pub struct ImageType;

impl ElementType for ImageType {
    fn kind(&self) -> ElementKind {
        ElementKind::Image
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Image(ImageData::default()).with_defaults(defaults)
    }

    fn on_create_end(&self, element: &mut Element) {
        let ElementData::Image(data) = &element.data else {
            return;
        };
        let (iw, ih) = (data.image_width.max(1.0), data.image_height.max(1.0));
        let rect = element.rect();
        // A click places the image at its intrinsic size; a drag keeps the dragged
        // width and derives the height from the intrinsic ratio.
        let width = if rect.width() < 2.0 { iw } else { rect.width() };
        element.x1 = rect.x0;
        element.y1 = rect.y0;
        element.x2 = rect.x0 + width;
        element.y2 = rect.y0 + width * ih / iw;
    }

    fn locks_ratio(&self) -> bool {
        true
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        box_handles(element, &HandleKind::CORNERS)
    }
}
