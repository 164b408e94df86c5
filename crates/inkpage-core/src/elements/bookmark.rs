//! Link previews. Metadata is resolved outside the core before the element is committed.

use super::{place_centered, AssetId, Element, ElementData, ElementKind, ElementType, Field, Value};
use crate::config::Defaults;
use crate::handles::Handle;
use serde::{Deserialize, Serialize};

pub const BOOKMARK_WIDTH: f64 = 320.0;
pub const BOOKMARK_HEIGHT: f64 = 120.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkData {
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Preview image.
    #[serde(default, rename = "assetId")]
    pub asset: Option<AssetId>,
}

impl BookmarkData {
    pub(super) fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::Link => Value::Text(self.link.clone()),
            Field::Title => Value::Text(self.title.clone()),
            Field::Description => Value::Text(self.description.clone()),
            Field::Asset => Value::Id(self.asset),
            _ => return None,
        })
    }

    pub(super) fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::Link, Value::Text(v)) => self.link = v,
            (Field::Title, Value::Text(v)) => self.title = v,
            (Field::Description, Value::Text(v)) => self.description = v,
            (Field::Asset, Value::Id(v)) => self.asset = v,
            _ => return false,
        }
        true
    }
}

pub struct BookmarkType;

impl ElementType for BookmarkType {
    fn kind(&self) -> ElementKind {
        ElementKind::Bookmark
    }

    fn initialize(&self, defaults: &Defaults) -> ElementData {
        ElementData::Bookmark(BookmarkData::default()).with_defaults(defaults)
    }

    fn on_create_end(&self, element: &mut Element) {
        place_centered(element, BOOKMARK_WIDTH, BOOKMARK_HEIGHT);
    }

    fn handlers(&self, _element: &Element) -> Vec<Handle> {
        Vec::new()
    }
}
