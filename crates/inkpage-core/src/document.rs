//! Persisted document shape and JSON (de)serialization.

use crate::assets::Asset;
use crate::config::{AppState, DOCUMENT_VERSION, Defaults};
use crate::editor::{DEFAULT_VIEWPORT_SIZE, Editor};
use crate::elements::AssetId;
use crate::gesture::ToolState;
use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Document loading errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),
    #[error("Document has no pages")]
    EmptyDocument,
    #[error("Invalid asset payload: {0}")]
    InvalidAsset(String),
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

/// The document as written to storage. Runtime-only state (tool, defaults, history)
/// is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub title: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, Asset>,
    #[serde(default)]
    pub app_state: AppState,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Editor {
    /// Snapshot of the persisted state.
    pub fn to_document(&self) -> Document {
        let mut document = Document {
            id: self.id,
            version: self.version.clone(),
            title: self.title.clone(),
            pages: self.pages.clone(),
            assets: self.assets.clone(),
            app_state: self.app_state,
            background: self.background.clone(),
        };
        for page in document.pages.iter_mut() {
            for element in page.elements_mut() {
                element.clear_transient();
            }
        }
        document
    }

    /// Open a persisted document. The first page becomes active.
    pub fn from_document(document: Document) -> Result<Self, DocumentError> {
        if document.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(document.version));
        }
        if document.pages.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        for asset in document.assets.values() {
            asset.decode()?;
        }
        let mut pages = document.pages;
        for page in pages.iter_mut() {
            page.finish_load();
        }
        log::debug!("document {} loaded with {} pages", document.id, pages.len());
        Ok(Self {
            id: document.id,
            version: document.version,
            title: document.title,
            pages,
            active: 0,
            assets: document.assets,
            app_state: document.app_state,
            background: document.background,
            defaults: Defaults::new(),
            tool: ToolState::default(),
            viewport_size: DEFAULT_VIEWPORT_SIZE,
        })
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_document())
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Document = serde_json::from_str(json)?;
        Self::from_document(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, ElementKind, Field, FieldSet, Value};
    use crate::resolve::ResolvedImage;
    use kurbo::{Point, Rect};

    fn populated() -> Editor {
        let mut editor = Editor::new();
        editor.title = "Diagram".to_string();
        editor.app_state.grid = true;
        let a = editor.create_element(ElementKind::Shape, Rect::new(0.0, 0.0, 100.0, 50.0)).unwrap();
        let b = editor.create_element(ElementKind::Arrow, Rect::new(10.0, 10.0, 200.0, 80.0)).unwrap();
        editor.create_element(ElementKind::Text, Rect::new(0.0, 200.0, 50.0, 230.0)).unwrap();
        editor.group_elements(&[a, b]);
        editor.update_elements(&[b], &FieldSet::from([(Field::Control, Value::Point(Some(Point::new(90.0, 10.0))))]), false);
        editor
            .commit_image(
                ResolvedImage {
                    asset: crate::assets::Asset::from_bytes("image/png", &[1, 2, 3]),
                    width: 64.0,
                    height: 32.0,
                },
                Some(Point::new(400.0, 400.0)),
            )
            .unwrap();
        editor.add_page("Second");
        editor.create_element(ElementKind::Note, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        editor
    }

    fn persisted(elements: &[Element]) -> Vec<Element> {
        elements
            .iter()
            .cloned()
            .map(|mut e| {
                e.clear_transient();
                e
            })
            .collect()
    }

    #[test]
    fn test_round_trip_keeps_elements() {
        let editor = populated();
        let json = editor.to_json().unwrap();
        let loaded = Editor::from_json(&json).unwrap();

        assert_eq!(loaded.id, editor.id);
        assert_eq!(loaded.title, "Diagram");
        assert!(loaded.app_state.grid);
        assert_eq!(loaded.pages().len(), 2);
        assert_eq!(loaded.assets(), editor.assets());
        for (original, restored) in editor.pages().iter().zip(loaded.pages()) {
            assert_eq!(restored.id, original.id);
            assert_eq!(restored.title, original.title);
            assert_eq!(restored.elements(), persisted(original.elements()).as_slice());
            assert!(!restored.can_undo());
        }
        assert_eq!(loaded.active_page_index(), 0);
    }

    #[test]
    fn test_round_trip_keeps_computed_floats() {
        let mut editor = Editor::new();
        let mut elements = Vec::new();
        for i in 0..300 {
            let t = i as f64 * 0.37;
            let mut el = Element::new(ElementKind::Shape, &Defaults::new());
            el.set_rect(Rect::new(t.sin() * 123.456, t.cos() * 98.7, 200.0 + t.tan(), 150.0 + (t / 3.0).exp()));
            el.rotation = (t * 1.1).sin() * std::f64::consts::PI;
            elements.push(el);
        }
        editor.add_elements(elements);
        let text = editor.create_element(ElementKind::Text, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        editor.update_elements(
            &[text],
            &FieldSet::from([
                (Field::Text, Value::Text("a computed size".to_string())),
                (Field::TextSize, Value::Number(20.0 / 3.0)),
            ]),
            false,
        );

        let loaded = Editor::from_json(&editor.to_json().unwrap()).unwrap();
        assert_eq!(loaded.get_elements(), persisted(editor.get_elements()).as_slice());
    }

    #[test]
    fn test_persisted_shape() {
        let editor = populated();
        let value: serde_json::Value = serde_json::from_str(&editor.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], DOCUMENT_VERSION);
        assert_eq!(value["appState"]["grid"], true);
        assert_eq!(value["appState"]["snapToElements"], true);
        assert_eq!(value["background"], "#ffffff");
        let element = &value["pages"][0]["elements"][0];
        assert_eq!(element["type"], "shape");
        assert_eq!(element["order"], 0);
        assert!(element["selected"] == false);
        assert!(value["pages"][0]["readonly"].is_boolean());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut document = populated().to_document();
        document.version = "99".to_string();
        assert!(matches!(
            Editor::from_document(document),
            Err(DocumentError::UnsupportedVersion(v)) if v == "99"
        ));
    }

    #[test]
    fn test_rejects_empty_document() {
        let json = r#"{"version":"1","title":"","pages":[]}"#;
        assert!(matches!(Editor::from_json(json), Err(DocumentError::EmptyDocument)));
    }

    #[test]
    fn test_rejects_bad_asset() {
        let mut document = populated().to_document();
        let id = *document.assets.keys().next().unwrap();
        document.assets.get_mut(&id).unwrap().data = "***".to_string();
        assert!(matches!(Editor::from_document(document), Err(DocumentError::InvalidAsset(_))));
    }

    #[test]
    fn test_load_repairs_order_and_flags() {
        let mut document = populated().to_document();
        let page = &mut document.pages[0];
        let json = serde_json::to_string(&*page).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["elements"][0]["order"] = 5.into();
        value["elements"][0]["selected"] = true.into();
        *page = serde_json::from_value(value).unwrap();
        let loaded = Editor::from_document(document).unwrap();
        let elements = loaded.pages()[0].elements();
        assert!(elements.iter().enumerate().all(|(i, e)| e.order == i && !e.selected));
        assert_eq!(elements.last().unwrap().kind(), ElementKind::Shape);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Editor::from_json("{"), Err(DocumentError::Json(_))));
    }
}
