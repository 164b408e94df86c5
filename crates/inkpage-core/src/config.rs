//! Editor settings, last-used style defaults and engine constants.

use crate::elements::{Field, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grid cell size in page units (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Zoom limits and step used by the zoom operations.
pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.1;
pub const ZOOM_DEFAULT: f64 = 1.0;

/// Snap distance in screen pixels; divided by the zoom before comparing page distances.
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Padding kept around the selection when fitting the zoom to it (screen pixels).
pub const FIT_PADDING: f64 = 40.0;

/// Offset applied to duplicated elements.
pub const IMPORT_OFFSET: f64 = 10.0;

/// Oldest history entries are dropped once a page holds more than this.
pub const HISTORY_LIMIT: usize = 200;

/// Document format version written by this crate.
pub const DOCUMENT_VERSION: &str = "1";

/// App-wide settings persisted with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Show the background grid (gestures also snap to it).
    #[serde(default)]
    pub grid: bool,
    /// Snap dragged elements to the edges of other elements.
    #[serde(default = "default_true")]
    pub snap_to_elements: bool,
    /// Show element dimensions while resizing.
    #[serde(default)]
    pub object_dimensions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            grid: false,
            snap_to_elements: true,
            object_dimensions: false,
        }
    }
}

/// Last-used style values, read by every element type when a new element is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    values: BTreeMap<Field, Value>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a remembered value.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Remember a value. Only style fields are kept; geometry and structure are ignored.
    pub fn set(&mut self, field: Field, value: Value) {
        if field.is_style() {
            self.values.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of remembered values.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_defaults() {
        let state = AppState::default();
        assert!(!state.grid);
        assert!(state.snap_to_elements);
        assert!(!state.object_dimensions);
    }

    #[test]
    fn test_app_state_missing_keys() {
        let state: AppState = serde_json::from_str("{\"grid\":true}").unwrap();
        assert!(state.grid);
        assert!(state.snap_to_elements);
    }

    #[test]
    fn test_defaults_ignore_geometry() {
        let mut defaults = Defaults::new();
        defaults.set(Field::X1, Value::Number(10.0));
        defaults.set(Field::StrokeWidth, Value::Number(4.0));
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.get(Field::StrokeWidth), Some(&Value::Number(4.0)));
    }
}
