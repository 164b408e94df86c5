//! Inkpage Core Library
//!
//! Platform-agnostic document engine for the inkpage diagram editor: pages of typed
//! elements, interactive gestures, and per-page undo history.

pub mod assets;
pub mod camera;
pub mod config;
pub mod document;
pub mod editor;
pub mod elements;
pub mod geometry;
pub mod gesture;
pub mod handles;
pub mod history;
pub mod page;
pub mod resolve;
pub mod snap;

pub use assets::Asset;
pub use camera::Viewport;
pub use config::{AppState, Defaults, GRID_SIZE};
pub use document::{Document, DocumentError};
pub use editor::{Clipboard, Editor};
pub use elements::{Element, ElementData, ElementId, ElementKind, ElementType, Field, FieldSet, GroupId, Value, element_type};
pub use gesture::{PointerDown, PointerMove, Tool, ToolState};
pub use handles::{Handle, HandleKind};
pub use history::{ElementChange, History, HistoryEntry};
pub use page::{Page, PageId};
pub use resolve::{BookmarkMetadata, ContentResolver, MemoryResolver, ResolveError, ResolvedImage};
pub use snap::{SnapGuide, snap_to_grid};
