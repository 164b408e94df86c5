//! Element definitions and the per-type behavior registry.
//!
//! Every element carries common geometry (two raw corners, rotation, z-order, group)
//! plus type-specific data in [`ElementData`]. Behavior that differs per type lives
//! behind the [`ElementType`] trait; [`element_type`] dispatches on [`ElementKind`].

mod arrow;
mod bookmark;
mod draw;
mod image;
mod note;
mod shape;
mod sticker;
pub mod style;
mod text;

pub use arrow::{arrow_points, ArrowData, ArrowType, CURVE_THRESHOLD};
pub use bookmark::{BookmarkData, BookmarkType, BOOKMARK_HEIGHT, BOOKMARK_WIDTH};
pub use draw::{page_points, DrawData, DrawType};
pub use image::{ImageData, ImageType};
pub use note::{NoteData, NoteType, NOTE_SIZE};
pub use shape::{ShapeData, ShapeType};
pub use sticker::{StickerData, StickerType, STICKER_SIZE};
pub use style::{Arrowhead, FillStyle, FontFamily, Rgba, ShapeKind, StrokeStyle, TextAlign};
pub use text::{measure_text, TextData, TextType, LINE_HEIGHT, TEXT_CHAR_WIDTH};

use crate::config::Defaults;
use crate::geometry::{rect_from_corners, rotate_point, rotated_rect_bounds};
use crate::gesture::CreateEvent;
use crate::handles::{default_handles, Handle, ResizeEvent};
use crate::snap::{default_snap_edges, default_snap_points, SnapEdge};
use kurbo::{BezPath, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;
/// Identifier shared by the members of a group.
pub type GroupId = Uuid;
/// Key into the editor's asset map.
pub type AssetId = Uuid;

/// Smallest width/height a finalized box may have.
pub const MIN_ELEMENT_SIZE: f64 = 1.0;

/// Element type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Shape,
    Arrow,
    Text,
    Draw,
    Image,
    Note,
    Sticker,
    Bookmark,
}

impl ElementKind {
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Shape,
        ElementKind::Arrow,
        ElementKind::Text,
        ElementKind::Draw,
        ElementKind::Image,
        ElementKind::Note,
        ElementKind::Sticker,
        ElementKind::Bookmark,
    ];
}

/// Type-specific element fields, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementData {
    Shape(ShapeData),
    Arrow(ArrowData),
    Text(TextData),
    Draw(DrawData),
    Image(ImageData),
    Note(NoteData),
    Sticker(StickerData),
    Bookmark(BookmarkData),
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementData::Shape(_) => ElementKind::Shape,
            ElementData::Arrow(_) => ElementKind::Arrow,
            ElementData::Text(_) => ElementKind::Text,
            ElementData::Draw(_) => ElementKind::Draw,
            ElementData::Image(_) => ElementKind::Image,
            ElementData::Note(_) => ElementKind::Note,
            ElementData::Sticker(_) => ElementKind::Sticker,
            ElementData::Bookmark(_) => ElementKind::Bookmark,
        }
    }

    fn get(&self, field: Field) -> Option<Value> {
        match self {
            ElementData::Shape(d) => d.get(field),
            ElementData::Arrow(d) => d.get(field),
            ElementData::Text(d) => d.get(field),
            ElementData::Draw(d) => d.get(field),
            ElementData::Image(d) => d.get(field),
            ElementData::Note(d) => d.get(field),
            ElementData::Sticker(d) => d.get(field),
            ElementData::Bookmark(d) => d.get(field),
        }
    }

    fn set(&mut self, field: Field, value: Value) -> bool {
        match self {
            ElementData::Shape(d) => d.set(field, value),
            ElementData::Arrow(d) => d.set(field, value),
            ElementData::Text(d) => d.set(field, value),
            ElementData::Draw(d) => d.set(field, value),
            ElementData::Image(d) => d.set(field, value),
            ElementData::Note(d) => d.set(field, value),
            ElementData::Sticker(d) => d.set(field, value),
            ElementData::Bookmark(d) => d.set(field, value),
        }
    }

    /// Copy every remembered default that applies to this type.
    pub(crate) fn with_defaults(mut self, defaults: &Defaults) -> Self {
        for (field, value) in defaults.iter() {
            self.set(field, value.clone());
        }
        self
    }
}

/// Every mutable element attribute, used as the key of history deltas and style updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    X1,
    Y1,
    X2,
    Y2,
    Rotation,
    Order,
    Group,
    Locked,
    Shape,
    FillColor,
    FillStyle,
    FillOpacity,
    StrokeColor,
    StrokeWidth,
    StrokeStyle,
    StrokeOpacity,
    Opacity,
    Text,
    TextColor,
    TextSize,
    TextFont,
    TextAlign,
    StartArrowhead,
    EndArrowhead,
    Control,
    Points,
    DrawWidth,
    DrawHeight,
    NoteColor,
    Sticker,
    Asset,
    Link,
    Title,
    Description,
    ImageWidth,
    ImageHeight,
}

impl Field {
    pub const ALL: [Field; 36] = [
        Field::X1,
        Field::Y1,
        Field::X2,
        Field::Y2,
        Field::Rotation,
        Field::Order,
        Field::Group,
        Field::Locked,
        Field::Shape,
        Field::FillColor,
        Field::FillStyle,
        Field::FillOpacity,
        Field::StrokeColor,
        Field::StrokeWidth,
        Field::StrokeStyle,
        Field::StrokeOpacity,
        Field::Opacity,
        Field::Text,
        Field::TextColor,
        Field::TextSize,
        Field::TextFont,
        Field::TextAlign,
        Field::StartArrowhead,
        Field::EndArrowhead,
        Field::Control,
        Field::Points,
        Field::DrawWidth,
        Field::DrawHeight,
        Field::NoteColor,
        Field::Sticker,
        Field::Asset,
        Field::Link,
        Field::Title,
        Field::Description,
        Field::ImageWidth,
        Field::ImageHeight,
    ];

    /// Geometry fields moved by a translate.
    pub const CORNERS: [Field; 4] = [Field::X1, Field::Y1, Field::X2, Field::Y2];

    /// Style fields are remembered as defaults for new elements.
    pub fn is_style(self) -> bool {
        matches!(
            self,
            Field::FillColor
                | Field::FillStyle
                | Field::FillOpacity
                | Field::StrokeColor
                | Field::StrokeWidth
                | Field::StrokeStyle
                | Field::StrokeOpacity
                | Field::Opacity
                | Field::TextColor
                | Field::TextSize
                | Field::TextFont
                | Field::TextAlign
                | Field::StartArrowhead
                | Field::EndArrowhead
                | Field::NoteColor
        )
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Color(Rgba),
    Id(Option<Uuid>),
    Point(Option<Point>),
    Points(Vec<Point>),
    Index(usize),
    Shape(ShapeKind),
    Fill(FillStyle),
    Stroke(StrokeStyle),
    Font(FontFamily),
    Align(TextAlign),
    Arrowhead(Arrowhead),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A set of field values, ordered by field.
pub type FieldSet = BTreeMap<Field, Value>;

/// A single element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Rotation in radians around the box center.
    #[serde(default)]
    pub rotation: f64,
    /// Z-order; equal to the element's index in its page after every mutation.
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub group: Option<GroupId>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub editing: bool,
    #[serde(default)]
    pub creating: bool,
    #[serde(default)]
    pub erased: bool,
    #[serde(flatten)]
    pub data: ElementData,
}

impl Element {
    /// Create a new element of `kind` at the origin, styled from `defaults`.
    pub fn new(kind: ElementKind, defaults: &Defaults) -> Self {
        Self::with_data(element_type(kind).initialize(defaults))
    }

    pub fn with_data(data: ElementData) -> Self {
        Self {
            id: Uuid::new_v4(),
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            rotation: 0.0,
            order: 0,
            group: None,
            locked: false,
            selected: false,
            editing: false,
            creating: false,
            erased: false,
            data,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    /// Behavior of this element's type.
    pub fn ty(&self) -> &'static dyn ElementType {
        element_type(self.kind())
    }

    /// The raw corners as a sorted rectangle.
    pub fn rect(&self) -> Rect {
        rect_from_corners(self.x1, self.y1, self.x2, self.y2)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x1 = rect.x0;
        self.y1 = rect.y0;
        self.x2 = rect.x1;
        self.y2 = rect.y1;
    }

    /// Axis-aligned box covering the element's visual extent.
    pub fn bounding_rect(&self) -> Rect {
        self.ty().bounding_rectangle(self)
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.ty().handlers(self)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.ty().hit_test(self, point, tolerance)
    }

    pub fn intersects_rect(&self, rect: Rect) -> bool {
        self.ty().intersects_rect(self, rect)
    }

    /// Move the element, including any absolute type-specific coordinates.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x1 += dx;
        self.y1 += dy;
        self.x2 += dx;
        self.y2 += dy;
        self.ty().on_duplicate(self, dx, dy);
    }

    /// Clear the runtime-only flags.
    pub fn clear_transient(&mut self) {
        self.selected = false;
        self.editing = false;
        self.creating = false;
        self.erased = false;
    }

    /// Read a field; `None` when it does not apply to this element's type.
    pub fn get(&self, field: Field) -> Option<Value> {
        Some(match field {
            Field::X1 => Value::Number(self.x1),
            Field::Y1 => Value::Number(self.y1),
            Field::X2 => Value::Number(self.x2),
            Field::Y2 => Value::Number(self.y2),
            Field::Rotation => Value::Number(self.rotation),
            Field::Order => Value::Index(self.order),
            Field::Group => Value::Id(self.group),
            Field::Locked => Value::Bool(self.locked),
            _ => return self.data.get(field),
        })
    }

    /// Write a field. Returns `false` when the field does not apply or the value has
    /// the wrong type.
    pub fn set(&mut self, field: Field, value: Value) -> bool {
        match (field, value) {
            (Field::X1, Value::Number(n)) => self.x1 = n,
            (Field::Y1, Value::Number(n)) => self.y1 = n,
            (Field::X2, Value::Number(n)) => self.x2 = n,
            (Field::Y2, Value::Number(n)) => self.y2 = n,
            (Field::Rotation, Value::Number(n)) => self.rotation = n,
            (Field::Order, Value::Index(i)) => self.order = i,
            (Field::Group, Value::Id(g)) => self.group = g,
            (Field::Locked, Value::Bool(b)) => self.locked = b,
            (
                Field::X1
                | Field::Y1
                | Field::X2
                | Field::Y2
                | Field::Rotation
                | Field::Order
                | Field::Group
                | Field::Locked,
                _,
            ) => return false,
            (field, value) => return self.data.set(field, value),
        }
        true
    }

    /// Capture the given fields (those that apply to this element).
    pub fn capture(&self, fields: &[Field]) -> FieldSet {
        fields
            .iter()
            .filter_map(|&field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    /// Capture every applicable field.
    pub fn capture_all(&self) -> FieldSet {
        self.capture(&Field::ALL)
    }

    /// Write every value of `set`.
    pub fn apply(&mut self, set: &FieldSet) {
        for (field, value) in set {
            self.set(*field, value.clone());
        }
    }

    /// Stroke dash lengths balanced to the element's outline, for renderers.
    pub fn stroke_dasharray(&self) -> Option<(f64, f64)> {
        let (style, width) = match &self.data {
            ElementData::Shape(d) => (d.stroke_style, d.stroke_width),
            ElementData::Arrow(d) => (d.stroke_style, d.stroke_width),
            _ => return None,
        };
        let length = match self.ty().bounds_outline(self) {
            Some(path) => path.perimeter(0.1),
            None => 2.0 * (self.width() + self.height()),
        };
        style.balanced_dash(width, length)
    }
}

/// Fields whose values differ between two captures, as (prev, next) sets.
pub fn diff_fields(prev: &FieldSet, next: &FieldSet) -> (FieldSet, FieldSet) {
    let mut before = FieldSet::new();
    let mut after = FieldSet::new();
    for (field, value) in next {
        match prev.get(field) {
            Some(old) if old == value => {}
            Some(old) => {
                before.insert(*field, old.clone());
                after.insert(*field, value.clone());
            }
            None => {
                after.insert(*field, value.clone());
            }
        }
    }
    (before, after)
}

/// Expand a fixed-size box around the point where the pointer went down.
fn place_centered(element: &mut Element, width: f64, height: f64) {
    let center = Point::new(element.x1, element.y1);
    element.set_rect(Rect::from_center_size(center, (width, height)));
}

/// Per-type behavior. Every method has a default; types override what differs.
///
/// Gestures perform the generic step themselves (tracking the pointer, box resize,
/// rotation) and then call the matching hook so a type can adjust the result.
pub trait ElementType: Sync {
    fn kind(&self) -> ElementKind;

    /// Type data for a freshly created element.
    fn initialize(&self, defaults: &Defaults) -> ElementData;

    fn on_create_start(&self, _element: &mut Element, _event: &CreateEvent) {}

    fn on_create_move(&self, _element: &mut Element, _event: &CreateEvent) {}

    fn on_create_end(&self, _element: &mut Element) {}

    fn on_resize_start(&self, _element: &mut Element, _snapshot: &Element) {}

    fn on_resize(&self, _element: &mut Element, _snapshot: &Element, _event: &ResizeEvent) {}

    fn on_resize_end(&self, _element: &mut Element, _snapshot: &Element) {}

    /// Recompute derived fields after `changed` were written.
    fn on_update(&self, _element: &mut Element, _changed: &[Field]) {}

    /// Bring raw corners into canonical form. Sorts corners and enforces the minimum size.
    fn normalize(&self, element: &mut Element) {
        let rect = element.rect();
        let min = self.min_size();
        element.set_rect(Rect::new(
            rect.x0,
            rect.y0,
            rect.x0 + rect.width().max(min),
            rect.y0 + rect.height().max(min),
        ));
    }

    fn min_size(&self) -> f64 {
        MIN_ELEMENT_SIZE
    }

    /// Resize keeps the aspect ratio even without the modifier.
    fn locks_ratio(&self) -> bool {
        false
    }

    fn handlers(&self, element: &Element) -> Vec<Handle> {
        default_handles(element)
    }

    /// Decorative outline distinct from the selection box.
    fn bounds_outline(&self, _element: &Element) -> Option<BezPath> {
        None
    }

    fn bounding_rectangle(&self, element: &Element) -> Rect {
        rotated_rect_bounds(element.rect(), element.rotation)
    }

    fn snap_edges(&self, element: &Element) -> Vec<SnapEdge> {
        default_snap_edges(self.bounding_rectangle(element))
    }

    fn snap_points(&self, _element: &Element, edge: &SnapEdge) -> Vec<Point> {
        default_snap_points(edge)
    }

    fn is_value_allowed(&self, _element: &Element, _field: Field, _value: &Value) -> bool {
        true
    }

    /// Shift absolute type-specific coordinates after the corners moved by (dx, dy).
    fn on_duplicate(&self, _element: &mut Element, _dx: f64, _dy: f64) {}

    fn hit_test(&self, element: &Element, point: Point, tolerance: f64) -> bool {
        let rect = element.rect();
        let local = rotate_point(point, rect.center(), -element.rotation);
        rect.inflate(tolerance, tolerance).contains(local)
    }

    fn intersects_rect(&self, element: &Element, rect: Rect) -> bool {
        let bounds = self.bounding_rectangle(element);
        rect.intersect(bounds.inflate(1.0, 1.0)).area() > 0.0
    }
}

/// Behavior for an element kind.
pub fn element_type(kind: ElementKind) -> &'static dyn ElementType {
    match kind {
        ElementKind::Shape => &ShapeType,
        ElementKind::Arrow => &ArrowType,
        ElementKind::Text => &TextType,
        ElementKind::Draw => &DrawType,
        ElementKind::Image => &ImageType,
        ElementKind::Note => &NoteType,
        ElementKind::Sticker => &StickerType,
        ElementKind::Bookmark => &BookmarkType,
    }
}
