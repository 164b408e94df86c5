//! Tools and pointer gestures.
//!
//! The input layer converts raw events into [`PointerDown`] and [`PointerMove`]
//! payloads (page units, cumulative delta since the pointer went down) and feeds them
//! to [`Editor::pointer_down`], [`Editor::pointer_move`] and [`Editor::pointer_up`].
//! Gestures mutate elements live and record a single history entry when they end.

use crate::config::{GRID_SIZE, SNAP_THRESHOLD};
use crate::editor::Editor;
use crate::elements::{Element, ElementId, ElementKind, Field, ShapeKind, Value};
use crate::geometry::union_rects;
use crate::handles::{HANDLE_HIT_TOLERANCE, HandleKind, ResizeEvent, apply_box_resize, hit_test_handles, rotation_for_pointer};
use crate::page::Page;
use crate::snap::{SnapGuide, SnapTarget, default_snap_edges, snap_edges, snap_to_grid};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Eraser radius in screen pixels.
pub const ERASER_TOLERANCE: f64 = 4.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Rectangle,
    Ellipse,
    Diamond,
    Arrow,
    Text,
    Draw,
    Note,
    Sticker,
    Eraser,
}

impl Tool {
    /// The element kind a creation tool produces.
    pub fn creates(self) -> Option<ElementKind> {
        match self {
            Tool::Rectangle | Tool::Ellipse | Tool::Diamond => Some(ElementKind::Shape),
            Tool::Arrow => Some(ElementKind::Arrow),
            Tool::Text => Some(ElementKind::Text),
            Tool::Draw => Some(ElementKind::Draw),
            Tool::Note => Some(ElementKind::Note),
            Tool::Sticker => Some(ElementKind::Sticker),
            Tool::Select | Tool::Pan | Tool::Eraser => None,
        }
    }

    fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Ellipse => Some(ShapeKind::Ellipse),
            Tool::Diamond => Some(ShapeKind::Diamond),
            _ => None,
        }
    }
}

/// Pointer went down. Coordinates are page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerDown {
    pub original_x: f64,
    pub original_y: f64,
    #[serde(default)]
    pub shift_key: bool,
    /// Handle under the pointer, when the input layer already hit-tested one.
    #[serde(default)]
    pub handler: Option<HandleKind>,
    /// Element under the pointer, when the input layer already hit-tested one.
    #[serde(default)]
    pub element: Option<ElementId>,
}

impl PointerDown {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            original_x: x,
            original_y: y,
            ..Self::default()
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.original_x, self.original_y)
    }
}

/// Pointer moved. `dx`/`dy` are cumulative since the pointer went down, in page units
/// of the viewport as it was at pointer-down. Panning moves the live viewport, so hosts
/// must not convert pan deltas through it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerMove {
    pub dx: f64,
    pub dy: f64,
    pub current_x: f64,
    pub current_y: f64,
    #[serde(default)]
    pub shift_key: bool,
}

impl PointerMove {
    pub fn delta(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }

    pub fn current(&self) -> Point {
        Point::new(self.current_x, self.current_y)
    }
}

/// Pointer progress handed to the creation hooks of element types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateEvent {
    pub origin: Point,
    pub current: Point,
    pub shift_key: bool,
}

/// The gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub(crate) enum Gesture {
    Create {
        id: ElementId,
        origin: Point,
    },
    Resize {
        handle: HandleKind,
        snapshot: Element,
    },
    Rotate {
        snapshot: Element,
    },
    Translate {
        snapshots: Vec<Element>,
        bounds: Rect,
        targets: Vec<SnapTarget>,
    },
    Erase,
    SelectArea {
        origin: Point,
    },
    Pan {
        start: Vec2,
        zoom: f64,
    },
}

impl Gesture {
    fn name(&self) -> &'static str {
        match self {
            Gesture::Create { .. } => "create",
            Gesture::Resize { .. } => "resize",
            Gesture::Rotate { .. } => "rotate",
            Gesture::Translate { .. } => "translate",
            Gesture::Erase => "erase",
            Gesture::SelectArea { .. } => "select-area",
            Gesture::Pan { .. } => "pan",
        }
    }
}

/// Transient tool state. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ToolState {
    pub tool: Tool,
    /// Keep the creation tool after an element is created.
    pub locked: bool,
    /// Rubber-band rectangle of the selection-area gesture.
    pub selection_area: Option<Rect>,
    /// Alignment guides of the running translate gesture.
    pub snap_guides: Vec<SnapGuide>,
    pub(crate) gesture: Option<Gesture>,
}

impl ToolState {
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }
}

impl Editor {
    pub fn tool(&self) -> Tool {
        self.tool.tool
    }

    /// Switch tools. A running gesture is cancelled.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool.gesture.is_some() {
            self.cancel_gesture();
        }
        self.tool.tool = tool;
    }

    pub fn set_tool_lock(&mut self, locked: bool) {
        self.tool.locked = locked;
    }

    pub fn tool_state(&self) -> &ToolState {
        &self.tool
    }

    /// Guides to draw while a translate gesture is snapped.
    pub fn snap_guides(&self) -> &[SnapGuide] {
        &self.tool.snap_guides
    }

    pub fn selection_area(&self) -> Option<Rect> {
        self.tool.selection_area
    }

    pub fn pointer_down(&mut self, event: PointerDown) {
        if self.tool.gesture.is_some() {
            self.cancel_gesture();
        }
        let gesture = match self.tool.tool {
            Tool::Pan => {
                let viewport = self.active_page().viewport;
                Some(Gesture::Pan {
                    start: viewport.translate(),
                    zoom: viewport.zoom,
                })
            }
            Tool::Eraser => self.start_erase(event.origin()),
            Tool::Select => self.start_select(&event),
            tool => tool.creates().and_then(|kind| self.start_create(tool, kind, &event)),
        };
        if let Some(gesture) = &gesture {
            log::debug!("gesture start: {}", gesture.name());
        }
        self.tool.gesture = gesture;
    }

    pub fn pointer_move(&mut self, event: PointerMove) {
        let Some(mut gesture) = self.tool.gesture.take() else {
            return;
        };
        match &mut gesture {
            Gesture::Create { id, origin } => self.move_create(*id, *origin, &event),
            Gesture::Resize { handle, snapshot } => self.move_resize(*handle, snapshot, &event),
            Gesture::Rotate { snapshot } => {
                let rotation = rotation_for_pointer(snapshot, event.current(), event.shift_key);
                if let Some(element) = self.active_page_mut().element_mut(snapshot.id) {
                    element.rotation = rotation;
                }
            }
            Gesture::Translate { snapshots, bounds, targets } => {
                self.move_translate(snapshots, *bounds, targets, event.delta());
            }
            Gesture::Erase => self.erase_at(event.current()),
            Gesture::SelectArea { origin } => {
                self.tool.selection_area = Some(Rect::from_points(*origin, event.current()));
            }
            Gesture::Pan { start, zoom } => {
                let offset = event.delta() * *zoom;
                let viewport = &mut self.active_page_mut().viewport;
                viewport.translate_x = start.x + offset.x;
                viewport.translate_y = start.y + offset.y;
            }
        }
        self.tool.gesture = Some(gesture);
    }

    /// Finish the running gesture and record it.
    pub fn pointer_up(&mut self) {
        let Some(gesture) = self.tool.gesture.take() else {
            return;
        };
        log::debug!("gesture end: {}", gesture.name());
        match gesture {
            Gesture::Create { id, .. } => self.finish_create(id),
            Gesture::Resize { snapshot, .. } => {
                let page = self.active_page_mut();
                if let Some(element) = page.element_mut(snapshot.id) {
                    element.ty().on_resize_end(element, &snapshot);
                }
                page.record_changes(&[snapshot]);
            }
            Gesture::Rotate { snapshot } => self.active_page_mut().record_changes(&[snapshot]),
            Gesture::Translate { snapshots, .. } => {
                self.tool.snap_guides.clear();
                self.active_page_mut().record_changes(&snapshots);
            }
            Gesture::Erase => {
                let page = self.active_page_mut();
                let ids: Vec<_> = page.elements().iter().filter(|e| e.erased).map(|e| e.id).collect();
                page.remove_elements(&ids);
                page.seal_history();
            }
            Gesture::SelectArea { .. } => {
                if let Some(area) = self.tool.selection_area.take() {
                    self.set_selection_area(area);
                }
            }
            Gesture::Pan { .. } => {}
        }
    }

    /// Abort the running gesture, restoring the pre-gesture state. Nothing is recorded.
    pub fn cancel_gesture(&mut self) {
        let Some(gesture) = self.tool.gesture.take() else {
            return;
        };
        log::debug!("gesture cancelled: {}", gesture.name());
        self.tool.snap_guides.clear();
        self.tool.selection_area = None;
        let page = self.active_page_mut();
        match gesture {
            Gesture::Create { id, .. } => page.discard_pending(id),
            Gesture::Resize { snapshot, .. } | Gesture::Rotate { snapshot } => restore(page, vec![snapshot]),
            Gesture::Translate { snapshots, .. } => restore(page, snapshots),
            Gesture::Erase => {
                for element in page.elements_mut() {
                    element.erased = false;
                }
            }
            Gesture::SelectArea { .. } => {}
            Gesture::Pan { start, .. } => {
                page.viewport.translate_x = start.x;
                page.viewport.translate_y = start.y;
            }
        }
    }

    fn start_create(&mut self, tool: Tool, kind: ElementKind, event: &PointerDown) -> Option<Gesture> {
        if self.active_page().readonly {
            log::warn!("cannot create elements on a readonly page");
            return None;
        }
        let origin = self.grid_snapped(event.origin());
        let mut element = Element::new(kind, &self.defaults);
        if let Some(shape) = tool.shape_kind() {
            element.set(Field::Shape, Value::Shape(shape));
        }
        element.x1 = origin.x;
        element.y1 = origin.y;
        element.x2 = origin.x;
        element.y2 = origin.y;
        element.creating = true;
        let create = CreateEvent {
            origin,
            current: origin,
            shift_key: event.shift_key,
        };
        element.ty().on_create_start(&mut element, &create);
        let id = element.id;
        self.clear_selection();
        self.active_page_mut().insert_pending(element);
        Some(Gesture::Create { id, origin })
    }

    fn move_create(&mut self, id: ElementId, origin: Point, event: &PointerMove) {
        let current = self.grid_snapped(origin + event.delta());
        let Some(element) = self.active_page_mut().element_mut(id) else {
            return;
        };
        element.x2 = current.x;
        element.y2 = current.y;
        let create = CreateEvent {
            origin,
            current,
            shift_key: event.shift_key,
        };
        element.ty().on_create_move(element, &create);
    }

    fn finish_create(&mut self, id: ElementId) {
        let page = self.active_page_mut();
        let Some(element) = page.element_mut(id) else {
            return;
        };
        element.creating = false;
        let ty = element.ty();
        ty.on_create_end(element);
        ty.normalize(element);
        // A click with the arrow tool draws nothing.
        if element.kind() == ElementKind::Arrow && element.width() < 1.0 && element.height() < 1.0 {
            page.discard_pending(id);
            return;
        }
        element.selected = true;
        element.editing = element.kind() == ElementKind::Text;
        page.record_created(&[id]);
        page.seal_history();
        if !self.tool.locked {
            self.tool.tool = Tool::Select;
        }
    }

    fn start_select(&mut self, event: &PointerDown) -> Option<Gesture> {
        let origin = event.origin();
        let tolerance = HANDLE_HIT_TOLERANCE / self.get_zoom();
        let selected = self.active_page().selected_ids();

        let single = match selected.as_slice() {
            [id] => Some(*id),
            _ => None,
        };
        let handle_target = match event.handler {
            // Only handles the element actually exposes can be dragged.
            Some(handle) => event
                .element
                .or(single)
                .filter(|id| {
                    self.active_page()
                        .element(*id)
                        .is_some_and(|element| element.handles().iter().any(|h| h.kind == handle))
                })
                .map(|id| (id, handle)),
            None => single.and_then(|id| {
                let element = self.active_page().element(id)?;
                Some((id, hit_test_handles(&element.handles(), origin, tolerance)?))
            }),
        };
        if let Some((id, handle)) = handle_target {
            return self.start_resize(id, handle);
        }

        let hit = event
            .element
            .or_else(|| self.active_page().elements_at_point(origin, tolerance).first().copied());
        let Some(id) = hit else {
            if !event.shift_key {
                self.clear_selection();
            }
            return Some(Gesture::SelectArea { origin });
        };
        if !selected.contains(&id) {
            self.select_element(id, event.shift_key);
        }
        self.start_translate()
    }

    fn start_resize(&mut self, id: ElementId, handle: HandleKind) -> Option<Gesture> {
        let page = self.active_page_mut();
        if page.readonly {
            return None;
        }
        let element = page.element_mut(id).filter(|e| !e.locked)?;
        let snapshot = element.clone();
        if handle == HandleKind::Rotation {
            return Some(Gesture::Rotate { snapshot });
        }
        element.ty().on_resize_start(element, &snapshot);
        Some(Gesture::Resize { handle, snapshot })
    }

    fn move_resize(&mut self, handle: HandleKind, snapshot: &Element, event: &PointerMove) {
        let Some(element) = self.active_page_mut().element_mut(snapshot.id) else {
            return;
        };
        let ty = element.ty();
        let resize = ResizeEvent {
            handle,
            dx: event.dx,
            dy: event.dy,
            current: event.current(),
            shift_key: event.shift_key,
        };
        let lock_ratio = event.shift_key || ty.locks_ratio();
        apply_box_resize(element, snapshot, handle, resize.delta(), lock_ratio, ty.min_size());
        ty.on_resize(element, snapshot, &resize);
    }

    fn start_translate(&mut self) -> Option<Gesture> {
        let page = self.active_page();
        if page.readonly {
            return None;
        }
        let snapshots: Vec<Element> = page
            .elements()
            .iter()
            .filter(|e| e.selected && !e.locked)
            .cloned()
            .collect();
        let bounds = union_rects(snapshots.iter().map(|e| e.bounding_rect()))?;
        let moving: HashSet<_> = snapshots.iter().map(|e| e.id).collect();
        let targets = page
            .elements()
            .iter()
            .filter(|e| !e.selected && !moving.contains(&e.id))
            .flat_map(|e| {
                let ty = e.ty();
                ty.snap_edges(e).into_iter().map(move |edge| SnapTarget {
                    points: ty.snap_points(e, &edge),
                    edge,
                })
            })
            .collect();
        Some(Gesture::Translate { snapshots, bounds, targets })
    }

    fn move_translate(&mut self, snapshots: &[Element], bounds: Rect, targets: &[SnapTarget], delta: Vec2) {
        let moved = bounds + delta;
        let mut offset = Vec2::ZERO;
        self.tool.snap_guides.clear();
        if self.app_state.snap_to_elements {
            let threshold = SNAP_THRESHOLD / self.get_zoom();
            let result = snap_edges(&default_snap_edges(moved), targets, threshold);
            if result.is_snapped() {
                offset = result.offset;
                self.tool.snap_guides = result.guides;
            }
        }
        if offset == Vec2::ZERO && self.app_state.grid {
            offset = snap_to_grid(moved.origin(), GRID_SIZE) - moved.origin();
        }
        let total = delta + offset;
        let page = self.active_page_mut();
        for snapshot in snapshots {
            if let Some(element) = page.element_mut(snapshot.id) {
                *element = snapshot.clone();
                element.translate(total.x, total.y);
            }
        }
    }

    fn start_erase(&mut self, point: Point) -> Option<Gesture> {
        if self.active_page().readonly {
            log::warn!("cannot erase on a readonly page");
            return None;
        }
        self.erase_at(point);
        Some(Gesture::Erase)
    }

    fn erase_at(&mut self, point: Point) {
        let tolerance = ERASER_TOLERANCE / self.get_zoom();
        let page = self.active_page_mut();
        let hits: HashSet<_> = page.elements_at_point(point, tolerance).into_iter().collect();
        for element in page.elements_mut() {
            if hits.contains(&element.id) && !element.locked {
                element.erased = true;
            }
        }
    }

    fn grid_snapped(&self, point: Point) -> Point {
        if self.app_state.grid {
            snap_to_grid(point, GRID_SIZE)
        } else {
            point
        }
    }
}

fn restore(page: &mut Page, snapshots: Vec<Element>) {
    for snapshot in snapshots {
        if let Some(element) = page.element_mut(snapshot.id) {
            *element = snapshot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementData;
    use crate::history::HistoryEntry;

    fn drag(editor: &mut Editor, from: Point, to: Point, shift_key: bool) {
        editor.pointer_down(PointerDown {
            shift_key,
            ..PointerDown::at(from.x, from.y)
        });
        let delta = to - from;
        editor.pointer_move(PointerMove {
            dx: delta.x,
            dy: delta.y,
            current_x: to.x,
            current_y: to.y,
            shift_key,
        });
        editor.pointer_up();
    }

    fn draw_rect(editor: &mut Editor, x0: f64, y0: f64, x1: f64, y1: f64) -> ElementId {
        editor.set_tool(Tool::Rectangle);
        drag(editor, Point::new(x0, y0), Point::new(x1, y1), false);
        editor.get_elements().last().unwrap().id
    }

    #[test]
    fn test_create_rectangle_records_one_entry() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 50.0);
        let el = editor.active_page().element(id).unwrap();
        assert_eq!(el.rect(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(el.selected);
        assert!(!el.creating);
        assert_eq!(editor.active_page().history().len(), 1);
        assert!(matches!(editor.active_page().history().head(), Some(HistoryEntry::Create { .. })));
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_create_drag_backwards_sorts_corners() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 100.0, 100.0, 20.0, 40.0);
        let el = editor.active_page().element(id).unwrap();
        assert_eq!((el.x1, el.y1, el.x2, el.y2), (20.0, 40.0, 100.0, 100.0));
    }

    #[test]
    fn test_tool_lock_keeps_tool() {
        let mut editor = Editor::new();
        editor.set_tool_lock(true);
        draw_rect(&mut editor, 0.0, 0.0, 10.0, 10.0);
        assert_eq!(editor.tool(), Tool::Rectangle);
    }

    #[test]
    fn test_ellipse_tool_sets_shape() {
        let mut editor = Editor::new();
        editor.set_tool(Tool::Ellipse);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 50.0), false);
        let el = editor.get_elements().last().unwrap();
        assert_eq!(el.get(Field::Shape), Some(Value::Shape(ShapeKind::Ellipse)));
    }

    #[test]
    fn test_cancel_create_leaves_nothing() {
        let mut editor = Editor::new();
        editor.set_tool(Tool::Rectangle);
        editor.pointer_down(PointerDown::at(0.0, 0.0));
        assert_eq!(editor.get_elements().len(), 1);
        editor.cancel_gesture();
        assert!(editor.get_elements().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_top_edge_ratio_locked_resize() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 100.0);
        editor.pointer_down(PointerDown {
            shift_key: true,
            handler: Some(HandleKind::Top),
            element: Some(id),
            ..PointerDown::at(50.0, 0.0)
        });
        editor.pointer_move(PointerMove {
            dx: 0.0,
            dy: -20.0,
            current_x: 50.0,
            current_y: -20.0,
            shift_key: true,
        });
        editor.pointer_up();
        let el = editor.active_page().element(id).unwrap();
        assert_eq!(el.y1, -20.0);
        assert!((el.height() - el.width()).abs() < 1e-9);
        assert_eq!(editor.active_page().history().len(), 2);
    }

    #[test]
    fn test_diagonal_ratio_lock_keeps_two_to_one() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 50.0);
        for (dx, dy) in [(30.0, 5.0), (-20.0, 40.0), (60.0, -10.0), (-35.0, -30.0)] {
            editor.pointer_down(PointerDown {
                shift_key: true,
                handler: Some(HandleKind::BottomRight),
                element: Some(id),
                ..PointerDown::at(100.0, 50.0)
            });
            editor.pointer_move(PointerMove {
                dx,
                dy,
                current_x: 100.0 + dx,
                current_y: 50.0 + dy,
                shift_key: true,
            });
            let el = editor.active_page().element(id).unwrap();
            assert!((el.width() / el.height() - 2.0).abs() < 1e-9, "ratio broken for ({dx}, {dy})");
            editor.cancel_gesture();
        }
    }

    #[test]
    fn test_resize_undo_restores_box() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 100.0);
        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::Right),
            element: Some(id),
            ..PointerDown::at(100.0, 50.0)
        });
        for step in 1..=5 {
            let dx = step as f64 * 10.0;
            editor.pointer_move(PointerMove {
                dx,
                current_x: 100.0 + dx,
                current_y: 50.0,
                ..PointerMove::default()
            });
        }
        editor.pointer_up();
        assert_eq!(editor.active_page().element(id).unwrap().x2, 150.0);
        assert!(editor.undo());
        assert_eq!(editor.active_page().element(id).unwrap().x2, 100.0);
        assert!(editor.redo());
        assert_eq!(editor.active_page().element(id).unwrap().x2, 150.0);
    }

    #[test]
    fn test_shrink_past_minimum_keeps_opposite_corner() {
        let mut editor = Editor::new();
        let id = editor.create_element(ElementKind::Note, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::TopLeft),
            element: Some(id),
            ..PointerDown::at(0.0, 0.0)
        });
        editor.pointer_move(PointerMove {
            dx: 150.0,
            dy: 150.0,
            current_x: 150.0,
            current_y: 150.0,
            shift_key: false,
        });
        editor.pointer_up();
        assert_eq!(editor.active_page().element(id).unwrap().rect(), Rect::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn test_shrink_past_minimum_from_left_edge() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 40.0);
        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::Left),
            element: Some(id),
            ..PointerDown::at(0.0, 20.0)
        });
        editor.pointer_move(PointerMove {
            dx: 180.0,
            current_x: 180.0,
            current_y: 20.0,
            ..PointerMove::default()
        });
        editor.pointer_up();
        let rect = editor.active_page().element(id).unwrap().rect();
        assert_eq!(rect.x1, 100.0);
        assert!(rect.width() >= 1.0 && rect.width() < 1.0 + 1e-9);
        assert_eq!((rect.y0, rect.y1), (0.0, 40.0));
    }

    #[test]
    fn test_handle_without_handler_is_refused() {
        let mut editor = Editor::new();
        let id = editor
            .commit_bookmark("https://example.com", Default::default(), Some(Point::ZERO))
            .unwrap();
        let before = editor.active_page().element(id).unwrap().rect();
        assert!(editor.active_page().element(id).unwrap().handles().is_empty());

        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::BottomRight),
            element: Some(id),
            ..PointerDown::at(before.x1, before.y1)
        });
        editor.pointer_move(PointerMove {
            dx: 300.0,
            dy: 300.0,
            current_x: before.x1 + 300.0,
            current_y: before.y1 + 300.0,
            shift_key: false,
        });
        editor.pointer_up();
        let after = editor.active_page().element(id).unwrap().rect();
        assert_eq!(after.size(), before.size());
    }

    #[test]
    fn test_arrow_refuses_box_handles() {
        let mut editor = Editor::new();
        let id = editor.create_element(ElementKind::Arrow, Rect::new(0.0, 0.0, 100.0, 0.0)).unwrap();
        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::Top),
            element: Some(id),
            ..PointerDown::at(50.0, 0.0)
        });
        assert!(!matches!(editor.tool.gesture, Some(Gesture::Resize { .. })));
        editor.cancel_gesture();
    }

    #[test]
    fn test_translate_records_single_update() {
        let mut editor = Editor::new();
        editor.app_state.snap_to_elements = false;
        let id = draw_rect(&mut editor, 0.0, 0.0, 50.0, 50.0);
        drag(&mut editor, Point::new(25.0, 25.0), Point::new(55.0, 45.0), false);
        let el = editor.active_page().element(id).unwrap();
        assert_eq!(el.rect(), Rect::new(30.0, 20.0, 80.0, 70.0));
        assert_eq!(editor.active_page().history().len(), 2);
        editor.undo();
        assert_eq!(editor.active_page().element(id).unwrap().rect(), Rect::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn test_translate_snaps_to_other_element() {
        let mut editor = Editor::new();
        draw_rect(&mut editor, 0.0, 0.0, 100.0, 100.0);
        let moving = draw_rect(&mut editor, 200.0, 0.0, 250.0, 50.0);
        editor.pointer_down(PointerDown::at(225.0, 25.0));
        // Left edge lands 3 units right of the other element's right edge.
        editor.pointer_move(PointerMove {
            dx: -97.0,
            dy: 0.0,
            current_x: 128.0,
            current_y: 25.0,
            shift_key: false,
        });
        assert!(!editor.snap_guides().is_empty());
        assert_eq!(editor.active_page().element(moving).unwrap().x1, 100.0);
        editor.pointer_up();
        assert!(editor.snap_guides().is_empty());
    }

    #[test]
    fn test_translate_snaps_to_grid() {
        let mut editor = Editor::new();
        editor.app_state.snap_to_elements = false;
        editor.app_state.grid = true;
        let id = draw_rect(&mut editor, 0.0, 0.0, 40.0, 40.0);
        drag(&mut editor, Point::new(20.0, 20.0), Point::new(27.0, 52.0), false);
        let el = editor.active_page().element(id).unwrap();
        assert_eq!((el.x1, el.y1), (0.0, 40.0));
    }

    #[test]
    fn test_rotation_handle() {
        let mut editor = Editor::new();
        let id = draw_rect(&mut editor, 0.0, 0.0, 100.0, 100.0);
        editor.pointer_down(PointerDown {
            handler: Some(HandleKind::Rotation),
            element: Some(id),
            ..PointerDown::at(50.0, -25.0)
        });
        editor.pointer_move(PointerMove {
            dx: 100.0,
            dy: 75.0,
            current_x: 150.0,
            current_y: 50.0,
            shift_key: true,
        });
        editor.pointer_up();
        let rotation = editor.active_page().element(id).unwrap().rotation;
        assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_eraser_removes_in_one_entry() {
        let mut editor = Editor::new();
        draw_rect(&mut editor, 0.0, 0.0, 50.0, 50.0);
        draw_rect(&mut editor, 100.0, 0.0, 150.0, 50.0);
        let before = editor.active_page().history().len();
        editor.set_tool(Tool::Eraser);
        drag(&mut editor, Point::new(25.0, 25.0), Point::new(125.0, 25.0), false);
        assert!(editor.get_elements().is_empty());
        assert_eq!(editor.active_page().history().len(), before + 1);
    }

    #[test]
    fn test_eraser_cancel_clears_flags() {
        let mut editor = Editor::new();
        draw_rect(&mut editor, 0.0, 0.0, 50.0, 50.0);
        editor.set_tool(Tool::Eraser);
        editor.pointer_down(PointerDown::at(25.0, 25.0));
        assert!(editor.get_elements()[0].erased);
        editor.cancel_gesture();
        assert!(!editor.get_elements()[0].erased);
        assert_eq!(editor.get_elements().len(), 1);
    }

    #[test]
    fn test_selection_area_selects_groups() {
        let mut editor = Editor::new();
        let a = draw_rect(&mut editor, 0.0, 0.0, 50.0, 50.0);
        let b = draw_rect(&mut editor, 300.0, 300.0, 350.0, 350.0);
        let c = draw_rect(&mut editor, 600.0, 0.0, 650.0, 50.0);
        editor.group_elements(&[a, b]);
        editor.clear_selection();
        drag(&mut editor, Point::new(-20.0, -20.0), Point::new(60.0, 60.0), false);
        assert!(editor.selection_area().is_none());
        let selected = editor.get_selection();
        assert!(selected.contains(&a) && selected.contains(&b));
        assert!(!selected.contains(&c));
    }

    #[test]
    fn test_draw_tool_keeps_points() {
        let mut editor = Editor::new();
        editor.set_tool(Tool::Draw);
        editor.pointer_down(PointerDown::at(10.0, 10.0));
        for (x, y) in [(20.0, 15.0), (40.0, 30.0), (60.0, 10.0)] {
            editor.pointer_move(PointerMove {
                dx: x - 10.0,
                dy: y - 10.0,
                current_x: x,
                current_y: y,
                shift_key: false,
            });
        }
        editor.pointer_up();
        let el = editor.get_elements().last().unwrap();
        let ElementData::Draw(data) = &el.data else { panic!("not a drawing") };
        assert_eq!(data.points.len(), 4);
        assert_eq!(el.rect(), Rect::new(10.0, 10.0, 60.0, 30.0));
    }

    #[test]
    fn test_arrow_click_discarded() {
        let mut editor = Editor::new();
        editor.set_tool(Tool::Arrow);
        editor.pointer_down(PointerDown::at(10.0, 10.0));
        editor.pointer_up();
        assert!(editor.get_elements().is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_readonly_page_ignores_create() {
        let mut editor = Editor::new();
        let page = editor.active_page().id;
        editor.set_page_readonly(page, true);
        editor.set_tool(Tool::Rectangle);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(10.0, 10.0), false);
        assert!(editor.get_elements().is_empty());
    }

    #[test]
    fn test_pan_scales_by_pointer_down_zoom() {
        let mut editor = Editor::new();
        editor.set_zoom(2.0);
        let start = editor.active_page().viewport.translate();
        editor.set_tool(Tool::Pan);
        editor.pointer_down(PointerDown::at(0.0, 0.0));
        for step in 1..=3 {
            let d = step as f64 * 5.0;
            editor.pointer_move(PointerMove {
                dx: d,
                dy: -d,
                current_x: d,
                current_y: -d,
                shift_key: false,
            });
        }
        editor.pointer_up();
        let viewport = editor.active_page().viewport;
        assert_eq!(viewport.translate(), start + Vec2::new(30.0, -30.0));
        assert_eq!(viewport.zoom, 2.0);
    }

    #[test]
    fn test_pan_moves_viewport() {
        let mut editor = Editor::new();
        editor.set_tool(Tool::Pan);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(30.0, -10.0), false);
        let viewport = editor.active_page().viewport;
        assert_eq!((viewport.translate_x, viewport.translate_y), (30.0, -10.0));
    }
}
