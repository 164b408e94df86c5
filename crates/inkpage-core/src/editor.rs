//! The editor aggregate: pages, assets, settings and the mutation API.

use crate::assets::Asset;
use crate::config::{AppState, DOCUMENT_VERSION, Defaults, FIT_PADDING, IMPORT_OFFSET, ZOOM_DEFAULT, ZOOM_STEP};
use crate::elements::{
    AssetId, Element, ElementId, ElementKind, Field, FieldSet, GroupId, Value, BOOKMARK_HEIGHT, BOOKMARK_WIDTH,
};
use crate::gesture::ToolState;
use crate::geometry::union_rects;
use crate::page::{Page, PageId};
use crate::resolve::{BookmarkMetadata, ResolvedImage};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Screen size assumed until the host reports one.
pub const DEFAULT_VIEWPORT_SIZE: Size = Size::new(1280.0, 800.0);

/// Elements plus the assets they reference, as carried between documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, Asset>,
}

/// An open document.
///
/// There is always at least one page and exactly one of them is active. Element
/// operations act on the active page.
#[derive(Debug, Clone)]
pub struct Editor {
    /// Unique document identifier.
    pub id: Uuid,
    pub version: String,
    pub title: String,
    pub(crate) pages: Vec<Page>,
    pub(crate) active: usize,
    pub(crate) assets: BTreeMap<AssetId, Asset>,
    pub app_state: AppState,
    /// Page background color as a CSS color string.
    pub background: String,
    pub(crate) defaults: Defaults,
    pub(crate) tool: ToolState,
    pub(crate) viewport_size: Size,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an empty document with one page.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            version: DOCUMENT_VERSION.to_string(),
            title: "Untitled".to_string(),
            pages: vec![Page::default()],
            active: 0,
            assets: BTreeMap::new(),
            app_state: AppState::default(),
            background: "#ffffff".to_string(),
            defaults: Defaults::new(),
            tool: ToolState::default(),
            viewport_size: DEFAULT_VIEWPORT_SIZE,
        }
    }

    // --- accessors ---

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    fn page_index(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    pub fn active_page(&self) -> &Page {
        &self.pages[self.active]
    }

    pub(crate) fn active_page_mut(&mut self) -> &mut Page {
        &mut self.pages[self.active]
    }

    pub fn active_page_index(&self) -> usize {
        self.active
    }

    /// Elements of the active page in z-order.
    pub fn get_elements(&self) -> &[Element] {
        self.active_page().elements()
    }

    /// Ids of the selected elements in z-order.
    pub fn get_selection(&self) -> Vec<ElementId> {
        self.active_page().selected_ids()
    }

    pub fn selected_elements(&self) -> Vec<&Element> {
        self.get_elements().iter().filter(|e| e.selected).collect()
    }

    pub fn get_zoom(&self) -> f64 {
        self.active_page().viewport.zoom
    }

    /// Last-used style values applied to new elements.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn assets(&self) -> &BTreeMap<AssetId, Asset> {
        &self.assets
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Store an asset under a fresh id.
    pub fn add_asset(&mut self, asset: Asset) -> AssetId {
        let id = Uuid::new_v4();
        self.assets.insert(id, asset);
        id
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn can_undo(&self) -> bool {
        self.active_page().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.active_page().can_redo()
    }

    // --- elements ---

    /// Append elements to the active page as one undo step.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> Vec<ElementId> {
        self.active_page_mut().add_elements(elements)
    }

    /// Create an element of `kind` covering `rect`, styled from the defaults.
    pub fn create_element(&mut self, kind: ElementKind, rect: Rect) -> Option<ElementId> {
        let mut element = Element::new(kind, &self.defaults);
        element.set_rect(rect);
        element.ty().normalize(&mut element);
        self.add_elements(vec![element]).first().copied()
    }

    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<Element> {
        self.active_page_mut().remove_elements(ids)
    }

    pub fn remove_selected(&mut self) -> Vec<Element> {
        let ids = self.get_selection();
        self.remove_elements(&ids)
    }

    /// Write `values` to the elements and remember accepted style values as defaults.
    ///
    /// With `coalesce`, a call with the same ids and fields as the previous update is
    /// merged into its undo step.
    pub fn update_elements(&mut self, ids: &[ElementId], values: &FieldSet, coalesce: bool) -> FieldSet {
        let accepted = self.active_page_mut().update_elements(ids, values, coalesce);
        for (field, value) in &accepted {
            self.defaults.set(*field, value.clone());
        }
        accepted
    }

    pub fn update_selected(&mut self, values: &FieldSet, coalesce: bool) -> FieldSet {
        let ids = self.get_selection();
        self.update_elements(&ids, values, coalesce)
    }

    pub fn lock_elements(&mut self, ids: &[ElementId]) {
        self.update_elements(ids, &FieldSet::from([(Field::Locked, Value::Bool(true))]), false);
    }

    pub fn unlock_elements(&mut self, ids: &[ElementId]) {
        self.update_elements(ids, &FieldSet::from([(Field::Locked, Value::Bool(false))]), false);
    }

    /// Nudge the unlocked selected elements. Repeated nudges form one undo step.
    pub fn move_selection(&mut self, dx: f64, dy: f64) {
        let updates: Vec<_> = self
            .get_elements()
            .iter()
            .filter(|e| e.selected && !e.locked)
            .map(|e| {
                let mut moved = e.clone();
                moved.translate(dx, dy);
                (e.id, moved.capture(&[Field::X1, Field::Y1, Field::X2, Field::Y2, Field::Control]))
            })
            .collect();
        if !updates.is_empty() {
            self.active_page_mut().update_each(updates, true);
        }
    }

    /// Copy elements and the assets they reference.
    pub fn export_elements(&self, ids: &[ElementId]) -> Clipboard {
        let elements: Vec<Element> = self
            .get_elements()
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .map(|mut e| {
                e.clear_transient();
                e
            })
            .collect();
        let assets = elements
            .iter()
            .filter_map(|e| match e.get(Field::Asset) {
                Some(Value::Id(Some(id))) => Some(id),
                _ => None,
            })
            .filter_map(|id| Some((id, self.assets.get(&id)?.clone())))
            .collect();
        Clipboard { elements, assets }
    }

    /// Paste elements centered on `at` (default: the viewport center).
    ///
    /// Elements get fresh ids, assets are stored under fresh ids, and grouped elements
    /// imported together share a fresh group. The copies become the selection.
    pub fn import_elements(&mut self, clipboard: Clipboard, at: Option<Point>) -> Vec<ElementId> {
        if clipboard.elements.is_empty() {
            return Vec::new();
        }
        if self.active_page().readonly {
            log::warn!("cannot import into a readonly page");
            return Vec::new();
        }
        let mut asset_ids = HashMap::new();
        for (old, asset) in clipboard.assets {
            asset_ids.insert(old, self.add_asset(asset));
        }
        let target = at.unwrap_or_else(|| self.viewport_center());
        let offset = union_rects(clipboard.elements.iter().map(|e| e.bounding_rect()))
            .map_or(Vec2::ZERO, |bounds| target - bounds.center());
        let copies = copy_elements(clipboard.elements, offset, &asset_ids);
        self.add_copies(copies)
    }

    /// Copy elements in place, shifted by [`IMPORT_OFFSET`]. The copies become the selection.
    pub fn duplicate_elements(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let originals: Vec<Element> = self
            .get_elements()
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect();
        let copies = copy_elements(originals, Vec2::new(IMPORT_OFFSET, IMPORT_OFFSET), &HashMap::new());
        self.add_copies(copies)
    }

    fn add_copies(&mut self, copies: Vec<Element>) -> Vec<ElementId> {
        let ids = self.add_elements(copies);
        if !ids.is_empty() {
            self.clear_selection();
            self.set_selection(&ids);
        }
        ids
    }

    /// Group the elements and select the new group.
    pub fn group_elements(&mut self, ids: &[ElementId]) -> Option<GroupId> {
        let group = self.active_page_mut().group_elements(ids)?;
        let members = self.active_page().group_members(group);
        self.set_selection(&members);
        Some(group)
    }

    pub fn ungroup_elements(&mut self, ids: &[ElementId]) {
        self.active_page_mut().ungroup_elements(ids);
    }

    // --- z-order ---

    pub fn bring_forward(&mut self, ids: &[ElementId]) {
        let ids = self.active_page().expand_groups(ids);
        self.active_page_mut().bring_forward(&ids);
    }

    pub fn send_backward(&mut self, ids: &[ElementId]) {
        let ids = self.active_page().expand_groups(ids);
        self.active_page_mut().send_backward(&ids);
    }

    pub fn bring_to_front(&mut self, ids: &[ElementId]) {
        let ids = self.active_page().expand_groups(ids);
        self.active_page_mut().bring_to_front(&ids);
    }

    pub fn send_to_back(&mut self, ids: &[ElementId]) {
        let ids = self.active_page().expand_groups(ids);
        self.active_page_mut().send_to_back(&ids);
    }

    // --- selection ---

    /// Select exactly `ids`, expanded to whole groups except inside the entered group.
    pub fn set_selection(&mut self, ids: &[ElementId]) {
        let page = self.active_page_mut();
        let selected: HashSet<_> = page.expand_groups(ids).into_iter().collect();
        for element in page.elements_mut() {
            element.selected = selected.contains(&element.id);
            if !element.selected {
                element.editing = false;
            }
        }
    }

    /// Select one element (and its group). With `additive` the current selection stays.
    pub fn select_element(&mut self, id: ElementId, additive: bool) {
        let mut ids = if additive { self.get_selection() } else { Vec::new() };
        ids.push(id);
        self.set_selection(&ids);
    }

    /// Select the unlocked elements touching `area`.
    pub fn set_selection_area(&mut self, area: Rect) {
        let page = self.active_page();
        let ids: Vec<_> = page
            .elements_in_rect(area)
            .into_iter()
            .filter(|id| page.element(*id).is_some_and(|e| !e.locked))
            .collect();
        self.tool.selection_area = None;
        self.set_selection(&ids);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(&[]);
    }

    pub fn select_all(&mut self) {
        let ids: Vec<_> = self.get_elements().iter().map(|e| e.id).collect();
        self.set_selection(&ids);
    }

    /// Enter a group so its members can be selected one at a time.
    pub fn enter_group(&mut self, group: GroupId) -> bool {
        let page = self.active_page_mut();
        if page.group_members(group).is_empty() {
            log::warn!("cannot enter unknown group {group}");
            return false;
        }
        page.active_group = Some(group);
        true
    }

    pub fn exit_group(&mut self) {
        self.active_page_mut().active_group = None;
    }

    // --- pages ---

    /// Append a page and make it active.
    pub fn add_page(&mut self, title: impl Into<String>) -> PageId {
        self.cancel_gesture();
        let page = Page::new(title);
        let id = page.id;
        self.pages.push(page);
        self.active = self.pages.len() - 1;
        log::debug!("page {id} added");
        id
    }

    /// Remove a page. The last remaining page cannot be removed.
    pub fn remove_page(&mut self, id: PageId) -> bool {
        if self.pages.len() == 1 {
            log::warn!("cannot remove the last page");
            return false;
        }
        let Some(index) = self.page_index(id) else {
            log::warn!("remove of unknown page {id}");
            return false;
        };
        self.cancel_gesture();
        self.pages.remove(index);
        if self.active > index || self.active == self.pages.len() {
            self.active -= 1;
        }
        log::debug!("page {id} removed");
        true
    }

    /// Copy a page next to the original and make the copy active.
    pub fn duplicate_page(&mut self, id: PageId) -> Option<PageId> {
        let index = self.page_index(id)?;
        self.cancel_gesture();
        let copy = self.pages[index].duplicate();
        let copy_id = copy.id;
        self.pages.insert(index + 1, copy);
        self.active = index + 1;
        log::debug!("page {id} duplicated as {copy_id}");
        Some(copy_id)
    }

    /// Move the page at `from` to index `to`. Out-of-range indices are refused.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        if from >= self.pages.len() || to >= self.pages.len() {
            log::warn!("page move {from} -> {to} out of range");
            return false;
        }
        let active = self.active_page().id;
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        self.active = self.page_index(active).unwrap_or(0);
        true
    }

    pub fn set_active_page(&mut self, id: PageId) -> bool {
        let Some(index) = self.page_index(id) else {
            log::warn!("unknown page {id}");
            return false;
        };
        if index != self.active {
            self.cancel_gesture();
            self.active = index;
        }
        true
    }

    pub fn update_page(&mut self, id: PageId, title: impl Into<String>, description: impl Into<String>) -> bool {
        let Some(index) = self.page_index(id) else {
            log::warn!("unknown page {id}");
            return false;
        };
        let page = &mut self.pages[index];
        page.title = title.into();
        page.description = description.into();
        true
    }

    pub fn set_page_readonly(&mut self, id: PageId, readonly: bool) -> bool {
        let Some(index) = self.page_index(id) else {
            log::warn!("unknown page {id}");
            return false;
        };
        if index == self.active {
            self.cancel_gesture();
        }
        self.pages[index].readonly = readonly;
        true
    }

    /// Remove every element of the active page as one undo step.
    pub fn clear_page(&mut self) -> Vec<Element> {
        self.cancel_gesture();
        self.active_page_mut().clear()
    }

    // --- viewport ---

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    fn screen_center(&self) -> Point {
        Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0)
    }

    /// Page point under the center of the screen.
    pub fn viewport_center(&self) -> Point {
        self.active_page().viewport.screen_to_page(self.screen_center())
    }

    /// Set the zoom around the viewport center. Clamped to the zoom limits.
    pub fn set_zoom(&mut self, zoom: f64) {
        let center = self.screen_center();
        self.active_page_mut().viewport.zoom_at(center, zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(ZOOM_DEFAULT);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.get_zoom() + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.get_zoom() - ZOOM_STEP);
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.active_page_mut().viewport.pan(delta);
    }

    /// Fit the selection, or every element when nothing is selected, into the screen.
    pub fn fit_zoom_to_selection(&mut self) {
        let page = self.active_page();
        let selection = page.selected_ids();
        let bounds = if selection.is_empty() {
            page.bounds()
        } else {
            page.bounds_of(&selection)
        };
        let Some(bounds) = bounds else {
            return;
        };
        let size = self.viewport_size;
        self.active_page_mut().viewport.fit_to_bounds(bounds, size, FIT_PADDING);
    }

    // --- history ---

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        self.active_page_mut().undo()
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        self.active_page_mut().redo()
    }

    // --- resolved content ---

    /// Place a resolved image at its intrinsic size, centered on `at` (default: the
    /// viewport center).
    pub fn commit_image(&mut self, resolved: ResolvedImage, at: Option<Point>) -> Option<ElementId> {
        if self.active_page().readonly {
            log::warn!("cannot add an image to a readonly page");
            return None;
        }
        let center = at.unwrap_or_else(|| self.viewport_center());
        let asset = self.add_asset(resolved.asset);
        let mut element = Element::new(ElementKind::Image, &self.defaults);
        element.set(Field::Asset, Value::Id(Some(asset)));
        element.set(Field::ImageWidth, Value::Number(resolved.width));
        element.set(Field::ImageHeight, Value::Number(resolved.height));
        element.set_rect(Rect::from_center_size(center, (resolved.width.max(1.0), resolved.height.max(1.0))));
        self.add_copies(vec![element]).first().copied()
    }

    /// Place a link preview centered on `at` (default: the viewport center).
    pub fn commit_bookmark(&mut self, url: &str, metadata: BookmarkMetadata, at: Option<Point>) -> Option<ElementId> {
        if self.active_page().readonly {
            log::warn!("cannot add a bookmark to a readonly page");
            return None;
        }
        let center = at.unwrap_or_else(|| self.viewport_center());
        let asset = metadata.image.map(|image| self.add_asset(image));
        let mut element = Element::new(ElementKind::Bookmark, &self.defaults);
        element.set(Field::Link, Value::Text(url.to_string()));
        element.set(Field::Title, Value::Text(metadata.title));
        element.set(Field::Description, Value::Text(metadata.description));
        element.set(Field::Asset, Value::Id(asset));
        element.set_rect(Rect::from_center_size(center, (BOOKMARK_WIDTH, BOOKMARK_HEIGHT)));
        self.add_copies(vec![element]).first().copied()
    }
}

/// Copies with fresh ids, moved by `offset`, with asset references remapped through
/// `asset_ids`. Groups with at least two copied members get a fresh shared id.
fn copy_elements(mut elements: Vec<Element>, offset: Vec2, asset_ids: &HashMap<AssetId, AssetId>) -> Vec<Element> {
    elements.sort_by_key(|e| e.order);
    let mut counts: HashMap<GroupId, usize> = HashMap::new();
    for group in elements.iter().filter_map(|e| e.group) {
        *counts.entry(group).or_default() += 1;
    }
    let groups: HashMap<GroupId, GroupId> = counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(group, _)| (group, Uuid::new_v4()))
        .collect();

    elements
        .into_iter()
        .map(|mut element| {
            element.id = Uuid::new_v4();
            element.clear_transient();
            element.group = element.group.and_then(|g| groups.get(&g).copied());
            element.translate(offset.x, offset.y);
            if let Some(Value::Id(Some(old))) = element.get(Field::Asset) {
                if let Some(new) = asset_ids.get(&old) {
                    element.set(Field::Asset, Value::Id(Some(*new)));
                }
            }
            element
        })
        .collect()
}
