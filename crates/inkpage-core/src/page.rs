//! A page: an ordered element list with its own history and viewport.

use crate::camera::Viewport;
use crate::elements::{Element, ElementId, Field, FieldSet, GroupId, Value, diff_fields};
use crate::geometry::union_rects;
use crate::history::{ElementChange, History, HistoryEntry, Signature};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Unique identifier for pages.
pub type PageId = Uuid;

/// A page of the document.
///
/// The element list is kept in z-order (back to front) and every element's `order`
/// equals its index after each mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    elements: Vec<Element>,
    /// Readonly pages refuse every element mutation.
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub viewport: Viewport,
    /// The group currently entered for intra-group selection.
    #[serde(skip)]
    pub active_group: Option<GroupId>,
    #[serde(skip)]
    history: History,
}

impl Default for Page {
    fn default() -> Self {
        Self::new("Page 1")
    }
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            elements: Vec::new(),
            readonly: false,
            viewport: Viewport::default(),
            active_group: None,
            history: History::new(),
        }
    }

    /// Elements in z-order (back to front).
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Direct access for gestures. Changes made through it are not recorded until
    /// [`Page::record_changes`] runs.
    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Close the current undo step. Called at the end of every gesture.
    pub fn seal_history(&mut self) {
        self.history.seal();
    }

    fn writable(&self) -> bool {
        if self.readonly {
            log::warn!("page {} is readonly, mutation refused", self.id);
        }
        !self.readonly
    }

    fn restamp(&mut self) {
        for (i, element) in self.elements.iter_mut().enumerate() {
            element.order = i;
        }
    }

    /// Sort by `order` (stable) and make `order` equal to the index again.
    fn resort(&mut self) {
        self.elements.sort_by_key(|e| e.order);
        self.restamp();
    }

    /// Insert elements at their recorded order, lowest first.
    fn insert_at_order(&mut self, mut elements: Vec<Element>) {
        elements.sort_by_key(|e| e.order);
        for mut element in elements {
            element.clear_transient();
            let index = element.order.min(self.elements.len());
            self.elements.insert(index, element);
        }
        self.restamp();
    }

    fn remove_ids(&mut self, ids: &HashSet<ElementId>) -> Vec<Element> {
        let (removed, kept): (Vec<Element>, Vec<Element>) = std::mem::take(&mut self.elements)
            .into_iter()
            .partition(|e| ids.contains(&e.id));
        self.elements = kept;
        self.restamp();
        removed
    }

    /// Append elements on top. Records one CREATE entry.
    pub fn add_elements(&mut self, elements: Vec<Element>) -> Vec<ElementId> {
        if !self.writable() || elements.is_empty() {
            return Vec::new();
        }
        let ids: Vec<_> = elements.iter().map(|e| e.id).collect();
        for mut element in elements {
            element.order = self.elements.len();
            self.elements.push(element);
        }
        self.restamp();
        self.record_created(&ids);
        ids
    }

    /// Insert an element without recording it. Used while a create gesture is running.
    pub(crate) fn insert_pending(&mut self, mut element: Element) {
        element.order = self.elements.len();
        self.elements.push(element);
    }

    /// Drop a pending element created with [`Page::insert_pending`].
    pub(crate) fn discard_pending(&mut self, id: ElementId) {
        self.remove_ids(&HashSet::from([id]));
    }

    /// Record a CREATE entry for elements already on the page.
    pub(crate) fn record_created(&mut self, ids: &[ElementId]) {
        let elements: Vec<_> = self
            .elements
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .map(|mut e| {
                e.clear_transient();
                e
            })
            .collect();
        if !elements.is_empty() {
            self.history.push(HistoryEntry::Create { elements }, false);
        }
    }

    /// Remove elements. Records a REMOVE entry, then a separate UPDATE entry for any
    /// group left with a single member (that member leaves the group).
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<Element> {
        if !self.writable() {
            return Vec::new();
        }
        let ids: HashSet<_> = ids.iter().copied().collect();
        let mut removed = self.remove_ids(&ids);
        if removed.is_empty() {
            return removed;
        }
        for element in removed.iter_mut() {
            element.clear_transient();
        }
        log::debug!("page {}: removed {} elements", self.id, removed.len());
        self.history.push(HistoryEntry::Remove { elements: removed.clone() }, false);

        let groups: HashSet<GroupId> = removed.iter().filter_map(|e| e.group).collect();
        let mut orphans = Vec::new();
        for group in groups {
            let members: Vec<_> = self.elements.iter().filter(|e| e.group == Some(group)).collect();
            if members.len() == 1 {
                orphans.push((members[0].id, FieldSet::from([(Field::Group, Value::Id(None))])));
            }
            if members.is_empty() && self.active_group == Some(group) {
                self.active_group = None;
            }
        }
        if !orphans.is_empty() {
            self.update_each(orphans, false);
        }
        removed
    }

    /// Remove every element in one REMOVE entry.
    pub fn clear(&mut self) -> Vec<Element> {
        let ids: Vec<_> = self.elements.iter().map(|e| e.id).collect();
        self.active_group = None;
        self.remove_elements(&ids)
    }

    /// Write per-element values, skipping any the element's type vetoes, and record one
    /// UPDATE entry. Returns the values accepted by at least one element.
    pub fn update_each(&mut self, updates: Vec<(ElementId, FieldSet)>, coalesce: bool) -> FieldSet {
        let mut accepted = FieldSet::new();
        if !self.writable() {
            return accepted;
        }
        let signature = Signature::new(
            updates.iter().map(|(id, _)| *id),
            updates.iter().flat_map(|(_, values)| values.keys().copied()),
        );
        let mut changes = Vec::new();
        for (id, values) in updates {
            let Some(element) = self.element_mut(id) else {
                log::warn!("update of unknown element {id}");
                continue;
            };
            let before = element.capture_all();
            let mut written = Vec::new();
            for (field, value) in values {
                if !element.ty().is_value_allowed(element, field, &value) {
                    log::warn!("{field:?} = {value:?} not allowed on element {id}");
                    continue;
                }
                if element.set(field, value.clone()) {
                    written.push(field);
                    accepted.insert(field, value);
                }
            }
            element.ty().on_update(element, &written);
            let (prev, next) = diff_fields(&before, &element.capture_all());
            let change = ElementChange { id, prev, next };
            if !change.is_empty() {
                changes.push(change);
            }
        }
        if !changes.is_empty() {
            self.history.push(HistoryEntry::update(changes, Some(signature)), coalesce);
        }
        accepted
    }

    /// Write the same values to several elements.
    pub fn update_elements(&mut self, ids: &[ElementId], values: &FieldSet, coalesce: bool) -> FieldSet {
        self.update_each(ids.iter().map(|id| (*id, values.clone())).collect(), coalesce)
    }

    /// Record everything that changed since `snapshots` were taken as one UPDATE entry
    /// and seal it.
    pub(crate) fn record_changes(&mut self, snapshots: &[Element]) {
        let changes: Vec<_> = snapshots
            .iter()
            .filter_map(|snapshot| {
                let current = self.element(snapshot.id)?;
                let (prev, next) = diff_fields(&snapshot.capture_all(), &current.capture_all());
                let change = ElementChange { id: snapshot.id, prev, next };
                (!change.is_empty()).then_some(change)
            })
            .collect();
        if !changes.is_empty() {
            self.history.push(HistoryEntry::update(changes, None), false);
        }
        self.history.seal();
    }

    /// Put the elements in one new group. Needs at least two elements.
    pub fn group_elements(&mut self, ids: &[ElementId]) -> Option<GroupId> {
        let ids: Vec<_> = ids.iter().copied().filter(|id| self.element(*id).is_some()).collect();
        if ids.len() < 2 || self.readonly {
            return None;
        }
        let group = Uuid::new_v4();
        let values = FieldSet::from([(Field::Group, Value::Id(Some(group)))]);
        self.update_elements(&ids, &values, false);
        Some(group)
    }

    /// Dissolve every group touched by `ids`.
    pub fn ungroup_elements(&mut self, ids: &[ElementId]) {
        let groups: HashSet<_> = ids.iter().filter_map(|id| self.element(*id)?.group).collect();
        let members: Vec<_> = self
            .elements
            .iter()
            .filter(|e| e.group.is_some_and(|g| groups.contains(&g)))
            .map(|e| e.id)
            .collect();
        if members.is_empty() {
            return;
        }
        if self.active_group.is_some_and(|g| groups.contains(&g)) {
            self.active_group = None;
        }
        self.update_elements(&members, &FieldSet::from([(Field::Group, Value::Id(None))]), false);
    }

    /// Ids of every member of `group`.
    pub fn group_members(&self, group: GroupId) -> Vec<ElementId> {
        self.elements.iter().filter(|e| e.group == Some(group)).map(|e| e.id).collect()
    }

    /// Expand ids to whole groups, except for the entered group.
    pub fn expand_groups(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let groups: HashSet<_> = ids
            .iter()
            .filter_map(|id| self.element(*id)?.group)
            .filter(|g| self.active_group != Some(*g))
            .collect();
        self.elements
            .iter()
            .filter(|e| wanted.contains(&e.id) || e.group.is_some_and(|g| groups.contains(&g)))
            .map(|e| e.id)
            .collect()
    }

    /// Rearrange elements to `arrangement` (a permutation of indices) and record the
    /// new orders.
    fn apply_arrangement(&mut self, arrangement: Vec<usize>) {
        if arrangement.iter().enumerate().all(|(i, &j)| i == j) {
            return;
        }
        let mut slots: Vec<Option<Element>> = std::mem::take(&mut self.elements).into_iter().map(Some).collect();
        self.elements = arrangement.into_iter().filter_map(|i| slots.get_mut(i)?.take()).collect();

        let mut changes = Vec::new();
        for (i, element) in self.elements.iter_mut().enumerate() {
            if element.order != i {
                changes.push(ElementChange {
                    id: element.id,
                    prev: FieldSet::from([(Field::Order, Value::Index(element.order))]),
                    next: FieldSet::from([(Field::Order, Value::Index(i))]),
                });
                element.order = i;
            }
        }
        self.history.push(HistoryEntry::update(changes, None), false);
    }

    fn moving_set(&self, ids: &[ElementId]) -> Vec<bool> {
        let ids: HashSet<_> = ids.iter().copied().collect();
        self.elements.iter().map(|e| ids.contains(&e.id)).collect()
    }

    /// Swap each element with the element above it; a foreign group above is skipped as
    /// one block.
    pub fn bring_forward(&mut self, ids: &[ElementId]) {
        if !self.writable() {
            return;
        }
        let moving = self.moving_set(ids);
        let n = self.elements.len();
        let mut arrangement: Vec<usize> = (0..n).collect();
        for i in (0..n.saturating_sub(1)).rev() {
            let current = arrangement[i];
            let above = arrangement[i + 1];
            if !moving[current] || moving[above] {
                continue;
            }
            let group = self.elements[above].group;
            let mut end = i + 1;
            if group.is_some() && group != self.elements[current].group {
                while end + 1 < n
                    && !moving[arrangement[end + 1]]
                    && self.elements[arrangement[end + 1]].group == group
                {
                    end += 1;
                }
            }
            arrangement[i..=end].rotate_left(1);
        }
        self.apply_arrangement(arrangement);
    }

    /// Swap each element with the element below it; a foreign group below is skipped as
    /// one block.
    pub fn send_backward(&mut self, ids: &[ElementId]) {
        if !self.writable() {
            return;
        }
        let moving = self.moving_set(ids);
        let n = self.elements.len();
        let mut arrangement: Vec<usize> = (0..n).collect();
        for i in 1..n {
            let current = arrangement[i];
            let below = arrangement[i - 1];
            if !moving[current] || moving[below] {
                continue;
            }
            let group = self.elements[below].group;
            let mut start = i - 1;
            if group.is_some() && group != self.elements[current].group {
                while start > 0
                    && !moving[arrangement[start - 1]]
                    && self.elements[arrangement[start - 1]].group == group
                {
                    start -= 1;
                }
            }
            arrangement[start..=i].rotate_right(1);
        }
        self.apply_arrangement(arrangement);
    }

    pub fn bring_to_front(&mut self, ids: &[ElementId]) {
        if !self.writable() {
            return;
        }
        let moving = self.moving_set(ids);
        let (top, rest): (Vec<usize>, Vec<usize>) = (0..self.elements.len()).partition(|&i| moving[i]);
        self.apply_arrangement(rest.into_iter().chain(top).collect());
    }

    pub fn send_to_back(&mut self, ids: &[ElementId]) {
        if !self.writable() {
            return;
        }
        let moving = self.moving_set(ids);
        let (bottom, rest): (Vec<usize>, Vec<usize>) = (0..self.elements.len()).partition(|&i| moving[i]);
        self.apply_arrangement(bottom.into_iter().chain(rest).collect());
    }

    /// Revert the newest applied entry. A no-op at the start of history.
    pub fn undo(&mut self) -> bool {
        if !self.writable() {
            return false;
        }
        let Some(entry) = self.history.next_undo() else {
            log::debug!("page {}: nothing to undo", self.id);
            return false;
        };
        log::debug!("page {}: undo {}", self.id, entry.kind_name());
        match entry {
            HistoryEntry::Create { elements } => {
                let ids = elements.iter().map(|e| e.id).collect();
                self.remove_ids(&ids);
            }
            HistoryEntry::Remove { elements } => self.insert_at_order(elements),
            HistoryEntry::Update { changes, .. } => {
                self.replay(changes.into_iter().map(|c| (c.id, c.prev)));
            }
        }
        self.after_replay();
        true
    }

    /// Replay the newest undone entry. A no-op at the tip of history.
    pub fn redo(&mut self) -> bool {
        if !self.writable() {
            return false;
        }
        let Some(entry) = self.history.next_redo() else {
            log::debug!("page {}: nothing to redo", self.id);
            return false;
        };
        log::debug!("page {}: redo {}", self.id, entry.kind_name());
        match entry {
            HistoryEntry::Create { elements } => self.insert_at_order(elements),
            HistoryEntry::Remove { elements } => {
                let ids = elements.iter().map(|e| e.id).collect();
                self.remove_ids(&ids);
            }
            HistoryEntry::Update { changes, .. } => {
                self.replay(changes.into_iter().map(|c| (c.id, c.next)));
            }
        }
        self.after_replay();
        true
    }

    fn replay(&mut self, sets: impl Iterator<Item = (ElementId, FieldSet)>) {
        for (id, set) in sets {
            if let Some(element) = self.element_mut(id) {
                element.apply(&set);
                let fields: Vec<_> = set.keys().copied().collect();
                element.ty().on_update(element, &fields);
            }
        }
    }

    fn after_replay(&mut self) {
        self.resort();
        for element in self.elements.iter_mut() {
            element.clear_transient();
        }
    }

    /// Elements under a page point, front to back.
    pub fn elements_at_point(&self, point: Point, tolerance: f64) -> Vec<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|e| e.hit_test(point, tolerance))
            .map(|e| e.id)
            .collect()
    }

    /// Elements touching a page rectangle, back to front.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| e.intersects_rect(rect))
            .map(|e| e.id)
            .collect()
    }

    /// Combined bounding box of the given elements.
    pub fn bounds_of(&self, ids: &[ElementId]) -> Option<Rect> {
        union_rects(
            self.elements
                .iter()
                .filter(|e| ids.contains(&e.id))
                .map(|e| e.bounding_rect()),
        )
    }

    /// Combined bounding box of every element.
    pub fn bounds(&self) -> Option<Rect> {
        union_rects(self.elements.iter().map(|e| e.bounding_rect()))
    }

    /// Ids of selected elements in z-order.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.elements.iter().filter(|e| e.selected).map(|e| e.id).collect()
    }

    /// Copy of this page with fresh page, element and group ids and an empty history.
    pub fn duplicate(&self) -> Page {
        let mut groups: HashMap<GroupId, GroupId> = HashMap::new();
        let elements = self
            .elements
            .iter()
            .map(|e| {
                let mut copy = e.clone();
                copy.id = Uuid::new_v4();
                copy.group = e.group.map(|g| *groups.entry(g).or_insert_with(Uuid::new_v4));
                copy.clear_transient();
                copy
            })
            .collect();
        Page {
            id: Uuid::new_v4(),
            title: format!("{} (copy)", self.title),
            description: self.description.clone(),
            elements,
            readonly: false,
            viewport: self.viewport,
            active_group: None,
            history: History::new(),
        }
    }

    /// Prepare a deserialized page: clear runtime flags and repair the order stamps.
    pub(crate) fn finish_load(&mut self) {
        for element in self.elements.iter_mut() {
            element.clear_transient();
        }
        self.resort();
    }
}
