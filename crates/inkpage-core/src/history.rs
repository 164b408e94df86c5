//! Linear undo/redo history with signature-based coalescing.
//!
//! Entries are kept newest-first. `index` counts how many entries are currently
//! undone; pushing a new entry discards them.

use crate::config::HISTORY_LIMIT;
use crate::elements::{Element, ElementId, Field, FieldSet};
use std::collections::VecDeque;

/// Field values of one element before and after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementChange {
    pub id: ElementId,
    pub prev: FieldSet,
    pub next: FieldSet,
}

impl ElementChange {
    pub fn is_empty(&self) -> bool {
        self.prev.is_empty() && self.next.is_empty()
    }

    fn merge(&mut self, later: ElementChange) {
        for (field, value) in later.prev {
            self.prev.entry(field).or_insert(value);
        }
        self.next.extend(later.next);
    }
}

/// The (ids, keys) pair two consecutive updates must share to coalesce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    ids: Vec<ElementId>,
    fields: Vec<Field>,
}

impl Signature {
    pub fn new(ids: impl IntoIterator<Item = ElementId>, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut ids: Vec<_> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        let mut fields: Vec<_> = fields.into_iter().collect();
        fields.sort();
        fields.dedup();
        Self { ids, fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// Elements added, in their state right after creation.
    Create { elements: Vec<Element> },
    /// Elements removed, in their state (and order) right before removal.
    Remove { elements: Vec<Element> },
    Update {
        changes: Vec<ElementChange>,
        signature: Option<Signature>,
    },
}

impl HistoryEntry {
    pub fn update(changes: Vec<ElementChange>, signature: Option<Signature>) -> Self {
        HistoryEntry::Update { changes, signature }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HistoryEntry::Create { .. } => "create",
            HistoryEntry::Remove { .. } => "remove",
            HistoryEntry::Update { .. } => "update",
        }
    }

    /// Fold `later` into this entry when both are updates with the same signature.
    fn try_merge(&mut self, later: HistoryEntry) -> Result<(), HistoryEntry> {
        let HistoryEntry::Update { changes, signature: Some(head) } = self else {
            return Err(later);
        };
        match later {
            HistoryEntry::Update { changes: later_changes, signature: Some(sig) } if sig == *head => {
                for change in later_changes {
                    match changes.iter_mut().find(|c| c.id == change.id) {
                        Some(existing) => existing.merge(change),
                        None => changes.push(change),
                    }
                }
                Ok(())
            }
            other => Err(other),
        }
    }
}

/// Per-page history.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    index: usize,
    /// When set, the head never absorbs a following update.
    sealed: bool,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. With `coalesce`, an update whose signature matches the head is
    /// merged into it. Returns `true` when merged.
    pub fn push(&mut self, entry: HistoryEntry, coalesce: bool) -> bool {
        if self.index > 0 {
            self.entries.drain(..self.index);
            self.index = 0;
            self.sealed = true;
        }

        if coalesce && !self.sealed {
            if let Some(head) = self.entries.front_mut() {
                match head.try_merge(entry) {
                    Ok(()) => {
                        log::debug!("history: merged update into head");
                        return true;
                    }
                    Err(entry) => return self.push_front(entry),
                }
            }
        }
        self.push_front(entry)
    }

    fn push_front(&mut self, entry: HistoryEntry) -> bool {
        log::debug!("history: push {}", entry.kind_name());
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_LIMIT);
        self.sealed = false;
        false
    }

    /// Close the head entry so the next update starts a new undo step.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// The entry to revert, advancing the undo position.
    pub fn next_undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.get(self.index)?.clone();
        self.index += 1;
        self.sealed = true;
        Some(entry)
    }

    /// The entry to replay, moving the undo position back.
    pub fn next_redo(&mut self) -> Option<HistoryEntry> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.sealed = true;
        self.entries.get(self.index).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.index < self.entries.len()
    }

    pub fn can_redo(&self) -> bool {
        self.index > 0
    }

    /// Number of undone entries.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest-first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.sealed = false;
    }
}
