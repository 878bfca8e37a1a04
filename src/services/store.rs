use std::collections::BTreeSet;

use crate::domain::record::Record;
use crate::domain::types::RecordId;

/// Records of the page currently on screen.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole page.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    /// Swaps in a record with the same id. Returns `false` when the record
    /// is not on the current page.
    pub fn replace_record(&mut self, record: Record) -> bool {
        match self.get_mut(record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Selected record ids. Independent of which page is loaded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Selects every visible id, or deselects exactly those when all of them
    /// are already selected. Ids from other pages are left alone.
    pub fn select_all_visible(&mut self, visible: &[RecordId]) {
        if visible.is_empty() {
            return;
        }
        if visible.iter().all(|id| self.ids.contains(id)) {
            for id in visible {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(visible.iter().copied());
        }
    }

    pub fn remove(&mut self, id: RecordId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
