//! Row selection across paginated and re-filtered views.
//!
//! Selections are keyed by record id and live independently of which page or
//! filter is currently displayed. They survive view changes on the same
//! logical dataset and are reconciled only when the caller declares a hard
//! dataset swap; the distinction is an explicit input because it cannot be
//! inferred from the data.

use std::collections::BTreeSet;

use crate::source::{DatasetChange, RecordId};

/// Set of selected record identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<RecordId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`
    pub fn toggle(&mut self, id: RecordId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select-all against the currently visible page: if every id on the page
    /// is already selected, deselect them all; otherwise select them all.
    /// Page-scoped because "all records across all pages" generally cannot be
    /// materialized in remote mode.
    pub fn toggle_all(&mut self, page_ids: &[RecordId]) {
        let all_selected =
            !page_ids.is_empty() && page_ids.iter().all(|id| self.selected.contains(id));
        if all_selected {
            for id in page_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(page_ids.iter().cloned());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> &BTreeSet<RecordId> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Adjust the selection for a collection change. A same-dataset change
    /// (paging, sorting, filtering the same list) preserves the selection
    /// untouched; a hard swap drops every id not present in `known_ids`.
    pub fn reconcile(&mut self, known_ids: &BTreeSet<RecordId>, change: DatasetChange) {
        match change {
            DatasetChange::SameDataset => {}
            DatasetChange::NewDataset => {
                self.selected.retain(|id| known_ids.contains(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<RecordId> {
        raw.iter().map(|n| RecordId::Int(*n)).collect()
    }

    fn id_set(raw: &[i64]) -> BTreeSet<RecordId> {
        raw.iter().map(|n| RecordId::Int(*n)).collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut sel = SelectionTracker::new();
        sel.toggle(RecordId::Int(1));
        assert!(sel.contains(&RecordId::Int(1)));
        sel.toggle(RecordId::Int(1));
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_all_selects_then_deselects_the_page() {
        let mut sel = SelectionTracker::new();
        let page = ids(&[1, 2, 3]);

        sel.toggle_all(&page);
        assert_eq!(sel.len(), 3);

        // All selected: toggling again removes them
        sel.toggle_all(&page);
        assert!(sel.is_empty());
    }

    #[test]
    fn toggle_all_with_partial_selection_selects_the_rest() {
        let mut sel = SelectionTracker::new();
        sel.toggle(RecordId::Int(2));

        sel.toggle_all(&ids(&[1, 2, 3]));
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn toggle_all_keeps_selections_from_other_pages() {
        let mut sel = SelectionTracker::new();
        sel.toggle(RecordId::Int(99)); // selected on another page

        let page = ids(&[1, 2]);
        sel.toggle_all(&page);
        sel.toggle_all(&page);
        assert!(sel.contains(&RecordId::Int(99)));
    }

    #[test]
    fn toggle_all_on_empty_page_is_a_noop() {
        let mut sel = SelectionTracker::new();
        sel.toggle_all(&[]);
        assert!(sel.is_empty());
    }

    #[test]
    fn same_dataset_reconcile_preserves_selection() {
        let mut sel = SelectionTracker::new();
        sel.toggle(RecordId::Int(7));

        // New page of the same list does not contain id 7
        sel.reconcile(&id_set(&[10, 11]), DatasetChange::SameDataset);
        assert!(sel.contains(&RecordId::Int(7)));
    }

    #[test]
    fn new_dataset_reconcile_drops_unknown_ids() {
        let mut sel = SelectionTracker::new();
        sel.toggle(RecordId::Int(7));
        sel.toggle(RecordId::Int(10));

        sel.reconcile(&id_set(&[10, 11]), DatasetChange::NewDataset);
        assert!(!sel.contains(&RecordId::Int(7)));
        assert!(sel.contains(&RecordId::Int(10)));
    }
}
