//! Selection tracker.
//!
//! Selected ids live in a hash set that is independent of the current page and
//! filter: changing either never drops a selection. "Select all" only ever
//! touches the ids of the filtered view it is given.

use std::collections::HashSet;

use crate::domain::EntityId;

/// Set of selected entity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<EntityId>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of one id. Returns `true` if it is now selected.
    pub fn toggle(&mut self, id: &EntityId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Selects every filtered id, or deselects exactly those when all already are.
    ///
    /// Ids selected outside `filtered` are left alone in both directions.
    ///
    /// # Examples
    ///
    /// ```
    /// use aptdesk::app::selection::SelectionSet;
    /// use aptdesk::domain::EntityId;
    ///
    /// let outside = EntityId::from("9");
    /// let filtered = [EntityId::from("1"), EntityId::from("2")];
    ///
    /// let mut selection = SelectionSet::new();
    /// selection.toggle(&outside);
    /// selection.select_all(&filtered);
    /// assert_eq!(selection.len(), 3);
    ///
    /// selection.select_all(&filtered);
    /// assert_eq!(selection.len(), 1);
    /// assert!(selection.contains(&outside));
    /// ```
    pub fn select_all<'a, I>(&mut self, filtered: I)
    where
        I: IntoIterator<Item = &'a EntityId>,
        I::IntoIter: Clone,
    {
        let filtered = filtered.into_iter();
        if self.is_all_selected(filtered.clone()) {
            for id in filtered {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(filtered.cloned());
        }
    }

    /// True when the filtered view is non-empty and every id in it is selected.
    pub fn is_all_selected<'a, I>(&self, filtered: I) -> bool
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        let mut any = false;
        for id in filtered {
            if !self.ids.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops the given ids, keeping everything else (used after bulk success).
    pub fn remove_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        for id in ids {
            self.ids.remove(id);
        }
    }

    /// Drops selected ids that no longer exist in the source collection.
    pub fn retain_known<'a, I>(&mut self, known: I)
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        let known: HashSet<&EntityId> = known.into_iter().collect();
        self.ids.retain(|id| known.contains(id));
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order, for stable request bodies and output.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        let id = EntityId::from("1");
        assert!(selection.toggle(&id));
        assert!(selection.contains(&id));
        assert!(!selection.toggle(&id));
        assert!(selection.is_empty());
    }

    #[test]
    fn empty_view_is_never_all_selected() {
        let mut selection = SelectionSet::new();
        selection.toggle(&EntityId::from("1"));
        assert!(!selection.is_all_selected(&Vec::<EntityId>::new()));
    }

    #[test]
    fn select_all_with_partial_selection_unions() {
        let filtered = ids(&["1", "2", "3"]);
        let mut selection = SelectionSet::new();
        selection.toggle(&filtered[0]);
        selection.select_all(&filtered);
        assert!(selection.is_all_selected(&filtered));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn remove_all_keeps_failed_ids() {
        let mut selection = SelectionSet::new();
        selection.select_all(&ids(&["1", "2", "3"]));
        selection.remove_all(&ids(&["1", "3"]));
        assert_eq!(selection.sorted_ids(), ids(&["2"]));
    }

    #[test]
    fn retain_known_prunes_deleted_records() {
        let mut selection = SelectionSet::new();
        selection.select_all(&ids(&["1", "2"]));
        selection.retain_known(&ids(&["2", "5"]));
        assert_eq!(selection.sorted_ids(), ids(&["2"]));
    }
}
