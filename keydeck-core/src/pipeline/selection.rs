//! Selected record ids.

use std::collections::BTreeSet;

use crate::models::CredentialRecord;

/// Set of selected record ids.
///
/// The set is not kept in sync with the filtered view: ids selected before a
/// filter change stay selected even when they are no longer visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles one id. Returns true if it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Toggles against the filtered view.
    ///
    /// When the selection size equals the filtered size the selection is
    /// cleared; otherwise it is replaced by exactly the filtered ids, dropping
    /// any selected id outside the view.
    pub fn toggle_all(&mut self, filtered: &[CredentialRecord]) {
        if self.ids.len() == filtered.len() {
            self.ids.clear();
        } else {
            self.ids = filtered.iter().map(|r| r.id.clone()).collect();
        }
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Returns true if `id` is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
