//! Saved searches as a synthetic subtree

use super::{MailboxTree, sort};
use crate::element::{EltAttrs, VFOLDER_KEY};
use crate::search::SavedSearch;

const VFOLDER_LABEL: &str = "Virtual Folders";

impl MailboxTree {
    /// Add `searches` below the virtual folder root.
    ///
    /// Labels of known virtual folders are refreshed. The root is created
    /// on first use; its children are kept sorted by label.
    pub fn insert_vfolders(&mut self, searches: &[SavedSearch]) {
        if searches.is_empty() || !self.state.folders {
            return;
        }

        let mut added = false;
        for search in searches {
            added |= self.insert_vfolder(&search.id, &search.label);

            let value = self.vfolder_value(&search.id);
            if let Some(elt) = self.state.elements.get_mut(&value) {
                elt.label.clone_from(&search.label);
            }
        }

        if added {
            self.sort_vfolders();
        }
    }

    /// Insert one virtual folder. Returns whether it was new.
    pub(crate) fn insert_vfolder(&mut self, id: &str, label: &str) -> bool {
        let value = self.vfolder_value(id);
        if self.state.elements.contains_key(&value) {
            return false;
        }

        if !self.state.elements.contains_key(VFOLDER_KEY) {
            let mut root = self.make_elt(
                VFOLDER_KEY,
                EltAttrs::VFOLDER | EltAttrs::NOSELECT | EltAttrs::NONIMAP,
            );
            root.label = VFOLDER_LABEL.to_string();
            self.insert_elt(root);
        }

        let mut elt = self.make_elt(&value, EltAttrs::VFOLDER | EltAttrs::IS_SUBSCRIBED);
        elt.label = label.to_string();
        elt.parent = VFOLDER_KEY.to_string();
        elt.depth = 1;
        self.insert_elt(elt);
        true
    }

    fn sort_vfolders(&mut self) {
        let needs_sort = self
            .state
            .elements
            .get(VFOLDER_KEY)
            .is_some_and(|root| root.has(EltAttrs::NEED_SORT));
        if !needs_sort {
            return;
        }

        if let Some(kids) = self.state.children.get_mut(VFOLDER_KEY) {
            sort::sort_by_label(kids, &self.state.elements);
        }
        if let Some(root) = self.state.elements.get_mut(VFOLDER_KEY) {
            root.set(EltAttrs::NEED_SORT, false);
        }
        self.changed = true;
    }

    /// Tree value of the virtual folder for search `id`.
    #[must_use]
    pub fn vfolder_value(&self, id: &str) -> String {
        format!("{VFOLDER_KEY}{}{id}", self.state.delimiter)
    }

    /// Search id of a virtual folder value.
    #[must_use]
    pub fn vfolder_id<'a>(&self, value: &'a str) -> Option<&'a str> {
        value
            .strip_prefix(VFOLDER_KEY)
            .and_then(|rest| rest.strip_prefix(self.state.delimiter.as_str()))
            .filter(|id| !id.is_empty())
    }
}
