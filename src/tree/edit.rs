//! Structural changes: insert, delete, subscribe, rename

use super::{MailboxTree, convert_name, entry_is_noselect, normalize_entry_name, sort};
use crate::element::{BASE_ELT, EltAttrs, MailboxElement, VFOLDER_KEY};
use crate::flag::MailboxAttr;
use crate::lister::ListEntry;
use crate::namespace::INBOX;
use tracing::{debug, warn};

impl MailboxTree {
    /// Insert listed mailboxes, looking up subscriptions as needed.
    pub fn insert(&mut self, entries: &[ListEntry]) {
        self.insert_with_hint(entries, None);
    }

    /// Insert listed mailboxes.
    ///
    /// `subscribed` says whether all of `entries` are known to be
    /// subscribed (`Some(true)`), known not to be (`Some(false)`), or
    /// must be checked against the server's subscription list (`None`).
    /// Missing ancestors are created as containers. Re-inserting a known
    /// mailbox is a no-op, except that a container listed as selectable
    /// becomes a mailbox.
    pub fn insert_with_hint(&mut self, entries: &[ListEntry], subscribed: Option<bool>) {
        let subscribe_mode = self.pref().subscribe();

        let mut ordered: Vec<(String, &ListEntry)> = entries
            .iter()
            .filter(|entry| !entry.has(&MailboxAttr::NonExistent))
            .map(|entry| (normalize_entry_name(entry), entry))
            .collect();
        ordered.sort_by(|(a, _), (b, _)| sort::hierarchy_cmp(a, b));

        for (name, entry) in ordered {
            let leaf_subscribed = !subscribe_mode
                || subscribed == Some(true)
                || name == INBOX
                || entry.has(&MailboxAttr::Subscribed);

            if self.state.elements.contains_key(&name) {
                self.promote(&name, entry, leaf_subscribed);
                continue;
            }

            let parts: Vec<&str> = if entry.delimiter.is_empty() {
                vec![name.as_str()]
            } else {
                name.split(entry.delimiter.as_str()).collect()
            };

            for i in 1..=parts.len() {
                let part = parts[..i].join(entry.delimiter.as_str());
                if self.state.elements.contains_key(&part) {
                    continue;
                }

                let leaf = i == parts.len();
                let mut attrs = EltAttrs::empty();
                if leaf {
                    if leaf_subscribed
                        || (subscribed.is_none() && self.remote_subscribed(&part))
                    {
                        attrs |= EltAttrs::IS_SUBSCRIBED;
                    }
                    if entry_is_noselect(entry) {
                        attrs |= EltAttrs::NOSELECT;
                    }
                } else {
                    attrs |= EltAttrs::NOSELECT;
                    if !subscribe_mode {
                        attrs |= EltAttrs::IS_SUBSCRIBED;
                    }
                }

                let elt = self.make_elt(&part, attrs);
                self.insert_elt(elt);
            }
        }
    }

    /// Turn a container into a mailbox once the server lists it as
    /// selectable.
    fn promote(&mut self, name: &str, entry: &ListEntry, subscribed: bool) {
        let Some(elt) = self.state.elements.get_mut(name) else {
            return;
        };
        if !elt.has(EltAttrs::NOSELECT)
            || elt.is_namespace()
            || elt.is_nonimap()
            || entry_is_noselect(entry)
        {
            return;
        }

        elt.set(EltAttrs::NOSELECT, false);
        if subscribed {
            elt.set(EltAttrs::IS_SUBSCRIBED, true);
        }
        self.diff.record_change(name);
        self.changed = true;
    }

    /// Insert mailboxes by name.
    ///
    /// Virtual folder values are added from the search registry; all
    /// other names are listed on the server. Listing failures leave the
    /// tree unchanged.
    pub fn insert_mailboxes<S: AsRef<str>>(&mut self, names: &[S]) {
        let mut remote = Vec::new();

        for name in names {
            let name = name.as_ref();
            if let Some(id) = self.vfolder_id(name).map(str::to_string) {
                let label = self
                    .searches
                    .get(&id)
                    .map_or_else(|| id.clone(), |search| search.label);
                self.insert_vfolder(&id, &label);
            } else {
                remote.push(convert_name(name));
            }
        }

        if remote.is_empty() {
            return;
        }
        remote.sort_by(|a, b| sort::hierarchy_cmp(a, b));

        // The subscription list may predate these mailboxes.
        self.subscribed_list = None;
        match self.lister.list(&remote, true) {
            Ok(entries) => self.insert_with_hint(&entries, None),
            Err(e) => warn!("Listing {} mailbox(es) failed: {}", remote.len(), e),
        }
    }

    /// Remove `value` from the tree.
    ///
    /// An element with children becomes a container instead. Containers
    /// left empty are removed as well, walking up until a mailbox, a
    /// namespace root, INBOX or the root is reached. Returns false for
    /// INBOX, namespace roots, synthetic headers and unknown values.
    pub fn delete(&mut self, value: &str) -> bool {
        let value = convert_name(value);

        if let Some(target) = self.vfolder_target(&value) {
            return self.delete_vfolder(&target);
        }

        let Some(elt) = self.state.elements.get(&value) else {
            return false;
        };
        let namespace_name = self
            .namespace_of(&value)
            .is_some_and(|ns| ns.name == value);
        if value == INBOX
            || elt.is_root()
            || elt.is_nonimap()
            || elt.is_namespace()
            || namespace_name
        {
            return false;
        }

        self.changed = true;

        if !self.children(&value).is_empty() {
            self.forget_listing(&value);
            self.set_container(&value, true);
            self.diff.record_change(&value);
            return true;
        }

        let mut current = value;
        loop {
            let parent = self
                .state
                .elements
                .get(&current)
                .map_or_else(|| BASE_ELT.to_string(), |elt| elt.parent.clone());

            self.forget_listing(&current);
            let emptied = self.unlink(&current);
            self.modify_expanded(&current, false);
            if self.poll_set().contains(&current) {
                self.remove_poll_list(&[current.as_str()]);
            }
            debug!("Removed {} from tree", current);

            if !emptied {
                break;
            }
            let Some(parent_elt) = self.state.elements.get(&parent) else {
                break;
            };

            let removable = parent_elt.has(EltAttrs::NOSELECT)
                && !parent_elt.is_namespace()
                && !parent_elt.is_nonimap()
                && !parent_elt.is_root()
                && parent != INBOX;
            if removable {
                current = parent;
                continue;
            }

            if let Some(parent_elt) = self.state.elements.get_mut(&parent) {
                parent_elt.set(EltAttrs::IS_OPEN, false);
            }
            self.modify_expanded(&parent, false);
            self.diff.record_change(&parent);
            break;
        }

        true
    }

    /// The tree value of a virtual folder addressed by `value`, either
    /// directly or by its search id.
    fn vfolder_target(&self, value: &str) -> Option<String> {
        if value == VFOLDER_KEY
            || self
                .state
                .elements
                .get(value)
                .is_some_and(MailboxElement::is_vfolder)
        {
            return Some(value.to_string());
        }

        let by_id = self.vfolder_value(value);
        (self.searches.is_virtual_folder(value) && self.state.elements.contains_key(&by_id))
            .then_some(by_id)
    }

    fn delete_vfolder(&mut self, value: &str) -> bool {
        if !self.state.elements.contains_key(value) {
            return false;
        }

        if value == VFOLDER_KEY {
            for child in self.children(VFOLDER_KEY).to_vec() {
                self.unlink(&child);
            }
            self.unlink(VFOLDER_KEY);
        } else if self.unlink(value) {
            self.unlink(VFOLDER_KEY);
        }

        self.changed = true;
        true
    }

    /// Mark `values` subscribed. Containers become mailboxes.
    pub fn subscribe<S: AsRef<str>>(&mut self, values: &[S]) {
        for value in values {
            let value = convert_name(value.as_ref());
            let Some(elt) = self.state.elements.get_mut(&value) else {
                continue;
            };

            elt.set(EltAttrs::IS_SUBSCRIBED, true);
            elt.set(EltAttrs::NOSELECT, false);
            let entry = ListEntry::new(value.clone(), self.delimiter_for(&value))
                .with_attr(MailboxAttr::Subscribed);
            if let Some(list) = self.subscribed_list.as_mut() {
                list.insert(value.clone(), entry);
            }
            self.diff.record_change(&value);
            self.changed = true;
        }
    }

    /// Mark `values` unsubscribed. INBOX is skipped.
    ///
    /// In the subscribed-only view a mailbox that still leads to
    /// subscribed mailboxes becomes a container.
    pub fn unsubscribe<S: AsRef<str>>(&mut self, values: &[S]) {
        let mut values: Vec<String> = values.iter().map(|v| convert_name(v.as_ref())).collect();
        values.sort_by(|a, b| sort::hierarchy_cmp(b, a));

        for value in values {
            if value == INBOX || !self.state.elements.contains_key(&value) {
                continue;
            }

            self.changed = true;
            self.state.unsub_view = true;

            if !self.state.show_unsub && self.has_children(&value) {
                self.set_container(&value, true);
            }
            if let Some(elt) = self.state.elements.get_mut(&value) {
                elt.set(EltAttrs::IS_SUBSCRIBED, false);
            }
            if let Some(list) = self.subscribed_list.as_mut() {
                list.shift_remove(&value);
            }
            self.diff.record_change(&value);
        }
    }

    /// Replace `old` and everything below it with the server's listing
    /// of `new`, carrying over which mailboxes were polled.
    ///
    /// Returns false if `old` is unknown, INBOX or not an IMAP mailbox.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let old = convert_name(old);
        let Some(elt) = self.state.elements.get(&old) else {
            return false;
        };
        if old == INBOX || elt.is_nonimap() || elt.is_vfolder() {
            return false;
        }

        let subtree = self.subtree(&old);
        let polled: Vec<String> = subtree
            .iter()
            .filter(|value| {
                self.state
                    .elements
                    .get(value.as_str())
                    .is_some_and(|elt| elt.has(EltAttrs::IS_POLLED))
            })
            .filter_map(|value| value.strip_prefix(old.as_str()))
            .map(|suffix| format!("{new}{suffix}"))
            .collect();

        for value in subtree.iter().rev() {
            self.delete(value);
        }

        self.subscribed_list = None;
        self.full_list = None;

        let delimiter = self.delimiter_for(new);
        let patterns = [new.to_string(), format!("{new}{delimiter}*")];
        match self.lister.list(&patterns, true) {
            Ok(entries) => self.insert_with_hint(&entries, None),
            Err(e) => warn!("Listing renamed mailbox {} failed: {}", new, e),
        }

        if !polled.is_empty() {
            self.add_poll_list(&polled);
        }
        true
    }

    /// `value` and all its descendants, parents before children.
    fn subtree(&self, value: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut pending = vec![value.to_string()];
        while let Some(current) = pending.pop() {
            pending.extend(self.children(&current).iter().rev().cloned());
            out.push(current);
        }
        out
    }
}
