//! Flat listings built by walking the tree

use super::MailboxTree;
use super::cursor::{Frame, NextMask, TreeCursor};
use crate::descriptor::ElementInfo;
use crate::element::MailboxElement;
use bitflags::bitflags;
use indexmap::IndexMap;
use std::collections::HashMap;

bitflags! {
    /// Options for [`MailboxTree::folder_list`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FolderListMask: u8 {
        /// Include containers.
        const CONTAINER   = 1;
        /// Include unsubscribed mailboxes.
        const UNSUB       = 1 << 1;
        /// Include virtual folders.
        const VFOLDER     = 1 << 2;
        /// Top level of the listing only.
        const NO_CHILDREN = 1 << 3;
        /// With `SAMELEVEL`, also list the levels above the base.
        const ANCESTORS   = 1 << 4;
        /// List the base's siblings instead of its descendants.
        const SAMELEVEL   = 1 << 5;
    }
}

/// One displayed row of [`MailboxTree::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRow {
    pub info: ElementInfo,
    /// Name shown to the user.
    pub display: String,
    /// Whether more rows follow at the same level.
    pub peek: bool,
}

/// Where a listing below a base element stops.
struct Bound {
    level: usize,
    frame: Frame,
}

impl MailboxTree {
    /// Mailboxes in display order, filtered by `mask`.
    ///
    /// With a `base`, only the mailboxes below it are listed (or its
    /// siblings, with `SAMELEVEL`). The view is switched to match `UNSUB`
    /// for the walk and switched back afterwards.
    pub fn folder_list(
        &mut self,
        mask: FolderListMask,
        base: Option<&str>,
    ) -> Vec<MailboxElement> {
        let mut sections = Vec::new();
        let mut base = base.map(str::to_string);

        loop {
            let (entries, ancestor) = self.folder_list_level(mask, base.as_deref());
            sections.push(entries);
            match ancestor.filter(|_| mask.contains(FolderListMask::ANCESTORS)) {
                Some(parent) => base = Some(parent),
                None => break,
            }
        }

        let mut merged: IndexMap<String, MailboxElement> = IndexMap::new();
        for elt in sections.into_iter().rev().flatten() {
            merged.entry(elt.value.clone()).or_insert(elt);
        }
        merged.into_values().collect()
    }

    /// One level of [`MailboxTree::folder_list`]. Also returns the parent
    /// of a `SAMELEVEL` base, for walking up to the ancestors.
    fn folder_list_level(
        &mut self,
        mask: FolderListMask,
        base: Option<&str>,
    ) -> (Vec<MailboxElement>, Option<String>) {
        let previous = self.state.show_unsub;
        let unsub = mask.contains(FolderListMask::UNSUB);
        self.switch_view(unsub);

        let mut cursor = TreeCursor::new();
        let mut bound = None;
        let mut ancestor = None;
        let mut mailbox = cursor.first(self, NextMask::empty());

        if let Some(base) = base {
            while mailbox
                .as_ref()
                .is_some_and(|elt| !elt.value.eq_ignore_ascii_case(base))
            {
                mailbox = cursor.next(self, NextMask::SHOW_CLOSED);
            }

            if let Some(found) = mailbox.take() {
                if mask.contains(FolderListMask::SAMELEVEL) {
                    if let Some(frame) = cursor.stack.last().cloned() {
                        bound = Some(Bound {
                            level: cursor.stack.len() - 1,
                            frame,
                        });
                        ancestor = Some(found.parent.clone());
                        cursor.index = 0;
                        mailbox = cursor
                            .current(self)
                            .cloned()
                            .filter(|elt| self.is_active_in(elt, unsub));
                        if mailbox.is_none() {
                            mailbox = cursor.next(self, NextMask::SHOW_CLOSED);
                        }
                    } else {
                        mailbox = cursor.first(self, NextMask::empty());
                    }
                } else {
                    bound = Some(Bound {
                        level: cursor.stack.len(),
                        frame: Frame {
                            index: cursor.index,
                            parent: cursor.parent.clone(),
                        },
                    });
                    mailbox = cursor.next(self, NextMask::SHOW_CLOSED);
                }
            }
        }

        let mut next_mask = NextMask::SHOW_CLOSED;
        if mask.contains(FolderListMask::NO_CHILDREN) {
            next_mask |= NextMask::NO_CHILDREN;
        }

        let mut out = Vec::new();
        while let Some(elt) = mailbox {
            if let Some(bound) = &bound {
                if cursor.stack.get(bound.level) != Some(&bound.frame) {
                    break;
                }
            }

            let shown = (mask.contains(FolderListMask::CONTAINER)
                || !self.is_container_in(&elt, unsub))
                && (mask.contains(FolderListMask::VFOLDER) || !elt.is_vfolder());
            if shown {
                out.push(elt);
            }
            mailbox = cursor.next(self, next_mask);
        }

        self.switch_view(previous);

        (out, ancestor)
    }

    /// Rows for rendering a folder tree, plus the recent-message counts
    /// of polled mailboxes.
    ///
    /// With `open`, containers get distinct open and closed icons.
    pub fn build(&mut self, mask: NextMask, open: bool) -> (Vec<FolderRow>, HashMap<String, u32>) {
        let mut rows = Vec::new();
        let mut new_messages = HashMap::new();

        let mut cursor = TreeCursor::new();
        let mut mailbox = cursor.first(self, mask);
        while let Some(elt) = mailbox {
            let info = self.element_info(&elt, open);
            let display = if elt.is_nonimap() {
                elt.label.clone()
            } else {
                self.state.namespaces.display_name(&elt.value)
            };
            if let Some(recent) = info.status.map(|s| s.recent).filter(|r| *r > 0) {
                new_messages.insert(elt.value.clone(), recent);
            }
            rows.push(FolderRow {
                info,
                display,
                peek: cursor.peek(self),
            });
            mailbox = cursor.next(self, mask);
        }

        (rows, new_messages)
    }
}
