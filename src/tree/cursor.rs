//! Depth-first traversal

use super::MailboxTree;
use crate::element::{BASE_ELT, MailboxElement};
use bitflags::bitflags;

bitflags! {
    /// Options for [`TreeCursor::next`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NextMask: u8 {
        /// Descend into closed elements too.
        const SHOW_CLOSED = 1;
        /// Only subscribed mailboxes, whatever the tree's view.
        const SHOW_SUB    = 1 << 1;
        /// Never descend.
        const NO_CHILDREN = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    BeforeStart,
    Positioned,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub index: usize,
    pub parent: String,
}

/// A position in a [`MailboxTree`].
///
/// The cursor does not borrow the tree, so several cursors can walk the
/// same tree independently. Levels are sorted lazily as the cursor
/// enters them, which is why stepping takes the tree mutably.
#[derive(Debug, Clone, Default)]
pub struct TreeCursor {
    pub(crate) parent: String,
    pub(crate) index: usize,
    pub(crate) stack: Vec<Frame>,
    state: CursorState,
    /// View of the last step, consulted by `peek`.
    show_unsub: Option<bool>,
}

impl TreeCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Move to the first top-level element and return it, active or not.
    pub fn reset(&mut self, tree: &mut MailboxTree) -> Option<MailboxElement> {
        self.parent = BASE_ELT.to_string();
        self.index = 0;
        self.stack.clear();
        self.state = CursorState::Positioned;
        self.show_unsub = None;
        tree.sort_level(BASE_ELT);
        self.current(tree).cloned()
    }

    /// Reset and return the first element shown under `mask`.
    pub fn first(&mut self, tree: &mut MailboxTree, mask: NextMask) -> Option<MailboxElement> {
        let elt = self.reset(tree)?;
        let show_unsub = view(tree, mask);
        self.show_unsub = Some(show_unsub);
        if tree.is_active_in(&elt, show_unsub) {
            Some(elt)
        } else {
            self.next(tree, mask)
        }
    }

    #[must_use]
    pub fn current<'t>(&self, tree: &'t MailboxTree) -> Option<&'t MailboxElement> {
        if self.state != CursorState::Positioned {
            return None;
        }
        tree.state
            .children
            .get(&self.parent)
            .and_then(|kids| kids.get(self.index))
            .and_then(|value| tree.state.elements.get(value))
    }

    /// Advance to the next element shown under `mask`.
    ///
    /// Descends into the current element if it is shown and open (or
    /// `SHOW_CLOSED` is set), otherwise moves to the next sibling,
    /// climbing back up as levels run out. Elements that are not shown
    /// are skipped.
    pub fn next(&mut self, tree: &mut MailboxTree, mask: NextMask) -> Option<MailboxElement> {
        if self.state != CursorState::Positioned {
            return None;
        }
        let show_unsub = view(tree, mask);
        self.show_unsub = Some(show_unsub);

        loop {
            let descend = self.current(tree).filter(|elt| {
                !mask.contains(NextMask::NO_CHILDREN)
                    && tree.is_active_in(elt, show_unsub)
                    && (mask.contains(NextMask::SHOW_CLOSED) || tree.is_open_in(elt, show_unsub))
            });

            if let Some(value) = descend.map(|elt| elt.value.clone()) {
                self.stack.push(Frame {
                    index: self.index,
                    parent: std::mem::replace(&mut self.parent, value),
                });
                self.index = 0;
                tree.sort_level(&self.parent);
            } else {
                self.index += 1;
            }

            while self.current(tree).is_none() {
                let Some(frame) = self.stack.pop() else {
                    self.state = CursorState::Exhausted;
                    return None;
                };
                self.index = frame.index + 1;
                self.parent = frame.parent;
            }

            if let Some(elt) = self
                .current(tree)
                .filter(|elt| tree.is_active_in(elt, show_unsub))
            {
                return Some(elt.clone());
            }
        }
    }

    /// Whether a later sibling at the current level is shown, under the
    /// mask of the last `first` or `next` call.
    #[must_use]
    pub fn peek(&self, tree: &MailboxTree) -> bool {
        if self.state != CursorState::Positioned {
            return false;
        }
        let show_unsub = self.show_unsub.unwrap_or(tree.state.show_unsub);
        tree.state
            .children
            .get(&self.parent)
            .into_iter()
            .flat_map(|kids| kids.iter().skip(self.index + 1))
            .filter_map(|value| tree.state.elements.get(value))
            .any(|elt| tree.is_active_in(elt, show_unsub))
    }

    /// Nesting depth of the current position.
    #[must_use]
    pub fn level(&self) -> usize {
        self.stack.len()
    }
}

fn view(tree: &MailboxTree, mask: NextMask) -> bool {
    tree.state.show_unsub && !mask.contains(NextMask::SHOW_SUB)
}

/// Iterator over the shown elements of a tree, depth first.
pub struct Traversal<'a> {
    tree: &'a mut MailboxTree,
    cursor: TreeCursor,
    mask: NextMask,
}

impl Iterator for Traversal<'_> {
    type Item = MailboxElement;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor.state() {
            CursorState::BeforeStart => self.cursor.first(self.tree, self.mask),
            CursorState::Positioned => self.cursor.next(self.tree, self.mask),
            CursorState::Exhausted => None,
        }
    }
}

impl MailboxTree {
    /// Walk the shown elements in display order.
    pub fn traverse(&mut self, mask: NextMask) -> Traversal<'_> {
        Traversal {
            tree: self,
            cursor: TreeCursor::new(),
            mask,
        }
    }
}
