//! Element change tracking between checkpoints

use indexmap::IndexSet;
use serde::Serialize;

/// Elements added, changed and deleted since tracking started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EltDiff {
    pub added: IndexSet<String>,
    pub changed: IndexSet<String>,
    pub deleted: IndexSet<String>,
}

impl EltDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }
}

/// Accumulates an [`EltDiff`] while tracking is active.
///
/// Changes that cancel out within one batch leave no trace: deleting
/// an element added in the same batch drops it from `added` instead of
/// reporting the delete.
#[derive(Debug, Default)]
pub struct DiffTracker {
    pending: Option<EltDiff>,
    suspended: bool,
}

impl DiffTracker {
    /// Begin a new batch, discarding anything not yet drained.
    pub fn start(&mut self) {
        self.pending = Some(EltDiff::default());
        self.suspended = false;
    }

    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.pending.is_some() && !self.suspended
    }

    /// The batch so far, without draining it.
    #[must_use]
    pub const fn pending(&self) -> Option<&EltDiff> {
        self.pending.as_ref()
    }

    /// Stop recording without ending the batch.
    pub const fn suspend(&mut self) {
        self.suspended = true;
    }

    pub const fn resume(&mut self) {
        self.suspended = false;
    }

    fn sets(&mut self) -> Option<&mut EltDiff> {
        if self.suspended {
            None
        } else {
            self.pending.as_mut()
        }
    }

    pub fn record_add(&mut self, value: &str) {
        if let Some(diff) = self.sets() {
            if diff.deleted.shift_remove(value) {
                diff.changed.insert(value.to_string());
            } else {
                diff.added.insert(value.to_string());
            }
        }
    }

    pub fn record_change(&mut self, value: &str) {
        if let Some(diff) = self.sets() {
            if !diff.added.contains(value) && !diff.deleted.contains(value) {
                diff.changed.insert(value.to_string());
            }
        }
    }

    pub fn record_delete(&mut self, value: &str) {
        if let Some(diff) = self.sets() {
            if diff.added.shift_remove(value) {
                return;
            }
            diff.changed.shift_remove(value);
            diff.deleted.insert(value.to_string());
        }
    }

    /// Take the batch and stop tracking.
    ///
    /// Returns `None` if tracking was never started or nothing changed.
    pub fn drain(&mut self) -> Option<EltDiff> {
        self.suspended = false;
        self.pending.take().filter(|diff| !diff.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_changes_are_dropped() {
        let mut diff = DiffTracker::default();
        diff.record_add("Work");
        assert!(!diff.is_tracking());
        assert_eq!(diff.drain(), None);
    }

    #[test]
    fn drain_is_single_use() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.record_add("Work");
        diff.record_change("INBOX");
        let drained = diff.drain().unwrap();
        assert!(drained.added.contains("Work"));
        assert!(drained.changed.contains("INBOX"));
        assert_eq!(diff.drain(), None);
    }

    #[test]
    fn empty_batch_drains_to_none() {
        let mut diff = DiffTracker::default();
        diff.start();
        assert_eq!(diff.drain(), None);
    }

    #[test]
    fn add_then_delete_is_net_zero() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.record_add("Lists");
        diff.record_change("Lists");
        diff.record_delete("Lists");
        assert!(diff.pending().unwrap().is_empty());
    }

    #[test]
    fn delete_supersedes_change() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.record_change("Work");
        diff.record_delete("Work");
        let drained = diff.drain().unwrap();
        assert!(drained.changed.is_empty());
        assert!(drained.deleted.contains("Work"));
    }

    #[test]
    fn delete_then_add_becomes_change() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.record_delete("Work");
        diff.record_add("Work");
        let drained = diff.drain().unwrap();
        assert!(drained.deleted.is_empty());
        assert!(drained.added.is_empty());
        assert!(drained.changed.contains("Work"));
    }

    #[test]
    fn suspended_tracking_records_nothing() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.suspend();
        diff.record_add("Work");
        diff.resume();
        diff.record_add("Home");
        let drained = diff.drain().unwrap();
        assert!(!drained.added.contains("Work"));
        assert!(drained.added.contains("Home"));
    }

    #[test]
    fn restart_discards_pending() {
        let mut diff = DiffTracker::default();
        diff.start();
        diff.record_add("Work");
        diff.start();
        assert_eq!(diff.drain(), None);
    }
}
