//! Snapshot-based undo/redo log, scoped to the active count.
//!
//! Two bounded stacks: `past` holds pre-mutation snapshots (oldest first,
//! capped at [`MAX_ENTRIES`] with oldest evicted), `future` holds states
//! undone and available for redo. Any fresh user action discards `future`:
//! branching history is dropped, not merged. The whole log resets whenever
//! the active count changes; it is per-session state and never persisted.

use crate::model::Count;
use chrono::{DateTime, Utc};

/// Upper bound on retained past snapshots.
pub const MAX_ENTRIES: usize = 50;

/// A deep copy of a count's state at a point in time.
///
/// The copy never aliases live state: mutating the document after capture
/// must not change the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub count_id: String,
    pub state: Count,
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    #[must_use]
    pub fn capture(count_id: &str, state: &Count) -> Self {
        Self {
            count_id: count_id.to_string(),
            state: state.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct History {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pre-mutation snapshot. Clears the redo stack and evicts the
    /// oldest entry once the cap is exceeded.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.past.push(snapshot);
        self.future.clear();
        if self.past.len() > MAX_ENTRIES {
            self.past.remove(0);
        }
    }

    /// Pop the newest past snapshot, stashing `current` for redo.
    /// Returns `None` (and drops `current`) when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Inverse of [`undo`](Self::undo).
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    /// Jump to an arbitrary point in `past`. Everything newer than `index`
    /// moves, order-reversed, onto the front of `future`; the entry at
    /// `index` stays in `past` and a copy of it becomes the live state.
    pub fn restore_at(&mut self, index: usize) -> Option<Snapshot> {
        if index >= self.past.len() {
            return None;
        }
        let mut moved = self.past.split_off(index + 1);
        moved.reverse();
        moved.append(&mut self.future);
        self.future = moved;
        self.past.get(index).cloned()
    }

    /// Drop both stacks. Called when the active count changes.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    #[must_use]
    pub fn past(&self) -> &[Snapshot] {
        &self.past
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}
