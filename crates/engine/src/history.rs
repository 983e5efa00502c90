//! Undo/redo history of table snapshots.
//!
//! Each entry is the full `(headers, rows)` state taken just before a
//! mutation. Undo hands back that state and parks the current one on the
//! redo stack.

use crate::row::{Headers, Row};

pub const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// What the user did, e.g. "Delete rows".
    pub label: String,
    pub headers: Headers,
    pub rows: Vec<Row>,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, headers: Headers, rows: Vec<Row>) -> Self {
        Self { label: label.into(), headers, rows }
    }
}

#[derive(Clone, Debug)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        // Limit history size
        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last snapshot for undo. `current` becomes the redo target.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(Snapshot { label: entry.label.clone(), ..current });
        Some(entry)
    }

    /// Pop from the redo stack. `current` goes back onto the undo stack.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(Snapshot { label: entry.label.clone(), ..current });
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the entry the next undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|s| s.label.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(label: &str, patient: &str) -> Snapshot {
        let headers = Headers::blank(1, 1, 1);
        let mut row = Row::empty(&headers);
        row.is_patient = patient.to_string();
        Snapshot::new(label, headers, vec![row])
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        history.record(snap("Edit", "0"));
        assert_eq!(history.undo_label(), Some("Edit"));

        let restored = history.undo(snap("", "1")).unwrap();
        assert_eq!(restored.rows[0].is_patient, "0");
        assert!(!history.can_undo());
        assert_eq!(history.redo_label(), Some("Edit"));

        let redone = history.redo(snap("", "0")).unwrap();
        assert_eq!(redone.rows[0].is_patient, "1");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        history.record(snap("a", "0"));
        history.undo(snap("", "1"));
        assert!(history.can_redo());
        history.record(snap("b", "1"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_bounded_depth_drops_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(snap(&format!("e{i}"), ""));
        }
        assert_eq!(history.undo_len(), 3);
        let mut labels = Vec::new();
        while let Some(s) = history.undo(snap("", "")) {
            labels.push(s.label);
        }
        assert_eq!(labels, vec!["e4", "e3", "e2"]);
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new(0);
        assert_eq!(history.max_entries(), 1);
        assert!(history.undo(snap("", "")).is_none());
        assert!(history.redo(snap("", "")).is_none());
    }
}
