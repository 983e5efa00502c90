//! Change notifications emitted by the table store.
//!
//! The store queues events as it mutates; the session drains them and hands
//! each one to the validation manager, the filter set and the selection so
//! they can remap or revalidate. Events are also what tests use to assert
//! that a rejected operation really was a no-op.

use linelist_core::CellPos;

use crate::column::ColumnChange;

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// Column metadata changed (insert, delete, layout, wholesale replace).
    ColumnsChanged(ColumnChange),
    /// `count` empty rows were inserted before `index`.
    RowsInserted { index: usize, count: usize },
    /// Rows were removed. Indices are pre-deletion, ascending.
    RowsDeleted { indices: Vec<usize> },
    /// Cells were written with new values (edit, paste, header rename).
    CellsChanged { cells: Vec<CellPos> },
    /// Cells were blanked.
    CellsCleared { cells: Vec<CellPos> },
}

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<TableEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = TableEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[TableEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only ColumnsChanged events.
    pub fn column_changes(&self) -> Vec<&ColumnChange> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TableEvent::ColumnsChanged(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// All cells reported as written, in event order.
    pub fn changed_cells(&self) -> Vec<CellPos> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TableEvent::CellsChanged { cells } => Some(cells.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_collector_filtering() {
        let mut collector = EventCollector::new();
        collector.extend([
            TableEvent::RowsInserted { index: 0, count: 2 },
            TableEvent::CellsChanged { cells: vec![CellPos::new(0, 1), CellPos::new(1, 1)] },
            TableEvent::CellsCleared { cells: vec![CellPos::new(0, 2)] },
            TableEvent::CellsChanged { cells: vec![CellPos::new(-1, 3)] },
        ]);

        assert_eq!(collector.len(), 4);
        assert!(collector.column_changes().is_empty());
        assert_eq!(collector.changed_cells().len(), 3);

        collector.clear();
        assert!(collector.is_empty());
    }
}
