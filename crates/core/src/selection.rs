//! Selection and editing state machine.
//!
//! The grid supports three kinds of selection at once:
//! - a focused cell plus a rectangular range grown from an anchor
//! - a set of individually toggled cells (ctrl+click)
//! - a set of individually toggled rows (ctrl+click on the serial column)
//!
//! The individual sets and the range are never merged. Consumers ask for the
//! [`EffectiveSelection`], which prefers the individual sets and falls back to
//! the range only when both are empty.
//!
//! Editing is a sub-state: at most one cell is being edited at a time, and
//! starting an edit elsewhere commits the live one first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::range::{CellPos, CellRange, SERIAL_COL};

/// Which band a drag started in. Frozen for the lifetime of the drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragContext {
    #[default]
    None,
    /// Drag started on a header label; the range stays in the header band.
    Header,
    /// Drag started in the body; the range never reaches the header band.
    Body,
    /// Drag started on the serial column; whole rows are selected.
    Row,
}

/// Cell storage seen by the editing state machine.
pub trait EditTarget {
    /// Whether the cell at `pos` accepts edits (the serial column never does).
    fn is_editable(&self, pos: CellPos) -> bool;
    /// Current raw value of the cell.
    fn read_cell(&self, pos: CellPos) -> String;
    /// Persist a committed edit.
    fn commit_cell(&mut self, pos: CellPos, value: &str);
}

/// The live edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub cell: CellPos,
    /// Value captured when editing started, restored on cancel.
    pub original_value: String,
    /// Current buffer contents.
    pub value: String,
}

/// What `stop_editing` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    NotEditing,
    /// The buffer differed from the original and was written to the target.
    Committed { cell: CellPos, value: String },
    /// Saved, but the buffer equalled the original value; nothing written.
    Unchanged { cell: CellPos },
    /// Cancelled; the visual cell shows `original` again.
    Reverted { cell: CellPos, original: String },
}

/// The selection that copy, bulk-delete and menu labels act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveSelection<'a> {
    Empty,
    Cells(&'a BTreeSet<CellPos>),
    Rows(&'a BTreeSet<usize>),
    Range(CellRange),
}

/// Counts used for pluralized labels ("Delete 3 rows").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionCounts {
    pub cells: usize,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected_cell: Option<CellPos>,
    anchor: Option<CellPos>,
    range: Option<CellRange>,
    dragging: bool,
    drag_context: DragContext,
    editing: Option<EditState>,
    individual_cells: BTreeSet<CellPos>,
    individual_rows: BTreeSet<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn selected_cell(&self) -> Option<CellPos> {
        self.selected_cell
    }

    pub fn anchor(&self) -> Option<CellPos> {
        self.anchor
    }

    pub fn range(&self) -> Option<CellRange> {
        self.range
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_context(&self) -> DragContext {
        self.drag_context
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&EditState> {
        self.editing.as_ref()
    }

    pub fn individual_cells(&self) -> &BTreeSet<CellPos> {
        &self.individual_cells
    }

    pub fn individual_rows(&self) -> &BTreeSet<usize> {
        &self.individual_rows
    }

    // -------------------------------------------------------------------------
    // Point and range selection
    // -------------------------------------------------------------------------

    /// Select a single cell (click). Collapses the range and resets the anchor.
    pub fn select_cell(&mut self, pos: CellPos) {
        self.selected_cell = Some(pos);
        self.anchor = Some(pos);
        self.range = Some(CellRange::single(pos));
    }

    /// Select a whole body row (serial column click).
    pub fn select_row(&mut self, row: usize, column_count: usize) {
        let range = CellRange::full_row(row, column_count);
        self.selected_cell = Some(range.start);
        self.anchor = Some(range.start);
        self.range = Some(range);
    }

    /// Select every body row of one column (header click).
    pub fn select_column(&mut self, col: usize, row_count: usize) {
        if row_count == 0 {
            self.select_cell(CellPos::header(col));
            return;
        }
        let range = CellRange::new(
            CellPos::new(0, col),
            CellPos::new(row_count as isize - 1, col),
        );
        self.selected_cell = Some(range.start);
        self.anchor = Some(range.start);
        self.range = Some(range);
    }

    /// Begin a drag at `pos`. The drag context is decided here and stays
    /// fixed until `end_drag_selection`.
    pub fn start_drag(&mut self, pos: CellPos) {
        self.select_cell(pos);
        self.dragging = true;
        self.drag_context = if pos.col == SERIAL_COL {
            DragContext::Row
        } else if pos.is_header() {
            DragContext::Header
        } else {
            DragContext::Body
        };
    }

    /// Grow the range to the pointer position, respecting the drag context.
    pub fn update_drag_selection(&mut self, pos: CellPos, column_count: usize) {
        if !self.dragging {
            return;
        }
        let Some(anchor) = self.anchor else {
            return;
        };

        let range = match self.drag_context {
            DragContext::Row => {
                let a = CellPos::new(anchor.row.max(0), 0);
                let b = CellPos::new(pos.row.max(0), column_count.saturating_sub(1));
                CellRange::new(a, b)
            }
            DragContext::Header => {
                let row = pos.row.min(-1);
                CellRange::new(anchor, CellPos::new(row, pos.col))
            }
            DragContext::Body | DragContext::None => {
                let row = pos.row.max(0);
                CellRange::new(anchor, CellPos::new(row, pos.col))
            }
        };
        self.range = Some(range);
    }

    /// Finish a drag. Focus returns to the range's top-left corner, not the
    /// pointer-up position.
    pub fn end_drag_selection(&mut self) {
        self.dragging = false;
        self.drag_context = DragContext::None;
        if let Some(range) = self.range {
            self.selected_cell = Some(range.start);
        }
    }

    /// Keyboard range growth (shift+arrow / shift+click) from the anchor.
    pub fn extend_selection(&mut self, pos: CellPos) {
        let anchor = match self.anchor.or(self.selected_cell) {
            Some(a) => a,
            None => {
                self.select_cell(pos);
                return;
            }
        };
        self.anchor = Some(anchor);
        let range = CellRange::new(anchor, pos);
        self.range = Some(range);
        self.selected_cell = Some(range.start);
    }

    /// Set an explicit range (e.g. the footprint of a paste).
    pub fn set_selection_range(&mut self, start: CellPos, end: CellPos) {
        let range = CellRange::new(start, end);
        self.range = Some(range);
        self.anchor = Some(range.start);
        self.selected_cell = Some(range.start);
    }

    /// Move the focused cell by a delta, collapsing to a single cell.
    pub fn move_by(&mut self, d_row: isize, d_col: isize, row_count: usize, column_count: usize) {
        if row_count == 0 || column_count == 0 {
            return;
        }
        let current = self.selected_cell.unwrap_or(CellPos::new(0, 1));
        let row = (current.row + d_row).clamp(0, row_count as isize - 1);
        let col = (current.col as isize + d_col).clamp(0, column_count as isize - 1) as usize;
        self.select_cell(CellPos::new(row, col));
    }

    /// Pull every stored coordinate back inside the grid after rows or
    /// columns were removed.
    pub fn clamp_to(&mut self, row_count: usize, column_count: usize) {
        let max_row = row_count as isize - 1;
        let max_col = column_count.saturating_sub(1);
        let fits = |p: &CellPos| p.row <= max_row && p.col <= max_col;

        if row_count == 0 || column_count == 0 {
            self.selected_cell = None;
            self.anchor = None;
            self.range = None;
        } else {
            let clamp = |p: CellPos| CellPos::new(p.row.min(max_row), p.col.min(max_col));
            self.selected_cell = self.selected_cell.map(clamp);
            self.anchor = self.anchor.map(clamp);
            self.range = self.range.map(|r| CellRange::new(clamp(r.start), clamp(r.end)));
        }
        self.individual_cells.retain(fits);
        self.individual_rows.retain(|&r| (r as isize) <= max_row);
    }

    // -------------------------------------------------------------------------
    // Disjoint selection
    // -------------------------------------------------------------------------

    /// Toggle one cell in the individual set. Returns true if it is now selected.
    pub fn toggle_individual_cell(&mut self, pos: CellPos) -> bool {
        if self.individual_cells.remove(&pos) {
            false
        } else {
            self.individual_cells.insert(pos);
            true
        }
    }

    /// Toggle one body row in the individual set. Returns true if it is now selected.
    pub fn toggle_individual_row(&mut self, row: usize) -> bool {
        if self.individual_rows.remove(&row) {
            false
        } else {
            self.individual_rows.insert(row);
            true
        }
    }

    pub fn clear_individual_selections(&mut self) {
        self.individual_cells.clear();
        self.individual_rows.clear();
    }

    pub fn has_individual_selection(&self) -> bool {
        !self.individual_cells.is_empty() || !self.individual_rows.is_empty()
    }

    /// Reset to the unselected state. Does not touch a live edit.
    pub fn clear_selection(&mut self) {
        self.selected_cell = None;
        self.anchor = None;
        self.range = None;
        self.dragging = false;
        self.drag_context = DragContext::None;
        self.clear_individual_selections();
    }

    /// Individual cells, then individual rows, then the range.
    pub fn effective(&self) -> EffectiveSelection<'_> {
        if !self.individual_cells.is_empty() {
            EffectiveSelection::Cells(&self.individual_cells)
        } else if !self.individual_rows.is_empty() {
            EffectiveSelection::Rows(&self.individual_rows)
        } else if let Some(range) = self.range {
            EffectiveSelection::Range(range)
        } else {
            EffectiveSelection::Empty
        }
    }

    /// Whether `pos` is part of the effective selection.
    pub fn is_selected(&self, pos: CellPos) -> bool {
        match self.effective() {
            EffectiveSelection::Empty => false,
            EffectiveSelection::Cells(cells) => cells.contains(&pos),
            EffectiveSelection::Rows(rows) => pos.body_row().is_some_and(|r| rows.contains(&r)),
            EffectiveSelection::Range(range) => range.contains(pos),
        }
    }

    /// Cell, row and column counts of the effective selection.
    pub fn counts(&self, column_count: usize) -> SelectionCounts {
        match self.effective() {
            EffectiveSelection::Empty => SelectionCounts::default(),
            EffectiveSelection::Cells(cells) => {
                let rows: BTreeSet<isize> = cells.iter().map(|p| p.row).collect();
                let cols: BTreeSet<usize> = cells.iter().map(|p| p.col).collect();
                SelectionCounts { cells: cells.len(), rows: rows.len(), columns: cols.len() }
            }
            EffectiveSelection::Rows(rows) => {
                // Whole rows span the data columns only
                let data_columns = column_count.saturating_sub(1);
                SelectionCounts {
                    cells: rows.len() * data_columns,
                    rows: rows.len(),
                    columns: data_columns,
                }
            }
            EffectiveSelection::Range(range) => SelectionCounts {
                cells: range.cell_count(),
                rows: range.row_count(),
                columns: range.col_count(),
            },
        }
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Start editing `pos` with its current value in the buffer.
    pub fn start_editing<T: EditTarget>(&mut self, pos: CellPos, target: &mut T) -> bool {
        self.start_editing_with(pos, None, target)
    }

    /// Start editing `pos`. `initial` replaces the buffer (typing over a cell).
    ///
    /// Returns false when the cell is not editable. Editing the cell that is
    /// already live is a no-op; any other live edit is committed first.
    pub fn start_editing_with<T: EditTarget>(
        &mut self,
        pos: CellPos,
        initial: Option<&str>,
        target: &mut T,
    ) -> bool {
        if let Some(live) = &self.editing {
            if live.cell == pos {
                return true;
            }
            self.stop_editing(true, target);
        }

        if !target.is_editable(pos) {
            return false;
        }

        let original_value = target.read_cell(pos);
        let value = initial.map(str::to_string).unwrap_or_else(|| original_value.clone());
        self.editing = Some(EditState { cell: pos, original_value, value });
        self.selected_cell = Some(pos);
        true
    }

    /// Replace the live edit buffer. Ignored when not editing.
    pub fn set_edit_value(&mut self, value: impl Into<String>) {
        if let Some(edit) = &mut self.editing {
            edit.value = value.into();
        }
    }

    /// Leave the editing sub-state, saving or reverting the buffer.
    pub fn stop_editing<T: EditTarget>(&mut self, save: bool, target: &mut T) -> EditOutcome {
        let Some(edit) = self.editing.take() else {
            return EditOutcome::NotEditing;
        };

        if !save {
            return EditOutcome::Reverted { cell: edit.cell, original: edit.original_value };
        }
        if edit.value == edit.original_value {
            return EditOutcome::Unchanged { cell: edit.cell };
        }
        target.commit_cell(edit.cell, &edit.value);
        EditOutcome::Committed { cell: edit.cell, value: edit.value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal cell store: column 0 is read-only.
    #[derive(Default)]
    struct MapTarget {
        cells: HashMap<CellPos, String>,
        commits: Vec<(CellPos, String)>,
    }

    impl EditTarget for MapTarget {
        fn is_editable(&self, pos: CellPos) -> bool {
            pos.col != SERIAL_COL
        }

        fn read_cell(&self, pos: CellPos) -> String {
            self.cells.get(&pos).cloned().unwrap_or_default()
        }

        fn commit_cell(&mut self, pos: CellPos, value: &str) {
            self.cells.insert(pos, value.to_string());
            self.commits.push((pos, value.to_string()));
        }
    }

    fn p(row: isize, col: usize) -> CellPos {
        CellPos::new(row, col)
    }

    #[test]
    fn test_select_cell_collapses_range() {
        let mut sel = SelectionState::new();
        sel.set_selection_range(p(0, 1), p(3, 4));
        sel.select_cell(p(2, 2));
        assert_eq!(sel.range(), Some(CellRange::single(p(2, 2))));
        assert_eq!(sel.anchor(), Some(p(2, 2)));
        assert_eq!(sel.selected_cell(), Some(p(2, 2)));
    }

    #[test]
    fn test_select_row_spans_full_width() {
        let mut sel = SelectionState::new();
        sel.select_row(3, 8);
        let range = sel.range().unwrap();
        assert_eq!(range.start, p(3, 0));
        assert_eq!(range.end, p(3, 7));
    }

    #[test]
    fn test_drag_context_is_decided_at_start() {
        let mut sel = SelectionState::new();
        sel.start_drag(p(2, 0));
        assert_eq!(sel.drag_context(), DragContext::Row);

        sel.start_drag(p(-1, 3));
        assert_eq!(sel.drag_context(), DragContext::Header);

        sel.start_drag(p(4, 3));
        assert_eq!(sel.drag_context(), DragContext::Body);
    }

    #[test]
    fn test_body_drag_never_reaches_header() {
        let mut sel = SelectionState::new();
        sel.start_drag(p(3, 2));
        sel.update_drag_selection(p(-1, 5), 10);
        let range = sel.range().unwrap();
        assert_eq!(range.start, p(0, 2));
        assert_eq!(range.end, p(3, 5));
        assert!(!range.touches_header());
    }

    #[test]
    fn test_header_drag_stays_in_header() {
        let mut sel = SelectionState::new();
        sel.start_drag(p(-1, 2));
        sel.update_drag_selection(p(6, 4), 10);
        let range = sel.range().unwrap();
        assert_eq!(range.start, p(-1, 2));
        assert_eq!(range.end, p(-1, 4));
    }

    #[test]
    fn test_row_drag_selects_whole_rows() {
        let mut sel = SelectionState::new();
        sel.start_drag(p(5, 0));
        sel.update_drag_selection(p(2, 3), 12);
        let range = sel.range().unwrap();
        assert_eq!(range.start, p(2, 0));
        assert_eq!(range.end, p(5, 11));
    }

    #[test]
    fn test_end_drag_refocuses_top_left() {
        let mut sel = SelectionState::new();
        sel.start_drag(p(6, 5));
        sel.update_drag_selection(p(1, 2), 10);
        sel.end_drag_selection();
        assert!(!sel.is_dragging());
        assert_eq!(sel.drag_context(), DragContext::None);
        assert_eq!(sel.selected_cell(), Some(p(1, 2)));
    }

    #[test]
    fn test_update_without_drag_is_ignored() {
        let mut sel = SelectionState::new();
        sel.select_cell(p(1, 1));
        sel.update_drag_selection(p(4, 4), 10);
        assert_eq!(sel.range(), Some(CellRange::single(p(1, 1))));
    }

    #[test]
    fn test_extend_selection_keeps_anchor() {
        let mut sel = SelectionState::new();
        sel.select_cell(p(4, 4));
        sel.extend_selection(p(2, 6));
        assert_eq!(sel.anchor(), Some(p(4, 4)));
        assert_eq!(sel.selected_cell(), Some(p(2, 4)));

        sel.extend_selection(p(5, 1));
        let range = sel.range().unwrap();
        assert_eq!(range.start, p(4, 1));
        assert_eq!(range.end, p(5, 4));
        assert_eq!(sel.selected_cell(), Some(p(4, 1)));
    }

    #[test]
    fn test_individual_overrides_range() {
        let mut sel = SelectionState::new();
        sel.set_selection_range(p(0, 1), p(9, 5));
        sel.toggle_individual_cell(p(2, 3));
        sel.toggle_individual_cell(p(7, 4));

        let counts = sel.counts(10);
        assert_eq!(counts.cells, 2);
        assert_eq!(counts.rows, 2);
        assert_eq!(counts.columns, 2);
        assert!(matches!(sel.effective(), EffectiveSelection::Cells(c) if c.len() == 2));
        assert!(!sel.is_selected(p(0, 1)));
        assert!(sel.is_selected(p(7, 4)));
    }

    #[test]
    fn test_individual_rows_override_range() {
        let mut sel = SelectionState::new();
        sel.set_selection_range(p(0, 1), p(9, 5));
        sel.toggle_individual_row(4);
        sel.toggle_individual_row(8);
        let counts = sel.counts(12);
        assert_eq!(counts.rows, 2);
        assert_eq!(counts.columns, 11);
        assert_eq!(counts.cells, 22);

        // Toggling off falls back to the range
        sel.toggle_individual_row(4);
        sel.toggle_individual_row(8);
        assert_eq!(sel.counts(12).rows, 10);
    }

    #[test]
    fn test_clear_selection_resets_everything() {
        let mut sel = SelectionState::new();
        sel.set_selection_range(p(0, 1), p(2, 2));
        sel.toggle_individual_cell(p(1, 1));
        sel.toggle_individual_row(1);
        sel.clear_selection();
        assert_eq!(sel.selected_cell(), None);
        assert_eq!(sel.range(), None);
        assert_eq!(sel.anchor(), None);
        assert_eq!(sel.effective(), EffectiveSelection::Empty);
    }

    #[test]
    fn test_editing_commit_and_cancel() {
        let mut target = MapTarget::default();
        target.cells.insert(p(0, 2), "old".into());
        let mut sel = SelectionState::new();

        assert!(sel.start_editing(p(0, 2), &mut target));
        sel.set_edit_value("new");
        let outcome = sel.stop_editing(false, &mut target);
        assert_eq!(outcome, EditOutcome::Reverted { cell: p(0, 2), original: "old".into() });
        assert!(target.commits.is_empty());

        assert!(sel.start_editing(p(0, 2), &mut target));
        sel.set_edit_value("new");
        let outcome = sel.stop_editing(true, &mut target);
        assert_eq!(outcome, EditOutcome::Committed { cell: p(0, 2), value: "new".into() });
        assert_eq!(target.read_cell(p(0, 2)), "new");
    }

    #[test]
    fn test_editing_second_cell_commits_first() {
        let mut target = MapTarget::default();
        let mut sel = SelectionState::new();

        sel.start_editing(p(1, 1), &mut target);
        sel.set_edit_value("1");
        sel.start_editing(p(2, 1), &mut target);

        assert_eq!(target.commits, vec![(p(1, 1), "1".to_string())]);
        assert_eq!(sel.editing().map(|e| e.cell), Some(p(2, 1)));
    }

    #[test]
    fn test_editing_same_cell_is_noop() {
        let mut target = MapTarget::default();
        let mut sel = SelectionState::new();
        sel.start_editing(p(1, 1), &mut target);
        sel.set_edit_value("typed");
        assert!(sel.start_editing(p(1, 1), &mut target));
        assert_eq!(sel.editing().map(|e| e.value.as_str()), Some("typed"));
        assert!(target.commits.is_empty());
    }

    #[test]
    fn test_serial_column_not_editable() {
        let mut target = MapTarget::default();
        let mut sel = SelectionState::new();
        assert!(!sel.start_editing(p(1, SERIAL_COL), &mut target));
        assert!(!sel.is_editing());
        assert_eq!(sel.stop_editing(true, &mut target), EditOutcome::NotEditing);
    }

    #[test]
    fn test_unchanged_save_writes_nothing() {
        let mut target = MapTarget::default();
        target.cells.insert(p(0, 1), "1".into());
        let mut sel = SelectionState::new();
        sel.start_editing(p(0, 1), &mut target);
        assert_eq!(sel.stop_editing(true, &mut target), EditOutcome::Unchanged { cell: p(0, 1) });
        assert!(target.commits.is_empty());
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut sel = SelectionState::new();
        sel.set_selection_range(p(3, 2), p(9, 8));
        sel.toggle_individual_cell(p(8, 1));
        sel.toggle_individual_row(7);
        sel.clamp_to(5, 6);
        let range = sel.range().unwrap();
        assert_eq!(range.end, p(4, 5));
        assert!(sel.individual_cells().is_empty());
        assert!(sel.individual_rows().is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn drag_always_refocuses_range_start(
                r0 in 0isize..50, c0 in 1usize..20,
                r1 in -3isize..50, c1 in 1usize..20,
            ) {
                let mut sel = SelectionState::new();
                sel.start_drag(CellPos::new(r0, c0));
                sel.update_drag_selection(CellPos::new(r1, c1), 20);
                sel.end_drag_selection();
                let range = sel.range().unwrap();
                prop_assert_eq!(sel.selected_cell(), Some(range.start));
                prop_assert!(range.start.row >= 0);
            }
        }
    }
}
