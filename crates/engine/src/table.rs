//! The table store: headers plus the row matrix.
//!
//! Every structural mutation keeps each row's category sequences exactly as
//! long as the matching header group, and never leaves a group without a
//! column. Operations that would break either rule, or that address a row or
//! column that does not exist, do nothing and report that through their return
//! value. They never panic.

use std::collections::BTreeSet;

use linelist_core::{CellPos, CellRange, EditTarget, SERIAL_COL};
use serde::{Deserialize, Serialize};

use crate::column::{build_column_meta, ColumnChange, ColumnMeta, StructuralOp, TableLayout};
use crate::events::TableEvent;
use crate::row::{is_blank, ColumnGroup, DataKey, Headers, Row};

/// Shape of a freshly created (or reset) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableTemplate {
    pub basic_columns: usize,
    pub clinical_columns: usize,
    pub diet_columns: usize,
    pub row_count: usize,
}

impl Default for TableTemplate {
    fn default() -> Self {
        Self { basic_columns: 2, clinical_columns: 5, diet_columns: 10, row_count: 10 }
    }
}

impl TableTemplate {
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::blank(self.basic_columns, self.clinical_columns, self.diet_columns);
        headers.ensure_floor();
        headers
    }
}

#[derive(Debug, Clone)]
pub struct TableStore {
    headers: Headers,
    rows: Vec<Row>,
    layout: TableLayout,
    columns: Vec<ColumnMeta>,
    events: Vec<TableEvent>,
}

impl TableStore {
    /// Build a store from loaded data. Rows are conformed to the headers and
    /// empty groups are given their one blank column.
    pub fn new(mut headers: Headers, mut rows: Vec<Row>, layout: TableLayout) -> Self {
        headers.ensure_floor();
        for row in &mut rows {
            row.conform(&headers);
        }
        let columns = build_column_meta(&headers, &layout);
        Self { headers, rows, layout, columns, events: Vec::new() }
    }

    pub fn from_template(template: &TableTemplate, layout: TableLayout) -> Self {
        let headers = template.headers();
        let rows = (0..template.row_count).map(|_| Row::empty(&headers)).collect();
        Self::new(headers, rows, layout)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Option<&ColumnMeta> {
        self.columns.get(col)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Drain queued change events.
    pub fn take_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Raw value at a grid position. The serial column reads as the 1-based
    /// row number; header positions read the group label (scalar columns
    /// read their data key).
    pub fn value_at(&self, pos: CellPos) -> String {
        let Some(meta) = self.columns.get(pos.col) else {
            return String::new();
        };
        let Some(key) = meta.data_key else {
            return match pos.body_row() {
                Some(r) if r < self.rows.len() => (r + 1).to_string(),
                _ => String::new(),
            };
        };

        match pos.body_row() {
            None => match (key.group(), meta.cell_index) {
                (Some(group), Some(i)) => {
                    self.headers.group(group).get(i).cloned().unwrap_or_default()
                }
                _ => key.as_str().to_string(),
            },
            Some(r) => self
                .rows
                .get(r)
                .map(|row| row.get(key, meta.cell_index).to_string())
                .unwrap_or_default(),
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Change visibility flags or widths. Returns the column change if the
    /// metadata moved.
    pub fn set_layout(&mut self, layout: TableLayout) -> Option<ColumnChange> {
        if layout == self.layout {
            return None;
        }
        self.layout = layout;
        Some(self.rebuild_columns(StructuralOp::LayoutChanged))
    }

    fn rebuild_columns(&mut self, op: StructuralOp) -> ColumnChange {
        let after = build_column_meta(&self.headers, &self.layout);
        let before = std::mem::replace(&mut self.columns, after.clone());
        let change = ColumnChange { op, before, after };
        self.events.push(TableEvent::ColumnsChanged(change.clone()));
        change
    }

    /// Replace headers and rows wholesale (undo, redo, load).
    pub fn replace(&mut self, mut headers: Headers, mut rows: Vec<Row>) -> ColumnChange {
        headers.ensure_floor();
        for row in &mut rows {
            row.conform(&headers);
        }
        self.headers = headers;
        self.rows = rows;
        self.rebuild_columns(StructuralOp::Replaced)
    }

    // =========================================================================
    // Column structure
    // =========================================================================

    /// Insert `count` blank columns into `group` before `index`.
    pub fn insert_columns(
        &mut self,
        group: ColumnGroup,
        index: usize,
        count: usize,
    ) -> Option<ColumnChange> {
        let len = self.headers.len(group);
        if index > len || count == 0 {
            log::debug!("insert_columns rejected: {group:?} index {index} count {count} len {len}");
            return None;
        }

        let blanks = std::iter::repeat_with(String::new).take(count);
        self.headers.group_mut(group).splice(index..index, blanks.clone());
        for row in &mut self.rows {
            let cells = row.cells_mut(group);
            if cells.len() < len {
                cells.resize(len, String::new());
            }
            cells.splice(index..index, blanks.clone());
            cells.truncate(len + count);
        }

        Some(self.rebuild_columns(StructuralOp::Inserted { group, index, count }))
    }

    /// Delete the given columns of `group`. Rejected as a whole if any index
    /// is out of range or the group would be left empty.
    pub fn delete_columns_at(&mut self, group: ColumnGroup, indices: &[usize]) -> Option<ColumnChange> {
        let len = self.headers.len(group);
        let indices: BTreeSet<usize> = indices.iter().copied().collect();
        if indices.is_empty()
            || indices.iter().any(|&i| i >= len)
            || indices.len() >= len
        {
            log::debug!("delete_columns_at rejected: {group:?} {indices:?} len {len}");
            return None;
        }

        retain_indices(self.headers.group_mut(group), &indices);
        for row in &mut self.rows {
            let cells = row.cells_mut(group);
            cells.resize(len, String::new());
            retain_indices(cells, &indices);
        }

        let indices: Vec<usize> = indices.into_iter().collect();
        Some(self.rebuild_columns(StructuralOp::Deleted { group, indices }))
    }

    /// Blank every row's cell at `index` of `group`; the header label too if
    /// `clear_header` is set.
    pub fn clear_column(&mut self, group: ColumnGroup, index: usize, clear_header: bool) -> bool {
        if index >= self.headers.len(group) {
            return false;
        }

        let mut cleared = Vec::new();
        let col = crate::column::find_column(
            &self.columns,
            crate::column::ColumnType::from_group(group),
            Some(index),
        )
        .map(|m| m.index);

        if clear_header {
            self.headers.group_mut(group)[index].clear();
            if let Some(col) = col {
                cleared.push(CellPos::header(col));
            }
        }
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.set(group.data_key(), Some(index), String::new());
            if let Some(col) = col {
                cleared.push(CellPos::new(r as isize, col));
            }
        }

        self.events.push(TableEvent::CellsCleared { cells: cleared });
        true
    }

    /// Remove empty columns: no non-blank cell in any row and a blank header.
    /// At least one column always survives per group; when more columns are
    /// empty than may be removed, the ones at the end of the empty list go.
    pub fn delete_empty_columns(&mut self) -> Vec<ColumnChange> {
        let mut changes = Vec::new();
        for group in ColumnGroup::ALL {
            let len = self.headers.len(group);
            let empties: Vec<usize> = (0..len)
                .filter(|&i| {
                    is_blank(&self.headers.group(group)[i])
                        && self.rows.iter().all(|row| {
                            row.cells(group).get(i).map_or(true, |c| is_blank(c))
                        })
                })
                .collect();

            let removable = empties.len().min(len.saturating_sub(1));
            if removable == 0 {
                continue;
            }
            let doomed = &empties[empties.len() - removable..];
            if let Some(change) = self.delete_columns_at(group, doomed) {
                changes.push(change);
            }
        }
        changes
    }

    // =========================================================================
    // Row structure
    // =========================================================================

    /// Insert `count` empty rows before `index`.
    pub fn insert_rows(&mut self, index: usize, count: usize) -> bool {
        if index > self.rows.len() || count == 0 {
            log::debug!("insert_rows rejected: index {index} count {count}");
            return false;
        }
        let headers = &self.headers;
        let new_rows = (0..count).map(|_| Row::empty(headers));
        self.rows.splice(index..index, new_rows);
        self.events.push(TableEvent::RowsInserted { index, count });
        true
    }

    /// Remove the given rows (any order, duplicates ignored, out-of-range
    /// indices skipped). Returns the removed indices, ascending.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize> {
        let doomed: BTreeSet<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.rows.len())
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        retain_indices(&mut self.rows, &doomed);
        let removed: Vec<usize> = doomed.into_iter().collect();
        self.events.push(TableEvent::RowsDeleted { indices: removed.clone() });
        removed
    }

    /// Remove the inclusive range `start..=end`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Vec<usize> {
        if start > end {
            return Vec::new();
        }
        let indices: Vec<usize> = (start..=end.min(self.rows.len().saturating_sub(1))).collect();
        self.delete_rows(&indices)
    }

    /// Remove every empty row. Returns the removed indices.
    pub fn delete_empty_rows(&mut self) -> Vec<usize> {
        let empties: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_empty())
            .map(|(i, _)| i)
            .collect();
        self.delete_rows(&empties)
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Write a value by data address. `row < 0` renames the header label at
    /// `cell_index` of the key's group.
    pub fn update_cell(
        &mut self,
        row: isize,
        key: DataKey,
        cell_index: Option<usize>,
        value: &str,
    ) -> bool {
        if row < 0 {
            let (Some(group), Some(i)) = (key.group(), cell_index) else {
                return false;
            };
            let Some(label) = self.headers.group_mut(group).get_mut(i) else {
                return false;
            };
            *label = value.to_string();
            self.push_changed(row, key, cell_index);
            return true;
        }

        // Hidden columns (and out-of-range group indices) have no grid column
        let Some(col) = self.column_of(key, cell_index) else {
            return false;
        };
        let Some(target) = self.rows.get_mut(row as usize) else {
            return false;
        };
        target.set(key, cell_index, value.to_string());
        self.events.push(TableEvent::CellsChanged { cells: vec![CellPos::new(row, col)] });
        true
    }

    fn column_of(&self, key: DataKey, cell_index: Option<usize>) -> Option<usize> {
        self.columns
            .iter()
            .find(|m| m.data_key == Some(key) && m.cell_index == cell_index)
            .map(|m| m.index)
    }

    fn push_changed(&mut self, row: isize, key: DataKey, cell_index: Option<usize>) {
        if let Some(col) = self.column_of(key, cell_index) {
            self.events.push(TableEvent::CellsChanged { cells: vec![CellPos::new(row, col)] });
        }
    }

    /// Write a value by grid position.
    pub fn set_value_at(&mut self, pos: CellPos, value: &str) -> bool {
        let Some(meta) = self.columns.get(pos.col) else {
            return false;
        };
        let Some(key) = meta.data_key else {
            return false;
        };
        let cell_index = meta.cell_index;
        self.update_cell(pos.row, key, cell_index, value)
    }

    /// Blank the given positions. Serial and out-of-range positions are
    /// skipped; header positions blank the group label. Returns the count cleared.
    pub fn clear_cells(&mut self, positions: &[CellPos]) -> usize {
        let mut cleared = Vec::new();
        for &pos in positions {
            let Some(meta) = self.columns.get(pos.col) else {
                continue;
            };
            let Some(key) = meta.data_key else {
                continue;
            };
            let cell_index = meta.cell_index;
            match pos.body_row() {
                None => {
                    if let (Some(group), Some(i)) = (key.group(), cell_index) {
                        if let Some(label) = self.headers.group_mut(group).get_mut(i) {
                            label.clear();
                            cleared.push(pos);
                        }
                    }
                }
                Some(r) => {
                    if let Some(row) = self.rows.get_mut(r) {
                        row.set(key, cell_index, String::new());
                        cleared.push(pos);
                    }
                }
            }
        }
        let count = cleared.len();
        if count > 0 {
            self.events.push(TableEvent::CellsCleared { cells: cleared });
        }
        count
    }

    /// Write a 2-D text block with its top-left at `start`. Rows are appended
    /// when the block runs past the last row; cells past the last column are
    /// dropped, as are writes to the serial column and to header positions of
    /// scalar columns. Returns the footprint actually covered.
    pub fn paste_block(&mut self, start: CellPos, block: &[Vec<String>]) -> Option<CellRange> {
        if block.is_empty() || start.col >= self.columns.len() {
            return None;
        }

        let width = block.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return None;
        }
        let last_col = (start.col + width - 1).min(self.columns.len() - 1);
        let last_row = start.row + block.len() as isize - 1;

        if last_row >= 0 && last_row as usize >= self.rows.len() {
            let missing = last_row as usize + 1 - self.rows.len();
            let at = self.rows.len();
            self.insert_rows(at, missing);
        }

        let mut written = Vec::new();
        for (dr, line) in block.iter().enumerate() {
            let row = start.row + dr as isize;
            for (dc, value) in line.iter().enumerate() {
                let col = start.col + dc;
                if col > last_col || col == SERIAL_COL {
                    continue;
                }
                let Some(meta) = self.columns.get(col) else {
                    continue;
                };
                let Some(key) = meta.data_key else {
                    continue;
                };
                let cell_index = meta.cell_index;
                let value = value.trim_end_matches('\r');

                if row < 0 {
                    if let (Some(group), Some(i)) = (key.group(), cell_index) {
                        if let Some(label) = self.headers.group_mut(group).get_mut(i) {
                            *label = value.to_string();
                            written.push(CellPos::new(row, col));
                        }
                    }
                } else if let Some(target) = self.rows.get_mut(row as usize) {
                    target.set(key, cell_index, value.to_string());
                    written.push(CellPos::new(row, col));
                }
            }
        }

        if !written.is_empty() {
            self.events.push(TableEvent::CellsChanged { cells: written });
        }
        Some(CellRange::new(start, CellPos::new(last_row, last_col)))
    }

    /// True when every row's sequences match the header widths.
    pub fn is_consistent(&self) -> bool {
        self.rows.iter().all(|row| {
            ColumnGroup::ALL
                .iter()
                .all(|&g| row.cells(g).len() == self.headers.len(g))
        })
    }
}

impl EditTarget for TableStore {
    fn is_editable(&self, pos: CellPos) -> bool {
        let Some(meta) = self.columns.get(pos.col) else {
            return false;
        };
        if !meta.editable {
            return false;
        }
        match pos.body_row() {
            // Only group columns have editable header labels
            None => meta.cell_index.is_some(),
            Some(r) => r < self.rows.len(),
        }
    }

    fn read_cell(&self, pos: CellPos) -> String {
        self.value_at(pos)
    }

    fn commit_cell(&mut self, pos: CellPos, value: &str) {
        self.set_value_at(pos, value);
    }
}

/// Remove the elements at `doomed` positions, preserving order.
fn retain_indices<T>(items: &mut Vec<T>, doomed: &BTreeSet<usize>) {
    let mut i = 0;
    items.retain(|_| {
        let keep = !doomed.contains(&i);
        i += 1;
        keep
    });
}
