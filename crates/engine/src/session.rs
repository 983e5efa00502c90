//! The editing session: one table plus everything derived from it.
//!
//! A [`Session`] owns the table store, the selection state machine, the
//! validation manager, the undo history and the active filters. Every
//! mutating entry point snapshots the table for undo, runs the store
//! operation, then drains the store's events so validation errors and
//! filters follow their columns and the selection stays inside the grid.
//! Operations that the store rejects leave no history entry.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use linelist_core::{
    CellPos, CellRange, EditOutcome, EffectiveSelection, SelectionCounts, SelectionState,
};

use crate::clipboard::{format_tsv, parse_tsv};
use crate::column::TableLayout;
use crate::document::LineListDocument;
use crate::events::TableEvent;
use crate::filter::{ColumnFilter, FilterKey, FilterSet, ValueCount};
use crate::history::{History, Snapshot, DEFAULT_MAX_ENTRIES};
use crate::incubation::{summarize_incubation, ExposureSource, IncubationSummary};
use crate::row::{ColumnGroup, DataKey};
use crate::stats::{
    analyze_case_control, analyze_case_series, analyze_cohort, CaseControlResult,
    CaseSeriesResult, CohortResult, StatisticsOptions,
};
use crate::table::{TableStore, TableTemplate};
use crate::validation::ValidationManager;

/// Everything needed to build (and rebuild on reset) a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub template: TableTemplate,
    pub layout: TableLayout,
    pub statistics: StatisticsOptions,
    pub history_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            template: TableTemplate::default(),
            layout: TableLayout::default(),
            statistics: StatisticsOptions::default(),
            history_depth: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    table: TableStore,
    selection: SelectionState,
    validation: ValidationManager,
    history: History,
    filters: FilterSet,
}

impl Session {
    /// A fresh session on the empty template.
    pub fn create(config: SessionConfig) -> Self {
        let table = TableStore::from_template(&config.template, config.layout.clone());
        Self::with_table(table, config)
    }

    /// A session over loaded data. The table is validated up front.
    pub fn from_document(doc: LineListDocument, config: SessionConfig) -> Self {
        let table = doc.into_table(config.layout.clone());
        Self::with_table(table, config)
    }

    fn with_table(mut table: TableStore, config: SessionConfig) -> Self {
        table.take_events();
        let mut validation = ValidationManager::new();
        validation.validate_all(&table);
        Self {
            history: History::new(config.history_depth),
            config,
            table,
            selection: SelectionState::new(),
            validation,
            filters: FilterSet::new(),
        }
    }

    /// Back to the empty template with no selection, errors, filters or history.
    pub fn reset(&mut self) {
        self.table = TableStore::from_template(&self.config.template, self.config.layout.clone());
        self.table.take_events();
        self.selection = SelectionState::new();
        self.validation.clear();
        self.history.clear();
        self.filters.clear();
        log::debug!("session reset");
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn table(&self) -> &TableStore {
        &self.table
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Direct access for pure selection moves (click, drag, toggle).
    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn validation(&self) -> &ValidationManager {
        &self.validation
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn options(&self) -> &StatisticsOptions {
        &self.config.statistics
    }

    pub fn set_options(&mut self, options: StatisticsOptions) {
        self.config.statistics = options;
    }

    pub fn to_document(&self) -> LineListDocument {
        LineListDocument::from_table(&self.table)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Run a table operation with undo and change propagation.
    fn apply<R>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut TableStore, &mut SelectionState) -> R,
    ) -> R {
        let before = Snapshot::new(label, self.table.headers().clone(), self.table.rows().to_vec());
        let result = op(&mut self.table, &mut self.selection);
        let events = self.table.take_events();
        if !events.is_empty() {
            self.history.record(before);
            self.dispatch(events);
        }
        result
    }

    /// Like [`apply`](Self::apply) for operations that move cells. A live
    /// edit is committed first so it lands in the cell it was opened on.
    fn apply_structural<R>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut TableStore, &mut SelectionState) -> R,
    ) -> R {
        self.commit_edit();
        self.apply(label, op)
    }

    fn commit_edit(&mut self) {
        if self.selection.is_editing() {
            self.apply("Edit cell", |t, s| s.stop_editing(true, t));
        }
    }

    fn dispatch(&mut self, events: Vec<TableEvent>) {
        for event in &events {
            self.validation.apply_event(&self.table, event);
            if let TableEvent::ColumnsChanged(change) = event {
                self.filters.remap(change);
            }
        }
        self.selection.clamp_to(self.table.row_count(), self.table.column_count());
    }

    // =========================================================================
    // Structure
    // =========================================================================

    pub fn insert_columns(&mut self, group: ColumnGroup, index: usize, count: usize) -> bool {
        self.apply_structural("Insert columns", |t, _| t.insert_columns(group, index, count).is_some())
    }

    pub fn delete_columns(&mut self, group: ColumnGroup, indices: &[usize]) -> bool {
        self.apply_structural("Delete columns", |t, _| t.delete_columns_at(group, indices).is_some())
    }

    pub fn clear_column(&mut self, group: ColumnGroup, index: usize, clear_header: bool) -> bool {
        self.apply("Clear column", |t, _| t.clear_column(group, index, clear_header))
    }

    pub fn insert_rows(&mut self, index: usize, count: usize) -> bool {
        self.apply_structural("Insert rows", |t, _| t.insert_rows(index, count))
    }

    /// Returns the number of rows removed.
    pub fn delete_rows(&mut self, indices: &[usize]) -> usize {
        self.apply_structural("Delete rows", |t, _| t.delete_rows(indices).len())
    }

    pub fn delete_range(&mut self, start: usize, end: usize) -> usize {
        self.apply_structural("Delete rows", |t, _| t.delete_range(start, end).len())
    }

    /// Delete every body row touched by the effective selection.
    pub fn delete_selected_rows(&mut self) -> usize {
        let rows: Vec<usize> = match self.selection.effective() {
            EffectiveSelection::Empty => return 0,
            EffectiveSelection::Cells(cells) => {
                let mut rows: Vec<usize> = cells.iter().filter_map(|p| p.body_row()).collect();
                rows.dedup();
                rows
            }
            EffectiveSelection::Rows(rows) => rows.iter().copied().collect(),
            EffectiveSelection::Range(range) => range.body_rows().collect(),
        };
        let removed = self.delete_rows(&rows);
        if removed > 0 {
            self.selection.clear_individual_selections();
        }
        removed
    }

    pub fn delete_empty_rows(&mut self) -> usize {
        self.apply_structural("Delete empty rows", |t, _| t.delete_empty_rows().len())
    }

    /// Returns the number of columns removed across all groups.
    pub fn delete_empty_columns(&mut self) -> usize {
        self.apply_structural("Delete empty columns", |t, _| {
            t.delete_empty_columns()
                .iter()
                .map(|c| c.before.len() - c.after.len())
                .sum()
        })
    }

    /// Change visible columns or widths. Not an undoable edit.
    pub fn set_layout(&mut self, layout: TableLayout) -> bool {
        self.commit_edit();
        self.config.layout = layout.clone();
        let changed = self.table.set_layout(layout).is_some();
        let events = self.table.take_events();
        self.dispatch(events);
        changed
    }

    // =========================================================================
    // Cells and editing
    // =========================================================================

    pub fn update_cell(&mut self, row: isize, key: DataKey, cell_index: Option<usize>, value: &str) -> bool {
        self.apply("Edit cell", |t, _| t.update_cell(row, key, cell_index, value))
    }

    /// Enter edit mode on `pos`; a live edit elsewhere is committed first.
    pub fn start_editing(&mut self, pos: CellPos) -> bool {
        self.apply("Edit cell", |t, s| s.start_editing(pos, t))
    }

    /// Enter edit mode replacing the cell's text with `initial`.
    pub fn start_editing_with(&mut self, pos: CellPos, initial: &str) -> bool {
        self.apply("Edit cell", |t, s| s.start_editing_with(pos, Some(initial), t))
    }

    pub fn set_edit_value(&mut self, value: impl Into<String>) {
        self.selection.set_edit_value(value);
    }

    pub fn stop_editing(&mut self, save: bool) -> EditOutcome {
        self.apply("Edit cell", |t, s| s.stop_editing(save, t))
    }

    /// Blank the effective selection. Header cells of group columns lose
    /// their label. Returns the number of cells cleared.
    pub fn delete_selection(&mut self) -> usize {
        let positions = self.selected_positions();
        if positions.is_empty() {
            return 0;
        }
        self.apply("Clear cells", |t, _| t.clear_cells(&positions))
    }

    fn selected_positions(&self) -> Vec<CellPos> {
        let column_count = self.table.column_count();
        match self.selection.effective() {
            EffectiveSelection::Empty => Vec::new(),
            EffectiveSelection::Cells(cells) => cells.iter().copied().collect(),
            EffectiveSelection::Rows(rows) => rows
                .iter()
                .flat_map(|&r| (1..column_count).map(move |c| CellPos::new(r as isize, c)))
                .collect(),
            EffectiveSelection::Range(range) => range.cells().collect(),
        }
    }

    /// Counts for pluralized labels, individual selections first.
    pub fn selection_counts(&self) -> SelectionCounts {
        self.selection.counts(self.table.column_count())
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Tab-separated text of the effective selection.
    ///
    /// A range copies its rectangle. Individual rows copy every data column.
    /// Individual cells copy, per row, the span of columns used by any
    /// selected cell, with unselected cells left blank.
    pub fn copy_selection(&self) -> Option<String> {
        let column_count = self.table.column_count();
        let read = |r: isize, c: usize| self.table.value_at(CellPos::new(r, c));

        let block: Vec<Vec<String>> = match self.selection.effective() {
            EffectiveSelection::Empty => return None,
            EffectiveSelection::Range(range) => (range.start.row..=range.end.row)
                .map(|r| (range.start.col..=range.end.col).map(|c| read(r, c)).collect())
                .collect(),
            EffectiveSelection::Rows(rows) => rows
                .iter()
                .map(|&r| (1..column_count).map(|c| read(r as isize, c)).collect())
                .collect(),
            EffectiveSelection::Cells(cells) => {
                let min_col = cells.iter().map(|p| p.col).min()?;
                let max_col = cells.iter().map(|p| p.col).max()?;
                let mut by_row: BTreeMap<isize, Vec<usize>> = BTreeMap::new();
                for p in cells {
                    by_row.entry(p.row).or_default().push(p.col);
                }
                by_row
                    .iter()
                    .map(|(&r, cols)| {
                        (min_col..=max_col)
                            .map(|c| if cols.contains(&c) { read(r, c) } else { String::new() })
                            .collect()
                    })
                    .collect()
            }
        };
        Some(format_tsv(&block))
    }

    /// Paste tab-separated text at the selection's top-left cell (the
    /// selected cell when there is no range). The pasted footprint becomes
    /// the new selection.
    pub fn paste_text(&mut self, text: &str) -> Option<CellRange> {
        let block = parse_tsv(text);
        if block.is_empty() {
            return None;
        }
        let start = self
            .selection
            .range()
            .map(|r| r.start)
            .or_else(|| self.selection.selected_cell())?;

        let footprint = self.apply("Paste", |t, _| t.paste_block(start, &block))?;
        self.selection.clear_individual_selections();
        self.selection.set_selection_range(footprint.start, footprint.end);
        Some(footprint)
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn undo(&mut self) -> bool {
        self.restore_with(|history, current| history.undo(current))
    }

    pub fn redo(&mut self) -> bool {
        self.restore_with(|history, current| history.redo(current))
    }

    fn restore_with(&mut self, pop: impl FnOnce(&mut History, Snapshot) -> Option<Snapshot>) -> bool {
        if self.selection.is_editing() {
            self.selection.stop_editing(false, &mut self.table);
        }
        let current = Snapshot::new("", self.table.headers().clone(), self.table.rows().to_vec());
        let Some(snapshot) = pop(&mut self.history, current) else {
            return false;
        };
        log::debug!("restoring snapshot '{}'", snapshot.label);
        self.table.replace(snapshot.headers, snapshot.rows);
        let events = self.table.take_events();
        self.dispatch(events);
        true
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn set_filter(&mut self, key: FilterKey, filter: ColumnFilter) {
        self.filters.set(key, filter);
    }

    pub fn remove_filter(&mut self, key: &FilterKey) {
        self.filters.remove(key);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn visible_rows(&self) -> Vec<usize> {
        self.filters.visible_rows(self.table.rows())
    }

    pub fn available_values(&self, key: &FilterKey) -> Vec<ValueCount> {
        self.filters.available_values(self.table.rows(), key)
    }

    pub fn available_dates(&self, key: &FilterKey) -> Vec<ValueCount> {
        self.filters.available_dates(self.table.rows(), key)
    }

    // =========================================================================
    // Analyses (over every row, not the filtered view)
    // =========================================================================

    pub fn case_control(&self) -> Vec<CaseControlResult> {
        analyze_case_control(self.table.rows(), &self.table.headers().diet, &self.config.statistics)
    }

    pub fn cohort(&self) -> Vec<CohortResult> {
        analyze_cohort(self.table.rows(), &self.table.headers().diet, &self.config.statistics)
    }

    pub fn case_series(&self) -> Vec<CaseSeriesResult> {
        analyze_case_series(self.table.rows(), &self.table.headers().diet)
    }

    /// Incubation periods. In individual-exposure mode each row's own
    /// exposure time is used and `global_exposure` is ignored; otherwise
    /// `None` is returned when no global exposure time is given.
    pub fn incubation(&self, global_exposure: Option<NaiveDateTime>) -> Option<IncubationSummary> {
        let source = if self.table.layout().individual_exposure_mode {
            ExposureSource::Individual
        } else {
            ExposureSource::Global(global_exposure?)
        };
        Some(summarize_incubation(self.table.rows(), source))
    }
}
