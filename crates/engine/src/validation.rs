//! Per-cell validation of entered values.
//!
//! Status columns and the clinical/diet category cells take only `""`, `"0"`
//! or `"1"`. Timestamp columns take blank or a parseable timestamp. Basic
//! (demographic) cells take anything.
//!
//! Errors are keyed by `(row, col)` in grid coordinates, so they have to move
//! whenever the grid does: column changes remap by identity, row inserts and
//! deletes shift, clears drop. Header labels are never validated.

use std::collections::BTreeMap;

use linelist_core::CellPos;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnChange, ColumnType, StructuralOp};
use crate::events::TableEvent;
use crate::table::TableStore;
use crate::timestamp::parse_timestamp;

// ============================================================================
// Rules
// ============================================================================

/// Reason why a cell failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationFailureReason {
    /// Expected blank, "0" or "1".
    NotBinary,
    /// Expected blank or a `YYYY-MM-DD HH:mm` timestamp.
    InvalidTimestamp,
}

impl std::fmt::Display for ValidationFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailureReason::NotBinary => write!(f, "Value must be 0, 1 or blank"),
            ValidationFailureReason::InvalidTimestamp => {
                write!(f, "Value must be a date and time (YYYY-MM-DD HH:mm) or blank")
            }
        }
    }
}

/// A recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub reason: ValidationFailureReason,
    /// The offending value as entered.
    pub value: String,
}

/// Check a value against the rule of its column type.
pub fn validate_value(column_type: ColumnType, value: &str) -> Result<(), ValidationFailureReason> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    match column_type {
        ColumnType::IsPatient
        | ColumnType::IsConfirmedCase
        | ColumnType::Clinical
        | ColumnType::Diet => match trimmed {
            "0" | "1" => Ok(()),
            _ => Err(ValidationFailureReason::NotBinary),
        },
        ColumnType::SymptomOnset | ColumnType::IndividualExposureTime => {
            parse_timestamp(trimmed)
                .map(|_| ())
                .ok_or(ValidationFailureReason::InvalidTimestamp)
        }
        ColumnType::Serial | ColumnType::Basic => Ok(()),
    }
}

// ============================================================================
// ValidationManager
// ============================================================================

/// Stores validation errors for the body cells of one table.
#[derive(Debug, Clone, Default)]
pub struct ValidationManager {
    errors: BTreeMap<(usize, usize), ValidationError>,
}

impl ValidationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&ValidationError> {
        self.errors.get(&(row, col))
    }

    pub fn has_error(&self, row: usize, col: usize) -> bool {
        self.errors.contains_key(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over all errors in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &ValidationError)> {
        self.errors.iter()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Revalidate a single position. Header and serial positions are ignored.
    pub fn validate_cell(&mut self, table: &TableStore, pos: CellPos) {
        let Some(row) = pos.body_row() else {
            return;
        };
        let Some(meta) = table.column(pos.col) else {
            self.errors.remove(&(row, pos.col));
            return;
        };
        if row >= table.row_count() {
            self.errors.remove(&(row, pos.col));
            return;
        }

        let value = table.value_at(pos);
        match validate_value(meta.column_type, &value) {
            Ok(()) => {
                self.errors.remove(&(row, pos.col));
            }
            Err(reason) => {
                self.errors.insert((row, pos.col), ValidationError { reason, value });
            }
        }
    }

    /// Drop every error and revalidate the whole table.
    pub fn validate_all(&mut self, table: &TableStore) {
        self.errors.clear();
        for row in 0..table.row_count() {
            for col in 1..table.column_count() {
                self.validate_cell(table, CellPos::new(row as isize, col));
            }
        }
    }

    /// Bring the error map in line with one table change. `table` is the
    /// state after the change.
    pub fn apply_event(&mut self, table: &TableStore, event: &TableEvent) {
        match event {
            TableEvent::ColumnsChanged(change) => self.remap_columns(table, change),
            TableEvent::RowsInserted { index, count } => self.shift_rows_inserted(*index, *count),
            TableEvent::RowsDeleted { indices } => self.shift_rows_deleted(indices),
            TableEvent::CellsChanged { cells } => {
                for &pos in cells {
                    self.validate_cell(table, pos);
                }
            }
            TableEvent::CellsCleared { cells } => {
                for pos in cells {
                    if let Some(row) = pos.body_row() {
                        self.errors.remove(&(row, pos.col));
                    }
                }
            }
        }
    }

    fn remap_columns(&mut self, table: &TableStore, change: &ColumnChange) {
        if change.op == StructuralOp::Replaced {
            self.validate_all(table);
            return;
        }
        if change.is_identity() {
            return;
        }

        let old = std::mem::take(&mut self.errors);
        for ((row, col), error) in old {
            if let Some(new_col) = change.map_column(col) {
                self.errors.insert((row, new_col), error);
            }
        }
    }

    fn shift_rows_inserted(&mut self, index: usize, count: usize) {
        let old = std::mem::take(&mut self.errors);
        self.errors = old
            .into_iter()
            .map(|((row, col), e)| {
                let row = if row >= index { row + count } else { row };
                ((row, col), e)
            })
            .collect();
    }

    fn shift_rows_deleted(&mut self, indices: &[usize]) {
        let old = std::mem::take(&mut self.errors);
        self.errors = old
            .into_iter()
            .filter(|((row, _), _)| indices.binary_search(row).is_err())
            .map(|((row, col), e)| {
                let removed_before = indices.iter().take_while(|&&i| i < row).count();
                ((row - removed_before, col), e)
            })
            .collect();
    }
}
