//! Column metadata: the flattened coordinate system of the grid.
//!
//! Column order is fixed:
//! serial, isPatient, [isConfirmedCase], basic×N, clinical×N,
//! [individualExposureTime], symptomOnset, diet×N.
//!
//! Metadata is derived solely from `(headers, layout)`. It is rebuilt after
//! every structural change and the previous version is kept alongside the new
//! one in a [`ColumnChange`], so per-column state elsewhere (validation
//! errors, filters) can be remapped by `(type, cellIndex)` identity instead of
//! raw position.

use serde::{Deserialize, Serialize};

use crate::row::{ColumnGroup, DataKey, Headers};

/// Stable type tag of a grid column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnType {
    Serial,
    IsPatient,
    IsConfirmedCase,
    Basic,
    Clinical,
    IndividualExposureTime,
    SymptomOnset,
    Diet,
}

impl ColumnType {
    pub fn data_key(self) -> Option<DataKey> {
        match self {
            ColumnType::Serial => None,
            ColumnType::IsPatient => Some(DataKey::IsPatient),
            ColumnType::IsConfirmedCase => Some(DataKey::IsConfirmedCase),
            ColumnType::Basic => Some(DataKey::BasicInfo),
            ColumnType::Clinical => Some(DataKey::ClinicalSymptoms),
            ColumnType::IndividualExposureTime => Some(DataKey::IndividualExposureTime),
            ColumnType::SymptomOnset => Some(DataKey::SymptomOnset),
            ColumnType::Diet => Some(DataKey::DietInfo),
        }
    }

    pub fn group(self) -> Option<ColumnGroup> {
        match self {
            ColumnType::Basic => Some(ColumnGroup::Basic),
            ColumnType::Clinical => Some(ColumnGroup::Clinical),
            ColumnType::Diet => Some(ColumnGroup::Diet),
            _ => None,
        }
    }

    pub fn from_group(group: ColumnGroup) -> Self {
        match group {
            ColumnGroup::Basic => ColumnType::Basic,
            ColumnGroup::Clinical => ColumnType::Clinical,
            ColumnGroup::Diet => ColumnType::Diet,
        }
    }
}

/// One grid column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Absolute column index (serial column is 0).
    pub index: usize,
    /// Left edge in pixels.
    pub offset: f32,
    pub width: f32,
    pub editable: bool,
    pub data_key: Option<DataKey>,
    /// Position within the group for basic/clinical/diet columns.
    pub cell_index: Option<usize>,
    pub column_type: ColumnType,
}

impl ColumnMeta {
    /// Identity used to follow a column across structural changes.
    pub fn identity(&self) -> (ColumnType, Option<usize>) {
        (self.column_type, self.cell_index)
    }
}

/// Visibility flags and widths that shape the column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub serial_width: f32,
    pub status_width: f32,
    pub default_width: f32,
    pub timestamp_width: f32,
    /// Show the confirmed-case column after isPatient.
    pub show_confirmed_case: bool,
    /// Per-row exposure timestamps instead of a single global exposure time.
    pub individual_exposure_mode: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            serial_width: 50.0,
            status_width: 70.0,
            default_width: 80.0,
            timestamp_width: 140.0,
            show_confirmed_case: false,
            individual_exposure_mode: false,
        }
    }
}

/// Build the column metadata for `headers` under `layout`.
pub fn build_column_meta(headers: &Headers, layout: &TableLayout) -> Vec<ColumnMeta> {
    let mut specs: Vec<(ColumnType, Option<usize>, f32)> = Vec::new();
    specs.push((ColumnType::Serial, None, layout.serial_width));
    specs.push((ColumnType::IsPatient, None, layout.status_width));
    if layout.show_confirmed_case {
        specs.push((ColumnType::IsConfirmedCase, None, layout.status_width));
    }
    specs.extend((0..headers.basic.len()).map(|i| (ColumnType::Basic, Some(i), layout.default_width)));
    specs.extend(
        (0..headers.clinical.len()).map(|i| (ColumnType::Clinical, Some(i), layout.default_width)),
    );
    if layout.individual_exposure_mode {
        specs.push((ColumnType::IndividualExposureTime, None, layout.timestamp_width));
    }
    specs.push((ColumnType::SymptomOnset, None, layout.timestamp_width));
    specs.extend((0..headers.diet.len()).map(|i| (ColumnType::Diet, Some(i), layout.default_width)));

    let mut offset = 0.0;
    specs
        .into_iter()
        .enumerate()
        .map(|(index, (column_type, cell_index, width))| {
            let meta = ColumnMeta {
                index,
                offset,
                width,
                editable: column_type != ColumnType::Serial,
                data_key: column_type.data_key(),
                cell_index,
                column_type,
            };
            offset += width;
            meta
        })
        .collect()
}

/// Find the column with the given identity.
pub fn find_column(
    columns: &[ColumnMeta],
    column_type: ColumnType,
    cell_index: Option<usize>,
) -> Option<&ColumnMeta> {
    columns
        .iter()
        .find(|m| m.column_type == column_type && m.cell_index == cell_index)
}

/// Absolute index of the first column of a group.
pub fn group_start(columns: &[ColumnMeta], group: ColumnGroup) -> Option<usize> {
    find_column(columns, ColumnType::from_group(group), Some(0)).map(|m| m.index)
}

/// The structural operation behind a [`ColumnChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralOp {
    Inserted { group: ColumnGroup, index: usize, count: usize },
    /// `indices` are sorted ascending and unique.
    Deleted { group: ColumnGroup, indices: Vec<usize> },
    /// Visibility flags or widths changed; no group shifted.
    LayoutChanged,
    /// Headers were replaced wholesale (undo, redo, reset, load).
    Replaced,
}

/// Old and new column metadata around one structural change.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChange {
    pub op: StructuralOp,
    pub before: Vec<ColumnMeta>,
    pub after: Vec<ColumnMeta>,
}

impl ColumnChange {
    /// Where cell `index` of `group` moved to. `None` if it was deleted.
    pub fn map_cell_index(&self, group: ColumnGroup, index: usize) -> Option<usize> {
        match &self.op {
            StructuralOp::Inserted { group: g, index: at, count } if *g == group => {
                Some(if index >= *at { index + count } else { index })
            }
            StructuralOp::Deleted { group: g, indices } if *g == group => {
                if indices.binary_search(&index).is_ok() {
                    None
                } else {
                    let removed_before = indices.iter().take_while(|&&i| i < index).count();
                    Some(index - removed_before)
                }
            }
            _ => Some(index),
        }
    }

    /// Where absolute column `old` moved to, following its identity.
    pub fn map_column(&self, old: usize) -> Option<usize> {
        let meta = self.before.get(old)?;
        let cell_index = match (meta.column_type.group(), meta.cell_index) {
            (Some(group), Some(i)) => Some(self.map_cell_index(group, i)?),
            _ => meta.cell_index,
        };
        find_column(&self.after, meta.column_type, cell_index).map(|m| m.index)
    }

    /// True when every old column keeps its absolute index.
    pub fn is_identity(&self) -> bool {
        self.before.len() == self.after.len()
            && (0..self.before.len()).all(|c| self.map_column(c) == Some(c))
    }
}
