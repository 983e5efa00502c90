//! Column filters and dependent value lists.
//!
//! A filter accepts a set of raw cell values for one column. The value list
//! shown for a column is *dependent*: it counts every row that passes all the
//! other active filters, ignoring the column's own filter, so a user can still
//! widen a filter after narrowing it.
//!
//! Key invariants:
//! - Blank cells normalize to `""`, and `""` in an accepted set means "blanks"
//! - Filters are keyed by data address, not absolute column, and follow their
//!   column across structural changes
//! - Value lists are computed over the full row set, never a filtered view

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnChange, ColumnMeta};
use crate::error::EngineError;
use crate::row::{DataKey, Row};
use crate::timestamp::date_prefix;

// =============================================================================
// FilterKey: data address of a filtered column
// =============================================================================

/// `"{dataKey}-{cellIndex}"` for group columns, bare `"{dataKey}"` for scalar ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey {
    pub data_key: DataKey,
    pub cell_index: Option<usize>,
}

impl FilterKey {
    pub fn scalar(data_key: DataKey) -> Self {
        Self { data_key, cell_index: None }
    }

    pub fn indexed(data_key: DataKey, cell_index: usize) -> Self {
        Self { data_key, cell_index: Some(cell_index) }
    }

    /// Key of a grid column. The serial column has none.
    pub fn for_column(meta: &ColumnMeta) -> Option<Self> {
        meta.data_key.map(|data_key| Self { data_key, cell_index: meta.cell_index })
    }

    /// Absolute column currently addressed by this key.
    pub fn column(&self, columns: &[ColumnMeta]) -> Option<usize> {
        columns
            .iter()
            .find(|m| m.data_key == Some(self.data_key) && m.cell_index == self.cell_index)
            .map(|m| m.index)
    }

    /// Raw value of this key in a row.
    pub fn read<'a>(&self, row: &'a Row) -> &'a str {
        row.get(self.data_key, self.cell_index)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell_index {
            Some(i) => write!(f, "{}-{}", self.data_key.as_str(), i),
            None => f.write_str(self.data_key.as_str()),
        }
    }
}

impl FromStr for FilterKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidFilterKey(s.to_string());

        if let Some((name, index)) = s.rsplit_once('-') {
            let data_key = DataKey::parse(name).ok_or_else(invalid)?;
            let index: usize = index.parse().map_err(|_| invalid())?;
            if data_key.group().is_none() {
                return Err(invalid());
            }
            return Ok(Self::indexed(data_key, index));
        }

        let data_key = DataKey::parse(s).ok_or_else(invalid)?;
        if data_key.group().is_some() {
            return Err(invalid());
        }
        Ok(Self::scalar(data_key))
    }
}

// =============================================================================
// ColumnFilter: accepted values for one column
// =============================================================================

/// How a cell value is matched against the accepted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Exact raw value.
    #[default]
    Values,
    /// First `YYYY-MM-DD` token of a timestamp cell.
    DatePrefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub accepted: BTreeSet<String>,
    pub mode: FilterMode,
}

impl ColumnFilter {
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            accepted: values.into_iter().map(|v| normalize(v.as_ref()).to_string()).collect(),
            mode: FilterMode::Values,
        }
    }

    pub fn dates<I, S>(dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            accepted: dates.into_iter().map(|v| normalize(v.as_ref()).to_string()).collect(),
            mode: FilterMode::DatePrefix,
        }
    }

    /// Check if a raw cell value passes this filter
    pub fn passes(&self, raw: &str) -> bool {
        self.accepted.contains(self.match_key(raw))
    }

    fn match_key<'a>(&self, raw: &'a str) -> &'a str {
        match self.mode {
            FilterMode::Values => normalize(raw),
            FilterMode::DatePrefix => date_prefix(raw).unwrap_or(""),
        }
    }
}

/// Blank and whitespace-only values read as `""`.
fn normalize(raw: &str) -> &str {
    if raw.trim().is_empty() {
        ""
    } else {
        raw
    }
}

/// One entry of a column's value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Value-list ordering: finite numbers ascending, then text lexicographic,
/// then `""` last.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    fn rank(v: &str) -> (u8, Option<OrderedFloat<f64>>) {
        if v.is_empty() {
            return (2, None);
        }
        match v.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => (0, Some(OrderedFloat(x))),
            _ => (1, None),
        }
    }
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

// =============================================================================
// FilterSet: all active filters of a session
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: BTreeMap<FilterKey, ColumnFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a filter. An empty accepted set removes the column's filter.
    pub fn set(&mut self, key: FilterKey, filter: ColumnFilter) {
        if filter.accepted.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, filter);
        }
    }

    pub fn remove(&mut self, key: &FilterKey) -> Option<ColumnFilter> {
        self.filters.remove(key)
    }

    pub fn get(&self, key: &FilterKey) -> Option<&ColumnFilter> {
        self.filters.get(key)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterKey, &ColumnFilter)> {
        self.filters.iter()
    }

    /// True when the row passes every filter except the one on `except`.
    pub fn row_passes(&self, row: &Row, except: Option<&FilterKey>) -> bool {
        self.filters
            .iter()
            .filter(|(key, _)| Some(*key) != except)
            .all(|(key, filter)| filter.passes(key.read(row)))
    }

    /// Indices of rows passing all filters.
    pub fn visible_rows(&self, rows: &[Row]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.row_passes(row, None))
            .map(|(i, _)| i)
            .collect()
    }

    /// Distinct values of `target` with counts, over rows passing every other
    /// filter.
    pub fn available_values(&self, rows: &[Row], target: &FilterKey) -> Vec<ValueCount> {
        self.count_by(rows, target, normalize)
    }

    /// Like [`available_values`](Self::available_values) but grouped by the
    /// calendar date of timestamp cells. Cells without a date count as `""`.
    pub fn available_dates(&self, rows: &[Row], target: &FilterKey) -> Vec<ValueCount> {
        self.count_by(rows, target, |raw| date_prefix(raw).unwrap_or(""))
    }

    fn count_by<F>(&self, rows: &[Row], target: &FilterKey, key_of: F) -> Vec<ValueCount>
    where
        F: for<'a> Fn(&'a str) -> &'a str,
    {
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for row in rows.iter().filter(|row| self.row_passes(row, Some(target))) {
            *counts.entry(key_of(target.read(row))).or_insert(0) += 1;
        }

        let mut entries: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount { value: value.to_string(), count })
            .collect();
        entries.sort_by(|a, b| compare_values(&a.value, &b.value));
        entries
    }

    /// Follow filtered columns across a structural change. Filters on
    /// deleted or hidden columns are dropped.
    pub fn remap(&mut self, change: &ColumnChange) {
        let old = std::mem::take(&mut self.filters);
        for (key, filter) in old {
            let cell_index = match (key.data_key.group(), key.cell_index) {
                (Some(group), Some(i)) => match change.map_cell_index(group, i) {
                    Some(j) => Some(j),
                    None => {
                        log::debug!("dropping filter on deleted column {key}");
                        continue;
                    }
                },
                _ => key.cell_index,
            };
            let moved = FilterKey { data_key: key.data_key, cell_index };
            if moved.column(&change.after).is_some() {
                self.filters.insert(moved, filter);
            } else {
                log::debug!("dropping filter on hidden column {key}");
            }
        }
    }
}
