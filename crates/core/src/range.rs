use serde::{Deserialize, Serialize};

/// Row index of the header band. Header labels are addressed with negative rows.
pub const HEADER_ROW: isize = -1;

/// Absolute column index of the serial ("No.") column.
pub const SERIAL_COL: usize = 0;

/// A grid coordinate. Rows below zero address the header band, columns are
/// absolute column-metadata indices (the serial column is column 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: isize,
    pub col: usize,
}

impl CellPos {
    #[inline]
    pub fn new(row: isize, col: usize) -> Self {
        Self { row, col }
    }

    /// Position in the header band for the given column.
    #[inline]
    pub fn header(col: usize) -> Self {
        Self { row: HEADER_ROW, col }
    }

    pub fn is_header(&self) -> bool {
        self.row < 0
    }

    /// Body row index, or `None` for header positions.
    pub fn body_row(&self) -> Option<usize> {
        usize::try_from(self.row).ok()
    }
}

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellPos,
    pub end: CellPos,
}

impl CellRange {
    /// Create a new range, normalizing so start is the top-left corner.
    pub fn new(a: CellPos, b: CellPos) -> Self {
        Self {
            start: CellPos::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellPos::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Create a single-cell range.
    pub fn single(pos: CellPos) -> Self {
        Self { start: pos, end: pos }
    }

    /// Full-width range over one body row.
    pub fn full_row(row: usize, column_count: usize) -> Self {
        let row = row as isize;
        Self::new(
            CellPos::new(row, 0),
            CellPos::new(row, column_count.saturating_sub(1)),
        )
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row >= self.start.row
            && pos.row <= self.end.row
            && pos.col >= self.start.col
            && pos.col <= self.end.col
    }

    pub fn row_count(&self) -> usize {
        (self.end.row - self.start.row + 1) as usize
    }

    pub fn col_count(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// Check if this is a single cell.
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// True when any part of the range lies in the header band.
    pub fn touches_header(&self) -> bool {
        self.start.row < 0
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = CellPos> {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row).flat_map(move |r| (start.col..=end.col).map(move |c| CellPos::new(r, c)))
    }

    /// Body rows covered by the range (header rows skipped).
    pub fn body_rows(&self) -> impl Iterator<Item = usize> {
        let first = self.start.row.max(0);
        (first..=self.end.row).filter_map(|r| usize::try_from(r).ok())
    }
}
