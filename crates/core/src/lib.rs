//! Core grid types for the line-list workbench: coordinates, rectangular
//! ranges, and the selection/editing state machine.
//!
//! Nothing in this crate knows what a cell contains. Reads and writes go
//! through the [`selection::EditTarget`] trait, which the engine implements
//! over its table store.

pub mod range;
pub mod selection;

pub use range::{CellPos, CellRange, HEADER_ROW, SERIAL_COL};
pub use selection::{
    DragContext, EditOutcome, EditState, EditTarget, EffectiveSelection, SelectionCounts,
    SelectionState,
};
