//! Line-list engine: the case table, its structural edits, column filters,
//! validation, undo history and the outbreak statistics computed from it.

pub mod clipboard;
pub mod column;
pub mod document;
pub mod error;
pub mod events;
pub mod filter;
pub mod history;
pub mod incubation;
pub mod row;
pub mod session;
pub mod stats;
pub mod table;
pub mod timestamp;
pub mod validation;

pub use error::EngineError;
pub use row::{ColumnGroup, DataKey, Headers, Row};
pub use session::{Session, SessionConfig};
pub use table::{TableStore, TableTemplate};
