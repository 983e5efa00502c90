use thiserror::Error;

/// Errors at the engine's fallible boundaries (document I/O, key parsing).
///
/// Structural mutations never fail: an out-of-range index or a column-floor
/// violation is a silent no-op, reported through the operation's return value.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document JSON was malformed or did not match the row shape.
    #[error("document parse error: {0}")]
    DocumentParse(#[from] serde_json::Error),

    /// Reading or writing a document failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A filter key was neither `dataKey` nor `dataKey-index`.
    #[error("invalid filter key '{0}'")]
    InvalidFilterKey(String),
}
