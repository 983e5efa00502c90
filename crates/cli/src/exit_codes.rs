//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success                                        |
//! | 1    | General error                                  |
//! | 2    | Usage error (bad arguments, unknown column)    |
//! | 3    | I/O error (missing file, unwritable output)    |
//! | 4    | Parse error (malformed line-list document)     |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown filter key, bad timestamp.
pub const EXIT_USAGE: u8 = 2;

/// Reading the document or writing output failed.
pub const EXIT_IO: u8 = 3;

/// The document is not valid line-list JSON.
pub const EXIT_PARSE: u8 = 4;
