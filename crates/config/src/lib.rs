//! Configuration for line-list sessions: user settings stored as JSON in the
//! platform config directory.

pub mod settings;

pub use settings::{ConfigError, Settings};
