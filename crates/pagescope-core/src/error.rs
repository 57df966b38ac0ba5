//! Error types for the core engine.
//!
//! Almost nothing in the engine can fail: resolution failures degrade to a
//! marker and correlation anomalies are recorded, not raised. `CoreError`
//! covers the few places where input cannot be represented at all.

use thiserror::Error;

/// Errors raised while building events from external input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A recorded event could not be decoded.
    #[error("invalid event at line {line}: {reason}")]
    InvalidEvent {
        /// 1-based line number in the recording
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
