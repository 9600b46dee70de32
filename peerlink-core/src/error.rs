//! Error taxonomy shared by every boundary operation

use thiserror::Error;

/// Errors surfaced by boundary operations
///
/// This is a closed taxonomy: every failure of the engine collaborator is
/// mapped to the closest member at the point of the engine call, and the
/// FFI layer converts each member to one stable result code.
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was null, empty, or out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// A handle was null, already released, or of the wrong kind
    #[error("invalid native handle")]
    InvalidNativeHandle,

    /// A requested object (for example a capture device id) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation cannot be performed in the current state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Engine-level failure with no finer classification at this layer
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an engine failure carrying a display-formatted cause
    pub fn engine(cause: impl std::fmt::Display) -> Self {
        Self::Unknown(cause.to_string())
    }
}
