//! FileIO error types.

use std::io;
use thiserror::Error;

/// Boxed cause carried by [`FileIoError::BackendConstruction`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the switching layer and by the backends behind it.
///
/// Backend failures (`NotFound`, `AlreadyExists`, `PermissionDenied`, `Io`,
/// `Backend`) are produced by [`FileIo`](crate::FileIo) implementations and
/// are passed through the switching layer untouched.
#[derive(Error, Debug)]
pub enum FileIoError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The delegate backend could not be constructed or initialized
    #[error("Failed to initialize delegate FileIO '{backend}': {source}")]
    BackendConstruction {
        /// Registered backend name taken from `io-impl-delegate`
        backend: String,
        /// Underlying cause
        source: BoxError,
    },

    /// A matching rule has a replacement template that cannot be applied
    #[error("Cannot rewrite '{location}' with rule '{pattern}': {reason}")]
    Rewrite {
        /// Logical location being rewritten
        location: String,
        /// Pattern text of the matching rule
        pattern: String,
        /// Why the template is unusable
        reason: String,
    },

    /// An operation was called before `initialize` succeeded
    #[error("FileIO has not been initialized")]
    NotInitialized,

    /// `initialize` was called on an already initialized FileIO
    #[error("FileIO is already initialized")]
    AlreadyInitialized,

    /// Object not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// Object already exists
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error from a backend stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for FileIO operations.
pub type Result<T> = std::result::Result<T, FileIoError>;

impl FileIoError {
    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FileIoError::NotFound(_))
            || matches!(self, FileIoError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }

    /// Check if this error was raised while configuring the layer.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FileIoError::Config(_) | FileIoError::BackendConstruction { .. }
        )
    }
}
