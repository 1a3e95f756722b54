//! Error types for store operations.

use folio_codec::CodecError;
use folio_engine::EngineError;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A collection or resource name failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },

    /// A resource, collection, or database was absent.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was missing.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding a record failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The embedded engine failed.
    #[error("engine error: {0}")]
    Engine(EngineError),
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<EngineError> for CoreError {
    fn from(e: EngineError) -> Self {
        // A missing bucket is an absent collection to callers.
        match e {
            EngineError::BucketNotFound { name } => {
                Self::not_found(format!("collection '{name}' does not exist"))
            }
            other => Self::Engine(other),
        }
    }
}
