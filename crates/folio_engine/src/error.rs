//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The database file cannot be opened or created.
    #[error("cannot open database: {message}")]
    Open {
        /// Description of the open failure.
        message: String,
    },

    /// A transaction could not begin, commit, or roll back.
    #[error("transaction failed: {message}")]
    Transaction {
        /// Description of the transaction failure.
        message: String,
    },

    /// A bucket was addressed that does not exist.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// Name of the missing bucket.
        name: String,
    },

    /// A bucket name collides with engine-internal state.
    #[error("bucket name is reserved: {name}")]
    ReservedBucket {
        /// The rejected name.
        name: String,
    },

    /// The engine's storage layer failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Creates an open error.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Creates a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Creates a bucket-not-found error.
    pub fn bucket_not_found(name: impl Into<String>) -> Self {
        Self::BucketNotFound { name: name.into() }
    }

    /// Creates a reserved-bucket error.
    pub fn reserved_bucket(name: impl Into<String>) -> Self {
        Self::ReservedBucket { name: name.into() }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<redb::DatabaseError> for EngineError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::open(e.to_string())
    }
}

impl From<redb::TransactionError> for EngineError {
    fn from(e: redb::TransactionError) -> Self {
        Self::transaction(e.to_string())
    }
}

impl From<redb::CommitError> for EngineError {
    fn from(e: redb::CommitError) -> Self {
        Self::transaction(e.to_string())
    }
}

impl From<redb::TableError> for EngineError {
    fn from(e: redb::TableError) -> Self {
        match e {
            redb::TableError::TableDoesNotExist(name) => Self::BucketNotFound { name },
            other => Self::storage(other.to_string()),
        }
    }
}

impl From<redb::StorageError> for EngineError {
    fn from(e: redb::StorageError) -> Self {
        Self::storage(e.to_string())
    }
}
