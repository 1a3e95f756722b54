//! Engine trait definitions.

use crate::error::EngineResult;

/// A transactional key-value engine.
///
/// An engine stores opaque byte values under byte keys, grouped into named
/// buckets. It does not interpret the values it stores; foliodb owns all
/// record encoding.
///
/// # Invariants
///
/// - At most one write transaction is active at a time; `begin_write`
///   blocks until the slot is free
/// - Readers observe a serializable snapshot taken at `begin_read`
/// - A committed transaction is visible in full or not at all
/// - Per-bucket sequence numbers are strictly increasing and never reused,
///   even across deletions
///
/// # Implementors
///
/// - [`crate::RedbEngine`] - Persistent storage
/// - [`crate::MemoryEngine`] - For testing
pub trait KvEngine: Send + Sync {
    /// The read transaction type.
    type ReadTx<'e>: ReadTx
    where
        Self: 'e;

    /// The write transaction type.
    type WriteTx<'e>: WriteTx
    where
        Self: 'e;

    /// Begins a read-only transaction over a snapshot of the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be taken.
    fn begin_read(&self) -> EngineResult<Self::ReadTx<'_>>;

    /// Begins a write transaction, blocking until the writer slot is free.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    fn begin_write(&self) -> EngineResult<Self::WriteTx<'_>>;
}

/// A read-only transaction.
pub trait ReadTx {
    /// Reads the value stored under `key` in `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Returns every entry of `bucket` in key order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// A write transaction.
///
/// Dropping a write transaction without calling [`WriteTx::commit`]
/// discards every staged change.
pub trait WriteTx {
    /// Creates `bucket` if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is reserved or the engine fails.
    fn create_bucket(&mut self, bucket: &str) -> EngineResult<()>;

    /// Returns the next sequence number for `bucket`, starting at 1.
    ///
    /// The counter is the authoritative identifier source: it only moves
    /// forward and is never derived from the entries currently present, so
    /// identifiers survive deletions. Creates the bucket's counter on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be read or advanced.
    fn next_sequence(&mut self, bucket: &str) -> EngineResult<u64>;

    /// Raises `bucket`'s sequence counter to at least `floor`.
    ///
    /// Used when a caller stores an entry under an explicit identifier, so
    /// that later [`WriteTx::next_sequence`] calls can never hand that
    /// identifier out again.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be updated.
    fn ensure_sequence(&mut self, bucket: &str, floor: u64) -> EngineResult<()>;

    /// Reads the value stored under `key` in `bucket`, observing staged
    /// changes of this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` in `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Deletes the entry under `key` in `bucket`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn delete(&mut self, bucket: &str, key: &[u8]) -> EngineResult<()>;

    /// Returns every entry of `bucket` in key order, observing staged
    /// changes of this transaction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketNotFound`] if the bucket does
    /// not exist.
    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Commits the transaction, making all staged changes visible at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the database is unchanged.
    fn commit(self) -> EngineResult<()>;

    /// Explicitly discards the transaction.
    ///
    /// Equivalent to dropping it; provided for call sites that want the
    /// rollback visible in the code.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to release the transaction.
    fn rollback(self) -> EngineResult<()>;
}
