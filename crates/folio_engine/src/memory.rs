//! In-memory engine for testing.

use crate::engine::{KvEngine, ReadTx, WriteTx};
use crate::error::{EngineError, EngineResult};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
struct State {
    buckets: HashMap<String, BTreeMap<Vec<u8>, Vec<u8>>>,
    sequences: HashMap<String, u64>,
}

impl State {
    fn bucket(&self, name: &str) -> EngineResult<&BTreeMap<Vec<u8>, Vec<u8>>> {
        self.buckets
            .get(name)
            .ok_or_else(|| EngineError::bucket_not_found(name))
    }
}

/// An in-memory transactional engine.
///
/// This engine keeps all buckets in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// Write transactions stage changes against a private copy of the state
/// and publish it atomically on commit, so readers never observe a
/// half-applied transaction. The writer lock is held for the transaction's
/// lifetime, giving the same single-writer model as the persistent engine.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: RwLock<State>,
    writer: Mutex<()>,
}

impl MemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvEngine for MemoryEngine {
    type ReadTx<'e> = MemoryReadTx
    where
        Self: 'e;
    type WriteTx<'e> = MemoryWriteTx<'e>
    where
        Self: 'e;

    fn begin_read(&self) -> EngineResult<MemoryReadTx> {
        Ok(MemoryReadTx {
            snapshot: self.state.read().clone(),
        })
    }

    fn begin_write(&self) -> EngineResult<MemoryWriteTx<'_>> {
        let guard = self.writer.lock();
        let staged = self.state.read().clone();
        Ok(MemoryWriteTx {
            state: &self.state,
            staged,
            _writer: guard,
        })
    }
}

/// Read transaction over a cloned snapshot.
pub struct MemoryReadTx {
    snapshot: State,
}

impl ReadTx for MemoryReadTx {
    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.snapshot.bucket(bucket)?.get(key).cloned())
    }

    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .snapshot
            .bucket(bucket)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Write transaction holding the engine's writer lock.
pub struct MemoryWriteTx<'e> {
    state: &'e RwLock<State>,
    staged: State,
    _writer: MutexGuard<'e, ()>,
}

impl WriteTx for MemoryWriteTx<'_> {
    fn create_bucket(&mut self, bucket: &str) -> EngineResult<()> {
        self.staged.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    fn next_sequence(&mut self, bucket: &str) -> EngineResult<u64> {
        let counter = self.staged.sequences.entry(bucket.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    fn ensure_sequence(&mut self, bucket: &str, floor: u64) -> EngineResult<()> {
        let counter = self.staged.sequences.entry(bucket.to_string()).or_insert(0);
        if floor > *counter {
            *counter = floor;
        }
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.staged.bucket(bucket)?.get(key).cloned())
    }

    fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.staged
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| EngineError::bucket_not_found(bucket))?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, bucket: &str, key: &[u8]) -> EngineResult<()> {
        self.staged
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| EngineError::bucket_not_found(bucket))?
            .remove(key);
        Ok(())
    }

    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .staged
            .bucket(bucket)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(self) -> EngineResult<()> {
        *self.state.write() = self.staged;
        Ok(())
    }

    fn rollback(self) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_publishes_staged_changes() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().unwrap();
        tx.create_bucket("users").unwrap();
        tx.put("users", b"k", b"v").unwrap();
        tx.commit().unwrap();

        let tx = engine.begin_read().unwrap();
        assert_eq!(tx.get("users", b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn rollback_discards_staged_changes() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().unwrap();
        tx.create_bucket("users").unwrap();
        tx.rollback().unwrap();

        let tx = engine.begin_read().unwrap();
        assert!(matches!(
            tx.get("users", b"k"),
            Err(EngineError::BucketNotFound { .. })
        ));
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().unwrap();
        tx.create_bucket("users").unwrap();
        tx.put("users", b"k", b"old").unwrap();
        tx.commit().unwrap();

        let reader = engine.begin_read().unwrap();

        let mut tx = engine.begin_write().unwrap();
        tx.put("users", b"k", b"new").unwrap();
        tx.commit().unwrap();

        assert_eq!(reader.get("users", b"k").unwrap(), Some(b"old".to_vec()));
    }

    #[test]
    fn sequence_rolls_back_with_its_transaction() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().unwrap();
        tx.create_bucket("users").unwrap();
        tx.commit().unwrap();

        let mut tx = engine.begin_write().unwrap();
        assert_eq!(tx.next_sequence("users").unwrap(), 1);
        drop(tx);

        let mut tx = engine.begin_write().unwrap();
        assert_eq!(tx.next_sequence("users").unwrap(), 1);
        tx.commit().unwrap();
    }

    #[test]
    fn put_into_missing_bucket_fails() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().unwrap();
        assert!(matches!(
            tx.put("users", b"k", b"v"),
            Err(EngineError::BucketNotFound { .. })
        ));
    }
}
