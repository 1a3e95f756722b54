//! Persistent engine backed by redb.

use crate::engine::{KvEngine, ReadTx, WriteTx};
use crate::error::{EngineError, EngineResult};
use redb::{Database, ReadableTable, TableDefinition, TableHandle};
use std::path::Path;

/// Internal table holding one sequence counter per bucket.
const SEQ_TABLE_NAME: &str = "__folio_seq";
const SEQ_TABLE: TableDefinition<&str, u64> = TableDefinition::new(SEQ_TABLE_NAME);

fn bucket_def(name: &str) -> TableDefinition<'_, &'static [u8], &'static [u8]> {
    TableDefinition::new(name)
}

/// A persistent transactional engine storing everything in one redb file.
///
/// Buckets map to redb tables keyed by raw bytes. Sequence counters live in
/// a reserved internal table and are updated inside the same write
/// transaction as the data they identify, so a rolled-back transaction
/// never publishes a counter advance.
///
/// Isolation is redb's own model: a single active writer, any number of
/// concurrent readers, each reader on a serializable snapshot.
///
/// # Example
///
/// ```no_run
/// use folio_engine::{KvEngine, RedbEngine, WriteTx};
/// use std::path::Path;
///
/// let engine = RedbEngine::open(Path::new("default.folio")).unwrap();
/// let mut tx = engine.begin_write().unwrap();
/// tx.create_bucket("users").unwrap();
/// tx.put("users", b"k", b"v").unwrap();
/// tx.commit().unwrap();
/// ```
pub struct RedbEngine {
    db: Database,
}

impl RedbEngine {
    /// Opens or creates the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Open`] if the file is locked by another
    /// process, corrupt, or cannot be created.
    pub fn open(path: &Path) -> EngineResult<Self> {
        let db = Database::create(path)?;
        Ok(Self { db })
    }
}

impl KvEngine for RedbEngine {
    type ReadTx<'e> = RedbReadTx
    where
        Self: 'e;
    type WriteTx<'e> = RedbWriteTx
    where
        Self: 'e;

    fn begin_read(&self) -> EngineResult<RedbReadTx> {
        Ok(RedbReadTx {
            txn: self.db.begin_read()?,
        })
    }

    fn begin_write(&self) -> EngineResult<RedbWriteTx> {
        Ok(RedbWriteTx {
            txn: self.db.begin_write()?,
        })
    }
}

/// Read transaction over a redb snapshot.
pub struct RedbReadTx {
    txn: redb::ReadTransaction,
}

impl ReadTx for RedbReadTx {
    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(bucket_def(bucket))?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let table = self.txn.open_table(bucket_def(bucket))?;
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            entries.push((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(entries)
    }
}

/// Write transaction against a redb database.
///
/// Dropping the transaction without committing aborts it.
pub struct RedbWriteTx {
    txn: redb::WriteTransaction,
}

impl RedbWriteTx {
    fn bucket_exists(&self, bucket: &str) -> EngineResult<bool> {
        let mut tables = self.txn.list_tables()?;
        Ok(tables.any(|handle| handle.name() == bucket))
    }

    fn require_bucket(&self, bucket: &str) -> EngineResult<()> {
        if self.bucket_exists(bucket)? {
            Ok(())
        } else {
            Err(EngineError::bucket_not_found(bucket))
        }
    }
}

impl WriteTx for RedbWriteTx {
    fn create_bucket(&mut self, bucket: &str) -> EngineResult<()> {
        if bucket == SEQ_TABLE_NAME {
            return Err(EngineError::reserved_bucket(bucket));
        }
        // Opening a table in a write transaction creates it if absent.
        self.txn.open_table(bucket_def(bucket))?;
        Ok(())
    }

    fn next_sequence(&mut self, bucket: &str) -> EngineResult<u64> {
        let mut table = self.txn.open_table(SEQ_TABLE)?;
        let next = table.get(bucket)?.map(|guard| guard.value()).unwrap_or(0) + 1;
        table.insert(bucket, next)?;
        Ok(next)
    }

    fn ensure_sequence(&mut self, bucket: &str, floor: u64) -> EngineResult<()> {
        let mut table = self.txn.open_table(SEQ_TABLE)?;
        let current = table.get(bucket)?.map(|guard| guard.value()).unwrap_or(0);
        if floor > current {
            table.insert(bucket, floor)?;
        }
        Ok(())
    }

    fn get(&self, bucket: &str, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.require_bucket(bucket)?;
        let table = self.txn.open_table(bucket_def(bucket))?;
        let result = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(result)
    }

    fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.require_bucket(bucket)?;
        let mut table = self.txn.open_table(bucket_def(bucket))?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, bucket: &str, key: &[u8]) -> EngineResult<()> {
        self.require_bucket(bucket)?;
        let mut table = self.txn.open_table(bucket_def(bucket))?;
        table.remove(key)?;
        Ok(())
    }

    fn scan(&self, bucket: &str) -> EngineResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.require_bucket(bucket)?;
        let table = self.txn.open_table(bucket_def(bucket))?;
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            entries.push((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(entries)
    }

    fn commit(self) -> EngineResult<()> {
        self.txn.commit()?;
        Ok(())
    }

    fn rollback(self) -> EngineResult<()> {
        self.txn.abort()?;
        Ok(())
    }
}
