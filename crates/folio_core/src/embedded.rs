//! Engine-backed document store.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::filter::Filter;
use folio_engine::{KvEngine, RedbEngine, WriteTx};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// File extension of the embedded backing file.
pub const DB_EXT: &str = "folio";

/// A document store backed by a transactional key-value engine.
///
/// The store owns one engine-backed database file. Collections map to
/// engine buckets, created lazily on first insert; records are keyed by
/// the 8-byte big-endian encoding of a store-assigned sequence number.
/// All reads and writes go through [`Filter`] builders obtained from
/// [`EmbeddedStore::coll`], each mutating operation inside exactly one
/// engine transaction.
///
/// # Example
///
/// ```no_run
/// use folio_core::{Config, EmbeddedStore, Record};
///
/// let store = EmbeddedStore::open(Config::default()).unwrap();
///
/// let mut record = Record::new();
/// record.insert("Name".to_string(), "Karn".into());
/// let id = store.coll("users").insert(&record).unwrap();
/// assert_eq!(id, 1);
/// ```
pub struct EmbeddedStore<E: KvEngine = RedbEngine> {
    engine: E,
    config: Config,
}

impl EmbeddedStore<RedbEngine> {
    /// Opens or creates `<db_name>.folio` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Engine`] if the file is locked by another
    /// process, corrupt, or cannot be created.
    pub fn open(config: Config) -> CoreResult<Self> {
        Self::open_in(Path::new("."), config)
    }

    /// Opens or creates `<db_name>.folio` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Engine`] if the file cannot be opened.
    pub fn open_in(dir: &Path, config: Config) -> CoreResult<Self> {
        let path = dir.join(format!("{}.{}", config.db_name, DB_EXT));
        debug!(path = %path.display(), "opening database");
        let engine = RedbEngine::open(&path)?;
        Ok(Self { engine, config })
    }

    /// Removes the backing file of the database called `name` from the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such database exists, or
    /// [`CoreError::Io`] if removal fails.
    pub fn drop_database(name: &str) -> CoreResult<()> {
        Self::drop_database_in(Path::new("."), name)
    }

    /// Removes the backing file of the database called `name` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such database exists, or
    /// [`CoreError::Io`] if removal fails.
    pub fn drop_database_in(dir: &Path, name: &str) -> CoreResult<()> {
        let path = dir.join(format!("{name}.{DB_EXT}"));
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "dropped database");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CoreError::not_found(format!(
                "database '{name}' does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl<E: KvEngine> EmbeddedStore<E> {
    /// Wraps an already-open engine. Intended for tests and for callers
    /// that manage the engine themselves.
    pub fn with_engine(engine: E, config: Config) -> Self {
        Self { engine, config }
    }

    /// Creates the collection `name` if it does not already exist.
    ///
    /// Runs in its own transaction; on failure the database is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on an empty name or
    /// [`CoreError::Engine`] if the transaction fails.
    pub fn create_collection(&self, name: &str) -> CoreResult<()> {
        if name.is_empty() {
            return Err(CoreError::validation("collection name is empty"));
        }

        let mut tx = self.engine.begin_write()?;
        tx.create_bucket(name)?;
        tx.commit()?;
        debug!(collection = name, "created collection");
        Ok(())
    }

    /// Returns a query builder bound to this store and `name`.
    ///
    /// Construction touches no storage; execution happens on the builder's
    /// terminal operations.
    pub fn coll(&self, name: &str) -> Filter<'_, E> {
        Filter::new(self, name)
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }
}
