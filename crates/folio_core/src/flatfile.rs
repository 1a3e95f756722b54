//! Flat-file backend: one JSON file per record.
//!
//! On-disk layout:
//!
//! ```text
//! <root>/
//! ├─ users/
//! │  ├─ karn.json
//! │  └─ naphob.json
//! └─ orders/
//!    └─ 2041.json
//! ```
//!
//! Writes stage through `<resource>.json.tmp` and become visible in a
//! single atomic rename, so a concurrent reader sees either the previous
//! record or the new one, never a torn file.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::registry::MutexRegistry;
use folio_codec::Record;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension for stored records.
const RECORD_EXT: &str = "json";

/// Suffix for staged writes awaiting rename.
const TMP_SUFFIX: &str = "tmp";

/// A directory-rooted document store.
///
/// Mutations against one collection are serialized by a per-collection
/// lock held for the whole call; different collections proceed fully in
/// parallel. Reads are not synchronized against writes — the atomic rename
/// guarantees they still never observe partial content.
///
/// # Example
///
/// ```no_run
/// use folio_core::{Config, FlatFileStore, Record};
///
/// let store = FlatFileStore::open("./data", Config::default()).unwrap();
/// let mut record = Record::new();
/// record.insert("Name".to_string(), "Karn".into());
/// store.write("users", "karn", &record).unwrap();
/// ```
#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
    config: Config,
    mutexes: MutexRegistry,
}

impl FlatFileStore {
    /// Opens a store rooted at `root`, creating the directory and all of
    /// its parents if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let root: PathBuf = root.as_ref().components().collect();

        if root.exists() {
            debug!(root = %root.display(), "using existing database directory");
        } else {
            debug!(root = %root.display(), "creating database directory");
            fs::create_dir_all(&root)?;
        }

        Ok(Self {
            root,
            config,
            mutexes: MutexRegistry::new(),
        })
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `record` under `collection/resource`, replacing any previous
    /// content atomically.
    ///
    /// Holds the collection's lock for the full call. A failed encode or a
    /// failed staged write leaves the previous record (if any) untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on empty names,
    /// [`CoreError::Codec`] if the record cannot be encoded, or
    /// [`CoreError::Io`] on filesystem failure.
    pub fn write(&self, collection: &str, resource: &str, record: &Record) -> CoreResult<()> {
        validate_names(collection, resource)?;

        let lock = self.mutexes.get(collection);
        let _guard = lock.lock();

        let dir = self.root.join(collection);
        fs::create_dir_all(&dir)?;

        let bytes = self.config.encoder.encode(record)?;

        let final_path = dir.join(format!("{resource}.{RECORD_EXT}"));
        let tmp_path = dir.join(format!("{resource}.{RECORD_EXT}.{TMP_SUFFIX}"));
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Reads the record stored under `collection/resource`.
    ///
    /// The resource is accepted with or without its stored file extension.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on empty names,
    /// [`CoreError::NotFound`] if no such record exists, or
    /// [`CoreError::Codec`] on malformed content.
    pub fn read(&self, collection: &str, resource: &str) -> CoreResult<Record> {
        validate_names(collection, resource)?;

        let path = self.resolve_record(collection, resource).ok_or_else(|| {
            CoreError::not_found(format!("record '{collection}/{resource}' does not exist"))
        })?;

        let bytes = fs::read(path)?;
        Ok(self.config.decoder.decode(&bytes)?)
    }

    /// Returns the raw serialized contents of every record in
    /// `collection`, in directory enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on an empty collection name,
    /// [`CoreError::NotFound`] if the collection does not exist, or
    /// [`CoreError::Io`] if any entry cannot be read.
    pub fn read_all(&self, collection: &str) -> CoreResult<Vec<String>> {
        if collection.is_empty() {
            return Err(CoreError::validation("collection name is empty"));
        }

        let dir = self.root.join(collection);
        if !dir.is_dir() {
            return Err(CoreError::not_found(format!(
                "collection '{collection}' does not exist"
            )));
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            records.push(fs::read_to_string(entry?.path())?);
        }
        Ok(records)
    }

    /// Deletes the record (or nested directory) stored under
    /// `collection/resource`, holding the collection's lock for the call.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on empty names,
    /// [`CoreError::NotFound`] if the target does not exist, or
    /// [`CoreError::Io`] on filesystem failure.
    pub fn delete(&self, collection: &str, resource: &str) -> CoreResult<()> {
        validate_names(collection, resource)?;

        let lock = self.mutexes.get(collection);
        let _guard = lock.lock();

        let target = self.root.join(collection).join(resource);
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
            return Ok(());
        }

        match self.resolve_record(collection, resource) {
            Some(path) => {
                fs::remove_file(path)?;
                Ok(())
            }
            None => Err(CoreError::not_found(format!(
                "record '{collection}/{resource}' does not exist"
            ))),
        }
    }

    /// Resolves a resource to its file, trying the bare name first and the
    /// name with the record extension second.
    fn resolve_record(&self, collection: &str, resource: &str) -> Option<PathBuf> {
        let dir = self.root.join(collection);

        let bare = dir.join(resource);
        if bare.is_file() {
            return Some(bare);
        }

        let with_ext = dir.join(format!("{resource}.{RECORD_EXT}"));
        with_ext.is_file().then_some(with_ext)
    }
}

fn validate_names(collection: &str, resource: &str) -> CoreResult<()> {
    if collection.is_empty() {
        return Err(CoreError::validation("collection name is empty"));
    }
    if resource.is_empty() {
        return Err(CoreError::validation("resource name is empty"));
    }
    Ok(())
}
