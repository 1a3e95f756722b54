//! Backend-agnostic document store capability.

use crate::embedded::EmbeddedStore;
use crate::error::{CoreError, CoreResult};
use crate::flatfile::FlatFileStore;
use folio_codec::Record;
use folio_engine::{KvEngine, ReadTx, WriteTx};

/// The document-store surface both backends expose.
///
/// Callers and tests written against this trait work unchanged on either
/// backend. Resources are addressed by name: the flat-file backend uses
/// the name as the record's file name, the embedded backend interprets it
/// as the decimal rendering of a sequence identifier.
///
/// # Invariants
///
/// - Empty collection or resource names fail validation
/// - A record is always fully written or not written at all
/// - `read_all` returns raw serialized records in unspecified order
pub trait DocumentStore: Send + Sync {
    /// Writes `record` under `collection/resource`, replacing previous
    /// content atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the names are invalid, the record cannot be
    /// encoded, or the backend fails.
    fn write(&self, collection: &str, resource: &str, record: &Record) -> CoreResult<()>;

    /// Reads the record stored under `collection/resource`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such record exists.
    fn read(&self, collection: &str, resource: &str) -> CoreResult<Record>;

    /// Returns the raw serialized contents of every record in
    /// `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the collection does not exist.
    fn read_all(&self, collection: &str) -> CoreResult<Vec<String>>;

    /// Deletes the record stored under `collection/resource`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such record exists.
    fn delete(&self, collection: &str, resource: &str) -> CoreResult<()>;
}

impl DocumentStore for FlatFileStore {
    fn write(&self, collection: &str, resource: &str, record: &Record) -> CoreResult<()> {
        FlatFileStore::write(self, collection, resource, record)
    }

    fn read(&self, collection: &str, resource: &str) -> CoreResult<Record> {
        FlatFileStore::read(self, collection, resource)
    }

    fn read_all(&self, collection: &str) -> CoreResult<Vec<String>> {
        FlatFileStore::read_all(self, collection)
    }

    fn delete(&self, collection: &str, resource: &str) -> CoreResult<()> {
        FlatFileStore::delete(self, collection, resource)
    }
}

impl<E: KvEngine> DocumentStore for EmbeddedStore<E> {
    fn write(&self, collection: &str, resource: &str, record: &Record) -> CoreResult<()> {
        let id = parse_resource(collection, resource)?;

        let mut tx = self.engine().begin_write()?;
        tx.create_bucket(collection)?;
        // Keep future assigned identifiers clear of this explicit one.
        tx.ensure_sequence(collection, id)?;
        let bytes = self.config().encoder.encode(record)?;
        tx.put(collection, &id.to_be_bytes(), &bytes)?;
        tx.commit()?;
        Ok(())
    }

    fn read(&self, collection: &str, resource: &str) -> CoreResult<Record> {
        let id = parse_resource(collection, resource)?;

        let tx = self.engine().begin_read()?;
        let bytes = tx.get(collection, &id.to_be_bytes())?.ok_or_else(|| {
            CoreError::not_found(format!("record '{collection}/{resource}' does not exist"))
        })?;
        Ok(self.config().decoder.decode(&bytes)?)
    }

    fn read_all(&self, collection: &str) -> CoreResult<Vec<String>> {
        if collection.is_empty() {
            return Err(CoreError::validation("collection name is empty"));
        }

        let tx = self.engine().begin_read()?;
        let entries = tx.scan(collection)?;
        entries
            .into_iter()
            .map(|(_, value)| {
                String::from_utf8(value).map_err(|_| {
                    CoreError::Codec(folio_codec::CodecError::decode_failed(
                        "record is not valid UTF-8",
                    ))
                })
            })
            .collect()
    }

    fn delete(&self, collection: &str, resource: &str) -> CoreResult<()> {
        let id = parse_resource(collection, resource)?;

        let mut tx = self.engine().begin_write()?;
        if tx.get(collection, &id.to_be_bytes())?.is_none() {
            return Err(CoreError::not_found(format!(
                "record '{collection}/{resource}' does not exist"
            )));
        }
        tx.delete(collection, &id.to_be_bytes())?;
        tx.commit()?;
        Ok(())
    }
}

fn parse_resource(collection: &str, resource: &str) -> CoreResult<u64> {
    if collection.is_empty() {
        return Err(CoreError::validation("collection name is empty"));
    }
    if resource.is_empty() {
        return Err(CoreError::validation("resource name is empty"));
    }
    resource.parse().map_err(|_| {
        CoreError::validation(format!(
            "resource '{resource}' is not a record identifier"
        ))
    })
}
