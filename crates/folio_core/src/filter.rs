//! Query builder for the embedded backend.

use crate::embedded::EmbeddedStore;
use crate::error::{CoreError, CoreResult};
use folio_codec::{Record, Value};
use folio_engine::{KvEngine, ReadTx, WriteTx};
use tracing::debug;

/// Field name under which a record's sequence identifier is exposed.
const ID_FIELD: &str = "id";

type Comparison = fn(&Value, &Value) -> bool;

fn eq_values(a: &Value, b: &Value) -> bool {
    a == b
}

/// One predicate group: a set of field expectations combined with a
/// comparison function.
struct PredicateGroup {
    fields: Record,
    comp: Comparison,
}

impl PredicateGroup {
    /// Every field of the group must match. The `id` field compares
    /// against the record's assigned sequence number.
    fn matches(&self, id: u64, record: &Record) -> bool {
        self.fields.iter().all(|(field, expected)| {
            if field == ID_FIELD {
                (self.comp)(&Value::from(id), expected)
            } else {
                record
                    .get(field)
                    .is_some_and(|actual| (self.comp)(actual, expected))
            }
        })
    }
}

/// A chainable query over one collection.
///
/// Predicates, projection, and limit accumulate through the builder calls;
/// storage is touched only by the terminal operations ([`Filter::insert`],
/// [`Filter::update`], [`Filter::find`], [`Filter::delete`]). A record
/// satisfies the filter only if every accumulated predicate group matches.
///
/// # Example
///
/// ```no_run
/// use folio_core::{Config, EmbeddedStore, Record};
///
/// let store = EmbeddedStore::open(Config::default()).unwrap();
///
/// let mut rec = Record::new();
/// rec.insert("Name".to_string(), "Karn".into());
/// store.coll("users").insert(&rec).unwrap();
///
/// let mut by_name = Record::new();
/// by_name.insert("Name".to_string(), "Karn".into());
/// let found = store.coll("users").eq(by_name).find().unwrap();
/// assert_eq!(found.len(), 1);
/// ```
pub struct Filter<'s, E: KvEngine> {
    store: &'s EmbeddedStore<E>,
    collection: String,
    groups: Vec<PredicateGroup>,
    projection: Option<Vec<String>>,
    limit: Option<usize>,
}

impl<'s, E: KvEngine> Filter<'s, E> {
    pub(crate) fn new(store: &'s EmbeddedStore<E>, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
            groups: Vec::new(),
            projection: None,
            limit: None,
        }
    }

    /// Appends an equality predicate group.
    #[must_use]
    pub fn eq(mut self, fields: Record) -> Self {
        self.groups.push(PredicateGroup {
            fields,
            comp: eq_values,
        });
        self
    }

    /// Restricts which fields are materialized by subsequent reads.
    ///
    /// Matching is unaffected; the `id` field is always materialized.
    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Caps the number of records [`Filter::find`] returns.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Inserts `record` into the collection and returns its assigned
    /// sequence identifier.
    ///
    /// Runs in one write transaction: the bucket is created if absent, the
    /// identifier comes from the bucket's monotonic sequence counter, and
    /// any failure rolls the whole transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] on an empty collection name,
    /// [`CoreError::Codec`] if the record cannot be encoded, or
    /// [`CoreError::Engine`] if the transaction fails.
    pub fn insert(&self, record: &Record) -> CoreResult<u64> {
        self.validate()?;

        let mut tx = self.store.engine().begin_write()?;
        tx.create_bucket(&self.collection)?;
        let id = tx.next_sequence(&self.collection)?;
        let bytes = self.store.config().encoder.encode(record)?;
        tx.put(&self.collection, &id.to_be_bytes(), &bytes)?;
        tx.commit()?;

        debug!(collection = %self.collection, id, "inserted record");
        Ok(id)
    }

    /// Merges the fields of `changes` into every matching record and
    /// rewrites them, returning the updated records.
    ///
    /// Runs in one write transaction; the commit happens only if every
    /// rewrite succeeds, so a reader never observes a half-applied update.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the collection does not exist,
    /// [`CoreError::Codec`] on encode/decode failure, or
    /// [`CoreError::Engine`] if the transaction fails.
    pub fn update(&self, changes: &Record) -> CoreResult<Vec<Record>> {
        self.validate()?;

        let mut tx = self.store.engine().begin_write()?;
        let entries = tx.scan(&self.collection)?;

        let mut updated = Vec::new();
        for (key, value) in entries {
            let Some(id) = record_id(&key) else { continue };
            let mut record = self.store.config().decoder.decode(&value)?;
            if !self.matches(id, &record) {
                continue;
            }

            for (field, new_value) in changes {
                record.insert(field.clone(), new_value.clone());
            }
            let bytes = self.store.config().encoder.encode(&record)?;
            tx.put(&self.collection, &key, &bytes)?;

            record.insert(ID_FIELD.to_string(), Value::from(id));
            updated.push(record);
        }
        tx.commit()?;

        debug!(collection = %self.collection, count = updated.len(), "updated records");
        Ok(updated)
    }

    /// Returns every matching record, with projection and limit applied.
    ///
    /// Records are materialized with their `id` field populated from the
    /// stored key; the key-derived value wins over any stored field of the
    /// same name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the collection does not exist or
    /// [`CoreError::Codec`] if a stored record cannot be decoded.
    pub fn find(&self) -> CoreResult<Vec<Record>> {
        self.validate()?;

        let tx = self.store.engine().begin_read()?;
        let entries = tx.scan(&self.collection)?;

        let mut results = Vec::new();
        for (key, value) in entries {
            if self.limit.is_some_and(|limit| results.len() >= limit) {
                break;
            }
            let Some(id) = record_id(&key) else { continue };
            let record = self.store.config().decoder.decode(&value)?;
            if self.matches(id, &record) {
                results.push(self.materialize(id, record));
            }
        }
        Ok(results)
    }

    /// Deletes every matching record and returns how many were removed.
    ///
    /// The collection's sequence counter is untouched, so removed
    /// identifiers are never handed out again.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the collection does not exist,
    /// [`CoreError::Codec`] on decode failure, or [`CoreError::Engine`] if
    /// the transaction fails.
    pub fn delete(&self) -> CoreResult<usize> {
        self.validate()?;

        let mut tx = self.store.engine().begin_write()?;
        let entries = tx.scan(&self.collection)?;

        let mut removed = 0;
        for (key, value) in entries {
            let Some(id) = record_id(&key) else { continue };
            let record = self.store.config().decoder.decode(&value)?;
            if !self.matches(id, &record) {
                continue;
            }
            tx.delete(&self.collection, &key)?;
            removed += 1;
        }
        tx.commit()?;

        debug!(collection = %self.collection, removed, "deleted records");
        Ok(removed)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.collection.is_empty() {
            return Err(CoreError::validation("collection name is empty"));
        }
        Ok(())
    }

    fn matches(&self, id: u64, record: &Record) -> bool {
        self.groups.iter().all(|group| group.matches(id, record))
    }

    fn materialize(&self, id: u64, mut record: Record) -> Record {
        if let Some(projection) = &self.projection {
            record.retain(|field, _| projection.iter().any(|kept| kept == field));
        }
        record.insert(ID_FIELD.to_string(), Value::from(id));
        record
    }
}

/// Decodes a stored key back into a sequence identifier.
fn record_id(key: &[u8]) -> Option<u64> {
    <[u8; 8]>::try_from(key).ok().map(u64::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use folio_codec::{CodecError, CodecResult, Encoder, JsonEncoder};
    use folio_engine::MemoryEngine;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn memory_store() -> EmbeddedStore<MemoryEngine> {
        EmbeddedStore::with_engine(MemoryEngine::new(), Config::default())
    }

    #[test]
    fn insert_assigns_sequential_identifiers() {
        let store = memory_store();
        let a = store.coll("users").insert(&record(json!({"Name": "A"})));
        let b = store.coll("users").insert(&record(json!({"Name": "B"})));
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
    }

    #[test]
    fn identifiers_are_never_reused_after_delete() {
        let store = memory_store();
        let users = store.coll("users");

        assert_eq!(users.insert(&record(json!({"Name": "A"}))).unwrap(), 1);
        assert_eq!(users.insert(&record(json!({"Name": "B"}))).unwrap(), 2);

        let removed = store
            .coll("users")
            .eq(record(json!({"id": 1})))
            .delete()
            .unwrap();
        assert_eq!(removed, 1);

        assert_eq!(users.insert(&record(json!({"Name": "C"}))).unwrap(), 3);
    }

    #[test]
    fn find_matches_on_field_equality() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A", "Age": 23}))).unwrap();
        users.insert(&record(json!({"Name": "B", "Age": 25}))).unwrap();

        let found = store
            .coll("users")
            .eq(record(json!({"Name": "B"})))
            .find()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Age"], 25);
        assert_eq!(found[0]["id"], 2);
    }

    #[test]
    fn find_matches_on_identifier() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A"}))).unwrap();
        users.insert(&record(json!({"Name": "B"}))).unwrap();

        let found = store
            .coll("users")
            .eq(record(json!({"id": 2})))
            .find()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Name"], "B");
    }

    #[test]
    fn every_field_of_a_group_must_match() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A", "Age": 23}))).unwrap();

        let found = store
            .coll("users")
            .eq(record(json!({"Name": "A", "Age": 24})))
            .find()
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn groups_combine_with_logical_and() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A", "Age": 23}))).unwrap();
        users.insert(&record(json!({"Name": "A", "Age": 25}))).unwrap();

        let found = store
            .coll("users")
            .eq(record(json!({"Name": "A"})))
            .eq(record(json!({"Age": 25})))
            .find()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], 2);
    }

    #[test]
    fn missing_field_never_matches() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A"}))).unwrap();

        let found = store
            .coll("users")
            .eq(record(json!({"Age": 23})))
            .find()
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_filter_matches_everything() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A"}))).unwrap();
        users.insert(&record(json!({"Name": "B"}))).unwrap();

        assert_eq!(store.coll("users").find().unwrap().len(), 2);
    }

    #[test]
    fn select_projects_materialized_fields() {
        let store = memory_store();
        let users = store.coll("users");
        users
            .insert(&record(json!({"Name": "A", "Age": 23, "City": "Bangkok"})))
            .unwrap();

        let found = store
            .coll("users")
            .select(["Name"])
            .find()
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Name"], "A");
        assert_eq!(found[0]["id"], 1);
        assert!(!found[0].contains_key("Age"));
        assert!(!found[0].contains_key("City"));
    }

    #[test]
    fn limit_caps_results() {
        let store = memory_store();
        let users = store.coll("users");
        for i in 0..5 {
            users.insert(&record(json!({"N": i}))).unwrap();
        }

        assert_eq!(store.coll("users").limit(2).find().unwrap().len(), 2);
    }

    #[test]
    fn update_merges_fields_into_matches() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A", "Age": 23}))).unwrap();
        users.insert(&record(json!({"Name": "B", "Age": 25}))).unwrap();

        let updated = store
            .coll("users")
            .eq(record(json!({"Name": "A"})))
            .update(&record(json!({"Age": 24, "City": "Bangkok"})))
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["Age"], 24);
        assert_eq!(updated[0]["id"], 1);

        let found = store
            .coll("users")
            .eq(record(json!({"id": 1})))
            .find()
            .unwrap();
        assert_eq!(found[0]["Age"], 24);
        assert_eq!(found[0]["City"], "Bangkok");

        let untouched = store
            .coll("users")
            .eq(record(json!({"id": 2})))
            .find()
            .unwrap();
        assert_eq!(untouched[0]["Age"], 25);
    }

    #[test]
    fn update_on_missing_collection_is_not_found() {
        let store = memory_store();
        assert!(matches!(
            store.coll("ghosts").update(&record(json!({"X": 1}))),
            Err(CoreError::NotFound { .. })
        ));
    }

    /// Encoder that fails for records carrying both trip fields, letting a
    /// multi-record update succeed partway and then blow up.
    struct TripwireEncoder;

    impl Encoder for TripwireEncoder {
        fn encode(&self, record: &Record) -> CodecResult<Vec<u8>> {
            if record.contains_key("fuse") && record.contains_key("boom") {
                return Err(CodecError::encode_failed("tripwire"));
            }
            JsonEncoder::pretty().encode(record)
        }
    }

    #[test]
    fn failed_update_rolls_back_every_rewrite() {
        let store = EmbeddedStore::with_engine(
            MemoryEngine::new(),
            Config::default().encoder(Arc::new(TripwireEncoder)),
        );
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A"}))).unwrap();
        users.insert(&record(json!({"Name": "B", "fuse": 1}))).unwrap();

        // Rewriting A succeeds, rewriting B trips the encoder.
        let err = store.coll("users").update(&record(json!({"boom": 1})));
        assert!(matches!(err, Err(CoreError::Codec(_))));

        let all = store.coll("users").find().unwrap();
        assert_eq!(all.len(), 2);
        for r in all {
            assert!(!r.contains_key("boom"));
        }
    }

    #[test]
    fn delete_removes_only_matches() {
        let store = memory_store();
        let users = store.coll("users");
        users.insert(&record(json!({"Name": "A"}))).unwrap();
        users.insert(&record(json!({"Name": "B"}))).unwrap();

        let removed = store
            .coll("users")
            .eq(record(json!({"Name": "A"})))
            .delete()
            .unwrap();
        assert_eq!(removed, 1);

        let rest = store.coll("users").find().unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["Name"], "B");
    }

    #[test]
    fn empty_collection_name_fails_validation() {
        let store = memory_store();
        assert!(matches!(
            store.coll("").insert(&record(json!({}))),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn concurrent_inserts_assign_unique_increasing_identifiers() {
        let dir = tempdir().unwrap();
        let store = Arc::new(EmbeddedStore::open_in(dir.path(), Config::default()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    for i in 0..4 {
                        let id = store
                            .coll("users")
                            .insert(&record(json!({"Worker": worker, "N": i})))
                            .unwrap();
                        ids.push(id);
                    }
                    ids
                })
            })
            .collect();

        let mut all_ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        all_ids.sort_unstable();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 32);
        assert_eq!(*all_ids.last().unwrap(), 32);
    }
}
