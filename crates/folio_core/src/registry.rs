//! Per-collection lock registry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Lazily creates and caches one lock per collection name.
///
/// Each registry is owned by a single store instance, so independently
/// lived stores never contend on unrelated locks. A collection's lock is
/// created at most once and shared by every operation on that collection
/// for the store's lifetime.
///
/// The registry's own lock is held only while looking up or inserting an
/// entry, never across I/O.
#[derive(Debug, Default)]
pub struct MutexRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MutexRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `collection`, creating it on first use.
    pub fn get(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
