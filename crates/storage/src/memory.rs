//! In-memory document store
//!
//! `MemoryStore` is the ephemeral database the mapper is exercised against.
//!
//! # Design
//!
//! - DashMap keyed by collection name: writes lock only the target collection
//! - Per-collection `IndexMap` with FxHash: O(1) lookups, deterministic
//!   insertion-order scans for filters
//! - Every write applies its diff to a copy and swaps it in, so a failing
//!   diff leaves the stored document untouched

use crate::traits::{Storage, StoredDocument, WriteAck};
use async_trait::async_trait;
use dashmap::DashMap;
use docmap_core::{DocId, Error, JsonMap, JsonValue, PersistenceDiff, Result, ID_KEY, VERSION_KEY};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

pub(crate) type Collection = IndexMap<DocId, StoredDocument, BuildHasherDefault<FxHasher>>;

/// Ephemeral, process-local document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
    /// Storage writes attempted through [`Storage::write`]
    writes: AtomicU64,
    /// Injected failure for the next write
    fail_next: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `Storage::write` calls received so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Make the next `Storage::write` fail with a conflict carrying `reason`
    pub fn fail_next_write(&self, reason: impl Into<String>) {
        *self.fail_next.lock() = Some(reason.into());
    }

    /// Seed a document directly, bypassing the mapper
    ///
    /// `document` must be an object; `_id` and `__v` keys are stripped.
    pub fn insert_raw(&self, collection: &str, id: DocId, document: JsonValue) -> Result<()> {
        let values = document_values(document)?;
        let mut coll = self.collections.entry(collection.to_string()).or_default();
        if coll.contains_key(&id) {
            return Err(conflict(collection, id, "document already exists"));
        }
        coll.insert(id, StoredDocument::new(id, values));
        Ok(())
    }

    /// Read a document without going through the async interface
    pub fn get_raw(&self, collection: &str, id: &DocId) -> Option<StoredDocument> {
        self.collections
            .get(collection)
            .and_then(|coll| coll.get(id).cloned())
    }

    /// Number of documents in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|coll| coll.len())
            .unwrap_or(0)
    }

    /// Names of collections holding at least one document
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Drop every collection
    pub fn clear(&self) {
        self.collections.clear();
    }

    pub(crate) fn with_collection<R>(&self, collection: &str, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut coll = self.collections.entry(collection.to_string()).or_default();
        f(&mut coll)
    }

    pub(crate) fn read_collection<R>(&self, collection: &str, f: impl FnOnce(&Collection) -> R) -> Option<R> {
        self.collections.get(collection).map(|coll| f(&coll))
    }

    fn write_sync(
        &self,
        collection: &str,
        id: &DocId,
        diff: &PersistenceDiff,
        is_insert: bool,
    ) -> Result<WriteAck> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = self.fail_next.lock().take() {
            return Err(conflict(collection, *id, reason));
        }

        self.with_collection(collection, |coll| {
            if is_insert {
                if coll.contains_key(id) {
                    return Err(conflict(collection, *id, "document already exists"));
                }
                let mut doc = JsonValue::object();
                diff.apply_to(&mut doc)?;
                let values = document_values(doc)?;
                coll.insert(*id, StoredDocument::new(*id, values));
                debug!(collection, %id, fields = diff.len(), "inserted document");
                return Ok(WriteAck {
                    id: *id,
                    version: 0,
                    inserted: true,
                    modified: true,
                });
            }

            let stored = coll
                .get_mut(id)
                .ok_or_else(|| conflict(collection, *id, "document not found"))?;
            let modified = apply_to_stored(stored, diff)?;
            debug!(collection, %id, paths = %diff, modified, "updated document");
            Ok(WriteAck {
                id: *id,
                version: stored.version,
                inserted: false,
                modified,
            })
        })
    }
}

/// Apply `diff` to a stored document, bumping its version if content changed
pub(crate) fn apply_to_stored(stored: &mut StoredDocument, diff: &PersistenceDiff) -> Result<bool> {
    let mut doc = JsonValue::from(stored.values.clone());
    diff.apply_to(&mut doc)?;
    let values = document_values(doc)?;
    let modified = values != stored.values;
    if modified {
        stored.values = values;
        stored.version += 1;
    }
    Ok(modified)
}

/// Extract the field map of a document value, stripping reserved keys
pub(crate) fn document_values(document: JsonValue) -> Result<JsonMap> {
    match document.into_inner() {
        serde_json::Value::Object(mut map) => {
            map.remove(ID_KEY);
            map.remove(VERSION_KEY);
            Ok(map)
        }
        other => Err(Error::Storage(format!(
            "document must be an object, found {}",
            docmap_core::type_name(&other)
        ))),
    }
}

pub(crate) fn conflict(collection: &str, id: DocId, reason: impl Into<String>) -> Error {
    Error::Conflict {
        collection: collection.to_string(),
        id,
        reason: reason.into(),
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn fetch_by_id(&self, collection: &str, id: &DocId) -> Result<Option<StoredDocument>> {
        let found = self.get_raw(collection, id);
        trace!(collection, %id, found = found.is_some(), "fetch by id");
        Ok(found)
    }

    async fn write(
        &self,
        collection: &str,
        id: &DocId,
        diff: &PersistenceDiff,
        is_insert: bool,
    ) -> Result<WriteAck> {
        self.write_sync(collection, id, diff, is_insert)
    }
}
