//! Storage collaborator interface
//!
//! The mapper core consumes storage only through this trait. Implementations
//! own wire protocols, sessions and retry policy; the core never retries.

use async_trait::async_trait;
use docmap_core::{DocId, JsonMap, JsonValue, PersistenceDiff, Result, ID_KEY, VERSION_KEY};

/// A document as held by storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document id
    pub id: DocId,
    /// Number of content-changing updates applied since insert
    pub version: u64,
    /// Field values, without `_id` / `__v`
    pub values: JsonMap,
}

impl StoredDocument {
    /// New document at version 0
    pub fn new(id: DocId, values: JsonMap) -> Self {
        Self {
            id,
            version: 0,
            values,
        }
    }

    /// Lean view: values plus `_id` and `__v`
    pub fn to_json(&self) -> JsonValue {
        self.lean(true)
    }

    /// Lean view; `__v` is added only when `version_key` is set
    pub fn lean(&self, version_key: bool) -> JsonValue {
        let mut map = JsonMap::with_capacity(self.values.len() + 2);
        map.insert(ID_KEY.to_string(), self.id.to_json());
        map.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        if version_key {
            map.insert(VERSION_KEY.to_string(), serde_json::Value::from(self.version));
        }
        JsonValue::from(map)
    }
}

/// Acknowledgement of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    /// Document written
    pub id: DocId,
    /// Version after the write
    pub version: u64,
    /// The write created the document
    pub inserted: bool,
    /// The write changed stored content
    pub modified: bool,
}

impl WriteAck {
    /// Ack for a save that needed no storage round trip
    pub fn unchanged(id: DocId, version: u64) -> Self {
        Self {
            id,
            version,
            inserted: false,
            modified: false,
        }
    }
}

/// Key-value document store with CRUD and atomic per-document read-modify-write
///
/// Thread safety: All methods must be safe to call concurrently (Send + Sync).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch a document by id
    ///
    /// Returns `Ok(None)` if no such document exists.
    async fn fetch_by_id(&self, collection: &str, id: &DocId) -> Result<Option<StoredDocument>>;

    /// Write `diff` to the document `id`
    ///
    /// With `is_insert` the document must not exist yet and is created from the
    /// diff. Otherwise the document must exist and the diff is applied to it
    /// atomically.
    ///
    /// # Errors
    ///
    /// `Error::Conflict` if the insert/update precondition fails. Callers
    /// receive the error unchanged.
    async fn write(
        &self,
        collection: &str,
        id: &DocId,
        diff: &PersistenceDiff,
        is_insert: bool,
    ) -> Result<WriteAck>;
}
