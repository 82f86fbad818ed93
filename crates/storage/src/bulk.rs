//! Filtered updates and bulk writes over `MemoryStore`
//!
//! Filters are plain equality matches on dotted paths. There is no query
//! language here; `_id` is matched against the document id.

use crate::memory::{apply_to_stored, conflict, document_values, MemoryStore};
use crate::traits::StoredDocument;
use docmap_core::{
    DocId, Error, FieldPath, JsonMap, JsonValue, PersistenceDiff, Result, ID_KEY,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Equality filter over dotted paths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<DocId>,
    fields: Vec<(FieldPath, serde_json::Value)>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on document id
    pub fn by_id(id: DocId) -> Self {
        Self {
            id: Some(id),
            fields: Vec::new(),
        }
    }

    /// Add an equality condition (builder pattern)
    pub fn eq(mut self, path: FieldPath, value: impl Into<JsonValue>) -> Self {
        self.fields.push((path, value.into().into_inner()));
        self
    }

    /// Build from a `{ "dotted.path": value }` map
    pub fn from_json(map: &JsonMap) -> Result<Self> {
        let mut filter = Filter::all();
        for (key, value) in map {
            if key == ID_KEY {
                let id = DocId::from_json(value).ok_or_else(|| Error::InvalidValue {
                    path: ID_KEY.to_string(),
                    expected: "document id",
                    found: docmap_core::type_name(value),
                })?;
                filter.id = Some(id);
            } else {
                filter.fields.push((key.parse()?, value.clone()));
            }
        }
        Ok(filter)
    }

    /// Whether `doc` satisfies every condition
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        if let Some(id) = &self.id {
            if *id != doc.id {
                return false;
            }
        }
        if self.fields.is_empty() {
            return true;
        }
        let values = JsonValue::from(doc.values.clone());
        self.fields
            .iter()
            .all(|(path, expected)| values.get_path(path) == Some(expected))
    }

    /// Seed document for an upsert: the filter's field conditions
    fn seed(&self) -> Result<JsonValue> {
        let mut doc = JsonValue::object();
        for (path, value) in &self.fields {
            doc.set_path(path, value.clone())
                .map_err(|reason| Error::invalid_path(path.to_string(), reason))?;
        }
        Ok(doc)
    }
}

/// Outcome of [`MemoryStore::update_one`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matched by the filter (0 or 1)
    pub matched_count: u64,
    /// Documents whose content changed
    pub modified_count: u64,
    /// Id of the inserted document, if the update upserted
    pub upserted_id: Option<DocId>,
}

/// One operation of a bulk write
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOp {
    /// Insert a document; `_id` is taken from the document or generated
    InsertOne {
        /// Document to insert
        document: JsonMap,
    },
    /// Update the first matching document
    UpdateOne {
        /// Equality filter
        filter: JsonMap,
        /// Dotted-path update
        update: JsonMap,
        /// Insert from filter + update when nothing matches
        upsert: bool,
    },
    /// Delete the first matching document
    DeleteOne {
        /// Equality filter
        filter: JsonMap,
    },
}

/// Counts reported by [`MemoryStore::bulk_write`]
///
/// Id maps are keyed by the index of the operation that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteResult {
    /// Documents inserted by `InsertOne`
    pub inserted_count: u64,
    /// Documents matched by `UpdateOne`
    pub matched_count: u64,
    /// Documents changed by `UpdateOne`
    pub modified_count: u64,
    /// Documents removed by `DeleteOne`
    pub deleted_count: u64,
    /// Documents inserted by upserting `UpdateOne`
    pub upserted_count: u64,
    /// Op index -> upserted id
    pub upserted_ids: BTreeMap<usize, DocId>,
    /// Op index -> inserted id
    pub inserted_ids: BTreeMap<usize, DocId>,
}

/// Turn a dotted update map into a diff
fn update_diff(update: &JsonMap) -> Result<PersistenceDiff> {
    let mut diff = PersistenceDiff::new();
    for (key, value) in update {
        if key == ID_KEY {
            return Err(Error::invalid_path(key.clone(), "document id is immutable"));
        }
        diff.push(key.parse()?, value.clone());
    }
    Ok(diff)
}

impl MemoryStore {
    /// First document in `collection` matching `filter`
    pub fn find_one(&self, collection: &str, filter: &Filter) -> Option<StoredDocument> {
        self.read_collection(collection, |coll| {
            coll.values().find(|doc| filter.matches(doc)).cloned()
        })
        .flatten()
    }

    /// Apply a dotted-path update to the first document matching `filter`
    ///
    /// A key mapped to `null` writes null; keys not in `update` are untouched.
    /// With `upsert` and no match, a document built from the filter's
    /// conditions plus the update is inserted.
    pub fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &JsonMap,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let diff = update_diff(update)?;
        self.with_collection(collection, |coll| {
            if let Some(stored) = coll.values_mut().find(|doc| filter.matches(doc)) {
                let modified = apply_to_stored(stored, &diff)?;
                debug!(collection, id = %stored.id, modified, "update_one matched");
                return Ok(UpdateResult {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                });
            }
            if !upsert {
                return Ok(UpdateResult::default());
            }

            let id = filter.id.unwrap_or_default();
            if coll.contains_key(&id) {
                return Err(conflict(collection, id, "document already exists"));
            }
            let mut doc = filter.seed()?;
            diff.apply_to(&mut doc)?;
            coll.insert(id, StoredDocument::new(id, document_values(doc)?));
            debug!(collection, %id, "update_one upserted");
            Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                upserted_id: Some(id),
            })
        })
    }

    /// Remove the first document matching `filter`; returns whether one was removed
    pub fn delete_one(&self, collection: &str, filter: &Filter) -> bool {
        self.with_collection(collection, |coll| {
            let found = coll
                .iter()
                .find(|(_, doc)| filter.matches(doc))
                .map(|(id, _)| *id);
            match found {
                Some(id) => {
                    coll.shift_remove(&id);
                    debug!(collection, %id, "deleted document");
                    true
                }
                None => false,
            }
        })
    }

    /// Apply `ops` in order
    ///
    /// The first failing operation aborts the remaining ones and its error is
    /// returned; operations before it stay applied.
    pub fn bulk_write(&self, collection: &str, ops: &[BulkOp]) -> Result<BulkWriteResult> {
        let mut result = BulkWriteResult::default();
        for (index, op) in ops.iter().enumerate() {
            match op {
                BulkOp::InsertOne { document } => {
                    let id = match document.get(ID_KEY) {
                        Some(raw) => DocId::from_json(raw).ok_or_else(|| Error::InvalidValue {
                            path: ID_KEY.to_string(),
                            expected: "document id",
                            found: docmap_core::type_name(raw),
                        })?,
                        None => DocId::new(),
                    };
                    self.insert_raw(collection, id, JsonValue::from(document.clone()))?;
                    result.inserted_count += 1;
                    result.inserted_ids.insert(index, id);
                }
                BulkOp::UpdateOne {
                    filter,
                    update,
                    upsert,
                } => {
                    let outcome =
                        self.update_one(collection, &Filter::from_json(filter)?, update, *upsert)?;
                    result.matched_count += outcome.matched_count;
                    result.modified_count += outcome.modified_count;
                    if let Some(id) = outcome.upserted_id {
                        result.upserted_count += 1;
                        result.upserted_ids.insert(index, id);
                    }
                }
                BulkOp::DeleteOne { filter } => {
                    if self.delete_one(collection, &Filter::from_json(filter)?) {
                        result.deleted_count += 1;
                    }
                }
            }
        }
        debug!(
            collection,
            ops = ops.len(),
            inserted = result.inserted_count,
            matched = result.matched_count,
            upserted = result.upserted_count,
            "bulk write applied"
        );
        Ok(result)
    }
}
