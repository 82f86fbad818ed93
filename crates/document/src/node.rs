//! Document nodes
//!
//! A `DocumentNode` is one document, top-level or embedded: an id, typed field
//! values conforming to a [`Schema`], and a [`PathTracker`] of what changed.
//!
//! # Mutation entry points
//!
//! | Call | Effect | Mark |
//! |------|--------|------|
//! | `set_leaf("child.name", v)` | assigns in place | leaf on the node owning `name` |
//! | `set_field("child", {..})` | replaces the sub-document, new id | subtree on this node |
//! | `set_field("author", id)` | assigns the raw reference id | leaf on this node |
//! | `set_field("author", {..})` | attaches an unsaved replacement view | none |
//!
//! Embedded nodes are part of their owner: their dirty state is folded into
//! the owner's persistence diff. Referenced documents live in reference slots
//! and are never folded in.

use crate::tracker::PathTracker;
use docmap_core::{
    type_name, DocId, Error, FieldDescriptor, FieldPath, IntoFieldPath, JsonMap, JsonValue,
    PathSegment, PersistenceDiff, ReferenceTarget, Result, Schema, ID_KEY, VERSION_KEY,
};
use docmap_storage::StoredDocument;
use indexmap::IndexMap;
use std::sync::Arc;

/// Current value of one field
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Primitive value, possibly null
    Scalar(serde_json::Value),
    /// Raw id of a referenced document
    Reference(Option<DocId>),
    /// Single embedded document
    Embedded(Box<DocumentNode>),
    /// Ordered embedded documents
    EmbeddedList(Vec<DocumentNode>),
    /// Embedded or list field explicitly set to null
    Null,
}

impl FieldValue {
    /// Plain value as written to storage
    pub fn to_snapshot(&self) -> serde_json::Value {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::Reference(Some(id)) => id.to_json(),
            FieldValue::Reference(None) | FieldValue::Null => serde_json::Value::Null,
            FieldValue::Embedded(child) => child.to_snapshot().into_inner(),
            FieldValue::EmbeddedList(items) => serde_json::Value::Array(
                items.iter().map(|n| n.to_snapshot().into_inner()).collect(),
            ),
        }
    }
}

/// Population state of one reference field
#[derive(Debug, Clone)]
pub(crate) enum ReferenceSlot {
    Resolved(Box<DocumentNode>),
    Missing(DocId),
}

/// One document with change tracking
#[derive(Debug, Clone)]
pub struct DocumentNode {
    schema: Arc<Schema>,
    id: DocId,
    /// Set for top-level documents only
    collection: Option<String>,
    values: IndexMap<String, FieldValue>,
    tracker: PathTracker,
    persisted: bool,
    version: Option<u64>,
    version_key: bool,
    references: IndexMap<String, ReferenceSlot>,
}

impl DocumentNode {
    fn empty(schema: Arc<Schema>, id: DocId) -> Self {
        Self {
            schema,
            id,
            collection: None,
            values: IndexMap::new(),
            tracker: PathTracker::new(),
            persisted: false,
            version: None,
            version_key: true,
            references: IndexMap::new(),
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Build a new, unsaved node from a constructor payload
    ///
    /// Every provided field is marked dirty. A valid `_id` in the payload is
    /// used as the identity; otherwise a fresh id is generated.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for keys the schema does not declare
    /// - `InvalidValue` for values of the wrong type
    pub fn construct(schema: Arc<Schema>, payload: impl Into<JsonValue>) -> Result<Self> {
        let mut map = expect_object(payload.into().into_inner(), &FieldPath::root())?;
        let id = take_id(&mut map)?.unwrap_or_default();
        map.remove(VERSION_KEY);

        let mut node = Self::empty(schema, id);
        for (name, value) in map {
            node.set_field(&name, value)?;
        }
        Ok(node)
    }

    /// Build a persisted, clean node from stored data
    ///
    /// Keys the schema does not declare are dropped. `_id` and `__v` are
    /// taken from the data when present.
    pub fn load(schema: Arc<Schema>, stored: impl Into<JsonValue>) -> Result<Self> {
        Self::load_at(schema, stored.into().into_inner(), &FieldPath::root())
    }

    /// Load a top-level document fetched from `collection`
    pub fn from_stored(
        collection: impl Into<String>,
        schema: Arc<Schema>,
        stored: &StoredDocument,
    ) -> Result<Self> {
        let mut node = Self::load(schema, JsonValue::from(stored.values.clone()))?;
        node.id = stored.id;
        node.version = Some(stored.version);
        node.collection = Some(collection.into());
        Ok(node)
    }

    /// Make this a top-level document of `collection`
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    fn load_at(schema: Arc<Schema>, value: serde_json::Value, at: &FieldPath) -> Result<Self> {
        let mut map = expect_object(value, at)?;
        let id = take_id(&mut map)
            .map_err(|e| prefixed(e, at))?
            .unwrap_or_default();
        let version = map.remove(VERSION_KEY).and_then(|v| v.as_u64());

        let mut node = Self::empty(schema.clone(), id);
        node.persisted = true;
        node.version = version;
        for (name, value) in map {
            let Some(descriptor) = schema.field(&name) else {
                continue;
            };
            let path = at.clone().key(name.as_str());
            let value = load_value(descriptor, &path, value)?;
            node.values.insert(name, value);
        }
        Ok(node)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Identity, fixed for the node's lifetime
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Schema the node conforms to
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Collection of a top-level document, `None` for embedded nodes
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Whether the node has been written to storage
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Storage version, when known
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Show or hide `__v` in snapshots
    pub fn set_version_key(&mut self, enabled: bool) {
        self.version_key = enabled;
    }

    /// This node's own dirty paths
    pub fn tracker(&self) -> &PathTracker {
        &self.tracker
    }

    /// Raw value of a top-level field
    pub fn field_value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Embedded document held by `name`
    pub fn embedded(&self, name: &str) -> Option<&DocumentNode> {
        match self.values.get(name) {
            Some(FieldValue::Embedded(child)) => Some(child.as_ref()),
            _ => None,
        }
    }

    /// Mutable embedded document held by `name`
    ///
    /// Changes are tracked by the child and written when the owner is saved.
    pub fn embedded_mut(&mut self, name: &str) -> Option<&mut DocumentNode> {
        match self.values.get_mut(name) {
            Some(FieldValue::Embedded(child)) => Some(child.as_mut()),
            _ => None,
        }
    }

    /// Embedded list held by `name`
    pub fn embedded_list(&self, name: &str) -> Option<&[DocumentNode]> {
        match self.values.get(name) {
            Some(FieldValue::EmbeddedList(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Mutable elements of the embedded list held by `name`
    ///
    /// Elements can be mutated but not added or removed; replace the list with
    /// `set_field` for that.
    pub fn embedded_list_mut(&mut self, name: &str) -> Option<&mut [DocumentNode]> {
        match self.values.get_mut(name) {
            Some(FieldValue::EmbeddedList(items)) => Some(items.as_mut_slice()),
            _ => None,
        }
    }

    /// Raw id stored in reference field `name`
    pub fn reference_id(&self, name: &str) -> Result<Option<DocId>> {
        self.reference_target(name)?;
        Ok(match self.values.get(name) {
            Some(FieldValue::Reference(id)) => *id,
            _ => None,
        })
    }

    /// Read the current value at `path`
    ///
    /// Reference fields read as their raw id. Returns `Ok(None)` for unset
    /// fields and out-of-range indices.
    pub fn get(&self, path: impl IntoFieldPath) -> Result<Option<JsonValue>> {
        let path = path.into_field_path()?;
        let head = path
            .head_field()
            .ok_or_else(|| Error::invalid_path(path.to_string(), "path must start with a field name"))?;
        self.schema.require(head)?;
        Ok(self.value_at(path.segments()).map(JsonValue::from))
    }

    fn value_at(&self, segments: &[PathSegment]) -> Option<serde_json::Value> {
        let Some((PathSegment::Field(name), rest)) = segments.split_first() else {
            return None;
        };
        let value = self.values.get(name.as_str())?;
        if rest.is_empty() {
            return Some(value.to_snapshot());
        }
        match (value, rest.split_first()) {
            (FieldValue::Embedded(child), _) => child.value_at(rest),
            (FieldValue::EmbeddedList(items), Some((PathSegment::Index(i), tail))) => {
                let item = items.get(*i)?;
                if tail.is_empty() {
                    Some(item.to_snapshot().into_inner())
                } else {
                    item.value_at(tail)
                }
            }
            _ => None,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Assign a scalar or reference id at `path`
    ///
    /// `path` may descend into embedded documents and list elements
    /// (`child.name`, `children.1.name`). The mark is recorded on the node
    /// that declares the leaf, not on this node.
    ///
    /// # Errors
    ///
    /// - `UnknownField` if any field segment is not declared
    /// - `InvalidPath` if the path does not end at a scalar or reference
    ///   field, runs into a reference, misses an embedded document, or
    ///   indexes past the end of a list
    /// - `InvalidValue` if the value does not match the field type
    pub fn set_leaf(&mut self, path: impl IntoFieldPath, value: impl Into<JsonValue>) -> Result<()> {
        let path = path.into_field_path()?;
        let value = value.into().into_inner();
        let resolved = self.schema.resolve(&path)?;
        if !resolved.descriptor.is_leaf() {
            return Err(Error::invalid_path(
                path.to_string(),
                format!(
                    "'{}' is a {} field; assign it with set_field",
                    resolved.name,
                    resolved.descriptor.kind_name()
                ),
            ));
        }
        resolved.descriptor.check_leaf_value(&path, &value)?;
        self.assign_leaf(&path, path.segments(), value)
    }

    fn assign_leaf(
        &mut self,
        full: &FieldPath,
        segments: &[PathSegment],
        value: serde_json::Value,
    ) -> Result<()> {
        let Some((PathSegment::Field(name), rest)) = segments.split_first() else {
            return Err(Error::invalid_path(full.to_string(), "expected a field name"));
        };

        if rest.is_empty() {
            let descriptor = self.schema.require(name)?;
            let field_value = leaf_value(descriptor, full, value)?;
            if matches!(field_value, FieldValue::Reference(_)) {
                self.references.shift_remove(name.as_str());
            }
            self.values.insert(name.clone(), field_value);
            self.tracker.mark_leaf(FieldPath::field(name.as_str()));
            return Ok(());
        }

        match self.values.get_mut(name.as_str()) {
            Some(FieldValue::Embedded(child)) => child.assign_leaf(full, rest, value),
            Some(FieldValue::EmbeddedList(items)) => {
                let Some((PathSegment::Index(i), tail)) = rest.split_first() else {
                    return Err(Error::invalid_path(
                        full.to_string(),
                        format!("'{}' is an embedded list and needs an index", name),
                    ));
                };
                let len = items.len();
                let item = items.get_mut(*i).ok_or_else(|| {
                    Error::invalid_path(
                        full.to_string(),
                        format!("index {} out of range for '{}' of length {}", i, name, len),
                    )
                })?;
                item.assign_leaf(full, tail, value)
            }
            _ => Err(Error::invalid_path(
                full.to_string(),
                format!("'{}' holds no document", name),
            )),
        }
    }

    /// Assign a whole top-level field
    ///
    /// - scalar: same as `set_leaf`
    /// - embedded / embedded list: the value is built into new nodes with new
    ///   ids, and the field is marked as a replaced subtree
    /// - reference with an id or null: same as `set_leaf`
    /// - reference with an object: a new, unsaved node for the target schema
    ///   becomes the resolved view; the raw id and dirty set are unchanged
    ///   until that node is saved through the owner
    ///
    /// A dotted `name` is forwarded to `set_leaf`.
    pub fn set_field(&mut self, name: &str, value: impl Into<JsonValue>) -> Result<()> {
        let value = value.into().into_inner();
        let path: FieldPath = name.parse()?;
        if path.len() > 1 {
            return self.set_leaf(path, value);
        }

        let descriptor = self.schema.require(name)?.clone();
        match descriptor {
            FieldDescriptor::Scalar(_) => self.assign_leaf(&path, path.segments(), value),
            FieldDescriptor::Reference(target) => match value {
                serde_json::Value::Object(map) => self.assign_literal_reference(name, &target, map),
                other => self.assign_leaf(&path, path.segments(), other),
            },
            FieldDescriptor::Embedded(schema) => {
                let replacement = match value {
                    serde_json::Value::Null => FieldValue::Null,
                    serde_json::Value::Object(map) => {
                        FieldValue::Embedded(Box::new(Self::replacement(schema, map, &path)?))
                    }
                    other => {
                        return Err(Error::InvalidValue {
                            path: path.to_string(),
                            expected: "object",
                            found: type_name(&other),
                        })
                    }
                };
                self.replace_subtree(name, replacement);
                Ok(())
            }
            FieldDescriptor::EmbeddedList(schema) => {
                let replacement = match value {
                    serde_json::Value::Null => FieldValue::Null,
                    serde_json::Value::Array(items) => FieldValue::EmbeddedList(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, item)| {
                                let at = path.clone().index(i);
                                match item {
                                    serde_json::Value::Object(map) => {
                                        Self::replacement(schema.clone(), map, &at)
                                    }
                                    other => Err(Error::InvalidValue {
                                        path: at.to_string(),
                                        expected: "object",
                                        found: type_name(&other),
                                    }),
                                }
                            })
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    other => {
                        return Err(Error::InvalidValue {
                            path: path.to_string(),
                            expected: "array",
                            found: type_name(&other),
                        })
                    }
                };
                self.replace_subtree(name, replacement);
                Ok(())
            }
        }
    }

    /// Apply a partial update payload
    ///
    /// Each key is assigned with `set_field`. A key mapped to `null` sets the
    /// field to null; absent keys are untouched. The update is all-or-nothing:
    /// on error the node is left as it was.
    pub fn apply_update(&mut self, payload: impl Into<JsonValue>) -> Result<()> {
        let mut map = expect_object(payload.into().into_inner(), &FieldPath::root())?;
        if let Some(id) = take_id(&mut map)? {
            if id != self.id {
                return Err(Error::invalid_path(ID_KEY, "document id is immutable"));
            }
        }
        map.remove(VERSION_KEY);

        let mut next = self.clone();
        for (name, value) in map {
            next.set_field(&name, value)?;
        }
        *self = next;
        Ok(())
    }

    fn replacement(schema: Arc<Schema>, mut map: JsonMap, at: &FieldPath) -> Result<Self> {
        map.remove(ID_KEY);
        map.remove(VERSION_KEY);
        Self::construct(schema, JsonValue::from(map)).map_err(|e| prefixed(e, at))
    }

    fn replace_subtree(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
        self.tracker.mark_subtree_replaced(FieldPath::field(name));
    }

    fn assign_literal_reference(
        &mut self,
        name: &str,
        target: &ReferenceTarget,
        map: JsonMap,
    ) -> Result<()> {
        let mut node = Self::replacement(target.schema()?, map, &FieldPath::field(name))?;
        node.collection = Some(target.collection().to_string());
        node.version_key = self.version_key;
        self.references
            .insert(name.to_string(), ReferenceSlot::Resolved(Box::new(node)));
        Ok(())
    }

    // ========================================================================
    // Snapshots and diffs
    // ========================================================================

    /// Plain nested value of the current state
    ///
    /// References appear as raw ids. `__v` is included for nodes with a known
    /// storage version unless disabled with `set_version_key(false)`.
    pub fn to_snapshot(&self) -> JsonValue {
        let mut map = JsonMap::with_capacity(self.values.len() + 2);
        map.insert(ID_KEY.to_string(), self.id.to_json());
        for (name, _) in self.schema.fields() {
            if let Some(value) = self.values.get(name) {
                map.insert(name.to_string(), value.to_snapshot());
            }
        }
        if let (true, Some(version)) = (self.version_key, self.version) {
            map.insert(VERSION_KEY.to_string(), serde_json::Value::from(version));
        }
        JsonValue::from(map)
    }

    /// Output view honoring the schema's to-object options
    ///
    /// Resolved references are inlined, the transform hook runs on the
    /// finished map, and `__v` is dropped when the options disable it.
    pub fn to_object(&self) -> JsonValue {
        let options = &self.schema.options().to_object;
        let mut map = JsonMap::with_capacity(self.values.len() + 2);
        map.insert(ID_KEY.to_string(), self.id.to_json());
        for (name, _) in self.schema.fields() {
            let value = match (self.references.get(name), self.values.get(name)) {
                (Some(ReferenceSlot::Resolved(node)), _) => node.to_object().into_inner(),
                (_, Some(FieldValue::Embedded(child))) => child.to_object().into_inner(),
                (_, Some(FieldValue::EmbeddedList(items))) => serde_json::Value::Array(
                    items.iter().map(|n| n.to_object().into_inner()).collect(),
                ),
                (_, Some(other)) => other.to_snapshot(),
                (_, None) => continue,
            };
            map.insert(name.to_string(), value);
        }
        if let (true, true, Some(version)) = (self.version_key, options.version_key, self.version) {
            map.insert(VERSION_KEY.to_string(), serde_json::Value::from(version));
        }
        if let Some(transform) = &options.transform {
            transform(&mut map);
        }
        JsonValue::from(map)
    }

    /// Minimal write for this node and its embedded descendants
    ///
    /// Own dirty paths come first, each resolved to its current value. Dirty
    /// embedded nodes follow with their paths prefixed, unless a dirty
    /// ancestor already covers them. Resolved references are never included.
    pub fn to_persistence_diff(&self) -> PersistenceDiff {
        let mut diff = PersistenceDiff::new();
        for path in self.tracker.dirty_paths() {
            let value = self
                .value_at(path.segments())
                .unwrap_or(serde_json::Value::Null);
            diff.push(path.clone(), value);
        }
        for (name, value) in &self.values {
            let prefix = FieldPath::field(name.as_str());
            if self.tracker.covers(&prefix) {
                continue;
            }
            match value {
                FieldValue::Embedded(child) => {
                    diff.merge_prefixed(&prefix, child.to_persistence_diff());
                }
                FieldValue::EmbeddedList(items) => {
                    for (i, item) in items.iter().enumerate() {
                        diff.merge_prefixed(&prefix.clone().index(i), item.to_persistence_diff());
                    }
                }
                _ => {}
            }
        }
        diff
    }

    /// Record a successful write: persisted, clean, embedded nodes included
    ///
    /// Resolved references are separate documents and keep their own state.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
        self.tracker.clear();
        for value in self.values.values_mut() {
            match value {
                FieldValue::Embedded(child) => child.mark_persisted(),
                FieldValue::EmbeddedList(items) => {
                    items.iter_mut().for_each(DocumentNode::mark_persisted)
                }
                _ => {}
            }
        }
    }

    /// Dirty paths across the embedded tree, fully qualified
    pub fn modified_paths(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self.tracker.dirty_paths().cloned().collect();
        for (name, value) in &self.values {
            let prefix = FieldPath::field(name.as_str());
            match value {
                FieldValue::Embedded(child) => {
                    paths.extend(child.modified_paths().iter().map(|p| prefix.join(p)));
                }
                FieldValue::EmbeddedList(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let at = prefix.clone().index(i);
                        paths.extend(item.modified_paths().iter().map(|p| at.join(p)));
                    }
                }
                _ => {}
            }
        }
        paths
    }

    /// Whether `path`, an ancestor, or a descendant is dirty
    pub fn is_modified(&self, path: impl IntoFieldPath) -> Result<bool> {
        let path = path.into_field_path()?;
        Ok(self.modified_paths().iter().any(|p| p.overlaps(&path)))
    }

    // ========================================================================
    // Reference slots
    // ========================================================================

    pub(crate) fn reference_target(&self, name: &str) -> Result<ReferenceTarget> {
        match self.schema.require(name)? {
            FieldDescriptor::Reference(target) => Ok(target.clone()),
            other => Err(Error::invalid_path(
                name,
                format!("'{}' is a {} field, not a reference", name, other.kind_name()),
            )),
        }
    }

    pub(crate) fn reference_slot(&self, name: &str) -> Option<&ReferenceSlot> {
        self.references.get(name)
    }

    pub(crate) fn reference_slot_mut(&mut self, name: &str) -> Option<&mut ReferenceSlot> {
        self.references.get_mut(name)
    }

    pub(crate) fn attach_reference(&mut self, name: &str, slot: ReferenceSlot) {
        self.references.insert(name.to_string(), slot);
    }

    pub(crate) fn detach_reference(&mut self, name: &str) -> Option<ReferenceSlot> {
        self.references.shift_remove(name)
    }

    /// Point `name` at `id` without dropping the resolved view
    pub(crate) fn substitute_reference_id(&mut self, name: &str, id: DocId) {
        self.values
            .insert(name.to_string(), FieldValue::Reference(Some(id)));
        self.tracker.mark_leaf(FieldPath::field(name));
    }

    pub(crate) fn record_version(&mut self, version: u64) {
        self.version = Some(version);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn expect_object(value: serde_json::Value, at: &FieldPath) -> Result<JsonMap> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::InvalidValue {
            path: describe(at),
            expected: "object",
            found: type_name(&other),
        }),
    }
}

fn take_id(map: &mut JsonMap) -> Result<Option<DocId>> {
    match map.remove(ID_KEY) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(raw) => DocId::from_json(&raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidValue {
                path: ID_KEY.to_string(),
                expected: "document id",
                found: type_name(&raw),
            }),
    }
}

fn leaf_value(
    descriptor: &FieldDescriptor,
    path: &FieldPath,
    value: serde_json::Value,
) -> Result<FieldValue> {
    descriptor.check_leaf_value(path, &value)?;
    Ok(match descriptor {
        FieldDescriptor::Reference(_) => FieldValue::Reference(DocId::from_json(&value)),
        _ => FieldValue::Scalar(value),
    })
}

fn load_value(
    descriptor: &FieldDescriptor,
    path: &FieldPath,
    value: serde_json::Value,
) -> Result<FieldValue> {
    match descriptor {
        FieldDescriptor::Scalar(_) | FieldDescriptor::Reference(_) => {
            leaf_value(descriptor, path, value)
        }
        FieldDescriptor::Embedded(schema) => match value {
            serde_json::Value::Null => Ok(FieldValue::Null),
            other => Ok(FieldValue::Embedded(Box::new(DocumentNode::load_at(
                schema.clone(),
                other,
                path,
            )?))),
        },
        FieldDescriptor::EmbeddedList(schema) => match value {
            serde_json::Value::Null => Ok(FieldValue::Null),
            serde_json::Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| DocumentNode::load_at(schema.clone(), item, &path.clone().index(i)))
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::EmbeddedList),
            other => Err(Error::InvalidValue {
                path: path.to_string(),
                expected: "array",
                found: type_name(&other),
            }),
        },
    }
}

fn describe(at: &FieldPath) -> String {
    if at.is_empty() {
        "(document)".to_string()
    } else {
        at.to_string()
    }
}

/// Re-anchor an error raised inside a nested node at `at`
fn prefixed(err: Error, at: &FieldPath) -> Error {
    if at.is_empty() {
        return err;
    }
    let join = |inner: String| format!("{}.{}", at, inner);
    match err {
        Error::UnknownField { field } => Error::UnknownField { field: join(field) },
        Error::InvalidPath { path, reason } => Error::InvalidPath {
            path: join(path),
            reason,
        },
        Error::InvalidValue {
            path,
            expected,
            found,
        } => Error::InvalidValue {
            path: join(path),
            expected,
            found,
        },
        other => other,
    }
}
