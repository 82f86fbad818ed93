//! Persistence diffs
//!
//! A `PersistenceDiff` is the ordered set of `(path, value)` pairs a storage
//! write must touch. Entries keep the insertion order of the dirty paths they
//! were derived from, so the same mutations always produce the same diff.

use crate::error::{Error, Result};
use crate::path::FieldPath;
use crate::value::{JsonMap, JsonValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One path/value pair in a diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Dotted path written
    pub path: FieldPath,
    /// Value written at `path`
    pub value: JsonValue,
}

/// Minimal set of writes for one document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistenceDiff {
    entries: Vec<DiffEntry>,
}

impl PersistenceDiff {
    /// Empty diff
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    ///
    /// Entries covered by an ancestor already in the diff are dropped, and
    /// a new entry supersedes existing descendants.
    pub fn push(&mut self, path: FieldPath, value: impl Into<JsonValue>) {
        if self.entries.iter().any(|e| e.path.is_ancestor_of(&path)) {
            return;
        }
        self.entries.retain(|e| !e.path.is_strict_descendant_of(&path));
        self.entries.push(DiffEntry {
            path,
            value: value.into(),
        });
    }

    /// Append every entry of `other`, prefixing each path with `prefix`
    pub fn merge_prefixed(&mut self, prefix: &FieldPath, other: PersistenceDiff) {
        for entry in other.entries {
            self.push(prefix.join(&entry.path), entry.value);
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the write would touch nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter()
    }

    /// Paths in order
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.iter().map(|e| &e.path)
    }

    /// Value recorded for exactly `path`
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|e| e.path.to_path_string() == path)
            .map(|e| &e.value)
    }

    /// Whether any entry touches `path` or something beneath it
    pub fn touches(&self, path: &FieldPath) -> bool {
        self.entries.iter().any(|e| e.path.overlaps(path))
    }

    /// Flat update document keyed by dotted path
    pub fn to_update_map(&self) -> JsonMap {
        self.entries
            .iter()
            .map(|e| (e.path.to_path_string(), e.value.clone().into_inner()))
            .collect()
    }

    /// Apply every entry to `doc` in order
    pub fn apply_to(&self, doc: &mut JsonValue) -> Result<()> {
        for entry in &self.entries {
            doc.set_path(&entry.path, entry.value.clone().into_inner())
                .map_err(|reason| Error::invalid_path(entry.path.to_string(), reason))?;
        }
        Ok(())
    }
}

impl IntoIterator for PersistenceDiff {
    type Item = DiffEntry;
    type IntoIter = std::vec::IntoIter<DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for PersistenceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", entry.path, entry.value)?;
        }
        write!(f, "}}")
    }
}
