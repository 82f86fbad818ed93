//! Dirty-path tracking
//!
//! A `PathTracker` records which paths of one document node were assigned
//! since load or the last successful write. Two kinds of marks exist:
//!
//! - leaf marks: a single field was set
//! - subtree marks: a whole sub-document was replaced, which supersedes every
//!   mark beneath it
//!
//! Paths are relative to the node that owns the tracker. Iteration follows
//! insertion order so diffs are deterministic.

use docmap_core::FieldPath;
use indexmap::IndexSet;

/// Ordered set of dirty paths for one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTracker {
    dirty: IndexSet<FieldPath>,
}

impl PathTracker {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a leaf assignment. No-op if `path` is already dirty.
    pub fn mark_leaf(&mut self, path: FieldPath) {
        self.dirty.insert(path);
    }

    /// Record a whole-subtree replacement at `path`
    ///
    /// Existing marks strictly beneath `path` are dropped. A mark already at
    /// `path` keeps its position.
    pub fn mark_subtree_replaced(&mut self, path: FieldPath) {
        self.dirty.retain(|p| !p.is_strict_descendant_of(&path));
        self.dirty.insert(path);
    }

    /// Dirty paths in insertion order
    ///
    /// The iterator borrows the tracker and can be cloned to restart.
    pub fn dirty_paths(&self) -> impl Iterator<Item = &FieldPath> + Clone + '_ {
        self.dirty.iter()
    }

    /// Whether exactly `path` is marked
    pub fn is_dirty(&self, path: &FieldPath) -> bool {
        self.dirty.contains(path)
    }

    /// Whether `path` or one of its ancestors is marked
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.dirty.iter().any(|p| p.is_ancestor_of(path))
    }

    /// Number of marks
    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    /// True if nothing is marked
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    /// Forget every mark
    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}
