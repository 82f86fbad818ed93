//! Document tree, change tracking and reference resolution
//!
//! - PathTracker: ordered dirty paths of one node
//! - DocumentNode: typed field values with set-by-path and whole-field
//!   assignment, snapshots and persistence diffs
//! - ReferenceResolver: populates reference fields from storage
//! - persist: writes nodes and resolved references through `Storage`
//!
//! Nothing in this crate logs or retries; every failure is returned.
//! A node is single-owner: mutate it from one task at a time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod node;
pub mod persist;
pub mod resolver;
pub mod tracker;

pub use node::{DocumentNode, FieldValue};
pub use persist::{save, save_resolved, save_resolved_with, save_with, SaveOptions};
pub use resolver::{
    resolution, PopulateOutcome, ReferenceResolver, Resolution, DEFAULT_POPULATE_CONCURRENCY,
};
pub use tracker::PathTracker;
