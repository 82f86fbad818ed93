//! Storage layer for docmap
//!
//! This crate implements the storage side of the mapper:
//! - Storage: async collaborator trait consumed by the document core
//! - MemoryStore: DashMap + FxHash IndexMap in-memory document store
//! - Filter / update_one / bulk_write: equality-filtered updates with upsert
//!
//! # Concurrency
//!
//! `MemoryStore` shards by collection:
//! - Writes lock only the target collection
//! - Each write is an atomic read-modify-write on one document
//! - Reads return owned copies; no lock is held across an await

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bulk;
pub mod memory;
pub mod traits;

pub use bulk::{BulkOp, BulkWriteResult, Filter, UpdateResult};
pub use memory::MemoryStore;
pub use traits::{Storage, StoredDocument, WriteAck};
