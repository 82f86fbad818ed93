//! Commonly used types

pub use crate::config::MapperConfig;
pub use crate::mapper::{Mapper, Model};
pub use docmap_core::{
    DocId, Error, FieldPath, JsonMap, JsonValue, PersistenceDiff, ReferenceTarget, Result,
    Schema, ToObjectOptions,
};
pub use docmap_document::{DocumentNode, PathTracker, ReferenceResolver, Resolution};
pub use docmap_storage::{BulkOp, BulkWriteResult, Filter, MemoryStore, Storage, WriteAck};
