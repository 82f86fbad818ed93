//! Core types for docmap
//!
//! This crate defines the foundational types used throughout the mapper:
//! - DocId: Unique identifier for documents and embedded documents
//! - FieldPath: Dotted path into a document (`child.name`, `children.1.name`)
//! - JsonValue: Plain-data value used for payloads, snapshots and stored data
//! - Schema: Ordered field descriptors with descriptor-driven path resolution
//! - PersistenceDiff: Ordered (path, value) writes for one document
//! - Error: Error taxonomy shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod error;
pub mod id;
pub mod path;
pub mod schema;
pub mod value;

pub use diff::{DiffEntry, PersistenceDiff};
pub use error::{Error, Result};
pub use id::{DocId, ID_KEY, VERSION_KEY};
pub use path::{FieldPath, IntoFieldPath, PathParseError, PathSegment, MAX_PATH_LENGTH};
pub use schema::{
    FieldDescriptor, ReferenceTarget, ResolvedField, ScalarType, Schema, SchemaBuilder,
    SchemaOptions, ToObjectOptions, Transform,
};
pub use value::{type_name, JsonMap, JsonValue};
