//! Error types for docmap
//!
//! This module defines the error taxonomy shared by every layer of the mapper.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Variant | Class | Retried by core |
//! |---------|-------|-----------------|
//! | `UnknownField` | programmer error | never |
//! | `InvalidPath` | programmer error | never |
//! | `InvalidValue` | programmer error | never |
//! | `ReferenceNotFound` | recoverable | never (caller decides) |
//! | `Conflict` | storage | never (storage owns retry policy) |

use crate::id::DocId;
use crate::path::PathParseError;
use thiserror::Error;

/// Result type alias for docmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document mapper
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Field name is not declared by the schema
    #[error("unknown field: {field}")]
    UnknownField {
        /// The offending field name
        field: String,
    },

    /// Path is malformed or does not resolve to the kind of field the call needs
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as given by the caller
        path: String,
        /// Why resolution failed
        reason: String,
    },

    /// Value does not match the declared field type
    #[error("invalid value at '{path}': expected {expected}, found {found}")]
    InvalidValue {
        /// Path of the field being assigned
        path: String,
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        found: &'static str,
    },

    /// Referenced document does not exist in storage
    #[error("referenced document {id} not found in '{collection}'")]
    ReferenceNotFound {
        /// Collection that was searched
        collection: String,
        /// Id that was looked up
        id: DocId,
    },

    /// Reference target was declared but never bound to a schema
    #[error("reference target '{collection}' has no schema bound")]
    UnboundReference {
        /// Collection named by the reference
        collection: String,
    },

    /// Storage rejected the write
    #[error("write conflict on {collection}/{id}: {reason}")]
    Conflict {
        /// Collection written to
        collection: String,
        /// Document id
        id: DocId,
        /// Storage-provided reason
        reason: String,
    },

    /// Operation requires a top-level document but got an embedded one
    #[error("embedded documents are persisted through their owner")]
    NotTopLevel,

    /// Storage layer failure other than a conflict
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read or is invalid
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Build an `UnknownField` error
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Error::UnknownField {
            field: field.into(),
        }
    }

    /// Build an `InvalidPath` error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Only storage conflicts may succeed when retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Errors that indicate a bug in the calling code rather than a runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownField { .. }
                | Error::InvalidPath { .. }
                | Error::InvalidValue { .. }
                | Error::UnboundReference { .. }
                | Error::NotTopLevel
        )
    }
}

impl From<PathParseError> for Error {
    fn from(e: PathParseError) -> Self {
        Error::InvalidPath {
            path: e.input().to_string(),
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
