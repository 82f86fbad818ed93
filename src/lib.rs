//! docmap - change-tracking document mapper for document stores
//!
//! docmap maps schema-described documents onto a key-value document store.
//! It tracks which paths of a document changed, turns them into minimal
//! writes, and populates reference fields from storage on demand.
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let mapper = Mapper::with_defaults(store.clone());
//!
//! let people = mapper.register("people", Schema::builder().string("name").build()?)?;
//! let mut ian = mapper.insert(&people, serde_json::json!({"name": "Ian"})).await?;
//!
//! ian.set_field("name", "Ian Fleming")?;
//! mapper.save(&mut ian).await?;   // writes only `name`
//! ```
//!
//! # Architecture
//!
//! - `docmap-core`: ids, paths, values, schemas, diffs, errors
//! - `docmap-storage`: the `Storage` trait and the in-memory store
//! - `docmap-document`: `DocumentNode`, `PathTracker`, `ReferenceResolver`
//! - this crate: `Mapper` facade and `MapperConfig`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod mapper;
pub mod prelude;

pub use config::{MapperConfig, CONFIG_FILE_NAME};
pub use mapper::{Mapper, Model};

pub use docmap_core;
pub use docmap_document;
pub use docmap_storage;
