//! Mapper Comprehensive Test Suite
//!
//! End-to-end behavior of the `Mapper` facade over `MemoryStore`.
//!
//! ## Test Modules
//!
//! - **change_tracking**: leaf writes, subtree replacement, minimal diffs
//! - **subdocuments**: embedded nodes and embedded lists
//! - **references**: populate, persistence boundary, explicit reference saves
//! - **updates**: partial update payloads, `update_one`, `bulk_write`
//! - **output**: `to_object` transform, lean snapshots, version key
//! - **config_loading**: `docmap.toml` driven mapper construction
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test mapper_comprehensive
//! ```

mod common;

mod config_loading;
mod output;
mod references;
mod updates;
