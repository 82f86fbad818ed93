//! Writing nodes to storage
//!
//! `save` writes one top-level node: an insert for a node that was never
//! persisted, otherwise an update with its persistence diff. The node is
//! marked persisted only after storage acknowledges the write; on error it
//! keeps its dirty state so the caller can retry.
//!
//! Saving an owner never writes its resolved references. `save_resolved`
//! writes one of them explicitly.

use crate::node::{DocumentNode, ReferenceSlot};
use docmap_core::{Error, Result};
use docmap_storage::{Storage, WriteAck};

/// Options for [`save_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Skip the storage call when a persisted node has nothing to write
    pub skip_empty_writes: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            skip_empty_writes: true,
        }
    }
}

/// Save a top-level node with default options
pub async fn save(storage: &dyn Storage, node: &mut DocumentNode) -> Result<WriteAck> {
    save_with(storage, node, SaveOptions::default()).await
}

/// Save a top-level node
///
/// # Errors
///
/// - `NotTopLevel` for embedded nodes
/// - storage errors such as `Conflict`, unchanged
pub async fn save_with(
    storage: &dyn Storage,
    node: &mut DocumentNode,
    options: SaveOptions,
) -> Result<WriteAck> {
    let collection = node.collection().ok_or(Error::NotTopLevel)?.to_string();
    let is_insert = !node.is_persisted();
    let diff = node.to_persistence_diff();
    if !is_insert && diff.is_empty() && options.skip_empty_writes {
        return Ok(WriteAck::unchanged(node.id(), node.version().unwrap_or(0)));
    }

    let ack = storage.write(&collection, &node.id(), &diff, is_insert).await?;
    node.mark_persisted();
    node.record_version(ack.version);
    Ok(ack)
}

/// Save the resolved view of reference `field` with default options
pub async fn save_resolved(
    storage: &dyn Storage,
    owner: &mut DocumentNode,
    field: &str,
) -> Result<WriteAck> {
    save_resolved_with(storage, owner, field, SaveOptions::default()).await
}

/// Save the resolved view of reference `field`
///
/// If the saved view's id differs from the owner's raw id (a literal object
/// assigned to the field), the owner is pointed at the view and the field is
/// marked dirty. The owner itself is not written.
///
/// # Errors
///
/// - `InvalidPath` if the field is not populated
/// - `ReferenceNotFound` if population found no document
/// - storage errors, unchanged
pub async fn save_resolved_with(
    storage: &dyn Storage,
    owner: &mut DocumentNode,
    field: &str,
    options: SaveOptions,
) -> Result<WriteAck> {
    let target = owner.reference_target(field)?;
    let raw = owner.reference_id(field)?;
    let ack = match owner.reference_slot_mut(field) {
        Some(ReferenceSlot::Resolved(view)) => save_with(storage, view, options).await?,
        Some(ReferenceSlot::Missing(id)) => {
            return Err(Error::ReferenceNotFound {
                collection: target.collection().to_string(),
                id: *id,
            })
        }
        None => {
            return Err(Error::invalid_path(
                field,
                format!("reference '{}' is not populated", field),
            ))
        }
    };
    if raw != Some(ack.id) {
        owner.substitute_reference_id(field, ack.id);
    }
    Ok(ack)
}
