//! Reference population
//!
//! `ReferenceResolver` turns raw reference ids into attached, read-write views
//! of the referenced documents. A view is a separate top-level document: it is
//! never folded into the owner's persistence diff.
//!
//! A populate call only touches the node after its fetch has completed, so a
//! dropped (cancelled) call leaves the field not populated.

use crate::node::{DocumentNode, ReferenceSlot};
use docmap_core::{DocId, Error, Result, Schema};
use docmap_storage::Storage;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Default bound on concurrent fetches in [`ReferenceResolver::populate_many`]
pub const DEFAULT_POPULATE_CONCURRENCY: usize = 8;

/// Population state of a reference field
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// `populate` has not run since the raw id was last set
    NotPopulated,
    /// The field holds no id
    Null,
    /// `populate` ran and storage had no document with this id
    Missing {
        /// Id that was looked up
        id: DocId,
    },
    /// The referenced document
    Resolved(&'a DocumentNode),
}

impl<'a> Resolution<'a> {
    /// The resolved document, if any
    pub fn node(&self) -> Option<&'a DocumentNode> {
        match self {
            Resolution::Resolved(node) => Some(*node),
            _ => None,
        }
    }

    /// Whether `populate` ran for the current id, found or not
    pub fn is_populated(&self) -> bool {
        matches!(self, Resolution::Resolved(_) | Resolution::Missing { .. })
    }
}

/// Outcome of one field in [`ReferenceResolver::populate_many`]
pub type PopulateOutcome = (String, Result<()>);

/// Fetches referenced documents through a storage handle
#[derive(Clone)]
pub struct ReferenceResolver {
    storage: Arc<dyn Storage>,
    concurrency: usize,
    version_key: bool,
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("concurrency", &self.concurrency)
            .field("version_key", &self.version_key)
            .finish()
    }
}

impl ReferenceResolver {
    /// Resolver over `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            concurrency: DEFAULT_POPULATE_CONCURRENCY,
            version_key: true,
        }
    }

    /// Bound concurrent fetches in `populate_many` (minimum 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Whether populated documents show `__v` in snapshots
    pub fn with_version_key(mut self, enabled: bool) -> Self {
        self.version_key = enabled;
        self
    }

    /// Storage handle
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Populate reference field `field` of `node`
    ///
    /// No-op if the field is already resolved or holds no id.
    ///
    /// # Errors
    ///
    /// - `UnknownField` / `InvalidPath` if `field` is not a reference field
    /// - `UnboundReference` if the target schema was never bound
    /// - `ReferenceNotFound` if storage has no such document; the field is
    ///   then reported as [`Resolution::Missing`]
    /// - storage errors, unchanged; the field stays not populated
    pub async fn populate(&self, node: &mut DocumentNode, field: &str) -> Result<()> {
        let target = node.reference_target(field)?;
        if matches!(node.reference_slot(field), Some(ReferenceSlot::Resolved(_))) {
            return Ok(());
        }
        let Some(id) = node.reference_id(field)? else {
            return Ok(());
        };
        let fetched = self.fetch(target.collection(), target.schema()?, id).await;
        settle(node, field, target.collection(), id, fetched)
    }

    /// Populate several reference fields with concurrent fetches
    ///
    /// Duplicate fields are fetched once. Successful fetches are attached
    /// even if others fail. Returns one outcome per distinct field, in the
    /// order given.
    ///
    /// # Errors
    ///
    /// Field and schema errors are checked for every field before any fetch
    /// and abort the whole call.
    pub async fn populate_many(
        &self,
        node: &mut DocumentNode,
        fields: &[&str],
    ) -> Result<Vec<PopulateOutcome>> {
        let mut distinct: Vec<&str> = Vec::with_capacity(fields.len());
        let mut jobs = Vec::new();
        for &field in fields {
            if distinct.contains(&field) {
                continue;
            }
            distinct.push(field);
            let target = node.reference_target(field)?;
            if matches!(node.reference_slot(field), Some(ReferenceSlot::Resolved(_))) {
                continue;
            }
            if let Some(id) = node.reference_id(field)? {
                jobs.push((field, target.collection().to_string(), target.schema()?, id));
            }
        }

        let fetched: Vec<_> = stream::iter(jobs)
            .map(|(field, collection, schema, id)| async move {
                let outcome = self.fetch(&collection, schema, id).await;
                (field, collection, id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut settled: Vec<PopulateOutcome> = fetched
            .into_iter()
            .map(|(field, collection, id, outcome)| {
                (field.to_string(), settle(node, field, &collection, id, outcome))
            })
            .collect();

        Ok(distinct
            .into_iter()
            .map(|field| {
                let result = settled
                    .iter()
                    .position(|(f, _)| f == field)
                    .map(|i| settled.swap_remove(i).1)
                    .unwrap_or(Ok(()));
                (field.to_string(), result)
            })
            .collect())
    }

    /// Population state of `field`
    pub fn get_resolved<'a>(&self, node: &'a DocumentNode, field: &str) -> Result<Resolution<'a>> {
        resolution(node, field)
    }

    /// Mutable access to the resolved view of `field`
    ///
    /// Changes are tracked by the view and written only by saving the view.
    pub fn resolved_mut<'a>(
        &self,
        node: &'a mut DocumentNode,
        field: &str,
    ) -> Result<Option<&'a mut DocumentNode>> {
        node.reference_target(field)?;
        Ok(match node.reference_slot_mut(field) {
            Some(ReferenceSlot::Resolved(view)) => Some(view.as_mut()),
            _ => None,
        })
    }

    /// Drop the view of `field`, returning it if it was resolved
    pub fn depopulate(&self, node: &mut DocumentNode, field: &str) -> Result<Option<DocumentNode>> {
        node.reference_target(field)?;
        Ok(match node.detach_reference(field) {
            Some(ReferenceSlot::Resolved(view)) => Some(*view),
            _ => None,
        })
    }

    async fn fetch(
        &self,
        collection: &str,
        schema: Arc<Schema>,
        id: DocId,
    ) -> Result<Option<DocumentNode>> {
        match self.storage.fetch_by_id(collection, &id).await? {
            Some(stored) => {
                let mut view = DocumentNode::from_stored(collection, schema, &stored)?;
                view.set_version_key(self.version_key);
                Ok(Some(view))
            }
            None => Ok(None),
        }
    }
}

/// Population state of `field`, without a resolver
pub fn resolution<'a>(node: &'a DocumentNode, field: &str) -> Result<Resolution<'a>> {
    node.reference_target(field)?;
    Ok(match node.reference_slot(field) {
        Some(ReferenceSlot::Resolved(view)) => Resolution::Resolved(view.as_ref()),
        Some(ReferenceSlot::Missing(id)) => Resolution::Missing { id: *id },
        None => match node.reference_id(field)? {
            Some(_) => Resolution::NotPopulated,
            None => Resolution::Null,
        },
    })
}

fn settle(
    node: &mut DocumentNode,
    field: &str,
    collection: &str,
    id: DocId,
    fetched: Result<Option<DocumentNode>>,
) -> Result<()> {
    match fetched? {
        Some(view) => {
            node.attach_reference(field, ReferenceSlot::Resolved(Box::new(view)));
            Ok(())
        }
        None => {
            node.attach_reference(field, ReferenceSlot::Missing(id));
            Err(Error::ReferenceNotFound {
                collection: collection.to_string(),
                id,
            })
        }
    }
}
