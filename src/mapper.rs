//! Mapper facade
//!
//! `Mapper` ties an explicit storage handle, a model registry and a
//! `MapperConfig` together. There is no global connection: every mapper owns
//! the handle it was built with.

use crate::config::MapperConfig;
use docmap_core::{DocId, Error, JsonValue, ReferenceTarget, Result, Schema};
use docmap_document::{
    persist, DocumentNode, PopulateOutcome, ReferenceResolver, Resolution, SaveOptions,
};
use docmap_storage::{Storage, WriteAck};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A schema registered under a collection name
#[derive(Debug, Clone)]
pub struct Model {
    collection: Arc<str>,
    schema: Arc<Schema>,
}

impl Model {
    /// Collection documents of this model live in
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Schema of this model
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Reference target pointing at this model, already bound
    pub fn reference(&self) -> ReferenceTarget {
        ReferenceTarget::bound(self.collection.to_string(), self.schema.clone())
    }
}

/// Entry point for creating, loading, saving and populating documents
pub struct Mapper {
    storage: Arc<dyn Storage>,
    config: MapperConfig,
    resolver: ReferenceResolver,
    models: RwLock<FxHashMap<String, Model>>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("models", &self.models.read().len())
            .finish()
    }
}

impl Mapper {
    /// Build a mapper over `storage`
    ///
    /// # Errors
    ///
    /// `Error::Config` if `config` does not validate.
    pub fn new(storage: Arc<dyn Storage>, config: MapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(storage, config))
    }

    /// Mapper with the default configuration
    pub fn with_defaults(storage: Arc<dyn Storage>) -> Self {
        Self::build(storage, MapperConfig::default())
    }

    fn build(storage: Arc<dyn Storage>, config: MapperConfig) -> Self {
        let resolver = ReferenceResolver::new(storage.clone())
            .with_concurrency(config.populate_concurrency)
            .with_version_key(config.version_key);
        debug!(?config, "mapper created");
        Self {
            storage,
            config,
            resolver,
            models: RwLock::new(FxHashMap::default()),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Storage handle
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Resolver used by `populate`
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    fn save_options(&self) -> SaveOptions {
        SaveOptions {
            skip_empty_writes: self.config.skip_empty_writes,
        }
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Register `schema` under `collection`
    ///
    /// # Errors
    ///
    /// `Error::Config` if the collection is already registered.
    pub fn register(&self, collection: impl Into<String>, schema: Arc<Schema>) -> Result<Model> {
        let collection = collection.into();
        let mut models = self.models.write();
        if models.contains_key(&collection) {
            return Err(Error::Config(format!(
                "collection '{}' is already registered",
                collection
            )));
        }
        let model = Model {
            collection: Arc::from(collection.as_str()),
            schema,
        };
        models.insert(collection.clone(), model.clone());
        debug!(collection = %collection, "registered model");
        Ok(model)
    }

    /// Model registered under `collection`
    pub fn model(&self, collection: &str) -> Option<Model> {
        self.models.read().get(collection).cloned()
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// New, unsaved document of `model`
    pub fn create(&self, model: &Model, payload: impl Into<JsonValue>) -> Result<DocumentNode> {
        let mut node =
            DocumentNode::construct(model.schema.clone(), payload)?.in_collection(model.collection());
        node.set_version_key(self.config.version_key);
        Ok(node)
    }

    /// Create and save a document
    pub async fn insert(&self, model: &Model, payload: impl Into<JsonValue>) -> Result<DocumentNode> {
        let mut node = self.create(model, payload)?;
        self.save(&mut node).await?;
        Ok(node)
    }

    /// Load a document by id
    pub async fn find_by_id(&self, model: &Model, id: DocId) -> Result<Option<DocumentNode>> {
        let stored = self.storage.fetch_by_id(model.collection(), &id).await?;
        debug!(collection = model.collection(), %id, found = stored.is_some(), "find_by_id");
        stored
            .map(|stored| -> Result<DocumentNode> {
                let mut node =
                    DocumentNode::from_stored(model.collection(), model.schema.clone(), &stored)?;
                node.set_version_key(self.config.version_key);
                Ok(node)
            })
            .transpose()
    }

    /// Stored form of a document, without building a node
    ///
    /// `__v` is included only when the config enables the version key.
    pub async fn find_by_id_lean(&self, model: &Model, id: DocId) -> Result<Option<JsonValue>> {
        let stored = self.storage.fetch_by_id(model.collection(), &id).await?;
        Ok(stored.map(|stored| stored.lean(self.config.version_key)))
    }

    /// Load, apply a partial update, and save
    ///
    /// Returns `Ok(None)` if no document has this id.
    pub async fn update_by_id(
        &self,
        model: &Model,
        id: DocId,
        payload: impl Into<JsonValue>,
    ) -> Result<Option<WriteAck>> {
        let Some(mut node) = self.find_by_id(model, id).await? else {
            return Ok(None);
        };
        node.apply_update(payload)?;
        self.save(&mut node).await.map(Some)
    }

    /// Save a top-level document
    pub async fn save(&self, node: &mut DocumentNode) -> Result<WriteAck> {
        let collection = node.collection().unwrap_or("").to_string();
        let result = persist::save_with(self.storage.as_ref(), node, self.save_options()).await;
        match &result {
            Ok(ack) => debug!(
                collection = %collection,
                id = %ack.id,
                version = ack.version,
                inserted = ack.inserted,
                modified = ack.modified,
                "saved document"
            ),
            Err(e) => debug!(collection = %collection, error = %e, "save failed"),
        }
        result
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Populate reference `field` of `node`
    pub async fn populate(&self, node: &mut DocumentNode, field: &str) -> Result<()> {
        let result = self.resolver.populate(node, field).await;
        match &result {
            Err(Error::ReferenceNotFound { collection, id }) => {
                warn!(field, collection = %collection, %id, "populate found no document")
            }
            Err(e) => debug!(field, error = %e, "populate failed"),
            Ok(()) => debug!(field, "populated"),
        }
        result
    }

    /// Populate several reference fields of `node` concurrently
    pub async fn populate_many(
        &self,
        node: &mut DocumentNode,
        fields: &[&str],
    ) -> Result<Vec<PopulateOutcome>> {
        let outcomes = self.resolver.populate_many(node, fields).await?;
        for (field, outcome) in &outcomes {
            if let Err(e) = outcome {
                warn!(field = %field, error = %e, "populate failed");
            }
        }
        Ok(outcomes)
    }

    /// Population state of `field`
    pub fn get_resolved<'a>(&self, node: &'a DocumentNode, field: &str) -> Result<Resolution<'a>> {
        self.resolver.get_resolved(node, field)
    }

    /// Save the resolved view of reference `field`
    pub async fn save_resolved(&self, owner: &mut DocumentNode, field: &str) -> Result<WriteAck> {
        let ack = persist::save_resolved_with(
            self.storage.as_ref(),
            owner,
            field,
            self.save_options(),
        )
        .await?;
        debug!(field, id = %ack.id, inserted = ack.inserted, "saved resolved reference");
        Ok(ack)
    }
}
