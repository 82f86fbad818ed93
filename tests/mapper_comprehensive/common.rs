//! Shared fixtures for the mapper suite

#![allow(dead_code)]

use docmap::prelude::*;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Mapper Construction
// ============================================================================

pub struct TestMapper {
    pub store: Arc<MemoryStore>,
    pub mapper: Mapper,
}

impl TestMapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let mapper = Mapper::new(store.clone(), config).expect("valid config");
        Self { store, mapper }
    }

    pub fn register(&self, collection: &str, schema: Arc<Schema>) -> Model {
        self.mapper
            .register(collection, schema)
            .expect("register model")
    }
}

// ============================================================================
// Schemas
// ============================================================================

/// `{a, b, c}` numbers
pub fn flat_schema() -> Arc<Schema> {
    Schema::builder()
        .number("a")
        .number("b")
        .number("c")
        .build()
        .unwrap()
}

/// `{e, f, g}` numbers, used as an embedded child
pub fn child_schema() -> Arc<Schema> {
    Schema::builder()
        .number("e")
        .number("f")
        .number("g")
        .build()
        .unwrap()
}

/// `{name, child, children}`
pub fn parent_schema() -> Arc<Schema> {
    let item = Schema::builder()
        .string("name")
        .number("age")
        .build()
        .unwrap();
    Schema::builder()
        .string("name")
        .embedded("child", child_schema())
        .embedded_list("children", item)
        .build()
        .unwrap()
}

/// People and stories referencing each other
pub struct Library {
    pub people: Model,
    pub stories: Model,
}

pub fn library(t: &TestMapper) -> Library {
    let person_ref = ReferenceTarget::new("people");
    let story_ref = ReferenceTarget::new("stories");
    let person = Schema::builder()
        .string("name")
        .number("age")
        .reference("favorite", story_ref.clone())
        .build()
        .unwrap();
    let story = Schema::builder()
        .string("title")
        .reference("author", person_ref.clone())
        .reference("editor", person_ref.clone())
        .build()
        .unwrap();
    person_ref.bind(person.clone());
    story_ref.bind(story.clone());
    Library {
        people: t.register("people", person),
        stories: t.register("stories", story),
    }
}

/// Value at `path` in a stored document's values
pub fn stored_value(store: &MemoryStore, collection: &str, id: &DocId, key: &str) -> serde_json::Value {
    store
        .get_raw(collection, id)
        .and_then(|doc| doc.values.get(key).cloned())
        .unwrap_or(serde_json::Value::Null)
}
