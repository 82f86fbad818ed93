//! Output views: `to_snapshot`, `to_object` and lean reads

use crate::common::*;
use docmap::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn shouting_schema(version_key: bool) -> Arc<Schema> {
    Schema::builder()
        .string("name")
        .to_object(ToObjectOptions {
            transform: Some(Arc::new(|map: &mut JsonMap| {
                if let Some(serde_json::Value::String(name)) = map.get_mut("name") {
                    *name = name.to_uppercase();
                }
                map.remove("_id");
            })),
            version_key,
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_transform_runs_only_in_to_object() {
    let t = TestMapper::new();
    let model = t.register("people", shouting_schema(true));
    let node = t.mapper.insert(&model, json!({"name": "ian"})).await.unwrap();

    let object = node.to_object();
    assert_eq!(object["name"], json!("IAN"));
    assert!(object.get("_id").is_none());

    let snapshot = node.to_snapshot();
    assert_eq!(snapshot["name"], json!("ian"));
    assert_eq!(snapshot["_id"], node.id().to_json());
}

#[tokio::test]
async fn test_to_object_version_key_option() {
    let t = TestMapper::new();
    let with = t.register("with", shouting_schema(true));
    let without = t.register("without", shouting_schema(false));

    let a = t.mapper.insert(&with, json!({"name": "a"})).await.unwrap();
    let b = t.mapper.insert(&without, json!({"name": "b"})).await.unwrap();

    assert_eq!(a.to_object()["__v"], json!(0));
    assert!(b.to_object().get("__v").is_none());
    assert_eq!(b.to_snapshot()["__v"], json!(0));
}

#[tokio::test]
async fn test_unsaved_document_has_no_version() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let node = t.mapper.create(&model, json!({"a": 1})).unwrap();

    assert!(node.version().is_none());
    assert!(node.to_snapshot().get("__v").is_none());
    assert!(!node.is_persisted());
}

#[tokio::test]
async fn test_lean_read_shows_stored_form() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let mut story = t
        .mapper
        .insert(&lib.stories, json!({"title": "t", "author": ian.id().to_json()}))
        .await
        .unwrap();
    story.set_field("title", "u").unwrap();
    t.mapper.save(&mut story).await.unwrap();

    let lean = t
        .mapper
        .find_by_id_lean(&lib.stories, story.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lean["_id"], story.id().to_json());
    assert_eq!(lean["author"], ian.id().to_json());
    assert_eq!(lean["title"], json!("u"));
    assert_eq!(lean["__v"], json!(1));
    assert!(t
        .mapper
        .find_by_id_lean(&lib.stories, DocId::new())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_lean_read_honors_disabled_version_key() {
    let t = TestMapper::with_config(MapperConfig {
        version_key: false,
        ..MapperConfig::default()
    });
    let model = t.register("people", Schema::builder().string("name").build().unwrap());
    let node = t.mapper.insert(&model, json!({"name": "Ian"})).await.unwrap();

    let lean = t
        .mapper
        .find_by_id_lean(&model, node.id())
        .await
        .unwrap()
        .unwrap();
    assert!(lean.get("__v").is_none());
    assert_eq!(lean["name"], json!("Ian"));
    assert_eq!(lean["_id"], node.id().to_json());
    assert_eq!(t.store.get_raw("people", &node.id()).unwrap().version, 0);
}

#[tokio::test]
async fn test_to_object_inlines_resolved_reference() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let mut story = t
        .mapper
        .insert(&lib.stories, json!({"title": "t", "author": ian.id().to_json()}))
        .await
        .unwrap();

    assert_eq!(story.to_object()["author"], ian.id().to_json());
    t.mapper.populate(&mut story, "author").await.unwrap();

    let object = story.to_object();
    assert_eq!(object["author"]["name"], json!("Ian"));
    assert_eq!(object["author"]["_id"], ian.id().to_json());
    assert_eq!(story.to_snapshot()["author"], ian.id().to_json());
}

#[tokio::test]
async fn test_snapshot_keeps_schema_order() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let node = t.mapper.insert(&model, json!({"c": 3, "a": 1, "b": 2})).await.unwrap();

    let snapshot = node.to_snapshot();
    let keys: Vec<&str> = snapshot
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["_id", "a", "b", "c", "__v"]);
}
