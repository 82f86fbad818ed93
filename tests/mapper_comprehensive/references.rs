//! Reference population and the persistence boundary

use crate::common::*;
use docmap::prelude::*;
use serde_json::json;

async fn story_by(t: &TestMapper, lib: &Library, author: Option<DocId>) -> DocumentNode {
    let author = author.map(|id| id.to_json()).unwrap_or(serde_json::Value::Null);
    t.mapper
        .insert(&lib.stories, json!({"title": "Casino Royale", "author": author}))
        .await
        .unwrap()
}

// ============================================================================
// Persistence Boundary
// ============================================================================

#[tokio::test]
async fn test_parent_save_leaves_referenced_document_alone() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let mut story = story_by(&t, &lib, Some(ian.id())).await;

    t.mapper.populate(&mut story, "author").await.unwrap();
    t.mapper
        .resolver()
        .resolved_mut(&mut story, "author")
        .unwrap()
        .unwrap()
        .set_field("name", "Fleming")
        .unwrap();
    story.set_field("title", "Dr. No").unwrap();

    let diff = story.to_persistence_diff();
    assert!(diff.paths().all(|p| p.head_field() != Some("author")));
    t.mapper.save(&mut story).await.unwrap();
    assert_eq!(stored_value(&t.store, "people", &ian.id(), "name"), json!("Ian"));

    let ack = t.mapper.save_resolved(&mut story, "author").await.unwrap();
    assert_eq!(ack.id, ian.id());
    assert!(ack.modified);
    assert_eq!(stored_value(&t.store, "people", &ian.id(), "name"), json!("Fleming"));
    assert_eq!(
        stored_value(&t.store, "stories", &story.id(), "author"),
        ian.id().to_json()
    );
    assert!(story.to_persistence_diff().is_empty());
}

#[tokio::test]
async fn test_populated_view_reflects_stored_document() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian", "age": 56})).await.unwrap();
    let mut story = story_by(&t, &lib, Some(ian.id())).await;

    assert!(matches!(
        t.mapper.get_resolved(&story, "author").unwrap(),
        Resolution::NotPopulated
    ));
    t.mapper.populate(&mut story, "author").await.unwrap();

    let view = t.mapper.get_resolved(&story, "author").unwrap().node().unwrap();
    assert_eq!(view.id(), ian.id());
    assert_eq!(view.get("age").unwrap(), Some(JsonValue::from(56)));
    assert_eq!(view.collection(), Some("people"));
    assert!(view.is_persisted());
}

// ============================================================================
// Missing and Null References
// ============================================================================

#[tokio::test]
async fn test_missing_reference_is_distinct_from_unpopulated() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ghost = DocId::new();
    let mut story = story_by(&t, &lib, Some(ghost)).await;

    let err = t.mapper.populate(&mut story, "author").await.unwrap_err();
    assert!(matches!(err, Error::ReferenceNotFound { id, .. } if id == ghost));
    assert!(!err.is_retryable());

    match t.mapper.get_resolved(&story, "author").unwrap() {
        Resolution::Missing { id } => assert_eq!(id, ghost),
        other => panic!("expected Missing, got {:?}", other),
    }
    assert_eq!(story.reference_id("author").unwrap(), Some(ghost));
    assert!(matches!(
        t.mapper.save_resolved(&mut story, "author").await,
        Err(Error::ReferenceNotFound { .. })
    ));
}

#[tokio::test]
async fn test_null_reference_populates_to_null() {
    let t = TestMapper::new();
    let lib = library(&t);
    let mut story = story_by(&t, &lib, None).await;

    t.mapper.populate(&mut story, "author").await.unwrap();
    assert!(matches!(
        t.mapper.get_resolved(&story, "author").unwrap(),
        Resolution::Null
    ));
}

#[tokio::test]
async fn test_populate_non_reference_field_fails() {
    let t = TestMapper::new();
    let lib = library(&t);
    let mut story = story_by(&t, &lib, None).await;

    let err = t.mapper.populate(&mut story, "title").await.unwrap_err();
    assert!(err.is_programmer_error());
    assert!(matches!(
        t.mapper.populate(&mut story, "nope").await,
        Err(Error::UnknownField { .. })
    ));
}

// ============================================================================
// Reassignment
// ============================================================================

#[tokio::test]
async fn test_setting_raw_id_drops_view() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let ann = t.mapper.insert(&lib.people, json!({"name": "Ann"})).await.unwrap();
    let mut story = story_by(&t, &lib, Some(ian.id())).await;
    t.mapper.populate(&mut story, "author").await.unwrap();

    story.set_field("author", ann.id()).unwrap();
    assert!(matches!(
        t.mapper.get_resolved(&story, "author").unwrap(),
        Resolution::NotPopulated
    ));
    assert_eq!(
        story.to_persistence_diff().get("author").map(|v| v.as_inner().clone()),
        Some(ann.id().to_json())
    );

    t.mapper.populate(&mut story, "author").await.unwrap();
    let view = t.mapper.get_resolved(&story, "author").unwrap().node().unwrap();
    assert_eq!(view.get("name").unwrap(), Some(JsonValue::from("Ann")));
}

#[tokio::test]
async fn test_literal_object_reference_is_saved_explicitly() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let mut story = story_by(&t, &lib, Some(ian.id())).await;

    story.set_field("author", json!({"name": "Anonymous"})).unwrap();
    assert_eq!(story.reference_id("author").unwrap(), Some(ian.id()));
    assert!(story.to_persistence_diff().is_empty());
    let replacement = t.mapper.get_resolved(&story, "author").unwrap().node().unwrap();
    assert!(!replacement.is_persisted());
    let replacement_id = replacement.id();
    let people_before = t.store.count("people");

    t.mapper.save(&mut story).await.unwrap();
    assert_eq!(t.store.count("people"), people_before);

    let ack = t.mapper.save_resolved(&mut story, "author").await.unwrap();
    assert!(ack.inserted);
    assert_eq!(ack.id, replacement_id);
    assert_eq!(t.store.count("people"), people_before + 1);
    assert_eq!(story.reference_id("author").unwrap(), Some(replacement_id));
    assert!(story.is_modified("author").unwrap());

    t.mapper.save(&mut story).await.unwrap();
    assert_eq!(
        stored_value(&t.store, "stories", &story.id(), "author"),
        replacement_id.to_json()
    );
}

// ============================================================================
// Populate Many
// ============================================================================

#[tokio::test]
async fn test_populate_many_reports_each_field() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let ghost = DocId::new();
    let mut story = t
        .mapper
        .insert(
            &lib.stories,
            json!({"title": "t", "author": ian.id().to_json(), "editor": ghost.to_json()}),
        )
        .await
        .unwrap();

    let outcomes = t
        .mapper
        .populate_many(&mut story, &["editor", "author", "editor"])
        .await
        .unwrap();
    let fields: Vec<&str> = outcomes.iter().map(|(f, _)| f.as_str()).collect();
    assert_eq!(fields, vec!["editor", "author"]);
    assert!(matches!(outcomes[0].1, Err(Error::ReferenceNotFound { .. })));
    assert!(outcomes[1].1.is_ok());

    assert!(t.mapper.get_resolved(&story, "author").unwrap().node().is_some());
    assert!(t.mapper.get_resolved(&story, "editor").unwrap().is_populated());
}

#[tokio::test]
async fn test_populate_many_rejects_bad_field_before_fetching() {
    let t = TestMapper::new();
    let lib = library(&t);
    let ian = t.mapper.insert(&lib.people, json!({"name": "Ian"})).await.unwrap();
    let mut story = story_by(&t, &lib, Some(ian.id())).await;

    assert!(t
        .mapper
        .populate_many(&mut story, &["author", "title"])
        .await
        .is_err());
    assert!(matches!(
        t.mapper.get_resolved(&story, "author").unwrap(),
        Resolution::NotPopulated
    ));
}
