//! Partial updates, filtered updates and bulk writes

use crate::common::*;
use docmap::prelude::*;
use serde_json::json;

fn map(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

// ============================================================================
// update_by_id
// ============================================================================

#[tokio::test]
async fn test_update_by_id_null_and_absent_keys() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let node = t.mapper.insert(&model, json!({"a": 1, "b": 2, "c": 3})).await.unwrap();

    let ack = t
        .mapper
        .update_by_id(&model, node.id(), json!({"a": null, "b": 20}))
        .await
        .unwrap()
        .unwrap();
    assert!(ack.modified);

    let stored = t.store.get_raw("flat", &node.id()).unwrap();
    assert_eq!(stored.values["a"], json!(null));
    assert_eq!(stored.values["b"], json!(20));
    assert_eq!(stored.values["c"], json!(3));
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_update_by_id_unknown_document() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());

    let outcome = t
        .mapper
        .update_by_id(&model, DocId::new(), json!({"a": 1}))
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(t.store.count("flat"), 0);
}

#[tokio::test]
async fn test_failed_update_writes_nothing() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let node = t.mapper.insert(&model, json!({"a": 1, "b": 2})).await.unwrap();
    let writes = t.store.write_count();

    let err = t
        .mapper
        .update_by_id(&model, node.id(), json!({"a": 5, "b": "two"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
    assert_eq!(t.store.write_count(), writes);
    assert_eq!(stored_value(&t.store, "flat", &node.id(), "a"), json!(1));
}

#[tokio::test]
async fn test_apply_update_is_all_or_nothing() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let mut node = t.mapper.insert(&model, json!({"a": 1})).await.unwrap();

    assert!(node.apply_update(json!({"b": 2, "missing": 3})).is_err());
    assert_eq!(node.get("b").unwrap(), None);
    assert!(node.to_persistence_diff().is_empty());

    assert!(node
        .apply_update(json!({"_id": DocId::new().to_json(), "b": 2}))
        .is_err());
    node.apply_update(json!({"_id": node.id().to_json(), "b": 2})).unwrap();
    assert_eq!(node.modified_paths(), vec![FieldPath::field("b")]);
}

// ============================================================================
// update_one
// ============================================================================

#[tokio::test]
async fn test_update_one_by_field_filter() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let node = t.mapper.insert(&model, json!({"a": 1, "b": 2})).await.unwrap();
    t.mapper.insert(&model, json!({"a": 9, "b": 9})).await.unwrap();

    let filter = Filter::all().eq(FieldPath::field("a"), 1);
    let result = t
        .store
        .update_one("flat", &filter, &map(json!({"b": null})), false)
        .unwrap();
    assert_eq!(result.matched_count, 1);
    assert_eq!(result.modified_count, 1);
    assert!(result.upserted_id.is_none());

    let reloaded = t.mapper.find_by_id(&model, node.id()).await.unwrap().unwrap();
    assert_eq!(reloaded.get("b").unwrap(), Some(JsonValue::null()));
    assert_eq!(reloaded.get("a").unwrap(), Some(JsonValue::from(1)));
}

#[tokio::test]
async fn test_update_one_upsert_builds_from_filter() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let id = DocId::new();

    let result = t
        .store
        .update_one("flat", &Filter::by_id(id).eq(FieldPath::field("a"), 7), &map(json!({"b": 8})), true)
        .unwrap();
    assert_eq!(result.matched_count, 0);
    assert_eq!(result.upserted_id, Some(id));

    let node = t.mapper.find_by_id(&model, id).await.unwrap().unwrap();
    assert_eq!(node.get("a").unwrap(), Some(JsonValue::from(7)));
    assert_eq!(node.get("b").unwrap(), Some(JsonValue::from(8)));
}

// ============================================================================
// bulk_write
// ============================================================================

#[tokio::test]
async fn test_bulk_write_result_shape() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let existing = t.mapper.insert(&model, json!({"a": 1})).await.unwrap();
    let upsert_id = DocId::new();

    let ops = vec![
        BulkOp::InsertOne {
            document: map(json!({"a": 2})),
        },
        BulkOp::UpdateOne {
            filter: map(json!({"_id": upsert_id.to_json()})),
            update: map(json!({"a": 3})),
            upsert: true,
        },
        BulkOp::UpdateOne {
            filter: map(json!({"_id": existing.id().to_json()})),
            update: map(json!({"a": 1})),
            upsert: false,
        },
        BulkOp::UpdateOne {
            filter: map(json!({"a": 2})),
            update: map(json!({"b": 5})),
            upsert: false,
        },
    ];
    let result = t.store.bulk_write("flat", &ops).unwrap();

    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.upserted_count, 1);
    assert_eq!(result.matched_count, 2);
    assert_eq!(result.modified_count, 1);
    assert_eq!(result.deleted_count, 0);
    assert_eq!(result.upserted_ids.get(&1), Some(&upsert_id));
    assert!(result.inserted_ids.contains_key(&0));
    assert_eq!(t.store.count("flat"), 3);

    let shape = serde_json::to_value(&result).unwrap();
    assert_eq!(shape["upsertedCount"], json!(1));
    assert_eq!(shape["upsertedIds"]["1"], upsert_id.to_json());
    assert_eq!(shape["matchedCount"], json!(2));
}

#[tokio::test]
async fn test_bulk_write_stops_at_first_failure() {
    let t = TestMapper::new();
    let model = t.register("flat", flat_schema());
    let existing = t.mapper.insert(&model, json!({"a": 1})).await.unwrap();

    let ops = vec![
        BulkOp::DeleteOne {
            filter: map(json!({"a": 1})),
        },
        BulkOp::UpdateOne {
            filter: map(json!({"a": 0})),
            update: map(json!({"_id": existing.id().to_json()})),
            upsert: true,
        },
        BulkOp::InsertOne {
            document: map(json!({"a": 4})),
        },
    ];
    let err = t.store.bulk_write("flat", &ops).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
    assert_eq!(t.store.count("flat"), 0);
    assert!(t.mapper.find_by_id(&model, existing.id()).await.unwrap().is_none());
}
