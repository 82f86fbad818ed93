//! Building a mapper from `docmap.toml`

use crate::common::*;
use docmap::prelude::*;
use docmap::CONFIG_FILE_NAME;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_mapper_from_config_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "version_key = false\npopulate_concurrency = 2\n").unwrap();

    let config = MapperConfig::from_file(&path).unwrap();
    assert!(config.skip_empty_writes);
    let store = Arc::new(MemoryStore::new());
    let mapper = Mapper::new(store, config).unwrap();
    assert_eq!(mapper.config().populate_concurrency, 2);

    let model = mapper.register("flat", flat_schema()).unwrap();
    let node = mapper.insert(&model, json!({"a": 1})).await.unwrap();
    assert!(node.to_snapshot().get("__v").is_none());
}

#[test]
fn test_default_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    MapperConfig::write_default_if_missing(&path).unwrap();
    let config = MapperConfig::from_file(&path).unwrap();
    assert_eq!(config, MapperConfig::default());
}

#[test]
fn test_invalid_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "populate_concurrency = 0\n").unwrap();

    match MapperConfig::from_file(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains(CONFIG_FILE_NAME)),
        other => panic!("expected config error, got {:?}", other),
    }
}
