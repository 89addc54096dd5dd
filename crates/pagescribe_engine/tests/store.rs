use std::fs;

use pagescribe_core::RunState;
use pagescribe_engine::{FileProgressStore, MemoryProgressStore, ProgressStore, StoreError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_state() -> RunState {
    let mut state = RunState::new("abc123", "My Novel", "My Novel\n\n", 1_700_000_000_000);
    state.push_concluded("https://x.test/1", "\n\nChapter 1\n\nText", 1_700_000_000_100);
    state.push_excluded("https://x.test/2", 1_700_000_000_200);
    state
}

#[tokio::test]
async fn file_store_round_trips_and_clears() {
    let temp = TempDir::new().unwrap();
    let store = FileProgressStore::new(temp.path().to_path_buf());
    let state = sample_state();

    store.save("abc123", &state).await.unwrap();
    assert!(temp.path().join("novel_abc123.json").is_file());
    assert_eq!(store.load("abc123").await.unwrap(), Some(state));

    store.clear("abc123").await.unwrap();
    assert_eq!(store.load("abc123").await.unwrap(), None);
}

#[tokio::test]
async fn checkpoint_uses_the_documented_field_names() {
    let temp = TempDir::new().unwrap();
    let store = FileProgressStore::new(temp.path().to_path_buf());
    store.save("abc123", &sample_state()).await.unwrap();

    let raw = fs::read_to_string(temp.path().join("novel_abc123.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["title"], "My Novel");
    assert_eq!(json["runId"], "abc123");
    assert_eq!(json["downloadedIdentities"][1], "https://x.test/2");
    assert_eq!(json["excludedIdentities"][0], "https://x.test/2");
    assert_eq!(json["lastUpdate"], 1_700_000_000_200_i64);
    assert!(json["content"].as_str().unwrap().ends_with("Text"));
}

#[tokio::test]
async fn clearing_an_absent_key_is_a_noop() {
    let temp = TempDir::new().unwrap();
    let file = FileProgressStore::new(temp.path().join("never-created"));
    file.clear("missing").await.unwrap();

    let memory = MemoryProgressStore::new();
    memory.clear("missing").await.unwrap();
    assert_eq!(memory.load("missing").await.unwrap(), None);
}

#[tokio::test]
async fn corrupt_checkpoint_is_unavailable() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("novel_bad.json"), "{not json").unwrap();
    let store = FileProgressStore::new(temp.path().to_path_buf());
    assert!(matches!(
        store.load("bad").await,
        Err(StoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn file_lock_rejects_second_holder_until_released() {
    let temp = TempDir::new().unwrap();
    let store = FileProgressStore::new(temp.path().to_path_buf());

    store.acquire("abc123").await.unwrap();
    assert_eq!(
        store.acquire("abc123").await,
        Err(StoreError::Locked("abc123".to_string()))
    );
    store.acquire("other").await.unwrap();

    store.release("abc123").await;
    store.acquire("abc123").await.unwrap();
}

#[tokio::test]
async fn file_lock_is_exclusive_across_store_instances() {
    let temp = TempDir::new().unwrap();
    let first = FileProgressStore::new(temp.path().to_path_buf());
    let second = FileProgressStore::new(temp.path().to_path_buf());

    first.acquire("abc123").await.unwrap();
    assert!(second.is_locked("abc123"));
    assert_eq!(
        second.acquire("abc123").await,
        Err(StoreError::Locked("abc123".to_string()))
    );

    first.release("abc123").await;
    assert!(!second.is_locked("abc123"));
    second.acquire("abc123").await.unwrap();
}

#[tokio::test]
async fn dropped_holder_does_not_block_a_fresh_store() {
    let temp = TempDir::new().unwrap();
    let first = FileProgressStore::new(temp.path().to_path_buf());
    first.acquire("abc123").await.unwrap();
    // Same as a killed process: the handle goes away without a release.
    drop(first);

    let fresh = FileProgressStore::new(temp.path().to_path_buf());
    assert!(temp.path().join("novel_abc123.lock").exists());
    assert!(!fresh.is_locked("abc123"));
    fresh.acquire("abc123").await.unwrap();
}

#[tokio::test]
async fn leftover_lock_file_is_not_a_lock() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("novel_abc123.lock"), "1700000000000").unwrap();
    let store = FileProgressStore::new(temp.path().to_path_buf());
    assert!(!store.is_locked("abc123"));
    store.acquire("abc123").await.unwrap();
    assert!(store.acquire("abc123").await.is_err());
}

#[tokio::test]
async fn memory_store_locks_and_counts_saves() {
    let store = MemoryProgressStore::new();
    store.acquire("r").await.unwrap();
    assert!(matches!(
        store.acquire("r").await,
        Err(StoreError::Locked(_))
    ));
    store.release("r").await;
    store.acquire("r").await.unwrap();

    store.save("r", &sample_state()).await.unwrap();
    assert_eq!(store.save_count(), 1);
    assert!(store.contains("r"));

    store.set_fail_saves(true);
    assert!(store.save("r", &sample_state()).await.is_err());
    assert_eq!(store.save_count(), 1);
}
