//! Unit tests for the TTL cache

use std::sync::Arc;
use std::time::Duration;
use synth_image_gateway::cache::{CacheEntry, ManualClock, TtlCache, DEFAULT_TTL};
use synth_image_gateway::storage::{FileStore, KeyValueStore, MemoryStore};

const HOUR: Duration = Duration::from_secs(60 * 60);

#[test]
fn test_round_trip_then_expiry_removes_entry() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());
    let cache = TtlCache::with_clock(store.clone(), DEFAULT_TTL, clock.clone());

    cache.set("k", "v");
    assert_eq!(cache.get("k").as_deref(), Some("v"));

    clock.advance(24 * HOUR + Duration::from_secs(1));
    assert_eq!(cache.get("k"), None);
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn test_set_refreshes_timestamp() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());
    let cache = TtlCache::with_clock(store, DEFAULT_TTL, clock.clone());

    cache.set("k", "old");
    clock.advance(20 * HOUR);
    cache.set("k", "new");
    clock.advance(20 * HOUR);

    assert_eq!(cache.get("k").as_deref(), Some("new"));
}

#[test]
fn test_stored_record_layout() {
    let store = Arc::new(MemoryStore::new());
    let cache = TtlCache::new(store.clone(), DEFAULT_TTL);

    cache.set("hero", "data:image/jpeg;base64,AAAA");
    let raw = store.get("hero").unwrap().unwrap();
    let entry: CacheEntry = serde_json::from_str(&raw).unwrap();

    assert_eq!(entry.value, "data:image/jpeg;base64,AAAA");
    assert!(entry.timestamp > 0);
}

#[test]
fn test_file_backed_cache_persists_and_expires() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::default());

    let cache = TtlCache::with_clock(
        Arc::new(FileStore::open(dir.path()).unwrap()),
        DEFAULT_TTL,
        clock.clone(),
    );
    cache.set("synth-hero-image", "data:image/jpeg;base64,AAAA");

    let reopened_store = Arc::new(FileStore::open(dir.path()).unwrap());
    let reopened = TtlCache::with_clock(reopened_store.clone(), DEFAULT_TTL, clock.clone());
    assert_eq!(
        reopened.get("synth-hero-image").as_deref(),
        Some("data:image/jpeg;base64,AAAA")
    );

    clock.advance(25 * HOUR);
    assert_eq!(reopened.get("synth-hero-image"), None);
    assert_eq!(reopened_store.get("synth-hero-image").unwrap(), None);
}

#[test]
fn test_store_failures_degrade_to_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TtlCache::new(Arc::new(FileStore::open(dir.path()).unwrap()), DEFAULT_TTL);

    // Keys the file store rejects are logged and ignored
    cache.set("../outside", "v");
    assert_eq!(cache.get("../outside"), None);
}
