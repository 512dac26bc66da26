//! Tests for the FavouriteStore and its cache persistence

use tempfile::TempDir;

use awesome::application::services::{FavouriteStore, FAVOURITES_KEY};
use awesome::domain::TreeNode;
use awesome::infrastructure::traits::{CacheStore, FileCacheStore};
use awesome::util::testing::{init_test_setup, MemoryCache};

#[test]
fn given_tools_and_cli_when_round_tripping_then_single_path() {
    init_test_setup();
    let cache = MemoryCache::new();
    let mut store = FavouriteStore::new(FAVOURITES_KEY);
    store.record("Tools", None);
    store.record("Tools", Some("CLI"));
    store.record("Tools", Some("CLI"));

    store.save(&cache).unwrap();
    let loaded = FavouriteStore::from_cache(&cache, FAVOURITES_KEY);

    assert_eq!(loaded, store);
    assert_eq!(loaded.tree().child_names(), vec!["Tools"]);
    assert_eq!(
        loaded.tree().child("Tools").unwrap().child_names(),
        vec!["CLI"]
    );
}

#[test]
fn given_missing_blob_when_loading_then_empty() {
    let cache = MemoryCache::new();

    let store = FavouriteStore::from_cache(&cache, FAVOURITES_KEY);

    assert!(store.is_empty());
    assert_eq!(store.tree().name, FAVOURITES_KEY);
}

#[test]
fn given_corrupt_blob_when_loading_then_empty_without_error() {
    let cache = MemoryCache::new();
    cache.write(FAVOURITES_KEY, "{not json").unwrap();

    let store = FavouriteStore::from_cache(&cache, FAVOURITES_KEY);

    assert!(store.is_empty());
}

#[test]
fn given_file_cache_when_saving_then_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let mut store = FavouriteStore::new(FAVOURITES_KEY);
    store.record("Platforms", Some("Rust"));
    store.save(&FileCacheStore::new(temp.path())).unwrap();

    let reopened = FileCacheStore::new(temp.path());
    let loaded = FavouriteStore::from_cache(&reopened, FAVOURITES_KEY);

    assert_eq!(
        loaded.tree().child("Platforms").and_then(|p| p.child("Rust")),
        Some(&TreeNode::new("Rust"))
    );
    assert!(temp.path().join("awesome.json").exists());
}

#[test]
fn given_saved_choices_when_saving_empty_store_then_cleared() {
    let cache = MemoryCache::new();
    let mut store = FavouriteStore::new(FAVOURITES_KEY);
    store.record("Tools", Some("CLI"));
    store.save(&cache).unwrap();

    FavouriteStore::new(FAVOURITES_KEY).save(&cache).unwrap();

    assert!(FavouriteStore::from_cache(&cache, FAVOURITES_KEY).is_empty());
}

#[test]
fn given_single_favourite_when_picking_random_then_returns_it() {
    let mut store = FavouriteStore::new(FAVOURITES_KEY);
    store.record("Tools", None);

    for _ in 0..10 {
        assert_eq!(
            store.tree().random().map(|n| n.name.as_str()),
            Some("Tools")
        );
    }
}
