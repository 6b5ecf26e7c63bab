//! Tests for the hasher feature flags.
//!
//! Run with `--features fxhash` or `--features ahash` to exercise the fast
//! hashers; without either flag the standard hasher is used. Every test must
//! hold for all three.

use champ_collections::persistent::{PersistentHashMap, PersistentHashSet, SequencedHashMap};
use rstest::rstest;

// =============================================================================
// Determinism
// =============================================================================

/// Maps built independently from the same entries answer identically.
#[rstest]
fn test_deterministic_lookup_across_maps() {
    let entries: Vec<(String, i32)> = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .enumerate()
        .map(|(index, name)| ((*name).to_string(), index as i32))
        .collect();

    let map1: PersistentHashMap<String, i32> = entries.iter().cloned().collect();
    let map2: PersistentHashMap<String, i32> = entries.iter().rev().cloned().collect();

    for (key, value) in &entries {
        assert_eq!(map1.get(key), Some(value));
        assert_eq!(map2.get(key), Some(value));
    }
    assert_eq!(map1, map2);
}

#[rstest]
fn test_borrowed_and_owned_keys_hash_alike() {
    let map = PersistentHashMap::singleton("key".to_string(), 1);
    assert_eq!(map.get("key"), Some(&1));
    assert_eq!(map.get(&"key".to_string()), Some(&1));
}

// =============================================================================
// Volume
// =============================================================================

#[rstest]
#[case(10_000)]
#[case(100_000)]
fn test_large_maps_find_every_key(#[case] size: u64) {
    let map: PersistentHashMap<u64, u64> = (0..size).map(|n| (n, n * 3)).collect();
    assert_eq!(map.len(), size as usize);
    for key in (0..size).step_by(97) {
        assert_eq!(map.get(&key), Some(&(key * 3)));
    }
    assert_eq!(map.get(&size), None);
}

#[rstest]
fn test_sets_and_sequenced_maps_share_the_hasher() {
    let set: PersistentHashSet<String> = (0..1000).map(|n| format!("item-{n}")).collect();
    assert!(set.contains("item-999"));
    assert!(!set.contains("item-1000"));

    let map: SequencedHashMap<String, usize> = (0..1000).map(|n| (format!("item-{n}"), n)).collect();
    assert_eq!(map.index_of("item-500"), Some(500));
}
