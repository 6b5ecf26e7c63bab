#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! Vectors and sets serialize as sequences, maps as maps. Sequenced
//! collections keep their order through a round trip.

use champ_collections::persistent::{
    PersistentHashMap, PersistentHashSet, PersistentVector, SequencedHashMap, SequencedHashSet,
};
use rstest::rstest;
use serde::{Deserialize, Serialize};

// =============================================================================
// PersistentVector
// =============================================================================

#[rstest]
fn test_vector_json_roundtrip() {
    let vector: PersistentVector<i32> = (0..1000).collect();
    let json = serde_json::to_string(&vector).unwrap();
    let restored: PersistentVector<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(vector, restored);
}

#[rstest]
fn test_vector_serializes_as_json_array() {
    let vector: PersistentVector<i32> = (1..=3).collect();
    assert_eq!(serde_json::to_string(&vector).unwrap(), "[1,2,3]");
    let empty: PersistentVector<i32> = serde_json::from_str("[]").unwrap();
    assert!(empty.is_empty());
}

#[rstest]
fn test_vector_rejects_wrong_element_type() {
    let result: Result<PersistentVector<i32>, _> = serde_json::from_str("[1, \"two\"]");
    assert!(result.is_err());
}

// =============================================================================
// PersistentHashMap and PersistentHashSet
// =============================================================================

#[rstest]
fn test_hashmap_json_roundtrip() {
    let map: PersistentHashMap<String, i32> = (0..200).map(|n| (format!("key{n}"), n)).collect();
    let json = serde_json::to_string(&map).unwrap();
    let restored: PersistentHashMap<String, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(map, restored);
}

#[rstest]
fn test_hashmap_deserializes_from_json_object() {
    let map: PersistentHashMap<String, bool> =
        serde_json::from_str(r#"{"yes": true, "no": false}"#).unwrap();
    assert_eq!(map.get("yes"), Some(&true));
    assert_eq!(map.get("no"), Some(&false));
}

#[rstest]
fn test_hashset_json_roundtrip() {
    let set: PersistentHashSet<i32> = (0..100).collect();
    let json = serde_json::to_string(&set).unwrap();
    let restored: PersistentHashSet<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(set, restored);
}

// =============================================================================
// Sequenced collections
// =============================================================================

#[rstest]
fn test_sequenced_map_keeps_order_through_json() {
    let map = SequencedHashMap::new()
        .insert_last("b".to_string(), 2)
        .insert_last("c".to_string(), 3)
        .insert_first("a".to_string(), 1);
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"a":1,"b":2,"c":3}"#);

    let restored: SequencedHashMap<String, i32> = serde_json::from_str(r#"{"z":1,"y":2}"#).unwrap();
    assert_eq!(
        restored.keys().cloned().collect::<Vec<_>>(),
        vec!["z".to_string(), "y".to_string()]
    );
}

#[rstest]
fn test_sequenced_set_keeps_order_through_json() {
    let set = SequencedHashSet::new().insert_last(3).insert_last(1).insert_last(2);
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, "[3,1,2]");
    let restored: SequencedHashSet<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
}

// =============================================================================
// Nested in derived types
// =============================================================================

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Playlist {
    name: String,
    tracks: PersistentVector<String>,
    ratings: SequencedHashMap<String, u8>,
}

#[rstest]
fn test_collections_inside_derived_struct() {
    let playlist = Playlist {
        name: "mix".to_string(),
        tracks: ["one", "two"].iter().map(ToString::to_string).collect(),
        ratings: SequencedHashMap::singleton("two".to_string(), 5),
    };
    let json = serde_json::to_string(&playlist).unwrap();
    let restored: Playlist = serde_json::from_str(&json).unwrap();
    assert_eq!(playlist, restored);
}
