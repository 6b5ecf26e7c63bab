//! Persistent (immutable) data structures and their transient builders.
//!
//! This module provides efficient immutable collections that use structural
//! sharing to minimize copying:
//!
//! - [`PersistentHashMap`]: Persistent hash map (CHAMP)
//! - [`PersistentHashSet`]: Persistent hash set (based on CHAMP)
//! - [`SequencedHashMap`]: Persistent hash map that remembers insertion order
//! - [`SequencedHashSet`]: Persistent hash set that remembers insertion order
//! - [`PersistentVector`]: Persistent vector (size-annotated 32-way trie)
//!
//! Every persistent collection has a transient counterpart
//! ([`TransientHashMap`], [`TransientHashSet`], [`TransientSequencedHashMap`],
//! [`TransientSequencedHashSet`], [`TransientVector`]) for batching edits,
//! and the vector and the sequenced map have bounded variants
//! ([`BoundedVector`], [`BoundedSequencedHashMap`]).
//!
//! # Structural Sharing
//!
//! Operations on persistent collections create new versions without copying
//! the entire structure. Only the path from the root to the changed slot is
//! copied; every other node is shared between the old and the new version.
//! Operations that change nothing return a value that shares the receiver's
//! root, which can be observed with `ptr_eq`.
//!
//! # Examples
//!
//! ## `PersistentHashMap`
//!
//! ```rust
//! use champ_collections::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//! assert_eq!(map.get("one"), Some(&1));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```
//!
//! ## `SequencedHashMap`
//!
//! ```rust
//! use champ_collections::persistent::SequencedHashMap;
//!
//! let map = SequencedHashMap::new()
//!     .insert_last("a", 1)
//!     .insert_last("b", 2)
//!     .insert_first("c", 3);
//!
//! let keys: Vec<&&str> = map.keys().collect();
//! assert_eq!(keys, vec![&"c", &"a", &"b"]);
//! ```
//!
//! ## `PersistentVector`
//!
//! ```rust
//! use champ_collections::persistent::PersistentVector;
//!
//! let vector: PersistentVector<i32> = (0..100).collect();
//! assert_eq!(vector.get(50), Some(&50));
//!
//! let updated = vector.update(50, 999).unwrap();
//! assert_eq!(vector.get(50), Some(&50));     // Original unchanged
//! assert_eq!(updated.get(50), Some(&999));   // New version
//! ```

use std::hash::{Hash, Hasher};

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled (default), this is `std::sync::Arc`,
/// which makes persistent collections `Send + Sync`.
///
/// When the `arc` feature is disabled, this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

// =============================================================================
// Hash computation
// =============================================================================

#[cfg(feature = "fxhash")]
fn new_hasher() -> rustc_hash::FxHasher {
    rustc_hash::FxHasher::default()
}

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
fn new_hasher() -> ahash::AHasher {
    ahash::AHasher::default()
}

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
fn new_hasher() -> std::collections::hash_map::DefaultHasher {
    std::collections::hash_map::DefaultHasher::new()
}

/// Computes the 32-bit trie hash of a key.
///
/// The 64-bit hasher output is folded so that every bit contributes.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u32 {
    let mut hasher = new_hasher();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

/// Combines element hashes so that the result does not depend on iteration order.
pub(crate) fn hash_unordered<I, T>(elements: I) -> u64
where
    I: IntoIterator<Item = T>,
    T: Hash,
{
    elements.into_iter().fold(0_u64, |combined, element| {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        element.hash(&mut hasher);
        combined.wrapping_add(hasher.finish())
    })
}

mod cursor;
mod error;
mod hashmap;
mod hashset;
mod node;
mod owner;
mod sequenced;
mod sequenced_set;
mod trie;
mod vector;

pub use cursor::SequencedCursor;
pub use cursor::VectorCursor;
pub use error::CapacityError;
pub use error::CursorError;
pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIntoIterator;
pub use hashmap::PersistentHashMapIterator;
pub use hashmap::TransientHashMap;
pub use hashset::PersistentHashSet;
pub use hashset::PersistentHashSetIntoIterator;
pub use hashset::PersistentHashSetIterator;
pub use hashset::TransientHashSet;
pub use owner::Owner;
pub use sequenced::BoundedSequencedHashMap;
pub use sequenced::SequencedEntry;
pub use sequenced::SequencedHashMap;
pub use sequenced::SequencedHashMapIntoIterator;
pub use sequenced::SequencedHashMapIterator;
pub use sequenced::TransientSequencedHashMap;
pub use sequenced_set::SequencedHashSet;
pub use sequenced_set::SequencedHashSetIntoIterator;
pub use sequenced_set::SequencedHashSetIterator;
pub use sequenced_set::TransientSequencedHashSet;
pub use vector::BoundedVector;
pub use vector::PersistentVector;
pub use vector::PersistentVectorIntoIterator;
pub use vector::PersistentVectorIterator;
pub use vector::TransientVector;

// =============================================================================
// Tests
// =============================================================================
