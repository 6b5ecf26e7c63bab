//! Persistent (immutable) hash map based on CHAMP.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map
//! that uses structural sharing for efficient operations, and
//! [`TransientHashMap`], its mutable builder.
//!
//! # Overview
//!
//! `PersistentHashMap` is based on the Compressed Hash-Array Mapped Prefix-tree
//! (CHAMP), a refinement of HAMT. Every node keeps inline entries and sub-nodes
//! in two separate compressed arrays, and the trie is kept in a canonical
//! form: two maps with equal contents have the same shape no matter in which
//! order they were built.
//!
//! - O(log32 N) get (effectively O(1) for practical sizes)
//! - O(log32 N) insert
//! - O(log32 N) remove
//! - O(1) len and `is_empty`
//!
//! All operations return new maps without modifying the original,
//! and structural sharing ensures memory efficiency. Operations that would not
//! change the map return a map sharing the receiver's root (see
//! [`PersistentHashMap::ptr_eq`]).
//!
//! # Examples
//!
//! ```rust
//! use champ_collections::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2)
//!     .insert("three".to_string(), 3);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.get("two"), Some(&2));
//! assert_eq!(map.get("three"), Some(&3));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::rc::Rc;

use super::node::{Entries, Node};
use super::owner::Owner;
use super::{ReferenceCounter, hash_of, hash_unordered, trie};

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on CHAMP.
///
/// `PersistentHashMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `is_empty`     | O(1)              |
/// | `transient`    | O(1)              |
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
pub struct PersistentHashMap<K, V> {
    /// Root node of the trie
    root: ReferenceCounter<Node<K, V>>,
    /// Number of entries
    length: usize,
}

impl<K, V> Clone for PersistentHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::Empty),
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let empty: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(empty.is_empty());
    ///
    /// let non_empty = empty.insert("key".to_string(), 42);
    /// assert!(!non_empty.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Sharing a root implies equal contents. Operations that leave a map
    /// unchanged return a map that is `ptr_eq` to the receiver.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("a", 1);
    /// assert!(map.ptr_eq(&map.insert("a", 1)));
    /// assert!(map.ptr_eq(&map.remove("missing")));
    /// assert!(!map.ptr_eq(&map.insert("a", 2)));
    /// ```
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }

    /// Returns an iterator over key-value pairs.
    ///
    /// The iteration order is unspecified but stable for a given map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    ///
    /// let total: i32 = map.iter().map(|(_, value)| value).sum();
    /// assert_eq!(total, 3);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        PersistentHashMapIterator {
            entries: self.root.entries(),
            remaining: self.length,
        }
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Folds every entry into an accumulator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
    /// let total = map.fold(0, |accumulator, (_, value)| accumulator + value);
    /// assert_eq!(total, 3);
    /// ```
    pub fn fold<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(B, (&K, &V)) -> B,
    {
        self.iter().fold(init, function)
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("key".to_string(), 42);
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get("key"), Some(&42));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        let mut map = Self::new();
        map.insert_mut(key, value);
        map
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash` and
    /// `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and its value.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        trie::get(&self.root, key, hash_of(key))
    }

    /// Returns the value for `key`, or `default` when the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("a", 1);
    /// assert_eq!(map.get_or("a", &0), &1);
    /// assert_eq!(map.get_or("b", &0), &0);
    /// ```
    #[must_use]
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Removes a key from the map.
    ///
    /// Returns a new map without the key. If the key doesn't exist,
    /// returns a map sharing the receiver's root.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get("a"), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.contains_key(key) {
            return self.clone();
        }
        let mut result = self.clone();
        result.remove_mut(key);
        result
    }

    /// Returns an empty map.
    ///
    /// An empty receiver is returned unchanged.
    #[must_use]
    pub fn clear(&self) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        Self::new()
    }

    /// Updates the value for a key using a function.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("count".to_string(), 10);
    /// let updated = map.update("count", |value| value + 1);
    ///
    /// assert_eq!(updated.unwrap().get("count"), Some(&11));
    /// ```
    #[must_use]
    pub fn update<Q, F>(&self, key: &Q, function: F) -> Option<Self>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> V,
    {
        let (stored_key, value) = self.get_key_value(key)?;
        let new_value = function(value);
        let stored_key = stored_key.clone();

        let mut result = self.clone();
        result.insert_mut(stored_key, new_value);
        Some(result)
    }

    /// Updates or removes a value for a key using an updater function.
    ///
    /// The updater function receives `Some(&V)` if the key exists, or `None` if it doesn't.
    /// If the updater returns `Some(V)`, the value is inserted or updated.
    /// If the updater returns `None`, the key is removed (if it exists).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("count".to_string(), 10);
    ///
    /// // Increment existing value
    /// let updated = map.update_with("count", |maybe_value| {
    ///     maybe_value.map(|value| value + 1)
    /// });
    /// assert_eq!(updated.get("count"), Some(&11));
    ///
    /// // Insert if not exists
    /// let inserted = map.update_with("new_key", |maybe_value| {
    ///     maybe_value.copied().or(Some(100))
    /// });
    /// assert_eq!(inserted.get("new_key"), Some(&100));
    ///
    /// // Remove by returning None
    /// let removed = map.update_with("count", |_| None);
    /// assert_eq!(removed.get("count"), None);
    /// ```
    #[must_use]
    pub fn update_with<Q, F>(&self, key: &Q, updater: F) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let current = self.get_key_value(key);
        let new_value = updater(current.map(|(_, value)| value));

        match (current, new_value) {
            (Some((stored_key, _)), Some(value)) => {
                let stored_key = stored_key.clone();
                let mut result = self.clone();
                result.insert_mut(stored_key, value);
                result
            }
            (Some(_), None) => self.remove(key),
            (None, Some(value)) => {
                let mut result = self.clone();
                result.insert_mut(key.to_owned(), value);
                result
            }
            (None, None) => self.clone(),
        }
    }

    /// Keeps only the entries for which `predicate` returns `true`.
    ///
    /// Returns a map sharing the receiver's root when every entry is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<i32, i32> = (0..10).map(|n| (n, n)).collect();
    /// let even = map.retain(|key, _| key % 2 == 0);
    /// assert_eq!(even.len(), 5);
    /// assert!(map.ptr_eq(&map.retain(|_, _| true)));
    /// ```
    #[must_use]
    pub fn retain<F>(&self, predicate: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut transient = self.clone().transient();
        if transient.retain(predicate) == 0 {
            return self.clone();
        }
        transient.persistent()
    }

    /// Removes every key produced by `keys`.
    ///
    /// Returns a map sharing the receiver's root when no key was present.
    #[must_use]
    pub fn remove_all<'a, I, Q>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a Q>,
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized + 'a,
    {
        let mut transient = self.clone().transient();
        let mut changed = false;
        for key in keys {
            changed |= transient.remove(key).is_some();
        }
        if changed {
            transient.persistent()
        } else {
            self.clone()
        }
    }

    /// Converts this persistent map into a transient map.
    ///
    /// The conversion is O(1): the transient shares every node with the
    /// persistent map it came from and copies a node only when it first
    /// edits it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("a", 1);
    /// let mut transient = map.clone().transient();
    /// transient.insert("b", 2);
    /// let updated = transient.persistent();
    ///
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(updated.len(), 2);
    /// ```
    #[must_use]
    pub fn transient(self) -> TransientHashMap<K, V> {
        TransientHashMap {
            inner: self,
            owner: Owner::mint(),
            _marker: PhantomData,
        }
    }

    /// Stores `value` under `key` in place, copying shared nodes on the way.
    pub(crate) fn insert_mut(&mut self, key: K, value: V) -> Option<V> {
        let hash = hash_of(&key);
        let previous = trie::insert(&mut self.root, key, value, hash, 0);
        if previous.is_none() {
            self.length += 1;
        }
        previous
    }

    /// Removes `key` in place, copying shared nodes on the way.
    pub(crate) fn remove_mut<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = trie::remove(&mut self.root, key, hash_of(key), 0);
        if removed.is_some() {
            self.length -= 1;
        }
        removed
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PersistentHashMap<K, V> {
    /// Inserts a key-value pair into the map.
    ///
    /// Returns a new map with the key-value pair inserted.
    /// If the key already exists with an equal value, the receiver is
    /// returned unchanged (sharing its root).
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new().insert("key".to_string(), 1);
    /// let map2 = map1.insert("key".to_string(), 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        if self.get(&key) == Some(&value) {
            return self.clone();
        }
        let mut result = self.clone();
        result.insert_mut(key, value);
        result
    }

    /// Inserts every pair produced by `entries` in one transient session.
    ///
    /// Returns a map sharing the receiver's root when no pair changed the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("a", 1);
    /// let extended = map.insert_all([("b", 2), ("c", 3)]);
    /// assert_eq!(extended.len(), 3);
    /// assert!(map.ptr_eq(&map.insert_all([("a", 1)])));
    /// ```
    #[must_use]
    pub fn insert_all<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut transient = self.clone().transient();
        let mut changed = false;
        for (key, value) in entries {
            if transient.get(&key) != Some(&value) {
                transient.insert(key, value);
                changed = true;
            }
        }
        if changed {
            transient.persistent()
        } else {
            self.clone()
        }
    }

    /// Merges two maps, with values from `other` taking precedence on key conflicts.
    ///
    /// # Complexity
    ///
    /// O(m log32 (n + m)) where m is the size of `other`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let map2 = PersistentHashMap::new()
    ///     .insert("b".to_string(), 20)
    ///     .insert("c".to_string(), 3);
    ///
    /// let merged = map1.merge(&map2);
    ///
    /// assert_eq!(merged.get("a"), Some(&1));
    /// assert_eq!(merged.get("b"), Some(&20)); // From map2
    /// assert_eq!(merged.get("c"), Some(&3));
    /// ```
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        self.insert_all(
            other
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        )
    }
}

// =============================================================================
// TransientHashMap Definition
// =============================================================================

/// A transient (temporarily mutable) hash map for efficient batch updates.
///
/// A `TransientHashMap` edits its trie in place wherever it holds the only
/// reference to a node, and copies a node the first time it touches one that
/// is still shared with a persistent map. After the batch, convert it back
/// with [`persistent()`](Self::persistent), which is O(1).
///
/// # Design
///
/// - Every builder carries its own [`Owner`]; `Clone` forks the builder and
///   mints a new owner, after which the two forks never observe each other's
///   edits.
/// - `PhantomData<Rc<()>>` ensures `!Send` and `!Sync`.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::TransientHashMap;
///
/// let mut transient = TransientHashMap::new();
/// transient.insert("a", 1);
/// transient.insert("b", 2);
/// assert_eq!(transient.insert("a", 10), Some(1));
///
/// let map = transient.persistent();
/// assert_eq!(map.get("a"), Some(&10));
/// ```
pub struct TransientHashMap<K, V> {
    inner: PersistentHashMap<K, V>,
    owner: Owner,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientHashMap<i32, i32>: Send, Sync);
static_assertions::assert_not_impl_any!(TransientHashMap<String, String>: Send, Sync);

impl<K, V> TransientHashMap<K, V> {
    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the owner token of this editing session.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    /// Returns an iterator over key-value pairs.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        self.inner.iter()
    }

    /// Freezes this builder into a persistent map.
    ///
    /// The owner of the builder dies with it.
    ///
    /// # Complexity
    ///
    /// O(1) - only moves fields
    #[must_use]
    pub fn persistent(self) -> PersistentHashMap<K, V> {
        self.inner
    }
}

impl<K: Clone + Hash + Eq, V: Clone> TransientHashMap<K, V> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        PersistentHashMap::new().transient()
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Removes `key`, returning its value.
    ///
    /// Removing an absent key does not copy any node.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.inner.contains_key(key) {
            return None;
        }
        self.inner.remove_mut(key).map(|(_, value)| value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.inner = PersistentHashMap::new();
    }

    /// Inserts every pair produced by `entries`.
    pub fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        for (key, value) in entries {
            self.inner.insert_mut(key, value);
        }
    }

    /// Keeps only the entries for which `predicate` returns `true`.
    ///
    /// Returns the number of removed entries.
    pub fn retain<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .inner
            .iter()
            .filter(|&(key, value)| !predicate(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.inner.remove_mut(key);
        }
        doomed.len()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> TransientHashMap<K, V> {
    /// Stores `value` under `key`, returning the value it replaced.
    ///
    /// Storing a value equal to the current one leaves every node untouched,
    /// so nothing shared with the source map is copied.
    ///
    /// # Complexity
    ///
    /// O(log32 N) amortized
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.inner.get(&key) == Some(&value) {
            return Some(value);
        }
        self.inner.insert_mut(key, value)
    }
}

impl<K, V> Clone for TransientHashMap<K, V> {
    /// Forks the builder. The fork gets a fresh owner.
    fn clone(&self) -> Self {
        let owner = Owner::mint();
        log::trace!(
            "forking transient map {} into {}",
            self.owner.id(),
            owner.id()
        );
        Self {
            inner: self.inner.clone(),
            owner,
            _marker: PhantomData,
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Default for TransientHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for TransientHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = Self::new();
        transient.extend(iter);
        transient
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransientHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIterator<'a, K, V> {
    entries: Entries<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().collect::<TransientHashMap<K, V>>().persistent()
    }
}

impl<K: Clone + Hash + Eq, V: Clone, S: BuildHasher> From<HashMap<K, V, S>>
    for PersistentHashMap<K, V>
{
    fn from(map: HashMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> From<PersistentHashMap<K, V>> for HashMap<K, V> {
    fn from(map: PersistentHashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    /// Entries are moved out of nodes this map owns alone and cloned out of
    /// nodes it shares.
    fn into_iter(self) -> Self::IntoIter {
        let mut entries = Vec::with_capacity(self.length);
        Node::drain_into(self.root, &mut entries);
        PersistentHashMapIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.length != other.length {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }

        self.iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for PersistentHashMap<K, V> {}

impl<K: Hash, V: Hash> Hash for PersistentHashMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.length);
        state.write_u64(hash_unordered(self.iter()));
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}={value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for PersistentHashMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
struct PersistentHashMapVisitor<K, V> {
    marker: PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentHashMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = PersistentHashMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentHashMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert_mut(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentHashMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHashMapVisitor {
            marker: PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_new_creates_empty() {
        let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.iter().count(), 0);
    }

    #[rstest]
    fn test_insert_overwrite_keeps_length() {
        let map1 = PersistentHashMap::new().insert("key".to_string(), 1);
        let map2 = map1.insert("key".to_string(), 2);

        assert_eq!(map1.get("key"), Some(&1));
        assert_eq!(map2.get("key"), Some(&2));
        assert_eq!(map1.len(), 1);
        assert_eq!(map2.len(), 1);
    }

    #[rstest]
    fn test_identity_preserved_for_no_ops() {
        let map: PersistentHashMap<i32, i32> = (0..50).map(|n| (n, n * 2)).collect();

        assert!(map.ptr_eq(&map.insert(7, 14)));
        assert!(map.ptr_eq(&map.remove(&1000)));
        assert!(map.ptr_eq(&map.remove_all([&100, &200])));
        assert!(map.ptr_eq(&map.insert_all(vec![(1, 2), (2, 4)])));
        assert!(map.ptr_eq(&map.update_with(&999, |_| None)));
    }

    #[rstest]
    fn test_modifications_do_not_leak_into_original() {
        let original: PersistentHashMap<i32, i32> = (0..1000).map(|n| (n, n)).collect();
        let modified = original.insert(5000, 5000).remove(&3).insert(4, -4);

        assert_eq!(original.len(), 1000);
        assert_eq!(original.get(&3), Some(&3));
        assert_eq!(original.get(&4), Some(&4));
        assert_eq!(original.get(&5000), None);

        assert_eq!(modified.len(), 1000);
        assert_eq!(modified.get(&3), None);
        assert_eq!(modified.get(&4), Some(&-4));
    }

    #[rstest]
    fn test_retain_and_remove_all() {
        let map: PersistentHashMap<i32, i32> = (0..20).map(|n| (n, n)).collect();
        let odd = map.retain(|key, _| key % 2 == 1);
        assert_eq!(odd.len(), 10);
        assert!(odd.keys().all(|key| key % 2 == 1));

        let trimmed = map.remove_all([&0, &1, &2, &42]);
        assert_eq!(trimmed.len(), 17);
        assert!(!trimmed.contains_key(&1));
    }

    #[rstest]
    fn test_transient_fork_is_isolated() {
        let mut transient: TransientHashMap<i32, i32> = (0..100).map(|n| (n, n)).collect();
        let mut fork = transient.clone();
        assert_ne!(transient.owner(), fork.owner());

        transient.insert(1, -1);
        fork.remove(&2);

        assert_eq!(transient.get(&1), Some(&-1));
        assert_eq!(transient.get(&2), Some(&2));
        assert_eq!(fork.get(&1), Some(&1));
        assert_eq!(fork.get(&2), None);
    }

    #[rstest]
    fn test_transient_does_not_touch_source_map() {
        let map: PersistentHashMap<i32, i32> = (0..100).map(|n| (n, n)).collect();
        let mut transient = map.clone().transient();
        for key in 0..50 {
            transient.remove(&key);
        }
        transient.insert(500, 500);
        let frozen = transient.persistent();

        assert_eq!(map.len(), 100);
        assert_eq!(frozen.len(), 51);
        assert_eq!(map.get(&10), Some(&10));
        assert_eq!(frozen.get(&10), None);
    }

    #[rstest]
    fn test_equal_maps_hash_equally() {
        use std::collections::hash_map::DefaultHasher;

        let forward: PersistentHashMap<i32, i32> = (0..100).map(|n| (n, n)).collect();
        let backward: PersistentHashMap<i32, i32> = (0..100).rev().map(|n| (n, n)).collect();

        let digest = |map: &PersistentHashMap<i32, i32>| {
            let mut hasher = DefaultHasher::new();
            map.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(forward, backward);
        assert_eq!(digest(&forward), digest(&backward));
    }

    #[rstest]
    fn test_display_single_entry() {
        let map = PersistentHashMap::singleton("a", 1);
        assert_eq!(format!("{map}"), "{a=1}");
        assert_eq!(format!("{}", PersistentHashMap::<i32, i32>::new()), "{}");
    }

    #[derive(Debug)]
    struct CloneCounter(std::rc::Rc<std::cell::Cell<usize>>);

    impl Clone for CloneCounter {
        fn clone(&self) -> Self {
            self.0.set(self.0.get() + 1);
            Self(self.0.clone())
        }
    }

    #[rstest]
    fn test_into_iter_moves_entries_out_of_unshared_tries() {
        let clones = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut map = PersistentHashMap::new();
        for key in 0..300 {
            map.insert_mut(key, CloneCounter(clones.clone()));
        }
        let baseline = clones.get();

        let shared = map.clone();
        assert_eq!(shared.into_iter().count(), 300);
        assert_eq!(clones.get(), baseline + 300);

        let mut keys: Vec<i32> = map.into_iter().map(|(key, _)| key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..300).collect::<Vec<_>>());
        assert_eq!(clones.get(), baseline + 300);
    }

    #[rstest]
    fn test_std_conversions() {
        let std_map: HashMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
        let map = PersistentHashMap::from(std_map.clone());
        assert_eq!(map.get(&2), Some(&"two"));
        assert_eq!(HashMap::from(map), std_map);
    }
}
