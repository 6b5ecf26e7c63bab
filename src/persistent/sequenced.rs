//! Persistent hash map that remembers the order of its entries.
//!
//! This module provides [`SequencedHashMap`], its builder
//! [`TransientSequencedHashMap`] and the fixed-capacity
//! [`BoundedSequencedHashMap`].
//!
//! # Overview
//!
//! Every entry carries a sequence number, a signed 32-bit integer that
//! totally orders the map independently of the hash trie. Two structures are
//! kept in lock-step:
//!
//! - a [`PersistentHashMap`] from each key to its sequence number, for
//!   membership tests
//! - a [`PersistentVector`] of [`SequencedEntry`] values in ascending
//!   sequence order, which is the only place values are stored
//!
//! The position of a key is found by a binary search of the vector for the
//! key's sequence number. New entries at the front take the number just
//! below the current smallest one, new entries at the back the number just
//! above the current largest one. When an end of the `i32` range is reached
//! the map renumbers every entry densely around zero. Bounded maps never
//! renumber and fail with [`CapacityError`] instead.
//!
//! # Examples
//!
//! ```rust
//! use champ_collections::persistent::SequencedHashMap;
//!
//! let map = SequencedHashMap::new()
//!     .insert_last("a", 1)
//!     .insert_last("b", 2)
//!     .insert_first("c", 3);
//! assert_eq!(map.first(), Some((&"c", &3)));
//! assert_eq!(map.last(), Some((&"b", &2)));
//!
//! // Replacing a value keeps the entry where it is
//! let updated = map.insert("a", 9);
//! let entries: Vec<(&&str, &i32)> = updated.iter().collect();
//! assert_eq!(entries, vec![(&"c", &3), (&"a", &9), (&"b", &2)]);
//!
//! let (rest, key, value) = updated.pop_first().unwrap();
//! assert_eq!((key, value), ("c", 3));
//! assert_eq!(rest.keys().collect::<Vec<_>>(), vec![&"a", &"b"]);
//! ```

use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::rc::Rc;

use super::cursor::SequencedCursor;
use super::error::CapacityError;
use super::hashmap::PersistentHashMap;
use super::owner::Owner;
use super::vector::{PersistentVector, PersistentVectorIntoIterator, PersistentVectorIterator};
use super::{ReferenceCounter, hash_unordered};

// =============================================================================
// SequencedEntry
// =============================================================================

/// A key, its value and the sequence number that orders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequencedEntry<K, V> {
    key: K,
    value: V,
    sequence: i32,
}

impl<K, V> SequencedEntry<K, V> {
    /// Returns the key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Returns the sequence number.
    ///
    /// Sequence numbers grow in iteration order but are not contiguous.
    #[must_use]
    pub const fn sequence(&self) -> i32 {
        self.sequence
    }
}

// =============================================================================
// Sequence bookkeeping
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum End {
    First,
    Last,
}

/// What to do when no sequence number is left at one end.
trait Exhaustion {
    type Error;

    fn exhausted<K, V>(&self, core: &mut SequencedCore<K, V>) -> Result<(), Self::Error>
    where
        K: Clone + Hash + Eq,
        V: Clone;
}

/// Renumber every entry and carry on.
struct Renumber;

impl Exhaustion for Renumber {
    type Error = Infallible;

    fn exhausted<K, V>(&self, core: &mut SequencedCore<K, V>) -> Result<(), Self::Error>
    where
        K: Clone + Hash + Eq,
        V: Clone,
    {
        core.renumber();
        Ok(())
    }
}

/// Fail without touching the map.
struct Reject {
    capacity: usize,
}

impl Exhaustion for Reject {
    type Error = CapacityError;

    fn exhausted<K, V>(&self, core: &mut SequencedCore<K, V>) -> Result<(), Self::Error>
    where
        K: Clone + Hash + Eq,
        V: Clone,
    {
        log::debug!(
            "bounded sequenced map ran out of sequence numbers (range {}..{})",
            core.first,
            core.last
        );
        Err(CapacityError::new(self.capacity))
    }
}

/// The trie and the ordering vector of a sequenced map.
///
/// Every sequence number lies in `first..last`.
#[derive(Clone)]
struct SequencedCore<K, V> {
    trie: PersistentHashMap<K, i32>,
    order: PersistentVector<SequencedEntry<K, V>>,
    first: i32,
    last: i32,
}

impl<K, V> SequencedCore<K, V> {
    fn new() -> Self {
        Self {
            trie: PersistentHashMap::new(),
            order: PersistentVector::new(),
            first: 0,
            last: 0,
        }
    }

    fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.order.get(index).map(|entry| (&entry.key, &entry.value))
    }

    const fn has_room(&self, end: End) -> bool {
        match end {
            End::First => self.first > i32::MIN,
            End::Last => self.last < i32::MAX,
        }
    }

    /// Shrinks `first..last` to the numbers actually in use.
    fn tighten(&mut self) {
        match (self.order.first(), self.order.last()) {
            (Some(first), Some(last)) => {
                self.first = first.sequence;
                self.last = last.sequence + 1;
            }
            _ => {
                self.first = 0;
                self.last = 0;
            }
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> SequencedCore<K, V> {
    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let sequence = *self.trie.get(key)?;
        self.order
            .binary_search_by(|entry| entry.sequence.cmp(&sequence))
            .ok()
    }

    fn entry<Q>(&self, key: &Q) -> Option<&SequencedEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.order.get(self.position(key)?)
    }

    fn make_room<P: Exhaustion>(&mut self, end: End, policy: &P) -> Result<(), P::Error> {
        if !self.has_room(end) {
            policy.exhausted(self)?;
        }
        Ok(())
    }

    /// Adds a new entry at `end`. The caller has made room.
    fn attach(&mut self, key: K, value: V, end: End) {
        let sequence = match end {
            End::First => {
                self.first -= 1;
                self.first
            }
            End::Last => {
                self.last += 1;
                self.last - 1
            }
        };
        self.trie.insert_mut(key.clone(), sequence);
        let entry = SequencedEntry {
            key,
            value,
            sequence,
        };
        match end {
            End::First => self.order.push_front_mut(entry),
            End::Last => self.order.push_back_mut(entry),
        }
    }

    fn replace_value(&mut self, index: usize, value: V) -> Option<V> {
        let mut entry = self.order.get(index)?.clone();
        let previous = std::mem::replace(&mut entry.value, value);
        self.order.set_mut(index, entry);
        Some(previous)
    }

    /// Stores `value` under `key`. A new key goes to the back, an existing
    /// key stays where it is.
    fn insert<P: Exhaustion>(&mut self, key: K, value: V, policy: &P) -> Result<Option<V>, P::Error> {
        if let Some(index) = self.position(&key) {
            return Ok(self.replace_value(index, value));
        }
        self.make_room(End::Last, policy)?;
        self.attach(key, value, End::Last);
        Ok(None)
    }

    /// Stores `value` under `key` and moves the key to `end`.
    fn insert_at<P: Exhaustion>(
        &mut self,
        key: K,
        value: V,
        end: End,
        policy: &P,
    ) -> Result<Option<V>, P::Error> {
        self.make_room(end, policy)?;
        let previous = self
            .position(&key)
            .and_then(|index| self.order.remove_mut(index))
            .map(|entry| entry.value);
        self.attach(key, value, end);
        Ok(previous)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.position(key)?;
        self.remove_index(index)
    }

    fn remove_index(&mut self, index: usize) -> Option<(K, V)> {
        let entry = self.order.remove_mut(index)?;
        self.detach(entry)
    }

    fn pop(&mut self, end: End) -> Option<(K, V)> {
        let entry = match end {
            End::First => self.order.pop_front_mut(),
            End::Last => self.order.pop_back_mut(),
        }?;
        self.detach(entry)
    }

    fn detach(&mut self, entry: SequencedEntry<K, V>) -> Option<(K, V)> {
        self.trie.remove_mut(&entry.key);
        self.tighten();
        Some((entry.key, entry.value))
    }

    /// Gives the entries the dense range `-(n / 2)..n - n / 2`, keeping
    /// their order, and rebuilds both structures.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn renumber(&mut self) {
        let count = self.order.len();
        log::debug!(
            "renumbering {count} sequenced entries (range {}..{})",
            self.first,
            self.last
        );

        let base = -((count / 2) as i32);
        let mut trie = PersistentHashMap::new().transient();
        let mut order = PersistentVector::new().transient();
        for (offset, mut entry) in std::mem::take(&mut self.order).into_iter().enumerate() {
            entry.sequence = base + offset as i32;
            trie.insert(entry.key.clone(), entry.sequence);
            order.push_back(entry);
        }

        self.trie = trie.persistent();
        self.order = order.persistent();
        self.first = base;
        self.last = base + count as i32;
    }
}

// =============================================================================
// SequencedHashMap Definition
// =============================================================================

/// A persistent hash map that iterates in sequence order.
///
/// # Time Complexity
///
/// | Operation                     | Complexity            |
/// |-------------------------------|-----------------------|
/// | `get`, `contains_key`         | O(log32 N * log N)    |
/// | `first`, `last`               | O(1)                  |
/// | `get_index`                   | O(log32 N)            |
/// | `insert`, `remove`            | O(log32 N * log N)    |
/// | `insert_first`, `insert_last` | O(log32 N * log N)    |
/// | `pop_first`, `pop_last`       | O(log32 N) amortized  |
/// | renumbering                   | O(N), at most once per 2^31 edge inserts |
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::SequencedHashMap;
///
/// let map: SequencedHashMap<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
/// assert_eq!(map.index_of("y"), Some(1));
/// assert_eq!(map.get_index(0), Some((&"x", &1)));
/// ```
pub struct SequencedHashMap<K, V> {
    core: ReferenceCounter<SequencedCore<K, V>>,
}

impl<K, V> Clone for SequencedHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<K, V> SequencedHashMap<K, V> {
    /// Creates a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: ReferenceCounter::new(SequencedCore::new()),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.order.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.order.is_empty()
    }

    /// Returns `true` if both maps share the same internal structure.
    ///
    /// Operations that change nothing return a map for which this holds.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.core, &other.core)
    }

    /// Returns the entry with the smallest sequence number.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.core.get_index(0)
    }

    /// Returns the entry with the largest sequence number.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.len()
            .checked_sub(1)
            .and_then(|index| self.core.get_index(index))
    }

    /// Returns the entry at position `index` in sequence order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.core.get_index(index)
    }

    /// Returns a double-ended iterator over the entries in sequence order.
    #[must_use]
    pub fn iter(&self) -> SequencedHashMapIterator<'_, K, V> {
        SequencedHashMapIterator {
            inner: self.core.order.iter(),
        }
    }

    /// Returns an iterator over the keys in sequence order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in sequence order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns an iterator over the entries with their sequence numbers.
    #[must_use]
    pub fn entries(&self) -> PersistentVectorIterator<'_, SequencedEntry<K, V>> {
        self.core.order.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> SequencedHashMap<K, V> {
    /// Creates a map containing a single entry.
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().edit(|core| {
            let Ok(_) = core.insert(key, value, &Renumber);
        })
    }

    fn edit<F>(&self, function: F) -> Self
    where
        F: FnOnce(&mut SequencedCore<K, V>),
    {
        let mut core = (*self.core).clone();
        function(&mut core);
        Self {
            core: ReferenceCounter::new(core),
        }
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let map = SequencedHashMap::singleton("key".to_string(), 1);
    /// assert_eq!(map.get("key"), Some(&1));
    /// assert_eq!(map.get("other"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.entry(key).map(|entry| &entry.value)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.entry(key).map(|entry| (&entry.key, &entry.value))
    }

    /// Returns the value stored under `key`, or `default`.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns the position of `key` in sequence order.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.position(key)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.trie.contains_key(key)
    }

    /// Stores `value` under `key` and moves the key to the front.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let map = SequencedHashMap::new().insert("a", 1).insert("b", 2);
    /// let moved = map.insert_first("b", 3);
    /// assert_eq!(moved.first(), Some((&"b", &3)));
    /// assert_eq!(map.first(), Some((&"a", &1)));
    /// ```
    #[must_use]
    pub fn insert_first(&self, key: K, value: V) -> Self {
        self.edit(|core| {
            let Ok(_) = core.insert_at(key, value, End::First, &Renumber);
        })
    }

    /// Stores `value` under `key` and moves the key to the back.
    #[must_use]
    pub fn insert_last(&self, key: K, value: V) -> Self {
        self.edit(|core| {
            let Ok(_) = core.insert_at(key, value, End::Last, &Renumber);
        })
    }

    /// Removes `key`.
    ///
    /// Returns the receiver unchanged (sharing its structure) if the key is
    /// absent.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.contains_key(key) {
            return self.clone();
        }
        self.edit(|core| {
            core.remove(key);
        })
    }

    /// Removes every key produced by `keys` in one transient session.
    ///
    /// Returns the receiver unchanged (sharing its structure) when no key
    /// was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let map: SequencedHashMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
    /// let rest = map.remove_all(["a", "c"].iter());
    /// assert_eq!(rest.keys().collect::<Vec<_>>(), vec![&"b"]);
    /// assert!(map.ptr_eq(&map.remove_all(["z"].iter())));
    /// ```
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

    /// Keeps only the entries for which `predicate` returns `true`.
    ///
    /// Survivors keep their order. Returns the receiver unchanged (sharing
    /// its structure) when every entry survives.
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

    /// Removes the first entry.
    ///
    /// Returns `None` if the map is empty.
    #[must_use]
    pub fn pop_first(&self) -> Option<(Self, K, V)> {
        let mut core = (*self.core).clone();
        let (key, value) = core.pop(End::First)?;
        Some((
            Self {
                core: ReferenceCounter::new(core),
            },
            key,
            value,
        ))
    }

    /// Removes the last entry.
    ///
    /// Returns `None` if the map is empty.
    #[must_use]
    pub fn pop_last(&self) -> Option<(Self, K, V)> {
        let mut core = (*self.core).clone();
        let (key, value) = core.pop(End::Last)?;
        Some((
            Self {
                core: ReferenceCounter::new(core),
            },
            key,
            value,
        ))
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

    /// Converts this map into a transient map for batch edits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let mut transient = SequencedHashMap::new().transient();
    /// for number in 0..10 {
    ///     transient.insert_first(number, number * number);
    /// }
    /// let map = transient.persistent();
    /// assert_eq!(map.first(), Some((&9, &81)));
    /// ```
    #[must_use]
    pub fn transient(self) -> TransientSequencedHashMap<K, V> {
        TransientSequencedHashMap {
            core: ReferenceCounter::unwrap_or_clone(self.core),
            owner: Owner::mint(),
            modifications: 0,
            _marker: PhantomData,
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> SequencedHashMap<K, V> {
    /// Stores `value` under `key`.
    ///
    /// A new key is added at the back; an existing key keeps its position.
    /// If the key already holds an equal value, the receiver is returned
    /// unchanged (sharing its structure).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let map = SequencedHashMap::new().insert("a", 1).insert("b", 2);
    /// assert!(map.ptr_eq(&map.insert("a", 1)));
    /// assert_eq!(map.insert("a", 5).first(), Some((&"a", &5)));
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        if self.get(&key) == Some(&value) {
            return self.clone();
        }
        self.edit(|core| {
            let Ok(_) = core.insert(key, value, &Renumber);
        })
    }

    /// Inserts every pair produced by `entries` in one transient session.
    ///
    /// New keys are appended in iteration order; existing keys keep their
    /// position. Returns the receiver unchanged (sharing its structure) when
    /// no pair changed the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashMap;
    ///
    /// let map = SequencedHashMap::new().insert("b", 2).insert("a", 1);
    /// let extended = map.insert_all([("c", 3), ("b", 20)]);
    /// assert_eq!(extended.keys().collect::<Vec<_>>(), vec![&"b", &"a", &"c"]);
    /// assert_eq!(extended.get("b"), Some(&20));
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
}

// =============================================================================
// TransientSequencedHashMap Definition
// =============================================================================

/// A transient (temporarily mutable) sequenced hash map.
///
/// Mutates the nodes it owns exclusively in place and counts its structural
/// modifications for the [`SequencedCursor`]s it hands out. Replacing the
/// value of an existing key is not a structural modification.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::TransientSequencedHashMap;
///
/// let mut transient = TransientSequencedHashMap::new();
/// assert_eq!(transient.insert("a", 1), None);
/// assert_eq!(transient.insert("a", 2), Some(1));
/// transient.insert_first("b", 3);
///
/// let map = transient.persistent();
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec![&"b", &"a"]);
/// ```
pub struct TransientSequencedHashMap<K, V> {
    core: SequencedCore<K, V>,
    owner: Owner,
    modifications: u64,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientSequencedHashMap<i32, i32>: Send, Sync);

impl<K, V> TransientSequencedHashMap<K, V> {
    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.order.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.core.order.is_empty()
    }

    /// Returns the owner token of this editing session.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    pub(crate) const fn modification_count(&self) -> u64 {
        self.modifications
    }

    /// Returns the first entry.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.core.get_index(0)
    }

    /// Returns the last entry.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.len()
            .checked_sub(1)
            .and_then(|index| self.core.get_index(index))
    }

    /// Returns the entry at position `index` in sequence order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.core.get_index(index)
    }

    /// Returns a double-ended iterator over the entries in sequence order.
    #[must_use]
    pub fn iter(&self) -> SequencedHashMapIterator<'_, K, V> {
        SequencedHashMapIterator {
            inner: self.core.order.iter(),
        }
    }

    /// Returns a fail-fast cursor that can remove entries.
    #[must_use]
    pub const fn cursor(&self) -> SequencedCursor {
        SequencedCursor::new(self.owner, self.modifications)
    }

    /// Returns a read-only fail-fast cursor over the entries.
    #[must_use]
    pub const fn entries_cursor(&self) -> SequencedCursor {
        SequencedCursor::read_only(self.owner, self.modifications)
    }

    /// Freezes this builder into a persistent map.
    #[must_use]
    pub fn persistent(self) -> SequencedHashMap<K, V> {
        SequencedHashMap {
            core: ReferenceCounter::new(self.core),
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> TransientSequencedHashMap<K, V> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        SequencedHashMap::new().transient()
    }

    /// Returns a reference to the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.entry(key).map(|entry| &entry.value)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.trie.contains_key(key)
    }

    /// Returns the position of `key` in sequence order.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.core.position(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    ///
    /// A new key is added at the back; an existing key keeps its position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let Ok(previous) = self.core.insert(key, value, &Renumber);
        if previous.is_none() {
            self.modifications += 1;
        }
        previous
    }

    /// Stores `value` under `key` and moves the key to the front.
    pub fn insert_first(&mut self, key: K, value: V) -> Option<V> {
        let Ok(previous) = self.core.insert_at(key, value, End::First, &Renumber);
        self.modifications += 1;
        previous
    }

    /// Stores `value` under `key` and moves the key to the back.
    pub fn insert_last(&mut self, key: K, value: V) -> Option<V> {
        let Ok(previous) = self.core.insert_at(key, value, End::Last, &Renumber);
        self.modifications += 1;
        previous
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (_, value) = self.core.remove(key)?;
        self.modifications += 1;
        Some(value)
    }

    /// Removes and returns the first entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let entry = self.core.pop(End::First)?;
        self.modifications += 1;
        Some(entry)
    }

    /// Removes and returns the last entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let entry = self.core.pop(End::Last)?;
        self.modifications += 1;
        Some(entry)
    }

    pub(crate) fn remove_index(&mut self, index: usize) -> Option<(K, V)> {
        let entry = self.core.remove_index(index)?;
        self.modifications += 1;
        Some(entry)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.core = SequencedCore::new();
            self.modifications += 1;
        }
    }

    /// Keeps only the entries for which `predicate` returns `true`.
    ///
    /// Survivors keep their relative order. Returns how many entries were
    /// removed.
    pub fn retain<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let rejected: Vec<K> = self
            .iter()
            .filter(|&(key, value)| !predicate(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &rejected {
            self.remove(key);
        }
        rejected.len()
    }

    /// Inserts every pair produced by `entries` with [`insert`](Self::insert).
    pub fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }
}

impl<K: Clone, V: Clone> Clone for TransientSequencedHashMap<K, V> {
    /// Forks the builder. The fork gets a fresh owner.
    fn clone(&self) -> Self {
        let owner = Owner::mint();
        log::trace!(
            "forking transient sequenced map {} into {}",
            self.owner.id(),
            owner.id()
        );
        Self {
            core: self.core.clone(),
            owner,
            modifications: 0,
            _marker: PhantomData,
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Default for TransientSequencedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransientSequencedHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// BoundedSequencedHashMap Definition
// =============================================================================

/// A sequenced hash map that never grows beyond a fixed capacity.
///
/// Adding a key to a full map, or running out of sequence numbers at an
/// end, fails with [`CapacityError`] and leaves the map untouched. The map
/// never renumbers.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::BoundedSequencedHashMap;
///
/// let map = BoundedSequencedHashMap::new(2)
///     .try_insert("a", 1)
///     .unwrap()
///     .try_insert("b", 2)
///     .unwrap();
/// assert!(map.try_insert("c", 3).is_err());
/// // Existing keys can still be updated and moved
/// assert!(map.try_insert_first("b", 20).is_ok());
/// ```
pub struct BoundedSequencedHashMap<K, V> {
    map: SequencedHashMap<K, V>,
    capacity: usize,
}

impl<K, V> Clone for BoundedSequencedHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            capacity: self.capacity,
        }
    }
}

impl<K, V> BoundedSequencedHashMap<K, V> {
    /// Creates an empty map bounded to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            map: SequencedHashMap::new(),
            capacity,
        }
    }

    /// Wraps `map`, failing if it already exceeds `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `map.len() > capacity`.
    pub fn from_map(map: SequencedHashMap<K, V>, capacity: usize) -> Result<Self, CapacityError> {
        if map.len() > capacity {
            return Err(CapacityError::new(capacity));
        }
        Ok(Self { map, capacity })
    }

    /// Returns the maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if the map holds `capacity` entries.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.map.len() >= self.capacity
    }

    /// Returns the first entry.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.map.first()
    }

    /// Returns the last entry.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.map.last()
    }

    /// Returns a double-ended iterator over the entries in sequence order.
    #[must_use]
    pub fn iter(&self) -> SequencedHashMapIterator<'_, K, V> {
        self.map.iter()
    }

    /// Returns the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &SequencedHashMap<K, V> {
        &self.map
    }

    /// Unwraps the underlying map.
    #[must_use]
    pub fn into_map(self) -> SequencedHashMap<K, V> {
        self.map
    }

    fn with_core(&self, core: SequencedCore<K, V>) -> Self {
        Self {
            map: SequencedHashMap {
                core: ReferenceCounter::new(core),
            },
            capacity: self.capacity,
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> BoundedSequencedHashMap<K, V> {
    /// Returns a reference to the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    const fn policy(&self) -> Reject {
        Reject {
            capacity: self.capacity,
        }
    }

    fn ensure_room_for(&self, key: &K) -> Result<(), CapacityError> {
        if self.is_full() && !self.contains_key(key) {
            log::debug!(
                "bounded sequenced map rejected a new key beyond capacity {}",
                self.capacity
            );
            return Err(CapacityError::new(self.capacity));
        }
        Ok(())
    }

    /// Stores `value` under `key`; a new key goes to the back.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `key` is new and the map is full, or if
    /// no sequence number is left at the back.
    pub fn try_insert(&self, key: K, value: V) -> Result<Self, CapacityError> {
        self.ensure_room_for(&key)?;
        let mut core = (*self.map.core).clone();
        core.insert(key, value, &self.policy())?;
        Ok(self.with_core(core))
    }

    /// Stores `value` under `key` and moves the key to the front.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `key` is new and the map is full, or if
    /// no sequence number is left at the front.
    pub fn try_insert_first(&self, key: K, value: V) -> Result<Self, CapacityError> {
        self.ensure_room_for(&key)?;
        let mut core = (*self.map.core).clone();
        core.insert_at(key, value, End::First, &self.policy())?;
        Ok(self.with_core(core))
    }

    /// Stores `value` under `key` and moves the key to the back.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `key` is new and the map is full, or if
    /// no sequence number is left at the back.
    pub fn try_insert_last(&self, key: K, value: V) -> Result<Self, CapacityError> {
        self.ensure_room_for(&key)?;
        let mut core = (*self.map.core).clone();
        core.insert_at(key, value, End::Last, &self.policy())?;
        Ok(self.with_core(core))
    }

    /// Removes `key`.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self {
            map: self.map.remove(key),
            capacity: self.capacity,
        }
    }

    /// Removes the first entry.
    #[must_use]
    pub fn pop_first(&self) -> Option<(Self, K, V)> {
        let (map, key, value) = self.map.pop_first()?;
        Some((
            Self {
                map,
                capacity: self.capacity,
            },
            key,
            value,
        ))
    }

    /// Removes the last entry.
    #[must_use]
    pub fn pop_last(&self) -> Option<(Self, K, V)> {
        let (map, key, value) = self.map.pop_last()?;
        Some((
            Self {
                map,
                capacity: self.capacity,
            },
            key,
            value,
        ))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BoundedSequencedHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BoundedSequencedHashMap")
            .field("capacity", &self.capacity)
            .field("entries", &self.map)
            .finish()
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A double-ended iterator over the entries of a sequenced map, in sequence
/// order.
pub struct SequencedHashMapIterator<'a, K, V> {
    inner: PersistentVectorIterator<'a, SequencedEntry<K, V>>,
}

impl<'a, K, V> Iterator for SequencedHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for SequencedHashMapIterator<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|entry| (&entry.key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for SequencedHashMapIterator<'_, K, V> {}

impl<K, V> FusedIterator for SequencedHashMapIterator<'_, K, V> {}

/// An owning iterator over the entries of a sequenced map, in sequence order.
pub struct SequencedHashMapIntoIterator<K, V> {
    inner: PersistentVectorIntoIterator<SequencedEntry<K, V>>,
}

impl<K: Clone, V: Clone> Iterator for SequencedHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (entry.key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Clone, V: Clone> DoubleEndedIterator for SequencedHashMapIntoIterator<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| (entry.key, entry.value))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for SequencedHashMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for SequencedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for SequencedHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = TransientSequencedHashMap::new();
        transient.extend(iter);
        transient.persistent()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for TransientSequencedHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = Self::new();
        transient.extend(iter);
        transient
    }
}

impl<K: Clone + Hash + Eq, V: Clone> From<PersistentHashMap<K, V>> for SequencedHashMap<K, V> {
    /// Takes the entries in the iteration order of the hash map.
    fn from(map: PersistentHashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> From<SequencedHashMap<K, V>> for PersistentHashMap<K, V> {
    fn from(map: SequencedHashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Clone, V: Clone> IntoIterator for SequencedHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = SequencedHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        SequencedHashMapIntoIterator {
            inner: ReferenceCounter::unwrap_or_clone(self.core).order.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a SequencedHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = SequencedHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for SequencedHashMap<K, V> {
    /// Compares contents only; two maps holding the same entries in different
    /// orders are equal.
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }
        self.iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for SequencedHashMap<K, V> {}

impl<K: Hash, V: Hash> Hash for SequencedHashMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        state.write_u64(hash_unordered(self.iter()));
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SequencedHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for SequencedHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (position, (key, value)) in self.iter().enumerate() {
            if position > 0 {
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
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for SequencedHashMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
struct SequencedHashMapVisitor<K, V> {
    marker: PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for SequencedHashMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    type Value = SequencedHashMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut transient = TransientSequencedHashMap::new();
        while let Some((key, value)) = access.next_entry()? {
            transient.insert(key, value);
        }
        Ok(transient.persistent())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for SequencedHashMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(SequencedHashMapVisitor {
            marker: PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
