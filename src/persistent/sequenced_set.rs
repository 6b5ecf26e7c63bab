//! Persistent hash set that remembers the order of its elements.
//!
//! [`SequencedHashSet`] is a [`SequencedHashMap`] from each element to `()`.
//!
//! # Examples
//!
//! ```rust
//! use champ_collections::persistent::SequencedHashSet;
//!
//! let set = SequencedHashSet::new()
//!     .insert(2)
//!     .insert(3)
//!     .insert_first(1);
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! assert_eq!(format!("{set}"), "[1, 2, 3]");
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::hashset::PersistentHashSet;
use super::sequenced::{
    SequencedHashMap, SequencedHashMapIntoIterator, SequencedHashMapIterator,
    TransientSequencedHashMap,
};

/// A persistent hash set that iterates in sequence order.
pub struct SequencedHashSet<T> {
    inner: SequencedHashMap<T, ()>,
}

impl<T> Clone for SequencedHashSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SequencedHashSet<T> {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SequencedHashMap::new(),
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if both sets share the same internal structure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.inner.first().map(|(element, ())| element)
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.inner.last().map(|(element, ())| element)
    }

    /// Returns the element at position `index` in sequence order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.inner.get_index(index).map(|(element, ())| element)
    }

    /// Returns a double-ended iterator over the elements in sequence order.
    #[must_use]
    pub fn iter(&self) -> SequencedHashSetIterator<'_, T> {
        SequencedHashSetIterator {
            inner: self.inner.iter(),
        }
    }
}

impl<T: Clone + Hash + Eq> SequencedHashSet<T> {
    /// Creates a set containing a single element.
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self {
            inner: SequencedHashMap::singleton(element, ()),
        }
    }

    /// Returns `true` if the set contains `element`.
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Returns the position of `element` in sequence order.
    pub fn index_of<Q>(&self, element: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.index_of(element)
    }

    /// Adds `element` at the back unless it is already present.
    ///
    /// Returns the receiver unchanged (sharing its structure) if the element
    /// is already present.
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            inner: self.inner.insert(element, ()),
        }
    }

    /// Adds or moves `element` to the front.
    #[must_use]
    pub fn insert_first(&self, element: T) -> Self {
        Self {
            inner: self.inner.insert_first(element, ()),
        }
    }

    /// Adds or moves `element` to the back.
    #[must_use]
    pub fn insert_last(&self, element: T) -> Self {
        Self {
            inner: self.inner.insert_last(element, ()),
        }
    }

    /// Removes `element`.
    #[must_use]
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Self {
            inner: self.inner.remove(element),
        }
    }

    /// Returns an empty set.
    ///
    /// An empty receiver is returned unchanged.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self {
            inner: self.inner.clear(),
        }
    }

    /// Returns the elements of both sets.
    ///
    /// Elements of `other` missing from `self` are appended in `other`'s
    /// order. Returns the receiver unchanged when `other` adds nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use champ_collections::persistent::SequencedHashSet;
    ///
    /// let left: SequencedHashSet<i32> = [3, 1].into_iter().collect();
    /// let right: SequencedHashSet<i32> = [2, 1, 4].into_iter().collect();
    /// let union = left.union(&right);
    /// assert_eq!(union.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2, 4]);
    /// ```
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            inner: self
                .inner
                .insert_all(other.iter().map(|element| (element.clone(), ()))),
        }
    }

    /// Returns the elements of `self` that are also in `other`, in the
    /// receiver's order.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            inner: self.inner.retain(|element, ()| other.contains(element)),
        }
    }

    /// Returns the elements of `self` that are not in `other`, in the
    /// receiver's order.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            inner: self.inner.remove_all(other.iter()),
        }
    }

    /// Removes the first element.
    #[must_use]
    pub fn pop_first(&self) -> Option<(Self, T)> {
        let (inner, element, ()) = self.inner.pop_first()?;
        Some((Self { inner }, element))
    }

    /// Removes the last element.
    #[must_use]
    pub fn pop_last(&self) -> Option<(Self, T)> {
        let (inner, element, ()) = self.inner.pop_last()?;
        Some((Self { inner }, element))
    }

    /// Converts this set into a transient set for batch edits.
    #[must_use]
    pub fn transient(self) -> TransientSequencedHashSet<T> {
        TransientSequencedHashSet {
            inner: self.inner.transient(),
        }
    }
}

/// A transient (temporarily mutable) sequenced hash set.
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::TransientSequencedHashSet;
///
/// let mut transient = TransientSequencedHashSet::new();
/// assert!(transient.insert("b"));
/// assert!(!transient.insert("b"));
/// transient.insert_first("a");
/// let set = transient.persistent();
/// assert_eq!(set.first(), Some(&"a"));
/// ```
pub struct TransientSequencedHashSet<T> {
    inner: TransientSequencedHashMap<T, ()>,
}

static_assertions::assert_not_impl_any!(TransientSequencedHashSet<i32>: Send, Sync);

impl<T> TransientSequencedHashSet<T> {
    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.inner.first().map(|(element, ())| element)
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.inner.last().map(|(element, ())| element)
    }

    /// Returns a double-ended iterator over the elements in sequence order.
    #[must_use]
    pub fn iter(&self) -> SequencedHashSetIterator<'_, T> {
        SequencedHashSetIterator {
            inner: self.inner.iter(),
        }
    }

    /// Freezes this builder into a persistent set.
    #[must_use]
    pub fn persistent(self) -> SequencedHashSet<T> {
        SequencedHashSet {
            inner: self.inner.persistent(),
        }
    }
}

impl<T: Clone + Hash + Eq> TransientSequencedHashSet<T> {
    /// Creates a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        SequencedHashSet::new().transient()
    }

    /// Returns `true` if the set contains `element`.
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(element)
    }

    /// Adds `element` at the back. Returns `false` if it was already present,
    /// in which case its position is kept.
    pub fn insert(&mut self, element: T) -> bool {
        self.inner.insert(element, ()).is_none()
    }

    /// Adds or moves `element` to the front. Returns `true` if it was new.
    pub fn insert_first(&mut self, element: T) -> bool {
        self.inner.insert_first(element, ()).is_none()
    }

    /// Adds or moves `element` to the back. Returns `true` if it was new.
    pub fn insert_last(&mut self, element: T) -> bool {
        self.inner.insert_last(element, ()).is_none()
    }

    /// Removes `element`. Returns `true` if it was present.
    pub fn remove<Q>(&mut self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(element).is_some()
    }

    /// Removes and returns the first element.
    pub fn pop_first(&mut self) -> Option<T> {
        self.inner.pop_first().map(|(element, ())| element)
    }

    /// Removes and returns the last element.
    pub fn pop_last(&mut self) -> Option<T> {
        self.inner.pop_last().map(|(element, ())| element)
    }

    /// Adds every element produced by `elements` at the back.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        for element in elements {
            self.insert(element);
        }
    }
}

impl<T: Clone> Clone for TransientSequencedHashSet<T> {
    /// Forks the builder. The fork gets a fresh owner.
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Hash + Eq> Default for TransientSequencedHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// A double-ended iterator over the elements of a sequenced set.
pub struct SequencedHashSetIterator<'a, T> {
    inner: SequencedHashMapIterator<'a, T, ()>,
}

impl<'a, T> Iterator for SequencedHashSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for SequencedHashSetIterator<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(element, ())| element)
    }
}

impl<T> ExactSizeIterator for SequencedHashSetIterator<'_, T> {}

/// An owning iterator over the elements of a sequenced set.
pub struct SequencedHashSetIntoIterator<T> {
    inner: SequencedHashMapIntoIterator<T, ()>,
}

impl<T: Clone> Iterator for SequencedHashSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Clone> DoubleEndedIterator for SequencedHashSetIntoIterator<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(element, ())| element)
    }
}

impl<T: Clone> ExactSizeIterator for SequencedHashSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for SequencedHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for SequencedHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut transient = TransientSequencedHashSet::new();
        transient.extend(iter);
        transient.persistent()
    }
}

impl<T: Clone + Hash + Eq> From<PersistentHashSet<T>> for SequencedHashSet<T> {
    fn from(set: PersistentHashSet<T>) -> Self {
        set.into_iter().collect()
    }
}

impl<T: Clone + Hash + Eq> From<SequencedHashSet<T>> for PersistentHashSet<T> {
    fn from(set: SequencedHashSet<T>) -> Self {
        set.into_iter().collect()
    }
}

impl<T: Clone> IntoIterator for SequencedHashSet<T> {
    type Item = T;
    type IntoIter = SequencedHashSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        SequencedHashSetIntoIterator {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a SequencedHashSet<T> {
    type Item = &'a T;
    type IntoIter = SequencedHashSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + Hash + Eq> PartialEq for SequencedHashSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Clone + Hash + Eq> Eq for SequencedHashSet<T> {}

impl<T: Hash> Hash for SequencedHashSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for SequencedHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for SequencedHashSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        for (position, element) in self.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for SequencedHashSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for SequencedHashSet<T>
where
    T: serde::Deserialize<'de> + Clone + Hash + Eq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements: Vec<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}
