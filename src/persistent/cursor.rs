//! Fail-fast cursors over transient builders.
//!
//! A cursor does not borrow the builder it walks. Each step takes the builder
//! as an argument, so the caller can keep editing it between steps. The
//! cursor remembers the builder's [`Owner`] and structural modification count
//! from when it was created. A step against a different builder, or against
//! one that changed structure behind the cursor's back, fails with
//! [`CursorError::ConcurrentModification`] instead of returning stale data.
//!
//! # Examples
//!
//! ```rust
//! use champ_collections::persistent::{CursorError, TransientVector};
//!
//! let mut vector = TransientVector::new();
//! vector.extend(0..6);
//!
//! let mut cursor = vector.cursor();
//! while let Some(element) = cursor.next(&vector).unwrap() {
//!     if element % 2 == 1 {
//!         cursor.remove(&mut vector).unwrap();
//!     }
//! }
//! assert_eq!(vector.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
//!
//! vector.push_back(6);
//! assert_eq!(cursor.next(&vector), Err(CursorError::ConcurrentModification));
//! ```

use std::hash::Hash;

use super::error::CursorError;
use super::owner::Owner;
use super::sequenced::TransientSequencedHashMap;
use super::vector::TransientVector;

/// Position bookkeeping shared by every cursor.
#[derive(Debug, Clone, Copy)]
struct CursorState {
    owner: Owner,
    expected_modifications: u64,
    /// Index of the element the next step returns.
    position: usize,
    /// Index of the element returned by the last successful step.
    last_returned: Option<usize>,
}

impl CursorState {
    const fn new(owner: Owner, modifications: u64) -> Self {
        Self {
            owner,
            expected_modifications: modifications,
            position: 0,
            last_returned: None,
        }
    }

    fn check(&self, owner: Owner, modifications: u64) -> Result<(), CursorError> {
        if self.owner != owner || self.expected_modifications != modifications {
            return Err(CursorError::ConcurrentModification);
        }
        Ok(())
    }

    /// Records a step to `index`, or the end of the walk.
    fn advance(&mut self, found: bool) {
        if found {
            self.last_returned = Some(self.position);
            self.position += 1;
        } else {
            self.last_returned = None;
        }
    }

    fn take_current(&mut self) -> Result<usize, CursorError> {
        self.last_returned.take().ok_or(CursorError::NoCurrentElement)
    }

    /// Re-synchronizes after the cursor removed the element at `index`.
    const fn removed(&mut self, index: usize, modifications: u64) {
        self.position = index;
        self.expected_modifications = modifications;
    }
}

// =============================================================================
// VectorCursor
// =============================================================================

/// A fail-fast cursor over a [`TransientVector`].
///
/// Created by [`TransientVector::cursor`].
#[derive(Debug, Clone)]
pub struct VectorCursor {
    state: CursorState,
}

impl VectorCursor {
    pub(crate) const fn new(owner: Owner, modifications: u64) -> Self {
        Self {
            state: CursorState::new(owner, modifications),
        }
    }

    /// Returns the next element, or `None` at the end of the vector.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::ConcurrentModification`] if `vector` is not the
    /// builder this cursor was created from, or if it changed structure
    /// through anything but this cursor.
    pub fn next<'a, T>(
        &mut self,
        vector: &'a TransientVector<T>,
    ) -> Result<Option<&'a T>, CursorError> {
        self.state
            .check(vector.owner(), vector.modification_count())?;
        let element = vector.get(self.state.position);
        self.state.advance(element.is_some());
        Ok(element)
    }

    /// Returns `true` if a following [`next`](Self::next) would yield an element.
    #[must_use]
    pub fn has_next<T>(&self, vector: &TransientVector<T>) -> bool {
        self.state.position < vector.len()
    }

    /// Removes the element returned by the last call to [`next`](Self::next).
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::ConcurrentModification`] as [`next`](Self::next)
    /// does, and [`CursorError::NoCurrentElement`] if no element was returned
    /// since the cursor was created or since the last removal.
    pub fn remove<T: Clone>(&mut self, vector: &mut TransientVector<T>) -> Result<T, CursorError> {
        self.state
            .check(vector.owner(), vector.modification_count())?;
        let index = self.state.take_current()?;
        let element = vector
            .remove(index)
            .ok_or(CursorError::ConcurrentModification)?;
        self.state.removed(index, vector.modification_count());
        Ok(element)
    }
}

// =============================================================================
// SequencedCursor
// =============================================================================

/// A fail-fast cursor over a [`TransientSequencedHashMap`], in sequence order.
///
/// Created by [`TransientSequencedHashMap::cursor`], which allows removal
/// through the cursor, or [`TransientSequencedHashMap::entries_cursor`],
/// which is read-only.
#[derive(Debug, Clone)]
pub struct SequencedCursor {
    state: CursorState,
    removable: bool,
}

impl SequencedCursor {
    pub(crate) const fn new(owner: Owner, modifications: u64) -> Self {
        Self {
            state: CursorState::new(owner, modifications),
            removable: true,
        }
    }

    pub(crate) const fn read_only(owner: Owner, modifications: u64) -> Self {
        Self {
            state: CursorState::new(owner, modifications),
            removable: false,
        }
    }

    /// Returns the next entry, or `None` at the end of the map.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::ConcurrentModification`] if `map` is not the
    /// builder this cursor was created from, or if it changed structure
    /// through anything but this cursor.
    pub fn next<'a, K, V>(
        &mut self,
        map: &'a TransientSequencedHashMap<K, V>,
    ) -> Result<Option<(&'a K, &'a V)>, CursorError>
    where
        K: Clone + Hash + Eq,
        V: Clone,
    {
        self.state.check(map.owner(), map.modification_count())?;
        let entry = map.get_index(self.state.position);
        self.state.advance(entry.is_some());
        Ok(entry)
    }

    /// Removes the entry returned by the last call to [`next`](Self::next).
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Unsupported`] on a read-only cursor,
    /// [`CursorError::ConcurrentModification`] as [`next`](Self::next) does,
    /// and [`CursorError::NoCurrentElement`] if no entry was returned since
    /// the cursor was created or since the last removal.
    pub fn remove<K, V>(
        &mut self,
        map: &mut TransientSequencedHashMap<K, V>,
    ) -> Result<(K, V), CursorError>
    where
        K: Clone + Hash + Eq,
        V: Clone,
    {
        if !self.removable {
            return Err(CursorError::Unsupported {
                operation: "remove",
            });
        }
        self.state.check(map.owner(), map.modification_count())?;
        let index = self.state.take_current()?;
        let entry = map
            .remove_index(index)
            .ok_or(CursorError::ConcurrentModification)?;
        self.state.removed(index, map.modification_count());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_remove_before_next_has_no_current_element() {
        let mut vector = TransientVector::new();
        vector.extend([1, 2, 3]);
        let mut cursor = vector.cursor();
        assert_eq!(cursor.remove(&mut vector), Err(CursorError::NoCurrentElement));
    }

    #[rstest]
    fn test_remove_twice_has_no_current_element() {
        let mut vector = TransientVector::new();
        vector.extend([1, 2, 3]);
        let mut cursor = vector.cursor();
        assert_eq!(cursor.next(&vector), Ok(Some(&1)));
        assert_eq!(cursor.remove(&mut vector), Ok(1));
        assert_eq!(cursor.remove(&mut vector), Err(CursorError::NoCurrentElement));
        assert_eq!(cursor.next(&vector), Ok(Some(&2)));
    }

    #[rstest]
    fn test_cursor_of_another_builder_is_rejected() {
        let mut first = TransientVector::new();
        first.push_back(1);
        let second = first.clone();
        let mut cursor = first.cursor();
        assert_eq!(
            cursor.next(&second),
            Err(CursorError::ConcurrentModification)
        );
    }

    #[rstest]
    fn test_value_replacement_is_not_structural() {
        let mut vector = TransientVector::new();
        vector.extend([1, 2, 3]);
        let mut cursor = vector.cursor();
        assert_eq!(cursor.next(&vector), Ok(Some(&1)));
        vector.set(1, 20);
        assert_eq!(cursor.next(&vector), Ok(Some(&20)));
    }

    #[rstest]
    fn test_exhausted_cursor_returns_none_and_clears_current() {
        let mut vector = TransientVector::new();
        vector.push_back(1);
        let mut cursor = vector.cursor();
        assert_eq!(cursor.next(&vector), Ok(Some(&1)));
        assert!(!cursor.has_next(&vector));
        assert_eq!(cursor.next(&vector), Ok(None));
        assert_eq!(cursor.remove(&mut vector), Err(CursorError::NoCurrentElement));
    }

    #[rstest]
    fn test_sequenced_cursor_removes_in_order() {
        let mut map = TransientSequencedHashMap::new();
        map.insert_last("a", 1);
        map.insert_last("b", 2);
        map.insert_first("c", 3);

        let mut cursor = map.cursor();
        assert_eq!(cursor.next(&map), Ok(Some((&"c", &3))));
        assert_eq!(cursor.next(&map), Ok(Some((&"a", &1))));
        assert_eq!(cursor.remove(&mut map), Ok(("a", 1)));
        assert_eq!(cursor.next(&map), Ok(Some((&"b", &2))));
        assert_eq!(cursor.next(&map), Ok(None));
        assert_eq!(map.len(), 2);
    }

    #[rstest]
    fn test_entries_cursor_is_read_only() {
        let mut map = TransientSequencedHashMap::new();
        map.insert("a", 1);
        let mut cursor = map.entries_cursor();
        assert_eq!(cursor.next(&map), Ok(Some((&"a", &1))));
        assert_eq!(
            cursor.remove(&mut map),
            Err(CursorError::Unsupported {
                operation: "remove"
            })
        );
        assert_eq!(map.len(), 1);
    }

    #[rstest]
    fn test_sequenced_cursor_detects_external_insert() {
        let mut map = TransientSequencedHashMap::new();
        map.insert("a", 1);
        let mut cursor = map.cursor();
        map.insert("b", 2);
        assert_eq!(cursor.next(&map), Err(CursorError::ConcurrentModification));
    }
}
