//! Error types for bounded collections and cursors.
//!
//! Every fallible operation of this crate reports one of these errors and
//! leaves the collection it was applied to unchanged.

use std::fmt;

/// Returned when a bounded collection cannot grow any further.
///
/// This error occurs when:
/// - an insertion would take a [`BoundedVector`](super::BoundedVector) or a
///   [`BoundedSequencedHashMap`](super::BoundedSequencedHashMap) past its
///   capacity
/// - a bounded sequenced map has used up the sequence numbers available at
///   one of its ends (bounded maps never renumber)
///
/// # Examples
///
/// ```rust
/// use champ_collections::persistent::{BoundedVector, CapacityError};
///
/// let vector = BoundedVector::new(1).try_push_back(1).unwrap();
/// assert_eq!(vector.try_push_back(2), Err(CapacityError { capacity: 1 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityError {
    /// The capacity of the collection that rejected the operation.
    pub capacity: usize,
}

impl CapacityError {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "capacity exceeded: the collection is bounded to {} elements",
            self.capacity
        )
    }
}

impl std::error::Error for CapacityError {}

/// Errors reported by [`VectorCursor`](super::VectorCursor) and
/// [`SequencedCursor`](super::SequencedCursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorError {
    /// The collection was structurally modified by something other than the
    /// cursor, or the cursor was used with a different builder.
    ConcurrentModification,
    /// `remove` was called before a successful `next`, or twice in a row.
    NoCurrentElement,
    /// The cursor does not support the operation.
    Unsupported {
        /// The name of the rejected operation.
        operation: &'static str,
    },
}

impl fmt::Display for CursorError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConcurrentModification => {
                write!(formatter, "collection was modified outside of the cursor")
            }
            Self::NoCurrentElement => write!(formatter, "cursor has no current element"),
            Self::Unsupported { operation } => {
                write!(formatter, "cursor does not support {operation}")
            }
        }
    }
}

impl std::error::Error for CursorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let error = CapacityError::new(16);
        assert_eq!(
            format!("{error}"),
            "capacity exceeded: the collection is bounded to 16 elements"
        );
    }

    #[test]
    fn test_cursor_error_display() {
        assert_eq!(
            format!("{}", CursorError::ConcurrentModification),
            "collection was modified outside of the cursor"
        );
        assert_eq!(
            format!("{}", CursorError::NoCurrentElement),
            "cursor has no current element"
        );
        assert_eq!(
            format!("{}", CursorError::Unsupported { operation: "remove" }),
            "cursor does not support remove"
        );
    }

    #[test]
    fn test_errors_are_std_errors() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&CapacityError::new(1));
        assert_error(&CursorError::NoCurrentElement);
    }
}
