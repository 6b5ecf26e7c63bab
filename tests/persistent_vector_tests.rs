//! Unit tests for PersistentVector, TransientVector and BoundedVector.

use champ_collections::persistent::{BoundedVector, CapacityError, PersistentVector, TransientVector};
use rstest::rstest;

fn range_vector(length: i32) -> PersistentVector<i32> {
    (0..length).collect()
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_creates_empty_vector() {
    let vector: PersistentVector<i32> = PersistentVector::new();
    assert!(vector.is_empty());
    assert_eq!(vector.get(0), None);
    assert_eq!(vector.first(), None);
    assert_eq!(vector.last(), None);
}

#[rstest]
#[case(1)]
#[case(32)]
#[case(33)]
#[case(64)]
#[case(65)]
#[case(1024)]
#[case(1025)]
#[case(40_000)]
fn test_collect_preserves_every_position(#[case] length: i32) {
    let vector = range_vector(length);
    assert_eq!(vector.len(), length as usize);
    for index in 0..length {
        assert_eq!(vector.get(index as usize), Some(&index));
    }
    assert_eq!(vector.get(length as usize), None);
}

#[rstest]
fn test_from_slice_and_into_vec() {
    let vector = PersistentVector::from_slice(&[3, 1, 4, 1, 5]);
    let elements: Vec<i32> = vector.into();
    assert_eq!(elements, vec![3, 1, 4, 1, 5]);
}

// =============================================================================
// Both ends
// =============================================================================

#[rstest]
fn test_push_front_reverses_order() {
    let mut vector = PersistentVector::new();
    for element in 0..200 {
        vector = vector.push_front(element);
    }
    let expected: Vec<i32> = (0..200).rev().collect();
    assert_eq!(vector.iter().copied().collect::<Vec<_>>(), expected);
}

#[rstest]
fn test_mixed_pushes_and_pops_behave_like_deque() {
    let mut vector = PersistentVector::new();
    let mut model = std::collections::VecDeque::new();
    for element in 0..500 {
        if element % 3 == 0 {
            vector = vector.push_front(element);
            model.push_front(element);
        } else {
            vector = vector.push_back(element);
            model.push_back(element);
        }
    }
    for step in 0..300 {
        if step % 2 == 0 {
            let (rest, element) = vector.pop_front().unwrap();
            assert_eq!(Some(element), model.pop_front());
            vector = rest;
        } else {
            let (rest, element) = vector.pop_back().unwrap();
            assert_eq!(Some(element), model.pop_back());
            vector = rest;
        }
    }
    assert_eq!(vector.iter().copied().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
}

#[rstest]
fn test_pop_from_empty_is_none() {
    let vector: PersistentVector<i32> = PersistentVector::new();
    assert!(vector.pop_back().is_none());
    assert!(vector.pop_front().is_none());
}

// =============================================================================
// Positional edits
// =============================================================================

#[rstest]
#[case(0)]
#[case(17)]
#[case(500)]
#[case(999)]
#[case(1000)]
fn test_insert_at_position(#[case] index: usize) {
    let vector = range_vector(1000);
    let inserted = vector.insert(index, -1).unwrap();
    assert_eq!(inserted.len(), 1001);
    assert_eq!(inserted.get(index), Some(&-1));
    let mut model: Vec<i32> = (0..1000).collect();
    model.insert(index, -1);
    assert_eq!(inserted.iter().copied().collect::<Vec<_>>(), model);
    assert_eq!(vector.len(), 1000);
}

#[rstest]
#[case(0)]
#[case(31)]
#[case(512)]
#[case(999)]
fn test_remove_at_position(#[case] index: usize) {
    let vector = range_vector(1000);
    let (removed, element) = vector.remove(index).unwrap();
    assert_eq!(element, index as i32);
    let mut model: Vec<i32> = (0..1000).collect();
    model.remove(index);
    assert_eq!(removed.iter().copied().collect::<Vec<_>>(), model);
}

#[rstest]
fn test_out_of_range_positions_are_rejected() {
    let vector = range_vector(10);
    assert!(vector.insert(11, 0).is_none());
    assert!(vector.remove(10).is_none());
    assert!(vector.update(10, 0).is_none());
}

#[rstest]
fn test_update_does_not_modify_original() {
    let vector = range_vector(100);
    let updated = vector.update(50, -50).unwrap();
    assert_eq!(updated.get(50), Some(&-50));
    assert_eq!(vector.get(50), Some(&50));
}

// =============================================================================
// Split, append and slice
// =============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(32)]
#[case(1500)]
#[case(3000)]
fn test_split_then_append_round_trips(#[case] index: usize) {
    let vector = range_vector(3000);
    let (left, right) = vector.split_at(index);
    assert_eq!(left.len(), index);
    assert_eq!(right.len(), 3000 - index);
    assert_eq!(left.append(&right), vector);
}

#[rstest]
fn test_append_large_vectors() {
    let left = range_vector(2000);
    let right: PersistentVector<i32> = (2000..5000).collect();
    let joined = left.append(&right);
    assert_eq!(joined, range_vector(5000));
    assert_eq!(joined.get(2000), Some(&2000));
}

#[rstest]
fn test_slice_clamps_bounds() {
    let vector = range_vector(100);
    assert_eq!(vector.slice(10, 20), (10..20).collect::<PersistentVector<_>>());
    assert_eq!(vector.slice(90, 500), (90..100).collect::<PersistentVector<_>>());
    assert!(vector.slice(50, 10).is_empty());
}

// =============================================================================
// Search and iteration
// =============================================================================

#[rstest]
fn test_binary_search_by_on_sorted_vector() {
    let vector: PersistentVector<i32> = (0..3000).map(|n| n * 2).collect();
    assert_eq!(vector.binary_search_by(|element| element.cmp(&1000)), Ok(500));
    assert_eq!(vector.binary_search_by(|element| element.cmp(&1001)), Err(501));
    assert_eq!(vector.binary_search_by(|element| element.cmp(&-1)), Err(0));
}

#[rstest]
fn test_double_ended_iteration() {
    let vector = range_vector(100);
    let mut iter = vector.iter();
    assert_eq!(iter.len(), 100);
    assert_eq!(iter.next(), Some(&0));
    assert_eq!(iter.next_back(), Some(&99));
    assert_eq!(iter.len(), 98);
    let reversed: Vec<i32> = vector.iter().rev().copied().collect();
    assert_eq!(reversed, (0..100).rev().collect::<Vec<_>>());
}

// =============================================================================
// Transient builder
// =============================================================================

#[rstest]
fn test_transient_batch_edits() {
    let vector = range_vector(100);
    let mut transient = vector.clone().transient();
    transient.push_back(100);
    transient.push_front(-1);
    assert_eq!(transient.set(1, 1000), Some(0));
    assert!(transient.insert(50, 7));
    assert!(!transient.insert(500, 7));
    assert_eq!(transient.remove(0), Some(-1));
    let edited = transient.persistent();

    assert_eq!(edited.len(), 102);
    assert_eq!(edited.get(0), Some(&1000));
    assert_eq!(edited.get(49), Some(&7));
    assert_eq!(vector, range_vector(100));
}

#[rstest]
fn test_transient_clone_forks() {
    let mut original: TransientVector<i32> = TransientVector::new();
    original.extend(0..10);
    let mut fork = original.clone();
    fork.push_back(10);
    assert_eq!(original.pop_back(), Some(9));

    assert_ne!(original.owner(), fork.owner());
    assert_eq!(original.len(), 9);
    assert_eq!(fork.len(), 11);
}

// =============================================================================
// Bounded vector
// =============================================================================

#[rstest]
fn test_bounded_vector_accepts_capacity_then_rejects() {
    let capacity = 40;
    let mut vector = BoundedVector::new(capacity);
    for element in 0..capacity {
        vector = vector.try_push_back(element).unwrap();
    }
    assert!(vector.is_full());
    assert_eq!(vector.try_push_back(capacity), Err(CapacityError { capacity }));
    assert_eq!(vector.try_push_front(capacity), Err(CapacityError { capacity }));
    assert_eq!(vector.len(), capacity);
    assert_eq!(vector.as_vector().last(), Some(&(capacity - 1)));

    let (shrunk, last) = vector.pop_back().unwrap();
    assert_eq!(last, capacity - 1);
    let refilled = shrunk.try_push_front(capacity).unwrap();
    assert_eq!(refilled.get(0), Some(&capacity));
    assert_eq!(shrunk.len(), capacity - 1);
}

#[rstest]
fn test_bounded_vector_rejects_oversized_sources() {
    assert!(BoundedVector::from_vector(range_vector(5), 4).is_err());
    let bounded = BoundedVector::from_vector(range_vector(4), 6).unwrap();
    assert_eq!(bounded.try_append(&range_vector(3)), Err(CapacityError { capacity: 6 }));
    let full = bounded.try_append(&range_vector(2)).unwrap().into_vector();
    assert_eq!(full.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3, 0, 1]);
}
