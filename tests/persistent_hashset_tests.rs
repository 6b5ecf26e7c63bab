//! Unit tests for PersistentHashSet and TransientHashSet.

use champ_collections::persistent::{PersistentHashSet, TransientHashSet};
use rstest::rstest;
use std::collections::HashSet;

fn set_of(elements: &[i32]) -> PersistentHashSet<i32> {
    elements.iter().copied().collect()
}

// =============================================================================
// Construction and membership
// =============================================================================

#[rstest]
fn test_new_creates_empty_set() {
    let set: PersistentHashSet<i32> = PersistentHashSet::new();
    assert!(set.is_empty());
    assert_eq!(set, PersistentHashSet::default());
}

#[rstest]
fn test_clear_on_empty_set_keeps_identity() {
    let empty: PersistentHashSet<i32> = PersistentHashSet::new();
    assert!(empty.ptr_eq(&empty.clear()));
    assert!(set_of(&[1, 2]).clear().is_empty());
}

#[rstest]
fn test_insert_duplicate_keeps_identity() {
    let set = PersistentHashSet::singleton(42);
    let again = set.insert(42);
    assert_eq!(again.len(), 1);
    assert!(set.ptr_eq(&again));
}

#[rstest]
fn test_remove_absent_element_keeps_identity() {
    let set = set_of(&[1, 2, 3]);
    assert!(set.ptr_eq(&set.remove(&4)));
    let removed = set.remove(&2);
    assert!(!removed.contains(&2));
    assert!(set.contains(&2));
}

#[rstest]
fn test_borrowed_lookup() {
    let set: PersistentHashSet<String> = ["alpha", "beta"].iter().map(ToString::to_string).collect();
    assert!(set.contains("alpha"));
    assert!(!set.remove("beta").contains("beta"));
}

// =============================================================================
// Set algebra
// =============================================================================

#[rstest]
#[case(&[1, 2, 3], &[3, 4], &[1, 2, 3, 4])]
#[case(&[], &[1], &[1])]
#[case(&[1, 2], &[], &[1, 2])]
fn test_union(#[case] left: &[i32], #[case] right: &[i32], #[case] expected: &[i32]) {
    assert_eq!(set_of(left).union(&set_of(right)), set_of(expected));
}

#[rstest]
#[case(&[1, 2, 3], &[2, 3, 4], &[2, 3])]
#[case(&[1, 2], &[3, 4], &[])]
fn test_intersection(#[case] left: &[i32], #[case] right: &[i32], #[case] expected: &[i32]) {
    assert_eq!(set_of(left).intersection(&set_of(right)), set_of(expected));
}

#[rstest]
#[case(&[1, 2, 3], &[2], &[1, 3])]
#[case(&[1, 2], &[1, 2], &[])]
fn test_difference(#[case] left: &[i32], #[case] right: &[i32], #[case] expected: &[i32]) {
    assert_eq!(set_of(left).difference(&set_of(right)), set_of(expected));
}

#[rstest]
fn test_symmetric_difference() {
    assert_eq!(
        set_of(&[1, 2, 3]).symmetric_difference(&set_of(&[3, 4])),
        set_of(&[1, 2, 4])
    );
}

#[rstest]
fn test_subset_superset_disjoint() {
    let small = set_of(&[1, 2]);
    let large = set_of(&[1, 2, 3]);
    let other = set_of(&[7, 8]);

    assert!(small.is_subset(&large));
    assert!(!large.is_subset(&small));
    assert!(large.is_superset(&small));
    assert!(small.is_disjoint(&other));
    assert!(!small.is_disjoint(&large));
}

#[rstest]
fn test_union_with_subset_keeps_identity() {
    let large = set_of(&[1, 2, 3]);
    assert!(large.ptr_eq(&large.union(&set_of(&[2, 3]))));
}

// =============================================================================
// Transient builder
// =============================================================================

#[rstest]
fn test_transient_reports_whether_edits_changed_the_set() {
    let mut transient = TransientHashSet::new();
    assert!(transient.insert(1));
    assert!(!transient.insert(1));
    assert!(transient.insert(2));
    assert!(transient.remove(&1));
    assert!(!transient.remove(&1));
    assert_eq!(transient.len(), 1);
}

#[rstest]
fn test_transient_retain_reports_removed_count() {
    let mut transient: TransientHashSet<i32> = (0..10).collect();
    assert_eq!(transient.retain(|element| element % 2 == 0), 5);
    let expected: PersistentHashSet<i32> = (0..10).step_by(2).collect();
    assert_eq!(transient.persistent(), expected);
}

#[rstest]
fn test_transient_from_persistent_leaves_source_untouched() {
    let set = set_of(&[1, 2, 3]);
    let mut transient = set.clone().transient();
    transient.extend([4, 5]);
    transient.remove(&1);
    let edited = transient.persistent();

    assert_eq!(set, set_of(&[1, 2, 3]));
    assert_eq!(edited, set_of(&[2, 3, 4, 5]));
}

// =============================================================================
// Conversions
// =============================================================================

#[rstest]
fn test_from_std_set_and_back_through_iteration() {
    let std_set: HashSet<i32> = (0..40).collect();
    let set = PersistentHashSet::from(std_set.clone());
    let collected: HashSet<i32> = set.into_iter().collect();
    assert_eq!(collected, std_set);
}
