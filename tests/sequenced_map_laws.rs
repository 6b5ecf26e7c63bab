//! Property-based tests for SequencedHashMap.
//!
//! The model is a plain `Vec` of key-value pairs kept in sequence order.

use champ_collections::persistent::{SequencedHashMap, TransientSequencedHashMap};
use proptest::prelude::*;

// =============================================================================
// Strategy for generating test data
// =============================================================================

#[derive(Clone, Debug)]
enum Operation {
    Insert(u8, i32),
    InsertFirst(u8, i32),
    InsertLast(u8, i32),
    Remove(u8),
    PopFirst,
    PopLast,
}

fn arbitrary_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        2 => (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::Insert(key, value)),
        3 => (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::InsertFirst(key, value)),
        3 => (any::<u8>(), any::<i32>()).prop_map(|(key, value)| Operation::InsertLast(key, value)),
        2 => any::<u8>().prop_map(Operation::Remove),
        1 => Just(Operation::PopFirst),
        1 => Just(Operation::PopLast),
    ]
}

fn arbitrary_operations() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(arbitrary_operation(), 0..500)
}

#[derive(Default)]
struct Model {
    entries: Vec<(u8, i32)>,
}

impl Model {
    fn position(&self, key: u8) -> Option<usize> {
        self.entries.iter().position(|(candidate, _)| *candidate == key)
    }

    fn apply(&mut self, operation: &Operation) {
        match *operation {
            Operation::Insert(key, value) => match self.position(key) {
                Some(index) => self.entries[index].1 = value,
                None => self.entries.push((key, value)),
            },
            Operation::InsertFirst(key, value) => {
                if let Some(index) = self.position(key) {
                    self.entries.remove(index);
                }
                self.entries.insert(0, (key, value));
            }
            Operation::InsertLast(key, value) => {
                if let Some(index) = self.position(key) {
                    self.entries.remove(index);
                }
                self.entries.push((key, value));
            }
            Operation::Remove(key) => {
                if let Some(index) = self.position(key) {
                    self.entries.remove(index);
                }
            }
            Operation::PopFirst => {
                if !self.entries.is_empty() {
                    self.entries.remove(0);
                }
            }
            Operation::PopLast => {
                self.entries.pop();
            }
        }
    }
}

fn apply_persistent(map: &SequencedHashMap<u8, i32>, operation: &Operation) -> SequencedHashMap<u8, i32> {
    match *operation {
        Operation::Insert(key, value) => map.insert(key, value),
        Operation::InsertFirst(key, value) => map.insert_first(key, value),
        Operation::InsertLast(key, value) => map.insert_last(key, value),
        Operation::Remove(key) => map.remove(&key),
        Operation::PopFirst => map.pop_first().map_or_else(|| map.clone(), |(rest, _, _)| rest),
        Operation::PopLast => map.pop_last().map_or_else(|| map.clone(), |(rest, _, _)| rest),
    }
}

fn apply_transient(map: &mut TransientSequencedHashMap<u8, i32>, operation: &Operation) {
    match *operation {
        Operation::Insert(key, value) => {
            map.insert(key, value);
        }
        Operation::InsertFirst(key, value) => {
            map.insert_first(key, value);
        }
        Operation::InsertLast(key, value) => {
            map.insert_last(key, value);
        }
        Operation::Remove(key) => {
            map.remove(&key);
        }
        Operation::PopFirst => {
            map.pop_first();
        }
        Operation::PopLast => {
            map.pop_last();
        }
    }
}

// =============================================================================
// Model equivalence
// =============================================================================

proptest! {
    #[test]
    fn prop_order_agrees_with_model(operations in arbitrary_operations()) {
        let mut map = SequencedHashMap::new();
        let mut model = Model::default();
        for operation in &operations {
            map = apply_persistent(&map, operation);
            model.apply(operation);
        }
        let entries: Vec<(u8, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        prop_assert_eq!(entries, model.entries.clone());
        for (index, (key, _)) in model.entries.iter().enumerate() {
            prop_assert_eq!(map.index_of(key), Some(index));
        }
    }

    #[test]
    fn prop_transient_agrees_with_persistent(operations in arbitrary_operations()) {
        let mut map = SequencedHashMap::new();
        let mut transient = TransientSequencedHashMap::new();
        for operation in &operations {
            map = apply_persistent(&map, operation);
            apply_transient(&mut transient, operation);
        }
        let built = transient.persistent();
        prop_assert_eq!(
            built.iter().collect::<Vec<_>>(),
            map.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_sequence_numbers_strictly_increase(operations in arbitrary_operations()) {
        let mut map = SequencedHashMap::new();
        for operation in &operations {
            map = apply_persistent(&map, operation);
        }
        let sequences: Vec<i32> = map.entries().map(|entry| entry.sequence()).collect();
        prop_assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

// =============================================================================
// Edit laws
// =============================================================================

proptest! {
    #[test]
    fn prop_insert_first_puts_key_first(operations in arbitrary_operations(), key in any::<u8>(), value in any::<i32>()) {
        let mut map = SequencedHashMap::new();
        for operation in &operations {
            map = apply_persistent(&map, operation);
        }
        let moved = map.insert_first(key, value);
        prop_assert_eq!(moved.first(), Some((&key, &value)));
        prop_assert_eq!(moved.len(), map.len() + usize::from(!map.contains_key(&key)));
    }

    #[test]
    fn prop_remove_preserves_relative_order(operations in arbitrary_operations(), key in any::<u8>()) {
        let mut map = SequencedHashMap::new();
        for operation in &operations {
            map = apply_persistent(&map, operation);
        }
        let expected: Vec<u8> = map.keys().copied().filter(|candidate| *candidate != key).collect();
        let removed = map.remove(&key);
        prop_assert_eq!(removed.keys().copied().collect::<Vec<_>>(), expected);
    }
}
