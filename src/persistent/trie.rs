//! Lookup, insertion and removal over CHAMP nodes.
//!
//! The mutating functions take the slot holding a node and go through
//! [`ReferenceCounter::make_mut`]: a node referenced only by the caller is
//! edited in place, a shared node is cloned first. Persistent maps always
//! reach their root through a fresh clone, so the path they edit is copied
//! and everything else stays shared. Transient maps own most of their nodes
//! exclusively after the first edit and mutate them without copying.

use std::borrow::Borrow;
use std::hash::Hash;

use super::ReferenceCounter;
use super::hash_of;
use super::node::{BITS_PER_LEVEL, Node, bit_for, index};

/// Finds the entry stored under `key`.
pub(crate) fn get<'a, K, V, Q>(root: &'a Node<K, V>, key: &Q, hash: u32) -> Option<(&'a K, &'a V)>
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut node = root;
    let mut shift = 0;

    loop {
        match node {
            Node::Empty => return None,
            Node::Branch {
                data_map,
                node_map,
                entries,
                children,
            } => {
                let bit = bit_for(hash, shift);
                if data_map & bit != 0 {
                    let (stored_key, value) = &entries[index(*data_map, bit)];
                    return (stored_key.borrow() == key).then_some((stored_key, value));
                }
                if node_map & bit == 0 {
                    return None;
                }
                node = &children[index(*node_map, bit)];
                shift += BITS_PER_LEVEL;
            }
            Node::Collision {
                hash: collision_hash,
                entries,
            } => {
                if *collision_hash != hash {
                    return None;
                }
                return entries
                    .iter()
                    .find(|(stored_key, _)| stored_key.borrow() == key)
                    .map(|(stored_key, value)| (stored_key, value));
            }
        }
    }
}

/// Stores `value` under `key`, returning the value it replaced.
pub(crate) fn insert<K, V>(
    slot: &mut ReferenceCounter<Node<K, V>>,
    key: K,
    value: V,
    hash: u32,
    shift: u32,
) -> Option<V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    let node = ReferenceCounter::make_mut(slot);

    match node {
        Node::Empty => {
            *node = Node::Branch {
                data_map: bit_for(hash, shift),
                node_map: 0,
                entries: vec![(key, value)],
                children: Vec::new(),
            };
            None
        }
        Node::Branch {
            data_map,
            node_map,
            entries,
            children,
        } => {
            let bit = bit_for(hash, shift);

            if *data_map & bit != 0 {
                let position = index(*data_map, bit);
                if entries[position].0 == key {
                    return Some(std::mem::replace(&mut entries[position].1, value));
                }

                let displaced = entries.remove(position);
                let displaced_hash = hash_of(&displaced.0);
                let child = Node::pair(
                    displaced,
                    displaced_hash,
                    (key, value),
                    hash,
                    shift + BITS_PER_LEVEL,
                );
                *data_map ^= bit;
                *node_map |= bit;
                children.insert(index(*node_map, bit), ReferenceCounter::new(child));
                None
            } else if *node_map & bit != 0 {
                let position = index(*node_map, bit);
                insert(
                    &mut children[position],
                    key,
                    value,
                    hash,
                    shift + BITS_PER_LEVEL,
                )
            } else {
                *data_map |= bit;
                entries.insert(index(*data_map, bit), (key, value));
                None
            }
        }
        Node::Collision { entries, .. } => {
            if let Some((_, stored)) = entries.iter_mut().find(|(stored_key, _)| *stored_key == key)
            {
                return Some(std::mem::replace(stored, value));
            }
            entries.push((key, value));
            None
        }
    }
}

/// Removes the entry stored under `key`.
///
/// Sub-nodes left with a single entry are inlined into their parent; the
/// inlining repeats on the way back up until the trie is canonical again.
pub(crate) fn remove<K, V, Q>(
    slot: &mut ReferenceCounter<Node<K, V>>,
    key: &Q,
    hash: u32,
    shift: u32,
) -> Option<(K, V)>
where
    K: Clone + Borrow<Q>,
    V: Clone,
    Q: Eq + ?Sized,
{
    let node = ReferenceCounter::make_mut(slot);

    match node {
        Node::Empty => None,
        Node::Branch {
            data_map,
            node_map,
            entries,
            children,
        } => {
            let bit = bit_for(hash, shift);

            if *data_map & bit != 0 {
                let position = index(*data_map, bit);
                if entries[position].0.borrow() != key {
                    return None;
                }
                *data_map ^= bit;
                let removed = entries.remove(position);
                if shift == 0 && *data_map == 0 && *node_map == 0 {
                    *node = Node::Empty;
                }
                Some(removed)
            } else if *node_map & bit != 0 {
                let position = index(*node_map, bit);
                let removed = remove(&mut children[position], key, hash, shift + BITS_PER_LEVEL)?;

                if children[position].is_singleton() {
                    if shift > 0 && *data_map == 0 && *node_map == bit {
                        // Only the singleton is left here: hand it to our parent.
                        if let Some(child) = children.pop() {
                            *node = ReferenceCounter::unwrap_or_clone(child);
                        }
                    } else {
                        let child = children.remove(position);
                        if let Some(entry) = ReferenceCounter::unwrap_or_clone(child).into_single_entry() {
                            *node_map ^= bit;
                            *data_map |= bit;
                            entries.insert(index(*data_map, bit), entry);
                        }
                    }
                }
                Some(removed)
            } else {
                None
            }
        }
        Node::Collision { entries, .. } => {
            let position = entries
                .iter()
                .position(|(stored_key, _)| stored_key.borrow() == key)?;
            Some(entries.swap_remove(position))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn root<K, V>() -> ReferenceCounter<Node<K, V>> {
        ReferenceCounter::new(Node::Empty)
    }

    fn put(slot: &mut ReferenceCounter<Node<i32, i32>>, key: i32, value: i32) -> Option<i32> {
        insert(slot, key, value, hash_of(&key), 0)
    }

    fn take(slot: &mut ReferenceCounter<Node<i32, i32>>, key: i32) -> Option<(i32, i32)> {
        remove(slot, &key, hash_of(&key), 0)
    }

    fn shape<K, V>(node: &Node<K, V>) -> String {
        match node {
            Node::Empty => "E".to_string(),
            Node::Branch {
                data_map,
                node_map,
                children,
                ..
            } => {
                let inner: Vec<String> = children.iter().map(|child| shape(child)).collect();
                format!("B({data_map:x},{node_map:x},[{}])", inner.join(","))
            }
            Node::Collision { hash, entries } => format!("C({hash:x},{})", entries.len()),
        }
    }

    fn assert_canonical<K, V>(node: &Node<K, V>, shift: u32) {
        if let Node::Branch {
            data_map,
            node_map,
            entries,
            children,
        } = node
        {
            assert_eq!(data_map & node_map, 0);
            assert_eq!(data_map.count_ones() as usize, entries.len());
            assert_eq!(node_map.count_ones() as usize, children.len());
            if shift > 0 {
                assert!(!node.is_singleton(), "singleton branch below the root");
                assert!(entries.len() + children.len() > 0);
            }
            for child in children {
                assert_canonical(child, shift + BITS_PER_LEVEL);
            }
        }
        if let Node::Collision { entries, .. } = node {
            assert!(entries.len() >= 2);
        }
    }

    #[rstest]
    fn test_insert_then_get() {
        let mut slot = root();
        for key in 0..200 {
            assert_eq!(put(&mut slot, key, key * 10), None);
        }
        for key in 0..200 {
            assert_eq!(get(&slot, &key, hash_of(&key)), Some((&key, &(key * 10))));
        }
        assert_eq!(get(&slot, &500, hash_of(&500)), None);
        assert_canonical(&slot, 0);
    }

    #[rstest]
    fn test_insert_existing_key_returns_previous_value() {
        let mut slot = root();
        put(&mut slot, 1, 1);
        assert_eq!(put(&mut slot, 1, 2), Some(1));
        assert_eq!(get(&slot, &1, hash_of(&1)), Some((&1, &2)));
    }

    #[rstest]
    fn test_remove_restores_empty_root() {
        let mut slot = root();
        put(&mut slot, 1, 1);
        put(&mut slot, 2, 2);
        assert_eq!(take(&mut slot, 1), Some((1, 1)));
        assert_eq!(take(&mut slot, 1), None);
        assert_eq!(take(&mut slot, 2), Some((2, 2)));
        assert!(matches!(*slot, Node::Empty));
    }

    #[rstest]
    fn test_shape_is_independent_of_history() {
        let mut ascending = root();
        for key in 0..300 {
            put(&mut ascending, key, key);
        }

        let mut churned = root();
        for key in (0..600).rev() {
            put(&mut churned, key, key);
        }
        for key in 300..600 {
            take(&mut churned, key);
        }

        assert_canonical(&ascending, 0);
        assert_canonical(&churned, 0);
        assert_eq!(shape(&ascending), shape(&churned));
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Colliding(&'static str);

    impl Hash for Colliding {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            0_u8.hash(state);
        }
    }

    #[rstest]
    fn test_colliding_hashes_share_a_collision_node() {
        let hash = hash_of(&Colliding("a"));
        let mut slot: ReferenceCounter<Node<Colliding, i32>> = root();
        insert(&mut slot, Colliding("a"), 1, hash, 0);
        insert(&mut slot, Colliding("b"), 2, hash, 0);
        insert(&mut slot, Colliding("c"), 3, hash, 0);
        assert_eq!(
            get(&slot, &Colliding("b"), hash),
            Some((&Colliding("b"), &2))
        );
        assert_eq!(get(&slot, &Colliding("d"), hash), None);

        assert_eq!(
            remove(&mut slot, &Colliding("a"), hash, 0),
            Some((Colliding("a"), 1))
        );
        assert_eq!(
            remove(&mut slot, &Colliding("b"), hash, 0),
            Some((Colliding("b"), 2))
        );
        // The last survivor is pulled all the way back into the root.
        assert_eq!(
            shape(&slot),
            format!("B({:x},0,[])", 1_u32 << (hash & 0x1f))
        );
        assert_eq!(
            get(&slot, &Colliding("c"), hash),
            Some((&Colliding("c"), &3))
        );
    }

    #[rstest]
    fn test_shared_nodes_are_copied_on_write() {
        let mut original = root();
        for key in 0..100 {
            put(&mut original, key, key);
        }
        let mut copy = original.clone();
        put(&mut copy, 1000, 1000);
        take(&mut copy, 5);

        assert_eq!(get(&original, &1000, hash_of(&1000)), None);
        assert_eq!(get(&original, &5, hash_of(&5)), Some((&5, &5)));
        assert_eq!(get(&copy, &1000, hash_of(&1000)), Some((&1000, &1000)));
        assert_eq!(get(&copy, &5, hash_of(&5)), None);
    }
}
