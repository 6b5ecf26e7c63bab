//! CHAMP trie nodes and bitmap helpers.
//!
//! A branch keeps two disjoint bitmaps over its 32 slots: `data_map` marks
//! slots holding an inline key/value pair and `node_map` marks slots holding
//! a sub-node. Both arrays are compressed, so the position of a slot inside
//! its array is the number of set bits below it.

use smallvec::SmallVec;

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits of the hash consumed per level (5 -> 32-way branching).
pub(crate) const BITS_PER_LEVEL: u32 = 5;

/// Width of the trie hash. Keys that agree on every bit end in a collision node.
pub(crate) const HASH_BITS: u32 = 32;

const FRAGMENT_MASK: u32 = (1 << BITS_PER_LEVEL) - 1;

// =============================================================================
// Bitmap helpers
// =============================================================================

/// Extracts the 5-bit chunk of `hash` used at `shift`.
#[inline]
pub(crate) const fn fragment(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & FRAGMENT_MASK
}

/// Returns the bitmap bit of the slot `hash` occupies at `shift`.
#[inline]
pub(crate) const fn bit_for(hash: u32, shift: u32) -> u32 {
    1 << fragment(hash, shift)
}

/// Returns the compressed array position of `bit` within `bitmap`.
#[inline]
pub(crate) const fn index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// =============================================================================
// Node Definition
// =============================================================================

/// A node of the hash trie.
#[derive(Clone)]
pub(crate) enum Node<K, V> {
    /// The node of an empty map.
    Empty,
    /// Bitmap-compressed node. `data_map & node_map == 0`.
    Branch {
        data_map: u32,
        node_map: u32,
        entries: Vec<(K, V)>,
        children: Vec<ReferenceCounter<Self>>,
    },
    /// Keys sharing all 32 hash bits. Holds at least two entries below the root.
    Collision { hash: u32, entries: Vec<(K, V)> },
}

impl<K, V> Node<K, V> {
    /// Builds the smallest node holding two entries with distinct keys.
    pub(crate) fn pair(
        first: (K, V),
        first_hash: u32,
        second: (K, V),
        second_hash: u32,
        shift: u32,
    ) -> Self {
        if shift >= HASH_BITS {
            debug_assert_eq!(first_hash, second_hash);
            return Self::Collision {
                hash: first_hash,
                entries: vec![first, second],
            };
        }

        let first_fragment = fragment(first_hash, shift);
        let second_fragment = fragment(second_hash, shift);

        if first_fragment == second_fragment {
            let child = Self::pair(
                first,
                first_hash,
                second,
                second_hash,
                shift + BITS_PER_LEVEL,
            );
            Self::Branch {
                data_map: 0,
                node_map: 1 << first_fragment,
                entries: Vec::new(),
                children: vec![ReferenceCounter::new(child)],
            }
        } else {
            let entries = if first_fragment < second_fragment {
                vec![first, second]
            } else {
                vec![second, first]
            };
            Self::Branch {
                data_map: (1 << first_fragment) | (1 << second_fragment),
                node_map: 0,
                entries,
                children: Vec::new(),
            }
        }
    }

    /// Returns `true` if this node holds exactly one entry and no sub-nodes.
    ///
    /// Such a node must not survive below the root: its parent inlines it.
    pub(crate) fn is_singleton(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Branch {
                data_map, node_map, ..
            } => *node_map == 0 && data_map.count_ones() == 1,
            Self::Collision { entries, .. } => entries.len() == 1,
        }
    }

    /// Takes the only entry out of a singleton node.
    pub(crate) fn into_single_entry(self) -> Option<(K, V)> {
        match self {
            Self::Empty => None,
            Self::Branch { mut entries, .. } | Self::Collision { mut entries, .. } => {
                entries.pop()
            }
        }
    }

    /// Iterates over every entry reachable from this node.
    pub(crate) fn entries(&self) -> Entries<'_, K, V> {
        let mut pending = SmallVec::new();
        pending.push(self);
        Entries {
            pending,
            current: [].iter(),
        }
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Moves every entry below `node` into `sink`.
    ///
    /// Nodes held only through `node` give up their entries; nodes still
    /// shared with another trie are cloned one level at a time.
    pub(crate) fn drain_into(node: ReferenceCounter<Self>, sink: &mut Vec<(K, V)>) {
        let mut pending: SmallVec<[ReferenceCounter<Self>; 16]> = SmallVec::new();
        pending.push(node);
        while let Some(node) = pending.pop() {
            match ReferenceCounter::unwrap_or_clone(node) {
                Self::Empty => {}
                Self::Branch {
                    entries, children, ..
                } => {
                    sink.extend(entries);
                    pending.extend(children);
                }
                Self::Collision { entries, .. } => sink.extend(entries),
            }
        }
    }
}

// =============================================================================
// Entries Iterator
// =============================================================================

/// Depth-first iterator over the entries of a trie.
///
/// Inline entries of a branch are produced before its sub-nodes.
pub(crate) struct Entries<'a, K, V> {
    pending: SmallVec<[&'a Node<K, V>; 16]>,
    current: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, value)) = self.current.next() {
                return Some((key, value));
            }

            match self.pending.pop()? {
                Node::Empty => {}
                Node::Branch {
                    entries, children, ..
                } => {
                    self.pending
                        .extend(children.iter().rev().map(ReferenceCounter::as_ref));
                    self.current = entries.iter();
                }
                Node::Collision { entries, .. } => {
                    self.current = entries.iter();
                }
            }
        }
    }
}
